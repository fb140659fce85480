//! Path-addressed blob store rooted at the project directory. Callers pass
//! forward-slash relative paths; directories are created on demand and every
//! write goes through a temp file + rename.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs;

use crate::error::{Result, StoreError};

#[derive(Clone, Debug)]
pub struct ProjectStorage {
    root: PathBuf,
}

impl ProjectStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, rel: &str) -> PathBuf {
        let mut path = self.root.clone();
        for segment in rel.split('/').filter(|segment| !segment.is_empty()) {
            path.push(segment);
        }
        path
    }

    pub async fn exists(&self, rel: &str) -> bool {
        fs::try_exists(self.resolve(rel)).await.unwrap_or(false)
    }

    pub async fn read_to_string(&self, rel: &str) -> Result<String> {
        fs::read_to_string(self.resolve(rel))
            .await
            .map_err(|source| StoreError::storage(rel, source))
    }

    pub async fn read_json<T: DeserializeOwned>(&self, rel: &str) -> Result<T> {
        let text = self.read_to_string(rel).await?;
        serde_json::from_str(&text).map_err(|err| StoreError::malformed(rel, err.to_string()))
    }

    pub async fn write_atomic(&self, rel: &str, contents: &[u8]) -> Result<()> {
        let path = self.resolve(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| StoreError::storage(rel, source))?;
        }

        let mut tmp_name = OsString::from(path.clone());
        tmp_name.push(".tmp");
        let tmp = PathBuf::from(tmp_name);

        fs::write(&tmp, contents)
            .await
            .map_err(|source| StoreError::storage(rel, source))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|source| StoreError::storage(rel, source))
    }

    pub async fn write_json<T: Serialize>(&self, rel: &str, value: &T) -> Result<()> {
        let data = serde_json::to_string_pretty(value)?;
        self.write_atomic(rel, format!("{data}\n").as_bytes()).await
    }
}

pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Uploaded pictures are stamped so re-uploads of the same source file never
/// collide: `img_<millis>_<sanitized original name>`.
pub fn picture_file_name<Tz: TimeZone>(original: &str, at: &DateTime<Tz>) -> String {
    format!(
        "img_{}_{}",
        at.timestamp_millis(),
        sanitize_file_name(original)
    )
}

pub fn picture_dir(class_type: &str, chapter_id: &str) -> String {
    format!("pictures/{class_type}/{chapter_id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    #[tokio::test]
    async fn write_creates_missing_directories() {
        let dir = TempDir::new().expect("temp dir");
        let storage = ProjectStorage::new(dir.path());

        storage
            .write_atomic("chapters/tcs/tcs_a.json", b"{}")
            .await
            .expect("write");

        assert!(storage.exists("chapters/tcs/tcs_a.json").await);
        let text = storage
            .read_to_string("chapters/tcs/tcs_a.json")
            .await
            .expect("read");
        assert_eq!(text, "{}");
    }

    #[tokio::test]
    async fn write_json_appends_trailing_newline() {
        let dir = TempDir::new().expect("temp dir");
        let storage = ProjectStorage::new(dir.path());

        storage
            .write_json("manifest.json", &serde_json::json!({"tcs": []}))
            .await
            .expect("write");

        let text = storage.read_to_string("manifest.json").await.expect("read");
        assert!(text.ends_with("}\n"));
    }

    #[tokio::test]
    async fn read_missing_file_is_storage_error() {
        let dir = TempDir::new().expect("temp dir");
        let storage = ProjectStorage::new(dir.path());

        let err = storage.read_to_string("manifest.json").await.unwrap_err();
        assert!(matches!(err, StoreError::StorageAccess { .. }));
    }

    #[test]
    fn picture_names_are_stamped_and_sanitized() {
        let at = Utc.with_ymd_and_hms(2025, 9, 1, 10, 30, 0).unwrap();
        let name = picture_file_name("mon image (1).png", &at);

        assert!(name.starts_with("img_"));
        assert!(name.ends_with("_mon_image__1_.png"));
        assert_eq!(picture_dir("tcs", "ch1"), "pictures/tcs/ch1");
    }
}
