//! Save decisions and project-wide synchronization. A chapter file is
//! rewritten only when its content fingerprint moved or its active flag
//! diverged from the manifest; the manifest itself is written once, after
//! every chapter write of the batch has completed.

use std::collections::BTreeMap;

use chrono::Utc;
use log::{debug, info, warn};
use tokio::task::JoinHandle;

use crate::data::ChapterData;
use crate::error::{Result, StoreError};
use crate::manifest::{ChapterKey, Manifest, ManifestEntry};
use crate::storage::{picture_dir, picture_file_name, ProjectStorage};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const CHAPTERS_DIR: &str = "chapters";

#[derive(Clone, Debug, Default)]
pub struct ProjectData {
    pub manifest: Manifest,
    pub chapters: BTreeMap<ChapterKey, ChapterData>,
}

impl ProjectData {
    /// Chapters of one class level, in manifest order.
    pub fn chapters_by_class(&self, class_type: &str) -> Vec<&ChapterData> {
        let Some(entries) = self.manifest.classes.get(class_type) else {
            return Vec::new();
        };

        entries
            .iter()
            .filter_map(|entry| {
                self.chapters
                    .get(&ChapterKey::new(class_type, entry.id.as_str()))
            })
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaveOutcome {
    pub written: bool,
    pub new_version: String,
}

#[derive(Debug, Default)]
pub struct SaveReport {
    pub saved: Vec<ChapterKey>,
    pub failed: Vec<(ChapterKey, StoreError)>,
    pub manifest_written: bool,
}

struct WriteJob {
    key: ChapterKey,
    rel: String,
    payload: String,
    new_version: String,
}

pub struct ContentStore {
    storage: ProjectStorage,
}

impl ContentStore {
    pub fn new(storage: ProjectStorage) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &ProjectStorage {
        &self.storage
    }

    /// Loads the manifest and every chapter it references. A chapter file
    /// that is missing or fails to parse is skipped and logged so one corrupt
    /// file never blocks the whole project from opening; only a missing
    /// manifest or chapters directory is fatal.
    pub async fn load_project(&self) -> Result<ProjectData> {
        let manifest: Manifest = self.storage.read_json(MANIFEST_FILE).await?;

        if !self.storage.exists(CHAPTERS_DIR).await {
            return Err(StoreError::storage(
                CHAPTERS_DIR,
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "chapters directory is missing",
                ),
            ));
        }

        let mut chapters = BTreeMap::new();
        for (class_type, entries) in &manifest.classes {
            for entry in entries {
                match self.load_chapter(class_type, entry).await {
                    Ok(chapter) => {
                        let key = ChapterKey::new(class_type.as_str(), entry.id.as_str());
                        chapters.insert(key, chapter);
                    }
                    Err(err) => {
                        warn!("skipping chapter {} ({}): {err}", entry.id, entry.file);
                    }
                }
            }
        }

        info!(
            "loaded {} of {} chapter(s) from manifest",
            chapters.len(),
            manifest.len()
        );
        Ok(ProjectData { manifest, chapters })
    }

    pub async fn load_chapter(
        &self,
        class_type: &str,
        entry: &ManifestEntry,
    ) -> Result<ChapterData> {
        let raw = self.storage.read_json(&chapter_rel_path(&entry.file)).await?;
        Ok(ChapterData::from_file(raw, entry, class_type))
    }

    /// The per-chapter save decision: recompute the fingerprint, compare it
    /// to the recorded version, and independently let an active-flag change
    /// force a write even when the content is unchanged.
    pub async fn save_chapter(
        &self,
        chapter: &mut ChapterData,
        entry: &mut ManifestEntry,
    ) -> Result<SaveOutcome> {
        let new_version = chapter.content_version()?;
        let content_changed = new_version != chapter.version;
        let active_changed = entry.is_active != chapter.is_active;

        if !content_changed && !active_changed {
            debug!("chapter {} unchanged, version kept: {}", chapter.id, chapter.version);
            return Ok(SaveOutcome {
                written: false,
                new_version,
            });
        }

        let mut file = chapter.to_file();
        file.version = new_version.clone();
        self.storage
            .write_json(&chapter_rel_path(&chapter.file_name), &file)
            .await?;

        chapter.version = new_version.clone();
        entry.version = new_version.clone();
        entry.is_active = chapter.is_active;

        info!("saved chapter {} at version {new_version}", chapter.id);
        Ok(SaveOutcome {
            written: true,
            new_version,
        })
    }

    /// Best-effort batch save. Chapter writes are issued concurrently; a
    /// failed write leaves that chapter's recorded version untouched and is
    /// reported per chapter, never aborting the rest. The manifest is written
    /// once, after all chapter writes have completed, and only reflects the
    /// chapters that actually persisted.
    pub async fn save_all(&self, project: &mut ProjectData) -> Result<SaveReport> {
        let mut report = SaveReport::default();
        let mut jobs = Vec::new();

        for (key, chapter) in &project.chapters {
            let Some(entry) = project.manifest.entry(key) else {
                report
                    .failed
                    .push((key.clone(), StoreError::not_found("manifest entry", key.to_string())));
                continue;
            };

            let new_version = match chapter.content_version() {
                Ok(version) => version,
                Err(err) => {
                    report.failed.push((key.clone(), err));
                    continue;
                }
            };

            let content_changed = new_version != chapter.version;
            let active_changed = entry.is_active != chapter.is_active;
            if !content_changed && !active_changed {
                continue;
            }

            let mut file = chapter.to_file();
            file.version = new_version.clone();
            let payload = match serde_json::to_string_pretty(&file) {
                Ok(payload) => payload,
                Err(err) => {
                    report.failed.push((key.clone(), err.into()));
                    continue;
                }
            };

            jobs.push(WriteJob {
                key: key.clone(),
                rel: chapter_rel_path(&chapter.file_name),
                payload,
                new_version,
            });
        }

        let handles: Vec<(ChapterKey, String, JoinHandle<Result<()>>)> = jobs
            .into_iter()
            .map(|job| {
                let WriteJob {
                    key,
                    rel,
                    payload,
                    new_version,
                } = job;
                let storage = self.storage.clone();
                let handle = tokio::spawn(async move {
                    storage
                        .write_atomic(&rel, format!("{payload}\n").as_bytes())
                        .await
                });
                (key, new_version, handle)
            })
            .collect();

        for (key, new_version, handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(join_err) => Err(StoreError::storage(
                    key.to_string(),
                    std::io::Error::other(join_err),
                )),
            };

            match result {
                Ok(()) => {
                    if let Some(chapter) = project.chapters.get_mut(&key) {
                        chapter.version = new_version.clone();
                    }
                    if let Some(entry) = project.manifest.entry_mut(&key) {
                        entry.version = new_version;
                        if let Some(chapter) = project.chapters.get(&key) {
                            entry.is_active = chapter.is_active;
                        }
                    }
                    report.saved.push(key);
                }
                Err(err) => {
                    warn!("failed to save chapter {key}: {err}");
                    report.failed.push((key, err));
                }
            }
        }

        if !report.saved.is_empty() {
            self.save_manifest(&project.manifest).await?;
            report.manifest_written = true;
        }

        info!(
            "save batch: {} saved, {} failed",
            report.saved.len(),
            report.failed.len()
        );
        Ok(report)
    }

    pub async fn save_manifest(&self, manifest: &Manifest) -> Result<()> {
        self.storage.write_json(MANIFEST_FILE, manifest).await
    }

    /// Active-flag toggle from the chapter table: resolves the entry by bare
    /// or composite id, flips both representations, and persists the manifest
    /// immediately.
    pub async fn set_active(
        &self,
        project: &mut ProjectData,
        candidate_id: &str,
        is_active: bool,
    ) -> Result<()> {
        let key = {
            let (class_type, entry) = project
                .manifest
                .find_by_any_id(candidate_id)
                .ok_or_else(|| StoreError::not_found("manifest entry", candidate_id))?;
            ChapterKey::new(class_type, entry.id.as_str())
        };

        if let Some(entry) = project.manifest.entry_mut(&key) {
            entry.is_active = is_active;
        }
        if let Some(chapter) = project.chapters.get_mut(&key) {
            chapter.is_active = is_active;
        }

        self.save_manifest(&project.manifest).await
    }

    pub async fn store_picture(
        &self,
        class_type: &str,
        chapter_id: &str,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<String> {
        let name = picture_file_name(original_name, &Utc::now());
        let rel = format!("{}/{name}", picture_dir(class_type, chapter_id));
        self.storage.write_atomic(&rel, bytes).await?;
        Ok(rel)
    }
}

fn chapter_rel_path(file_name: &str) -> String {
    format!("{CHAPTERS_DIR}/{file_name}")
}
