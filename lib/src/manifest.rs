use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ManifestEntry {
    pub id: String,

    pub file: String,

    #[serde(rename = "isActive", default)]
    pub is_active: bool,

    #[serde(default)]
    pub version: String,
}

/// Canonical identity of a chapter. Historically the editors address
/// chapters either by bare id or by `classType:id`; this key is the single
/// internal form both resolve to.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChapterKey {
    pub class_type: String,
    pub id: String,
}

impl ChapterKey {
    pub fn new(class_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            class_type: class_type.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for ChapterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.class_type, self.id)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ManifestPatch {
    pub file: Option<String>,
    pub is_active: Option<bool>,
    pub version: Option<String>,
}

/// The durable index of all chapters per class level: `manifest.json` is one
/// object keyed by class type, each value an ordered entry list.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(transparent)]
pub struct Manifest {
    pub classes: BTreeMap<String, Vec<ManifestEntry>>,
}

impl Manifest {
    pub fn entry(&self, key: &ChapterKey) -> Option<&ManifestEntry> {
        self.classes
            .get(&key.class_type)?
            .iter()
            .find(|entry| entry.id == key.id)
    }

    pub fn entry_mut(&mut self, key: &ChapterKey) -> Option<&mut ManifestEntry> {
        self.classes
            .get_mut(&key.class_type)?
            .iter_mut()
            .find(|entry| entry.id == key.id)
    }

    pub fn add_entry(&mut self, class_type: &str, entry: ManifestEntry) -> Result<()> {
        let entries = self.classes.entry(class_type.to_owned()).or_default();
        if entries.iter().any(|existing| existing.id == entry.id) {
            return Err(StoreError::DuplicateId {
                class_type: class_type.to_owned(),
                id: entry.id,
            });
        }

        entries.push(entry);
        Ok(())
    }

    /// Updates an entry matched by bare id or by `classType:id`.
    pub fn update_entry(&mut self, class_type: &str, id: &str, patch: ManifestPatch) -> Result<()> {
        let entries = self
            .classes
            .get_mut(class_type)
            .ok_or_else(|| StoreError::not_found("manifest entry", id))?;
        let entry = entries
            .iter_mut()
            .find(|entry| matches_candidate(class_type, &entry.id, id))
            .ok_or_else(|| StoreError::not_found("manifest entry", id))?;

        if let Some(file) = patch.file {
            entry.file = file;
        }
        if let Some(is_active) = patch.is_active {
            entry.is_active = is_active;
        }
        if let Some(version) = patch.version {
            entry.version = version;
        }

        Ok(())
    }

    /// Removing an absent entry is a no-op. The class key stays even when its
    /// list becomes empty; the manifest enumerates every class level.
    pub fn remove_entry(&mut self, class_type: &str, id: &str) {
        if let Some(entries) = self.classes.get_mut(class_type) {
            entries.retain(|entry| !matches_candidate(class_type, &entry.id, id));
        }
    }

    /// Resolves a candidate that may be a bare id or a `classType:id`
    /// composite, scanning every class. First match wins.
    pub fn find_by_any_id(&self, candidate: &str) -> Option<(&str, &ManifestEntry)> {
        self.classes.iter().find_map(|(class_type, entries)| {
            entries
                .iter()
                .find(|entry| matches_candidate(class_type, &entry.id, candidate))
                .map(|entry| (class_type.as_str(), entry))
        })
    }

    pub fn len(&self) -> usize {
        self.classes.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.values().all(Vec::is_empty)
    }
}

fn matches_candidate(class_type: &str, entry_id: &str, candidate: &str) -> bool {
    if entry_id == candidate {
        return true;
    }

    match candidate.split_once(':') {
        Some((class, id)) => class == class_type && id == entry_id,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str) -> ManifestEntry {
        ManifestEntry {
            id: id.to_owned(),
            file: format!("{id}.json"),
            is_active: false,
            version: "v000".to_owned(),
        }
    }

    fn manifest_with(class_type: &str, ids: &[&str]) -> Manifest {
        let mut manifest = Manifest::default();
        for id in ids {
            manifest
                .add_entry(class_type, entry(id))
                .expect("add entry");
        }
        manifest
    }

    #[test]
    fn add_rejects_duplicate_id_within_class() {
        let mut manifest = manifest_with("tcs", &["ch1"]);

        let err = manifest.add_entry("tcs", entry("ch1")).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateId { .. }));

        // Same id in another class is fine.
        manifest.add_entry("1bsm", entry("ch1")).expect("add entry");
    }

    #[test]
    fn find_by_any_id_resolves_bare_and_composite() {
        let manifest = manifest_with("1bsm", &["ch1"]);

        let (class_a, bare) = manifest.find_by_any_id("ch1").expect("bare id");
        let (class_b, composite) = manifest.find_by_any_id("1bsm:ch1").expect("composite id");

        assert_eq!(class_a, "1bsm");
        assert_eq!(class_b, "1bsm");
        assert_eq!(bare, composite);
        assert!(manifest.find_by_any_id("2bse:ch1").is_none());
        assert!(manifest.find_by_any_id("ch2").is_none());
    }

    #[test]
    fn update_patches_only_given_fields() {
        let mut manifest = manifest_with("tcs", &["ch1"]);

        manifest
            .update_entry(
                "tcs",
                "tcs:ch1",
                ManifestPatch {
                    version: Some("v111".to_owned()),
                    ..Default::default()
                },
            )
            .expect("update");

        let entry = manifest
            .entry(&ChapterKey::new("tcs", "ch1"))
            .expect("entry");
        assert_eq!(entry.version, "v111");
        assert_eq!(entry.file, "ch1.json");

        let err = manifest
            .update_entry("tcs", "missing", ManifestPatch::default())
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn remove_is_idempotent() {
        let mut manifest = manifest_with("tcs", &["ch1", "ch2"]);

        manifest.remove_entry("tcs", "ch1");
        manifest.remove_entry("tcs", "ch1");
        manifest.remove_entry("2bse", "ch1");

        assert_eq!(manifest.len(), 1);
        assert!(manifest.entry(&ChapterKey::new("tcs", "ch2")).is_some());
        assert!(manifest.classes.contains_key("tcs"));
    }

    #[test]
    fn manifest_round_trips_on_disk_shape() {
        let json = r#"{"tcs":[{"id":"ch1","file":"tcs_a.json","isActive":true,"version":"v1"}]}"#;
        let manifest: Manifest = serde_json::from_str(json).expect("parse manifest");
        assert!(manifest.classes["tcs"][0].is_active);

        let out = serde_json::to_string(&manifest).expect("serialize manifest");
        assert_eq!(out, json);
    }
}
