//! Concours (competitive-exam) content: records stored one file per exam
//! theme under `public/concours/<type>/`, indexed by `index.json` two levels
//! deep (type, then year). The index and the files on disk move together.

use std::collections::BTreeMap;

use chrono::{DateTime, Local, SecondsFormat, TimeZone, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::error::{Result, StoreError};
use crate::storage::ProjectStorage;

pub const INDEX_PATH: &str = "public/concours/index.json";

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ConcoursData {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub concours: String,

    #[serde(default)]
    pub annee: String,

    #[serde(default)]
    pub theme: String,

    #[serde(default)]
    pub resume: ConcoursResume,

    #[serde(default)]
    pub quiz: Vec<ConcoursQuestion>,
}

impl ConcoursData {
    /// Import-boundary validation: these four fields locate the record in
    /// the index and on disk.
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.id.is_empty() {
            missing.push("id");
        }
        if self.concours.is_empty() {
            missing.push("concours");
        }
        if self.annee.is_empty() {
            missing.push("annee");
        }
        if self.theme.is_empty() {
            missing.push("theme");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(StoreError::malformed(
                "concours import",
                format!("missing required field(s): {}", missing.join(", ")),
            ))
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ConcoursResume {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub introduction: String,

    #[serde(default)]
    pub sections: Vec<ConcoursResumeSection>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ConcoursResumeSection {
    #[serde(rename = "type", default = "default_section_kind")]
    pub kind: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub items: Vec<String>,
}

fn default_section_kind() -> String {
    "definitions".to_owned()
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ConcoursQuestion {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub theme: String,

    #[serde(default)]
    pub question: String,

    #[serde(rename = "type", default)]
    pub kind: String,

    #[serde(default)]
    pub options: Vec<ConcoursOption>,

    #[serde(default)]
    pub explanation: String,

    #[serde(default)]
    pub hints: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ConcoursOption {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub text: String,

    #[serde(rename = "isCorrect", default, alias = "is_correct")]
    pub is_correct: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ConcoursIndex {
    #[serde(default)]
    pub concours: Vec<ConcoursTypeEntry>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ConcoursTypeEntry {
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub icon: String,

    #[serde(default)]
    pub color: String,

    #[serde(default)]
    pub examens: Vec<ConcoursYear>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ConcoursYear {
    pub annee: String,

    #[serde(default)]
    pub fichiers: Vec<ConcoursFileEntry>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct ConcoursFileEntry {
    pub id: String,

    #[serde(default)]
    pub theme: String,

    #[serde(default)]
    pub file: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(rename = "lastModified", default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConcoursStatistics {
    pub total: usize,
    pub by_type: BTreeMap<String, usize>,
    pub by_year: BTreeMap<String, usize>,
}

impl ConcoursIndex {
    /// The index shipped with a fresh project: the three known exam tracks,
    /// no years yet.
    pub fn with_default_types() -> Self {
        Self {
            concours: vec![
                ConcoursTypeEntry {
                    id: "medecine".to_owned(),
                    name: "Médecine".to_owned(),
                    description: "Préparation au concours de médecine".to_owned(),
                    ..Default::default()
                },
                ConcoursTypeEntry {
                    id: "ensa".to_owned(),
                    name: "ENSA".to_owned(),
                    description:
                        "Préparation au concours de l'École Nationale des Sciences Appliquées"
                            .to_owned(),
                    ..Default::default()
                },
                ConcoursTypeEntry {
                    id: "ensam".to_owned(),
                    name: "ENSAM".to_owned(),
                    description:
                        "Préparation au concours de l'École Nationale Supérieure d'Arts et Métiers"
                            .to_owned(),
                    ..Default::default()
                },
            ],
        }
    }

    pub fn type_entry(&self, concours_type: &str) -> Option<&ConcoursTypeEntry> {
        self.concours.iter().find(|entry| entry.id == concours_type)
    }

    fn type_entry_mut(&mut self, concours_type: &str) -> Option<&mut ConcoursTypeEntry> {
        self.concours
            .iter_mut()
            .find(|entry| entry.id == concours_type)
    }

    pub fn all_files(&self) -> impl Iterator<Item = &ConcoursFileEntry> {
        self.concours
            .iter()
            .flat_map(|entry| &entry.examens)
            .flat_map(|year| &year.fichiers)
    }

    pub fn find_file(&self, id: &str) -> Option<&ConcoursFileEntry> {
        self.all_files().find(|file| file.id == id)
    }

    pub fn files_for_year(&self, concours_type: &str, annee: &str) -> &[ConcoursFileEntry] {
        self.type_entry(concours_type)
            .and_then(|entry| entry.examens.iter().find(|year| year.annee == annee))
            .map(|year| year.fichiers.as_slice())
            .unwrap_or(&[])
    }

    /// Adds or refreshes the index row for a record. The year node is created
    /// on first use and years stay sorted newest-first.
    pub fn upsert(
        &mut self,
        concours_type: &str,
        record: &ConcoursData,
        file_path: &str,
        version: String,
        last_modified: String,
    ) -> Result<ConcoursFileEntry> {
        let type_entry = self
            .type_entry_mut(concours_type)
            .ok_or_else(|| StoreError::not_found("concours type", concours_type))?;

        if !type_entry.examens.iter().any(|year| year.annee == record.annee) {
            type_entry.examens.push(ConcoursYear {
                annee: record.annee.clone(),
                fichiers: Vec::new(),
            });
            type_entry
                .examens
                .sort_by_key(|year| std::cmp::Reverse(year_ordinal(&year.annee)));
        }

        let year = type_entry
            .examens
            .iter_mut()
            .find(|year| year.annee == record.annee)
            .ok_or_else(|| StoreError::not_found("concours year", record.annee.as_str()))?;

        let updated = ConcoursFileEntry {
            id: record.id.clone(),
            theme: record.theme.clone(),
            file: file_path.to_owned(),
            version: Some(version),
            last_modified: Some(last_modified),
        };

        match year.fichiers.iter_mut().find(|file| file.id == record.id) {
            Some(existing) => *existing = updated.clone(),
            None => year.fichiers.push(updated.clone()),
        }

        Ok(updated)
    }

    /// Removes a record from a type; years left without files disappear.
    /// Removing something absent is a no-op.
    pub fn remove(&mut self, concours_type: &str, id: &str) {
        let Some(type_entry) = self.type_entry_mut(concours_type) else {
            return;
        };

        for year in &mut type_entry.examens {
            year.fichiers.retain(|file| file.id != id);
        }
        type_entry.examens.retain(|year| !year.fichiers.is_empty());
    }

    pub fn statistics(&self) -> ConcoursStatistics {
        let mut stats = ConcoursStatistics::default();

        for type_entry in &self.concours {
            let mut type_count = 0;
            for year in &type_entry.examens {
                let count = year.fichiers.len();
                type_count += count;
                stats.total += count;
                *stats.by_year.entry(year.annee.clone()).or_default() += count;
            }
            stats.by_type.insert(type_entry.id.clone(), type_count);
        }

        stats
    }
}

fn year_ordinal(annee: &str) -> i64 {
    annee.parse().unwrap_or(0)
}

pub struct ConcoursStore {
    storage: ProjectStorage,
}

impl ConcoursStore {
    pub fn new(storage: ProjectStorage) -> Self {
        Self { storage }
    }

    /// A missing or unreadable index yields the default one rather than
    /// failing: the editor must be able to open a project that has never
    /// shipped concours content.
    pub async fn load_index(&self) -> ConcoursIndex {
        match self.storage.read_json(INDEX_PATH).await {
            Ok(index) => index,
            Err(err) => {
                warn!("concours index unavailable, starting from defaults: {err}");
                ConcoursIndex::with_default_types()
            }
        }
    }

    pub async fn save_index(&self, index: &ConcoursIndex) -> Result<()> {
        self.storage.write_json(INDEX_PATH, index).await
    }

    /// Writes the record file and returns its public path
    /// (`/concours/<type>/<annee>-<slug>.json`).
    pub async fn save_record(
        &self,
        record: &ConcoursData,
        concours_type: &str,
    ) -> Result<String> {
        let file_name = format!("{}-{}.json", record.annee, slugify(&record.theme));
        let rel = format!("public/concours/{concours_type}/{file_name}");
        self.storage.write_json(&rel, record).await?;
        Ok(format!("/concours/{concours_type}/{file_name}"))
    }

    pub async fn load_record(&self, file_path: &str) -> Result<ConcoursData> {
        self.storage.read_json(&record_rel_path(file_path)).await
    }

    /// Full import: validate, persist the record file, then update and
    /// persist the index.
    pub async fn import(
        &self,
        file_content: &str,
        concours_type: &str,
    ) -> Result<ConcoursFileEntry> {
        let record: ConcoursData = serde_json::from_str(file_content)
            .map_err(|err| StoreError::malformed("concours import", err.to_string()))?;
        record.validate()?;

        let file_path = self.save_record(&record, concours_type).await?;

        let mut index = self.load_index().await;
        let entry = index.upsert(
            concours_type,
            &record,
            &file_path,
            version_stamp(&Local::now()),
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        )?;
        self.save_index(&index).await?;

        Ok(entry)
    }

    pub async fn remove(&self, concours_type: &str, id: &str) -> Result<()> {
        let mut index = self.load_index().await;
        index.remove(concours_type, id);
        self.save_index(&index).await
    }

    pub async fn export(&self, id: &str) -> Result<String> {
        let index = self.load_index().await;
        let entry = index
            .find_file(id)
            .ok_or_else(|| StoreError::not_found("concours", id))?;
        let record = self.load_record(&entry.file).await?;
        Ok(serde_json::to_string_pretty(&record)?)
    }
}

// Index entries carry public paths like "/concours/medecine/2024-algebre.json";
// on disk they live under "public/".
fn record_rel_path(file_path: &str) -> String {
    let trimmed = file_path.trim_start_matches('/');
    let trimmed = trimmed.strip_prefix("concours/").unwrap_or(trimmed);
    format!("public/concours/{trimmed}")
}

/// Lowercased, accents stripped via NFD decomposition, non-alphanumeric runs
/// collapsed to a single dash.
pub fn slugify(text: &str) -> String {
    let folded: String = text
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect();

    let mut out = String::with_capacity(folded.len());
    let mut last_dash = false;
    for c in folded.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
            last_dash = false;
        } else if !last_dash && !out.is_empty() {
            out.push('-');
            last_dash = true;
        }
    }

    out.trim_end_matches('-').to_owned()
}

/// Date-based index version, minute resolution: `v2024.03.28-1415`.
pub fn version_stamp<Tz: TimeZone>(now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!("v{}", now.format("%Y.%m.%d-%H%M"))
}
