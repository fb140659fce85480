use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::concours::ConcoursData;
use crate::manifest::ManifestEntry;
use crate::raw_data::{RawChapterFile, RawExercise, RawQuizOption, RawQuizQuestion};
use crate::version;

#[derive(Clone, Debug, PartialEq)]
pub struct ChapterData {
    pub id: String,
    pub class_type: String,
    pub file_name: String,
    pub is_active: bool,
    pub version: String,

    pub chapter_name: String,
    pub session_dates: Vec<String>,
    pub lesson_file: Option<String>,
    pub videos: Vec<Video>,
    pub quiz_questions: Vec<QuizQuestion>,
    pub exercises: Vec<Exercise>,
    pub concours: Vec<ConcoursData>,
}

impl ChapterData {
    /// Builds the in-memory chapter from a parsed file merged with its
    /// manifest entry. The file wins for content, the manifest for identity;
    /// a file without a version falls back to the manifest's.
    pub fn from_file(raw: RawChapterFile, entry: &ManifestEntry, class_type: &str) -> Self {
        let mut session_dates = raw.session_dates;
        session_dates.sort();

        let version = if raw.version.is_empty() {
            entry.version.clone()
        } else {
            raw.version
        };
        let chapter_name = if raw.chapter.is_empty() {
            chapter_name_from_file(&entry.file)
        } else {
            raw.chapter
        };

        Self {
            id: entry.id.clone(),
            class_type: class_type.to_lowercase(),
            file_name: entry.file.clone(),
            is_active: entry.is_active,
            version,
            chapter_name,
            session_dates,
            lesson_file: raw.lesson_file.filter(|path| !path.is_empty()),
            videos: raw.videos,
            quiz_questions: raw.quiz.into_iter().map(Into::into).collect(),
            exercises: raw.exercises.into_iter().map(Into::into).collect(),
            concours: raw.concours,
        }
    }

    /// Serializable file form. Exercise hints are rebuilt from the
    /// sub-question hints here; blank hints are dropped.
    pub fn to_file(&self) -> RawChapterFile {
        RawChapterFile {
            class: self.class_type.clone(),
            chapter: self.chapter_name.clone(),
            session_dates: self.session_dates.clone(),
            lesson_file: self.lesson_file.clone(),
            videos: self.videos.clone(),
            quiz: self
                .quiz_questions
                .iter()
                .cloned()
                .map(Into::into)
                .collect(),
            exercises: self.exercises.iter().cloned().map(Into::into).collect(),
            concours: self.concours.clone(),
            version: self.version.clone(),
        }
    }

    pub fn content_version(&self) -> crate::Result<String> {
        version::content_fingerprint(&self.to_file())
    }

    pub fn is_dirty(&self) -> crate::Result<bool> {
        Ok(self.content_version()? != self.version)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Video {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub title: String,

    #[serde(rename = "youtubeId", default)]
    pub youtube_id: String,

    #[serde(default)]
    pub duration: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub thumbnail: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum QuestionKind {
    #[default]
    Mcq,
    Ordering,
}

impl QuestionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mcq => "mcq",
            Self::Ordering => "ordering",
        }
    }

    fn parse(kind: &str) -> Self {
        match kind {
            "ordering" => Self::Ordering,
            _ => Self::Mcq,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct QuizQuestion {
    pub id: String,
    pub question: String,
    pub kind: QuestionKind,
    pub options: Vec<QuizOption>,
    pub steps: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct QuizOption {
    pub text: String,
    pub is_correct: bool,
    pub explanation: Option<String>,
}

impl From<RawQuizQuestion> for QuizQuestion {
    fn from(raw: RawQuizQuestion) -> Self {
        let mut options: Vec<QuizOption> = raw.options.into_iter().map(Into::into).collect();

        // Older files keep the explanation at the question level; move it
        // onto the correct option so there is a single representation.
        if let Some(explanation) = raw.explanation.filter(|text| !text.is_empty()) {
            if let Some(correct) = options.iter_mut().find(|option| option.is_correct) {
                if correct.explanation.is_none() {
                    correct.explanation = Some(explanation);
                }
            }
        }

        let id = if raw.id.is_empty() {
            derived_id("q_", &raw.question)
        } else {
            raw.id
        };

        Self {
            id,
            question: raw.question,
            kind: QuestionKind::parse(&raw.kind),
            options,
            steps: raw.steps,
        }
    }
}

impl From<RawQuizOption> for QuizOption {
    fn from(raw: RawQuizOption) -> Self {
        Self {
            text: raw.text,
            is_correct: raw.is_correct,
            explanation: raw.explanation.filter(|text| !text.is_empty()),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Exercise {
    pub id: String,
    pub title: String,
    pub statement: String,
    pub sub_questions: Vec<SubQuestion>,
    pub images: Vec<ExerciseImage>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SubQuestion {
    pub text: String,
    pub question_number: String,
    pub sub_sub_questions: Vec<SubSubQuestion>,
    pub hint: Option<String>,
    pub images: Vec<ExerciseImage>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct SubSubQuestion {
    #[serde(default)]
    pub text: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ExerciseImage {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub path: String,

    #[serde(default)]
    pub caption: String,

    #[serde(default = "default_image_size")]
    pub size: String,

    #[serde(default, alias = "customWidth", skip_serializing_if = "Option::is_none")]
    pub custom_width: Option<u32>,

    #[serde(default, alias = "customHeight", skip_serializing_if = "Option::is_none")]
    pub custom_height: Option<u32>,

    #[serde(default = "default_image_position")]
    pub position: String,

    #[serde(default = "default_image_alignment")]
    pub alignment: String,

    #[serde(default)]
    pub alt: String,
}

impl Default for ExerciseImage {
    fn default() -> Self {
        Self {
            id: String::new(),
            path: String::new(),
            caption: String::new(),
            size: default_image_size(),
            custom_width: None,
            custom_height: None,
            position: default_image_position(),
            alignment: default_image_alignment(),
            alt: String::new(),
        }
    }
}

fn default_image_size() -> String {
    "medium".to_owned()
}

fn default_image_position() -> String {
    "center".to_owned()
}

fn default_image_alignment() -> String {
    "center".to_owned()
}

impl From<RawExercise> for Exercise {
    fn from(raw: RawExercise) -> Self {
        // Hints are stored denormalized at the exercise level, keyed by
        // question number; resolve them into their sub-questions.
        let hints: BTreeMap<&str, &str> = raw
            .hint
            .iter()
            .filter(|hint| !hint.question_number.is_empty() && !hint.text.is_empty())
            .map(|hint| (hint.question_number.as_str(), hint.text.as_str()))
            .collect();

        let sub_questions = raw
            .sub_questions
            .into_iter()
            .enumerate()
            .map(|(index, sub)| {
                let question_number = sub
                    .question_number
                    .filter(|number| !number.is_empty())
                    .unwrap_or_else(|| (index + 1).to_string());
                let hint = hints.get(question_number.as_str()).map(|text| (*text).to_owned());

                SubQuestion {
                    text: sub.text,
                    question_number,
                    sub_sub_questions: sub.sub_sub_questions,
                    hint,
                    images: sub.images,
                }
            })
            .collect();

        let id = if raw.id.is_empty() {
            derived_id("exo_", &raw.title)
        } else {
            raw.id
        };

        Self {
            id,
            title: raw.title,
            statement: raw.statement,
            sub_questions,
            images: raw.images,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Violation {
    OptionCount { count: usize },
    CorrectCount { count: usize },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OptionCount { count } => write!(f, "question has {count} option(s)"),
            Self::CorrectCount { count } => write!(f, "question has {count} correct option(s)"),
        }
    }
}

/// Boundary validation for the editors. Nothing here is enforced by the data
/// model itself; callers decide what to do with the violations.
pub fn validate_question(question: &QuizQuestion) -> Vec<Violation> {
    if question.kind != QuestionKind::Mcq {
        return Vec::new();
    }

    let mut violations = Vec::new();

    let option_count = question.options.len();
    if !(2..=5).contains(&option_count) {
        violations.push(Violation::OptionCount {
            count: option_count,
        });
    }

    let correct_count = question
        .options
        .iter()
        .filter(|option| option.is_correct)
        .count();
    if correct_count != 1 {
        violations.push(Violation::CorrectCount {
            count: correct_count,
        });
    }

    violations
}

// Entries missing an id get one derived from their own text. Random ids
// would change the content fingerprint on every load.
fn derived_id(prefix: &str, seed: &str) -> String {
    let digest = blake3::hash(seed.as_bytes());
    format!("{prefix}{}", &digest.to_hex().as_str()[..8])
}

fn chapter_name_from_file(file_name: &str) -> String {
    let base = file_name.rsplit('/').next().unwrap_or(file_name);
    let stem = base.strip_suffix(".json").unwrap_or(base);
    let without_prefix = match stem.split_once('_') {
        Some((_, rest)) if !rest.is_empty() => rest,
        _ => stem,
    };

    without_prefix
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
