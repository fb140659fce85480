//! On-disk shapes for chapter files. Key names must match the JSON already
//! written by the editors, so every rename here is load-bearing.

use serde::{Deserialize, Serialize};

use crate::concours::ConcoursData;
use crate::data::{
    Exercise, ExerciseImage, QuizOption, QuizQuestion, SubQuestion, SubSubQuestion, Video,
};

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct RawChapterFile {
    #[serde(default)]
    pub class: String,

    #[serde(default)]
    pub chapter: String,

    #[serde(rename = "sessionDates", default)]
    pub session_dates: Vec<String>,

    #[serde(rename = "lessonFile", default, skip_serializing_if = "Option::is_none")]
    pub lesson_file: Option<String>,

    #[serde(default)]
    pub videos: Vec<Video>,

    #[serde(default)]
    pub quiz: Vec<RawQuizQuestion>,

    #[serde(default)]
    pub exercises: Vec<RawExercise>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub concours: Vec<ConcoursData>,

    #[serde(default)]
    pub version: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct RawQuizQuestion {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub question: String,

    #[serde(rename = "type", default)]
    pub kind: String,

    #[serde(default)]
    pub options: Vec<RawQuizOption>,

    #[serde(default)]
    pub steps: Vec<String>,

    // Legacy files carry the explanation at the question level; it is lifted
    // onto the correct option at load and never written back here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct RawQuizOption {
    #[serde(default)]
    pub text: String,

    // One front-end variant wrote camelCase, the other snake_case.
    #[serde(default, alias = "isCorrect")]
    pub is_correct: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct RawExercise {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub statement: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<ExerciseImage>,

    #[serde(default)]
    pub sub_questions: Vec<RawSubQuestion>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hint: Vec<RawHint>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct RawSubQuestion {
    #[serde(default)]
    pub text: String,

    #[serde(
        rename = "questionNumber",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub question_number: Option<String>,

    #[serde(default)]
    pub sub_sub_questions: Vec<SubSubQuestion>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<ExerciseImage>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct RawHint {
    #[serde(default)]
    pub text: String,

    #[serde(rename = "questionNumber", default)]
    pub question_number: String,
}

impl From<QuizQuestion> for RawQuizQuestion {
    fn from(question: QuizQuestion) -> Self {
        Self {
            id: question.id,
            question: question.question,
            kind: question.kind.as_str().to_owned(),
            options: question.options.into_iter().map(Into::into).collect(),
            steps: question.steps,
            explanation: None,
        }
    }
}

impl From<QuizOption> for RawQuizOption {
    fn from(option: QuizOption) -> Self {
        Self {
            text: option.text,
            is_correct: option.is_correct,
            explanation: option.explanation,
        }
    }
}

impl From<Exercise> for RawExercise {
    fn from(exercise: Exercise) -> Self {
        let hint = exercise
            .sub_questions
            .iter()
            .filter_map(|sub| {
                let text = sub.hint.as_deref().map(str::trim).filter(|t| !t.is_empty())?;
                Some(RawHint {
                    text: text.to_owned(),
                    question_number: sub.question_number.clone(),
                })
            })
            .collect();

        Self {
            id: exercise.id,
            title: exercise.title,
            statement: exercise.statement,
            images: exercise.images,
            sub_questions: exercise.sub_questions.into_iter().map(Into::into).collect(),
            hint,
        }
    }
}

impl From<SubQuestion> for RawSubQuestion {
    fn from(sub: SubQuestion) -> Self {
        Self {
            text: sub.text,
            question_number: Some(sub.question_number),
            sub_sub_questions: sub.sub_sub_questions,
            images: sub.images,
        }
    }
}
