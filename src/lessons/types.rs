use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use crate::core::shared::models::enums::{LessonType, LEVELS};
use crate::core::shared::models::{AnswerOption, Lesson, ListeningPassage, Question, ReadingPassage};
use crate::security::validation::{ValidationError, Validator};

pub const MIN_OPTIONS: usize = 2;
pub const MAX_OPTIONS: usize = 4;
pub const OPTION_LABELS: [&str; 4] = ["A", "B", "C", "D"];
pub const MAX_QUESTION_POINTS: i32 = 100;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LessonListQuery {
    pub lesson_type: Option<String>,
    pub toeic_part: Option<i32>,
    pub level: Option<String>,
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LessonSummary {
    #[serde(flatten)]
    pub lesson: Lesson,
    pub is_locked: bool,
}

/// Option as shown to a learner; the correct flag stays on the server.
#[derive(Debug, Clone, Serialize)]
pub struct OptionView {
    pub id: Uuid,
    pub label: String,
    pub content: String,
}

impl From<AnswerOption> for OptionView {
    fn from(option: AnswerOption) -> Self {
        Self {
            id: option.id,
            label: option.label,
            content: option.content,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    pub id: Uuid,
    pub reading_passage_id: Option<Uuid>,
    pub listening_passage_id: Option<Uuid>,
    pub content: String,
    pub points: i32,
    pub order_index: i32,
    pub options: Vec<OptionView>,
}

impl QuestionView {
    pub fn new(question: Question, options: Vec<AnswerOption>) -> Self {
        Self {
            id: question.id,
            reading_passage_id: question.reading_passage_id,
            listening_passage_id: question.listening_passage_id,
            content: question.content,
            points: question.points,
            order_index: question.order_index,
            options: options.into_iter().map(OptionView::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LessonDetail {
    pub lesson: Lesson,
    pub reading_passages: Vec<ReadingPassage>,
    pub listening_passages: Vec<ListeningPassage>,
    pub questions: Vec<QuestionView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PassageDetail<P> {
    pub lesson_id: Uuid,
    pub passage: P,
    pub questions: Vec<QuestionView>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateLessonRequest {
    pub title: String,
    pub description: Option<String>,
    pub lesson_type: String,
    pub toeic_part: Option<i32>,
    pub level: Option<String>,
    pub order_index: Option<i32>,
    pub duration_minutes: Option<i32>,
    pub is_premium: Option<bool>,
    pub is_published: Option<bool>,
}

impl CreateLessonRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        Validator::new()
            .required(&self.title, "title")
            .length(self.title.trim(), "title", None, Some(200))
            .one_of(Some(self.lesson_type.as_str()), "lesson_type", &LessonType::ALL)
            .one_of(self.level.as_deref(), "level", &LEVELS)
            .check(
                self.toeic_part.map_or(true, |p| (1..=7).contains(&p)),
                "toeic_part",
                "must be between 1 and 7",
            )
            .check(
                self.duration_minutes.map_or(true, |d| d > 0),
                "duration_minutes",
                "must be positive",
            )
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateReadingRequest {
    pub title: String,
    pub content: String,
    pub order_index: Option<i32>,
}

impl CreateReadingRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        Validator::new()
            .required(&self.title, "title")
            .required(&self.content, "content")
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateListeningRequest {
    pub title: String,
    pub audio_url: String,
    pub transcript: Option<String>,
    pub image_url: Option<String>,
    pub order_index: Option<i32>,
}

impl CreateListeningRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        Validator::new()
            .required(&self.title, "title")
            .required(&self.audio_url, "audio_url")
            .optional_url(Some(self.audio_url.as_str()))
            .optional_url(self.image_url.as_deref())
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewOptionInput {
    pub label: String,
    pub content: String,
    #[serde(default)]
    pub is_correct: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateQuestionRequest {
    pub content: String,
    pub explanation: Option<String>,
    pub points: Option<i32>,
    pub order_index: Option<i32>,
    pub reading_passage_id: Option<Uuid>,
    pub listening_passage_id: Option<Uuid>,
    pub options: Vec<NewOptionInput>,
}

impl CreateQuestionRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        Validator::new()
            .required(&self.content, "content")
            .check(
                self.points
                    .map_or(true, |p| (1..=MAX_QUESTION_POINTS).contains(&p)),
                "points",
                "must be between 1 and 100",
            )
            .check(
                !(self.reading_passage_id.is_some() && self.listening_passage_id.is_some()),
                "passage",
                "a question belongs to at most one passage",
            )
            .finish()?;
        validate_options(&self.options)
    }
}

/// 2 to 4 options, labels A-D without repeats, exactly one correct.
pub fn validate_options(options: &[NewOptionInput]) -> Result<(), ValidationError> {
    if !(MIN_OPTIONS..=MAX_OPTIONS).contains(&options.len()) {
        return Err(ValidationError::InvalidValue {
            field: "options".to_string(),
            message: format!("must contain {MIN_OPTIONS} to {MAX_OPTIONS} options"),
        });
    }

    let mut labels = HashSet::new();
    for option in options {
        let label = option.label.trim().to_uppercase();
        if !OPTION_LABELS.contains(&label.as_str()) {
            return Err(ValidationError::InvalidValue {
                field: "options.label".to_string(),
                message: format!("'{}' is not one of A, B, C, D", option.label),
            });
        }
        if !labels.insert(label) {
            return Err(ValidationError::InvalidValue {
                field: "options.label".to_string(),
                message: format!("duplicate label '{}'", option.label),
            });
        }
        if option.content.trim().is_empty() {
            return Err(ValidationError::Required("options.content".to_string()));
        }
    }

    let correct = options.iter().filter(|o| o.is_correct).count();
    if correct != 1 {
        return Err(ValidationError::InvalidValue {
            field: "options".to_string(),
            message: format!("exactly one option must be correct, found {correct}"),
        });
    }

    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedQuestion {
    pub question: Question,
    pub options: Vec<AnswerOption>,
}
