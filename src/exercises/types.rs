use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::shared::models::{ExerciseResult, ProgressStatus};
use crate::core::shared::utils::{format_percentage, format_ratio};
use crate::exercises::scoring::AnswerInput;

pub const MAX_DURATION_SECONDS: i32 = 6 * 60 * 60;

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitExerciseRequest {
    pub answers: Vec<AnswerInput>,
    pub duration_seconds: Option<i32>,
}

impl SubmitExerciseRequest {
    pub fn duration(&self) -> i32 {
        self.duration_seconds.unwrap_or(0).clamp(0, MAX_DURATION_SECONDS)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnswerBreakdown {
    pub question_id: Uuid,
    pub question_content: String,
    pub selected_option_id: Option<Uuid>,
    pub correct_option_id: Option<Uuid>,
    pub is_correct: bool,
    pub points_earned: i32,
    pub points: i32,
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressSnapshot {
    pub status: ProgressStatus,
    pub best_percentage: f64,
    pub attempts: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmissionResponse {
    pub result: ExerciseResult,
    pub percentage_text: String,
    pub ratio_text: String,
    pub passed: bool,
    pub answers: Vec<AnswerBreakdown>,
    pub progress: ProgressSnapshot,
    pub schedules_completed: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResultListQuery {
    pub lesson_id: Option<Uuid>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResultSummary {
    #[serde(flatten)]
    pub result: ExerciseResult,
    pub lesson_title: String,
    pub lesson_type: String,
    pub percentage_text: String,
    pub ratio_text: String,
}

impl ResultSummary {
    pub fn new(result: ExerciseResult, lesson_title: String, lesson_type: String) -> Self {
        Self {
            percentage_text: format_percentage(result.percentage),
            ratio_text: format_ratio(result.correct_count as i64, result.total_questions as i64),
            result,
            lesson_title,
            lesson_type,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResultDetail {
    #[serde(flatten)]
    pub summary: ResultSummary,
    pub answers: Vec<AnswerBreakdown>,
}
