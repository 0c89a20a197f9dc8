use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::core::shared::models::AnswerOption;
use crate::core::shared::models::Question;
use crate::core::shared::utils::percentage;
use crate::security::error_sanitizer::ApiError;

#[derive(Debug, Clone, PartialEq)]
pub struct ScoringQuestion {
    pub id: Uuid,
    pub points: i32,
    pub correct_option_id: Option<Uuid>,
    pub option_ids: Vec<Uuid>,
}

impl ScoringQuestion {
    pub fn from_parts(question: &Question, options: &[AnswerOption]) -> Self {
        Self {
            id: question.id,
            points: question.points,
            correct_option_id: options.iter().find(|o| o.is_correct).map(|o| o.id),
            option_ids: options.iter().map(|o| o.id).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct AnswerInput {
    pub question_id: Uuid,
    pub option_id: Option<Uuid>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredAnswer {
    pub question_id: Uuid,
    pub selected_option_id: Option<Uuid>,
    pub correct_option_id: Option<Uuid>,
    pub is_correct: bool,
    pub points_earned: i32,
    pub points_possible: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoreSummary {
    pub answers: Vec<ScoredAnswer>,
    pub score: i32,
    pub max_score: i32,
    pub correct_count: i32,
    pub total_questions: i32,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionError {
    #[error("Bài học chưa có câu hỏi")]
    NoQuestions,
    #[error("Question {0} was answered more than once")]
    DuplicateQuestion(Uuid),
    #[error("Question {0} does not belong to this lesson")]
    ForeignQuestion(Uuid),
    #[error("Option {option_id} is not an option of question {question_id}")]
    ForeignOption { question_id: Uuid, option_id: Uuid },
    #[error("Lesson point total is too large to score")]
    ScoreOverflow,
}

impl From<SubmissionError> for ApiError {
    fn from(err: SubmissionError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

/// Rejects duplicate answers, answers to questions outside the lesson and
/// options that belong to another question.
pub fn validate_submission(
    questions: &[ScoringQuestion],
    answers: &[AnswerInput],
) -> Result<(), SubmissionError> {
    if questions.is_empty() {
        return Err(SubmissionError::NoQuestions);
    }

    let by_id: HashMap<Uuid, &ScoringQuestion> = questions.iter().map(|q| (q.id, q)).collect();
    let mut seen = HashSet::new();

    for answer in answers {
        if !seen.insert(answer.question_id) {
            return Err(SubmissionError::DuplicateQuestion(answer.question_id));
        }
        let question = by_id
            .get(&answer.question_id)
            .ok_or(SubmissionError::ForeignQuestion(answer.question_id))?;
        if let Some(option_id) = answer.option_id {
            if !question.option_ids.contains(&option_id) {
                return Err(SubmissionError::ForeignOption {
                    question_id: answer.question_id,
                    option_id,
                });
            }
        }
    }

    Ok(())
}

/// Scores every lesson question; unanswered ones count as wrong.
pub fn score_submission(
    questions: &[ScoringQuestion],
    answers: &[AnswerInput],
) -> Result<ScoreSummary, SubmissionError> {
    let selected: HashMap<Uuid, Option<Uuid>> = answers
        .iter()
        .map(|a| (a.question_id, a.option_id))
        .collect();

    let mut scored = Vec::with_capacity(questions.len());
    let mut score: i64 = 0;
    let mut max_score: i64 = 0;
    let mut correct_count = 0;

    for question in questions {
        let selected_option_id = selected.get(&question.id).copied().flatten();
        let is_correct = match (selected_option_id, question.correct_option_id) {
            (Some(chosen), Some(correct)) => chosen == correct,
            _ => false,
        };
        let points_earned = if is_correct { question.points } else { 0 };

        max_score += i64::from(question.points);
        score += i64::from(points_earned);
        if is_correct {
            correct_count += 1;
        }

        scored.push(ScoredAnswer {
            question_id: question.id,
            selected_option_id,
            correct_option_id: question.correct_option_id,
            is_correct,
            points_earned,
            points_possible: question.points,
        });
    }

    let narrow = |total: i64| i32::try_from(total).map_err(|_| SubmissionError::ScoreOverflow);
    Ok(ScoreSummary {
        answers: scored,
        score: narrow(score)?,
        max_score: narrow(max_score)?,
        correct_count,
        total_questions: questions.len() as i32,
        percentage: percentage(score, max_score),
    })
}
