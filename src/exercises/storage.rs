use chrono::{DateTime, Utc};
use diesel::prelude::*;
use std::collections::HashMap;
use uuid::Uuid;

use crate::core::middleware::AuthenticatedUser;
use crate::core::shared::models::{ExerciseResult, ProgressStatus, SubmittedAnswer, UserProgress};
use crate::core::shared::schema::{
    answer_options, exercise_results, lessons, questions, submitted_answers, user_progress,
};
use crate::exercises::types::{AnswerBreakdown, ResultDetail, ResultSummary};
use crate::security::error_sanitizer::{ApiError, ApiResult};

/// Creates the caller's progress row for the lesson if missing and locks it
/// for the rest of the transaction. Concurrent submissions for the same user
/// and lesson queue here, so attempt numbers are read one at a time.
pub fn lock_progress(
    conn: &mut PgConnection,
    user_id: Uuid,
    lesson_id: Uuid,
    now: DateTime<Utc>,
) -> ApiResult<UserProgress> {
    let fresh = UserProgress {
        id: Uuid::new_v4(),
        user_id,
        lesson_id,
        status: ProgressStatus::InProgress.as_str().to_string(),
        best_percentage: 0.0,
        last_percentage: 0.0,
        attempts: 0,
        last_activity_at: now,
        completed_at: None,
    };
    diesel::insert_into(user_progress::table)
        .values(&fresh)
        .on_conflict((user_progress::user_id, user_progress::lesson_id))
        .do_nothing()
        .execute(conn)?;

    Ok(user_progress::table
        .filter(user_progress::user_id.eq(user_id))
        .filter(user_progress::lesson_id.eq(lesson_id))
        .select(UserProgress::as_select())
        .for_update()
        .first(conn)?)
}

/// Result with its lesson, visible to the owner or an admin. Anyone else gets
/// the same 404 as for a missing result.
pub fn load_result_for(
    conn: &mut PgConnection,
    result_id: Uuid,
    viewer: &AuthenticatedUser,
) -> ApiResult<ResultSummary> {
    let row: Option<(ExerciseResult, String, String)> = exercise_results::table
        .inner_join(lessons::table)
        .filter(exercise_results::id.eq(result_id))
        .select((ExerciseResult::as_select(), lessons::title, lessons::lesson_type))
        .first(conn)
        .optional()?;

    match row {
        Some((result, title, lesson_type)) if viewer.can_view(result.user_id) => {
            Ok(ResultSummary::new(result, title, lesson_type))
        }
        _ => Err(ApiError::NotFound("Result".to_string())),
    }
}

/// Stored answers of a result in question order, with correct options and
/// explanations.
pub fn load_breakdown(conn: &mut PgConnection, result_id: Uuid) -> ApiResult<Vec<AnswerBreakdown>> {
    let rows: Vec<(SubmittedAnswer, String, Option<String>, i32)> = submitted_answers::table
        .inner_join(questions::table)
        .filter(submitted_answers::result_id.eq(result_id))
        .select((
            SubmittedAnswer::as_select(),
            questions::content,
            questions::explanation,
            questions::points,
        ))
        .order((questions::order_index.asc(), questions::created_at.asc()))
        .load(conn)?;

    let question_ids: Vec<Uuid> = rows.iter().map(|(a, ..)| a.question_id).collect();
    let correct: HashMap<Uuid, Uuid> = answer_options::table
        .filter(answer_options::question_id.eq_any(&question_ids))
        .filter(answer_options::is_correct.eq(true))
        .select((answer_options::question_id, answer_options::id))
        .load::<(Uuid, Uuid)>(conn)?
        .into_iter()
        .collect();

    Ok(rows
        .into_iter()
        .map(|(answer, content, explanation, points)| AnswerBreakdown {
            correct_option_id: correct.get(&answer.question_id).copied(),
            question_id: answer.question_id,
            question_content: content,
            selected_option_id: answer.selected_option_id,
            is_correct: answer.is_correct,
            points_earned: answer.points_earned,
            points,
            explanation,
        })
        .collect())
}

pub fn load_result_detail(
    conn: &mut PgConnection,
    result_id: Uuid,
    viewer: &AuthenticatedUser,
) -> ApiResult<ResultDetail> {
    let summary = load_result_for(conn, result_id, viewer)?;
    let answers = load_breakdown(conn, result_id)?;
    Ok(ResultDetail { summary, answers })
}
