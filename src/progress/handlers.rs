use axum::{extract::State, Json};
use chrono::Utc;
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::middleware::AuthenticatedUser;
use crate::core::shared::models::{ApiResponse, ProgressStatus, UserProgress};
use crate::core::shared::schema::{exercise_results, lessons, user_progress};
use crate::core::shared::state::AppState;
use crate::core::shared::utils::{format_percentage, with_conn};
use crate::progress::types::{build_dashboard, Dashboard, LessonCounts, ProgressEntry, ResultFact};
use crate::security::error_sanitizer::ApiResult;

type ResultRow = (
    Uuid,
    Uuid,
    f64,
    i32,
    i32,
    i32,
    chrono::DateTime<Utc>,
    String,
    String,
);

/// Every graded attempt of the user joined with its lesson.
pub fn load_result_facts(conn: &mut PgConnection, user_id: Uuid) -> QueryResult<Vec<ResultFact>> {
    let rows: Vec<ResultRow> = exercise_results::table
        .inner_join(lessons::table)
        .filter(exercise_results::user_id.eq(user_id))
        .select((
            exercise_results::id,
            exercise_results::lesson_id,
            exercise_results::percentage,
            exercise_results::correct_count,
            exercise_results::total_questions,
            exercise_results::duration_seconds,
            exercise_results::submitted_at,
            lessons::title,
            lessons::lesson_type,
        ))
        .order(exercise_results::submitted_at.desc())
        .load(conn)?;

    Ok(rows
        .into_iter()
        .map(
            |(result_id, lesson_id, percentage, correct, total, duration, submitted_at, title, lesson_type)| {
                ResultFact {
                    result_id,
                    lesson_id,
                    lesson_title: title,
                    lesson_type,
                    percentage,
                    correct_count: correct,
                    total_questions: total,
                    duration_seconds: duration,
                    submitted_at,
                }
            },
        )
        .collect())
}

fn count_with_status(conn: &mut PgConnection, user_id: Uuid, status: ProgressStatus) -> QueryResult<i64> {
    user_progress::table
        .filter(user_progress::user_id.eq(user_id))
        .filter(user_progress::status.eq(status.as_str()))
        .count()
        .get_result(conn)
}

pub async fn handle_list_progress(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
) -> ApiResult<Json<ApiResponse<Vec<ProgressEntry>>>> {
    let user_id = user.user_id;

    let entries = with_conn(&state.conn, move |conn| {
        let rows: Vec<(UserProgress, String, String)> = user_progress::table
            .inner_join(lessons::table)
            .filter(user_progress::user_id.eq(user_id))
            .select((UserProgress::as_select(), lessons::title, lessons::lesson_type))
            .order(user_progress::last_activity_at.desc())
            .load(conn)?;

        Ok(rows
            .into_iter()
            .map(|(progress, lesson_title, lesson_type)| ProgressEntry {
                best_percentage_text: format_percentage(progress.best_percentage),
                progress,
                lesson_title,
                lesson_type,
            })
            .collect::<Vec<_>>())
    })
    .await?;

    Ok(ApiResponse::ok(entries))
}

pub async fn handle_dashboard(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
) -> ApiResult<Json<ApiResponse<Dashboard>>> {
    let user_id = user.user_id;

    let dashboard = with_conn(&state.conn, move |conn| {
        let facts = load_result_facts(conn, user_id)?;
        let counts = LessonCounts {
            completed: count_with_status(conn, user_id, ProgressStatus::Completed)?,
            in_progress: count_with_status(conn, user_id, ProgressStatus::InProgress)?,
            total_published: lessons::table
                .filter(lessons::is_published.eq(true))
                .count()
                .get_result(conn)?,
        };
        Ok(build_dashboard(&facts, counts, Utc::now().date_naive()))
    })
    .await?;

    Ok(ApiResponse::ok(dashboard))
}
