use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use diesel::dsl::max;
use diesel::prelude::*;
use log::info;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::middleware::{ApiJson, AuthenticatedUser};
use crate::core::shared::models::{ApiResponse, ExerciseResult, Pagination, SubmittedAnswer};
use crate::core::shared::schema::{exercise_results, lessons, study_schedules, submitted_answers, user_progress};
use crate::core::shared::state::AppState;
use crate::core::shared::utils::{format_percentage, format_ratio, with_conn};
use crate::exercises::scoring::{score_submission, validate_submission, ScoringQuestion};
use crate::exercises::storage::{load_result_detail, lock_progress};
use crate::exercises::types::{
    AnswerBreakdown, ProgressSnapshot, ResultDetail, ResultListQuery, ResultSummary,
    SubmissionResponse, SubmitExerciseRequest,
};
use crate::lessons::storage::{ensure_unlocked, load_questions_with_options, load_visible_lesson, QuestionScope};
use crate::progress::tracker::apply_attempt;
use crate::security::error_sanitizer::{ApiError, ApiResult};

pub async fn handle_submit_exercise(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(lesson_id): Path<Uuid>,
    ApiJson(req): ApiJson<SubmitExerciseRequest>,
) -> ApiResult<Json<ApiResponse<SubmissionResponse>>> {
    let user_id = user.user_id;
    let role = Some(user.role);
    let pass_percentage = state.pass_percentage();
    let duration = req.duration();

    let response = with_conn(&state.conn, move |conn| {
        conn.transaction::<_, ApiError, _>(|conn| {
            let lesson = load_visible_lesson(conn, lesson_id, role)?;
            ensure_unlocked(&lesson, role)?;

            let questions = load_questions_with_options(conn, QuestionScope::Lesson(lesson_id))?;
            let scoring: Vec<ScoringQuestion> = questions
                .iter()
                .map(|(q, options)| ScoringQuestion::from_parts(q, options))
                .collect();
            validate_submission(&scoring, &req.answers)?;
            let summary = score_submission(&scoring, &req.answers)?;

            let now = Utc::now();
            let progress = lock_progress(conn, user_id, lesson_id, now)?;
            let previous_attempt: Option<i32> = exercise_results::table
                .filter(exercise_results::user_id.eq(user_id))
                .filter(exercise_results::lesson_id.eq(lesson_id))
                .select(max(exercise_results::attempt_number))
                .first(conn)?;

            let result = ExerciseResult {
                id: Uuid::new_v4(),
                user_id,
                lesson_id,
                score: summary.score,
                max_score: summary.max_score,
                correct_count: summary.correct_count,
                total_questions: summary.total_questions,
                percentage: summary.percentage,
                attempt_number: previous_attempt.unwrap_or(0) + 1,
                duration_seconds: duration,
                submitted_at: now,
            };
            diesel::insert_into(exercise_results::table)
                .values(&result)
                .execute(conn)?;

            let answer_rows: Vec<SubmittedAnswer> = summary
                .answers
                .iter()
                .map(|a| SubmittedAnswer {
                    id: Uuid::new_v4(),
                    result_id: result.id,
                    question_id: a.question_id,
                    selected_option_id: a.selected_option_id,
                    is_correct: a.is_correct,
                    points_earned: a.points_earned,
                })
                .collect();
            diesel::insert_into(submitted_answers::table)
                .values(&answer_rows)
                .execute(conn)?;

            let update = apply_attempt(Some(&progress), summary.percentage, pass_percentage, now);
            diesel::update(user_progress::table.find(progress.id))
                .set((
                    user_progress::status.eq(update.status.as_str()),
                    user_progress::best_percentage.eq(update.best_percentage),
                    user_progress::last_percentage.eq(update.last_percentage),
                    user_progress::attempts.eq(update.attempts),
                    user_progress::last_activity_at.eq(now),
                    user_progress::completed_at.eq(update.completed_at),
                ))
                .execute(conn)?;

            let schedules_completed = diesel::update(
                study_schedules::table
                    .filter(study_schedules::user_id.eq(user_id))
                    .filter(study_schedules::lesson_id.eq(lesson_id))
                    .filter(study_schedules::is_completed.eq(false))
                    .filter(study_schedules::scheduled_date.le(now.date_naive())),
            )
            .set((
                study_schedules::is_completed.eq(true),
                study_schedules::completed_at.eq(Some(now)),
            ))
            .execute(conn)?;

            let explanations: HashMap<Uuid, (String, Option<String>, i32)> = questions
                .into_iter()
                .map(|(q, _)| (q.id, (q.content, q.explanation, q.points)))
                .collect();
            let answers = summary
                .answers
                .iter()
                .map(|a| {
                    let (content, explanation, points) = explanations
                        .get(&a.question_id)
                        .cloned()
                        .unwrap_or_else(|| (String::new(), None, a.points_possible));
                    AnswerBreakdown {
                        question_id: a.question_id,
                        question_content: content,
                        selected_option_id: a.selected_option_id,
                        correct_option_id: a.correct_option_id,
                        is_correct: a.is_correct,
                        points_earned: a.points_earned,
                        points,
                        explanation,
                    }
                })
                .collect();

            Ok(SubmissionResponse {
                percentage_text: format_percentage(result.percentage),
                ratio_text: format_ratio(result.correct_count as i64, result.total_questions as i64),
                passed: result.percentage >= pass_percentage,
                answers,
                progress: ProgressSnapshot {
                    status: update.status,
                    best_percentage: update.best_percentage,
                    attempts: update.attempts,
                },
                schedules_completed,
                result,
            })
        })
    })
    .await?;

    info!(
        "User {} submitted lesson {} (attempt {}, {})",
        user_id, lesson_id, response.result.attempt_number, response.percentage_text
    );
    Ok(ApiResponse::ok(response))
}

pub async fn handle_list_results(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Query(query): Query<ResultListQuery>,
) -> ApiResult<Json<ApiResponse<Vec<ResultSummary>>>> {
    let user_id = user.user_id;
    let page = Pagination {
        limit: query.limit,
        offset: query.offset,
    };

    let results = with_conn(&state.conn, move |conn| {
        let mut db_query = exercise_results::table
            .inner_join(lessons::table)
            .filter(exercise_results::user_id.eq(user_id))
            .into_boxed();
        if let Some(lesson_id) = query.lesson_id {
            db_query = db_query.filter(exercise_results::lesson_id.eq(lesson_id));
        }

        let rows: Vec<(ExerciseResult, String, String)> = db_query
            .select((ExerciseResult::as_select(), lessons::title, lessons::lesson_type))
            .order(exercise_results::submitted_at.desc())
            .limit(page.limit())
            .offset(page.offset())
            .load(conn)?;

        Ok(rows
            .into_iter()
            .map(|(result, title, lesson_type)| ResultSummary::new(result, title, lesson_type))
            .collect::<Vec<_>>())
    })
    .await?;

    Ok(ApiResponse::ok(results))
}

pub async fn handle_get_result(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(result_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<ResultDetail>>> {
    let detail = with_conn(&state.conn, move |conn| load_result_detail(conn, result_id, &user)).await?;

    Ok(ApiResponse::ok(detail))
}
