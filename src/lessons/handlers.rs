use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use diesel::prelude::*;
use log::info;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::middleware::{AdminUser, ApiJson, AuthenticatedUser, OptionalUser};
use crate::core::shared::models::{
    AnswerOption, ApiResponse, Lesson, ListeningPassage, Pagination, Question, ReadingPassage,
};
use crate::core::shared::schema::{answer_options, lessons, listening_passages, questions, reading_passages};
use crate::core::shared::state::AppState;
use crate::core::shared::utils::{contains_pattern, with_conn};
use crate::lessons::storage::{
    ensure_unlocked, load_lesson_exists, load_questions_with_options, load_visible_lesson,
    QuestionScope,
};
use crate::lessons::types::{
    CreateLessonRequest, CreateListeningRequest, CreateQuestionRequest, CreateReadingRequest,
    CreatedQuestion, LessonDetail, LessonListQuery, LessonSummary, PassageDetail, QuestionView,
};
use crate::security::error_sanitizer::{ApiError, ApiResult};

type Created<T> = (StatusCode, Json<ApiResponse<T>>);

pub async fn handle_list_lessons(
    State(state): State<Arc<AppState>>,
    caller: OptionalUser,
    Query(query): Query<LessonListQuery>,
) -> ApiResult<Json<ApiResponse<Vec<LessonSummary>>>> {
    let role = caller.role();
    let page = Pagination {
        limit: query.limit,
        offset: query.offset,
    };

    let rows = with_conn(&state.conn, move |conn| {
        let mut db_query = lessons::table
            .filter(lessons::is_published.eq(true))
            .into_boxed();

        if let Some(ref lesson_type) = query.lesson_type {
            db_query = db_query.filter(lessons::lesson_type.eq(lesson_type.clone()));
        }
        if let Some(part) = query.toeic_part {
            db_query = db_query.filter(lessons::toeic_part.eq(part));
        }
        if let Some(ref level) = query.level {
            db_query = db_query.filter(lessons::level.eq(level.clone()));
        }
        if let Some(ref search) = query.search {
            db_query = db_query.filter(lessons::title.ilike(contains_pattern(search)));
        }

        let rows: Vec<Lesson> = db_query
            .select(Lesson::as_select())
            .order((lessons::order_index.asc(), lessons::created_at.asc()))
            .offset(page.offset())
            .limit(page.limit())
            .load(conn)?;
        Ok(rows)
    })
    .await?;

    let summaries = rows
        .into_iter()
        .map(|lesson| LessonSummary {
            is_locked: lesson.is_locked_for(role),
            lesson,
        })
        .collect();
    Ok(ApiResponse::ok(summaries))
}

pub async fn handle_get_lesson(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(lesson_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<LessonDetail>>> {
    let role = Some(user.role);

    let detail = with_conn(&state.conn, move |conn| {
        let lesson = load_visible_lesson(conn, lesson_id, role)?;
        ensure_unlocked(&lesson, role)?;

        let reading_passages: Vec<ReadingPassage> = reading_passages::table
            .filter(reading_passages::lesson_id.eq(lesson_id))
            .select(ReadingPassage::as_select())
            .order(reading_passages::order_index.asc())
            .load(conn)?;
        let listening_passages: Vec<ListeningPassage> = listening_passages::table
            .filter(listening_passages::lesson_id.eq(lesson_id))
            .select(ListeningPassage::as_select())
            .order(listening_passages::order_index.asc())
            .load(conn)?;
        let questions = load_questions_with_options(conn, QuestionScope::Lesson(lesson_id))?
            .into_iter()
            .map(|(q, options)| QuestionView::new(q, options))
            .collect();

        Ok(LessonDetail {
            lesson,
            reading_passages,
            listening_passages,
            questions,
        })
    })
    .await?;

    Ok(ApiResponse::ok(detail))
}

pub async fn handle_create_lesson(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    ApiJson(req): ApiJson<CreateLessonRequest>,
) -> ApiResult<Created<Lesson>> {
    req.validate()?;

    let lesson = with_conn(&state.conn, move |conn| {
        let order_index = match req.order_index {
            Some(index) => index,
            None => {
                let max: Option<i32> = lessons::table
                    .select(diesel::dsl::max(lessons::order_index))
                    .first(conn)?;
                max.unwrap_or(0) + 1
            }
        };

        let now = Utc::now();
        let lesson = Lesson {
            id: Uuid::new_v4(),
            title: req.title.trim().to_string(),
            description: req.description,
            lesson_type: req.lesson_type,
            toeic_part: req.toeic_part,
            level: req.level.unwrap_or_else(|| "beginner".to_string()),
            order_index,
            duration_minutes: req.duration_minutes.unwrap_or(15),
            is_premium: req.is_premium.unwrap_or(false),
            is_published: req.is_published.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };
        diesel::insert_into(lessons::table)
            .values(&lesson)
            .execute(conn)?;
        Ok(lesson)
    })
    .await?;

    info!("Admin {} created lesson {}", admin.user_id, lesson.id);
    Ok(ApiResponse::created(lesson))
}

pub async fn handle_add_reading(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Path(lesson_id): Path<Uuid>,
    ApiJson(req): ApiJson<CreateReadingRequest>,
) -> ApiResult<Created<ReadingPassage>> {
    req.validate()?;

    let passage = with_conn(&state.conn, move |conn| {
        load_lesson_exists(conn, lesson_id)?;
        let order_index = match req.order_index {
            Some(index) => index,
            None => {
                let count: i64 = reading_passages::table
                    .filter(reading_passages::lesson_id.eq(lesson_id))
                    .count()
                    .get_result(conn)?;
                count as i32 + 1
            }
        };

        let passage = ReadingPassage {
            id: Uuid::new_v4(),
            lesson_id,
            title: req.title.trim().to_string(),
            content: req.content,
            order_index,
            created_at: Utc::now(),
        };
        diesel::insert_into(reading_passages::table)
            .values(&passage)
            .execute(conn)?;
        Ok(passage)
    })
    .await?;

    info!("Added reading passage {} to lesson {}", passage.id, lesson_id);
    Ok(ApiResponse::created(passage))
}

pub async fn handle_add_listening(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Path(lesson_id): Path<Uuid>,
    ApiJson(req): ApiJson<CreateListeningRequest>,
) -> ApiResult<Created<ListeningPassage>> {
    req.validate()?;

    let passage = with_conn(&state.conn, move |conn| {
        load_lesson_exists(conn, lesson_id)?;
        let order_index = match req.order_index {
            Some(index) => index,
            None => {
                let count: i64 = listening_passages::table
                    .filter(listening_passages::lesson_id.eq(lesson_id))
                    .count()
                    .get_result(conn)?;
                count as i32 + 1
            }
        };

        let passage = ListeningPassage {
            id: Uuid::new_v4(),
            lesson_id,
            title: req.title.trim().to_string(),
            audio_url: req.audio_url,
            transcript: req.transcript,
            image_url: req.image_url,
            order_index,
            created_at: Utc::now(),
        };
        diesel::insert_into(listening_passages::table)
            .values(&passage)
            .execute(conn)?;
        Ok(passage)
    })
    .await?;

    info!("Added listening passage {} to lesson {}", passage.id, lesson_id);
    Ok(ApiResponse::created(passage))
}

pub async fn handle_add_question(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Path(lesson_id): Path<Uuid>,
    ApiJson(req): ApiJson<CreateQuestionRequest>,
) -> ApiResult<Created<CreatedQuestion>> {
    req.validate()?;

    let created = with_conn(&state.conn, move |conn| {
        conn.transaction::<_, ApiError, _>(|conn| {
            load_lesson_exists(conn, lesson_id)?;

            if let Some(passage_id) = req.reading_passage_id {
                let owner: Option<Uuid> = reading_passages::table
                    .find(passage_id)
                    .select(reading_passages::lesson_id)
                    .first(conn)
                    .optional()?;
                if owner != Some(lesson_id) {
                    return Err(ApiError::Validation(
                        "reading_passage_id does not belong to this lesson".to_string(),
                    ));
                }
            }
            if let Some(passage_id) = req.listening_passage_id {
                let owner: Option<Uuid> = listening_passages::table
                    .find(passage_id)
                    .select(listening_passages::lesson_id)
                    .first(conn)
                    .optional()?;
                if owner != Some(lesson_id) {
                    return Err(ApiError::Validation(
                        "listening_passage_id does not belong to this lesson".to_string(),
                    ));
                }
            }

            let order_index = match req.order_index {
                Some(index) => index,
                None => {
                    let count: i64 = questions::table
                        .filter(questions::lesson_id.eq(lesson_id))
                        .count()
                        .get_result(conn)?;
                    count as i32 + 1
                }
            };

            let question = Question {
                id: Uuid::new_v4(),
                lesson_id,
                reading_passage_id: req.reading_passage_id,
                listening_passage_id: req.listening_passage_id,
                content: req.content.trim().to_string(),
                explanation: req.explanation,
                points: req.points.unwrap_or(1),
                order_index,
                created_at: Utc::now(),
            };
            diesel::insert_into(questions::table)
                .values(&question)
                .execute(conn)?;

            let options: Vec<AnswerOption> = req
                .options
                .into_iter()
                .map(|o| AnswerOption {
                    id: Uuid::new_v4(),
                    question_id: question.id,
                    label: o.label.trim().to_uppercase(),
                    content: o.content.trim().to_string(),
                    is_correct: o.is_correct,
                })
                .collect();
            diesel::insert_into(answer_options::table)
                .values(&options)
                .execute(conn)?;

            Ok(CreatedQuestion { question, options })
        })
    })
    .await?;

    info!(
        "Added question {} with {} options to lesson {}",
        created.question.id,
        created.options.len(),
        lesson_id
    );
    Ok(ApiResponse::created(created))
}

pub async fn handle_get_reading(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(passage_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<PassageDetail<ReadingPassage>>>> {
    let role = Some(user.role);

    let detail = with_conn(&state.conn, move |conn| {
        let passage: ReadingPassage = reading_passages::table
            .find(passage_id)
            .select(ReadingPassage::as_select())
            .first(conn)
            .optional()?
            .ok_or_else(|| ApiError::NotFound("Reading passage".to_string()))?;

        let lesson = load_visible_lesson(conn, passage.lesson_id, role)?;
        ensure_unlocked(&lesson, role)?;

        let questions = load_questions_with_options(conn, QuestionScope::Reading(passage_id))?
            .into_iter()
            .map(|(q, options)| QuestionView::new(q, options))
            .collect();

        Ok(PassageDetail {
            lesson_id: lesson.id,
            passage,
            questions,
        })
    })
    .await?;

    Ok(ApiResponse::ok(detail))
}

pub async fn handle_get_listening(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(passage_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<PassageDetail<ListeningPassage>>>> {
    let role = Some(user.role);

    let detail = with_conn(&state.conn, move |conn| {
        let passage: ListeningPassage = listening_passages::table
            .find(passage_id)
            .select(ListeningPassage::as_select())
            .first(conn)
            .optional()?
            .ok_or_else(|| ApiError::NotFound("Listening passage".to_string()))?;

        let lesson = load_visible_lesson(conn, passage.lesson_id, role)?;
        ensure_unlocked(&lesson, role)?;

        let questions = load_questions_with_options(conn, QuestionScope::Listening(passage_id))?
            .into_iter()
            .map(|(q, options)| QuestionView::new(q, options))
            .collect();

        Ok(PassageDetail {
            lesson_id: lesson.id,
            passage,
            questions,
        })
    })
    .await?;

    Ok(ApiResponse::ok(detail))
}
