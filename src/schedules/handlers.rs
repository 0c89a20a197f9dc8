use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use diesel::prelude::*;
use log::info;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::middleware::{ApiJson, AuthenticatedUser};
use crate::core::shared::models::{ApiResponse, StudySchedule};
use crate::core::shared::schema::{lessons, study_schedules};
use crate::core::shared::state::AppState;
use crate::core::shared::utils::with_conn;
use crate::lessons::storage::load_visible_lesson;
use crate::roadmaps::storage::{completed_lesson_ids, is_registered, load_visible_roadmap, roadmap_lesson_ids};
use crate::schedules::planner::plan_lessons;
use crate::schedules::types::{
    CreateScheduleRequest, DeletedSchedule, GenerateScheduleRequest, GeneratedSchedule,
    ScheduleEntry, ScheduleQuery, UpdateScheduleRequest,
};
use crate::security::error_sanitizer::{ApiError, ApiResult};

type Created<T> = (StatusCode, Json<ApiResponse<T>>);

fn load_owned(conn: &mut PgConnection, schedule_id: Uuid, user_id: Uuid) -> ApiResult<StudySchedule> {
    study_schedules::table
        .filter(study_schedules::id.eq(schedule_id))
        .filter(study_schedules::user_id.eq(user_id))
        .select(StudySchedule::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| ApiError::NotFound("Schedule".to_string()))
}

pub async fn handle_list_schedules(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Query(query): Query<ScheduleQuery>,
) -> ApiResult<Json<ApiResponse<Vec<ScheduleEntry>>>> {
    query.validate()?;
    let user_id = user.user_id;

    let entries = with_conn(&state.conn, move |conn| {
        let mut db_query = study_schedules::table
            .inner_join(lessons::table)
            .filter(study_schedules::user_id.eq(user_id))
            .into_boxed();
        if let Some(from) = query.from {
            db_query = db_query.filter(study_schedules::scheduled_date.ge(from));
        }
        if let Some(to) = query.to {
            db_query = db_query.filter(study_schedules::scheduled_date.le(to));
        }

        let rows: Vec<(StudySchedule, String, String)> = db_query
            .order((study_schedules::scheduled_date.asc(), study_schedules::created_at.asc()))
            .select((StudySchedule::as_select(), lessons::title, lessons::lesson_type))
            .load(conn)?;

        Ok(rows
            .into_iter()
            .map(|(schedule, lesson_title, lesson_type)| ScheduleEntry {
                schedule,
                lesson_title,
                lesson_type,
            })
            .collect::<Vec<_>>())
    })
    .await?;

    Ok(ApiResponse::ok(entries))
}

pub async fn handle_create_schedule(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    ApiJson(req): ApiJson<CreateScheduleRequest>,
) -> ApiResult<Created<StudySchedule>> {
    req.validate()?;
    let user_id = user.user_id;
    let role = Some(user.role);

    let schedule = with_conn(&state.conn, move |conn| {
        load_visible_lesson(conn, req.lesson_id, role)?;

        let schedule = StudySchedule {
            id: Uuid::new_v4(),
            user_id,
            roadmap_id: None,
            lesson_id: req.lesson_id,
            scheduled_date: req.scheduled_date,
            is_completed: false,
            note: req.note.map(|n| n.trim().to_string()),
            created_at: Utc::now(),
            completed_at: None,
        };
        diesel::insert_into(study_schedules::table)
            .values(&schedule)
            .execute(conn)?;
        Ok(schedule)
    })
    .await?;

    Ok(ApiResponse::created(schedule))
}

pub async fn handle_update_schedule(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(schedule_id): Path<Uuid>,
    ApiJson(req): ApiJson<UpdateScheduleRequest>,
) -> ApiResult<Json<ApiResponse<StudySchedule>>> {
    req.validate()?;
    let user_id = user.user_id;

    let schedule = with_conn(&state.conn, move |conn| {
        let current = load_owned(conn, schedule_id, user_id)?;
        let changes = req.into_changes(&current, Utc::now());

        let updated = diesel::update(study_schedules::table.find(current.id))
            .set(&changes)
            .returning(StudySchedule::as_returning())
            .get_result(conn)?;
        Ok(updated)
    })
    .await?;

    Ok(ApiResponse::ok(schedule))
}

pub async fn handle_delete_schedule(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(schedule_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<DeletedSchedule>>> {
    let user_id = user.user_id;

    with_conn(&state.conn, move |conn| {
        let deleted = diesel::delete(
            study_schedules::table
                .filter(study_schedules::id.eq(schedule_id))
                .filter(study_schedules::user_id.eq(user_id)),
        )
        .execute(conn)?;
        if deleted == 0 {
            return Err(ApiError::NotFound("Schedule".to_string()));
        }
        Ok(())
    })
    .await?;

    Ok(ApiResponse::ok(DeletedSchedule { id: schedule_id }))
}

pub async fn handle_generate_schedule(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    ApiJson(req): ApiJson<GenerateScheduleRequest>,
) -> ApiResult<Created<GeneratedSchedule>> {
    let user_id = user.user_id;
    let role = Some(user.role);
    let options = req.plan_options(&state.config.learning, Utc::now().date_naive());
    options.validate()?;
    let roadmap_id = req.roadmap_id;
    let replace_existing = req.replace_existing;

    let generated = with_conn(&state.conn, move |conn| {
        conn.transaction::<_, ApiError, _>(|conn| {
            load_visible_roadmap(conn, roadmap_id, role)?;
            if !is_registered(conn, user_id, roadmap_id)? {
                return Err(ApiError::Forbidden(
                    "Bạn chưa đăng ký lộ trình này".to_string(),
                ));
            }

            let pending = study_schedules::table
                .filter(study_schedules::user_id.eq(user_id))
                .filter(study_schedules::roadmap_id.eq(roadmap_id))
                .filter(study_schedules::is_completed.eq(false));

            let removed = if replace_existing {
                diesel::delete(pending.clone()).execute(conn)?
            } else {
                0
            };

            let lesson_ids = roadmap_lesson_ids(conn, roadmap_id)?;
            let completed: HashSet<Uuid> = completed_lesson_ids(conn, user_id)?.into_iter().collect();
            let skipped_completed = lesson_ids.iter().filter(|id| completed.contains(id)).count();

            let mut skip = completed;
            if !replace_existing {
                skip.extend(pending.select(study_schedules::lesson_id).load::<Uuid>(conn)?);
            }

            let now = Utc::now();
            let rows: Vec<StudySchedule> = plan_lessons(&lesson_ids, &skip, &options)?
                .into_iter()
                .map(|planned| StudySchedule {
                    id: Uuid::new_v4(),
                    user_id,
                    roadmap_id: Some(roadmap_id),
                    lesson_id: planned.lesson_id,
                    scheduled_date: planned.scheduled_date,
                    is_completed: false,
                    note: None,
                    created_at: now,
                    completed_at: None,
                })
                .collect();

            if !rows.is_empty() {
                diesel::insert_into(study_schedules::table)
                    .values(&rows)
                    .execute(conn)?;
            }

            Ok(GeneratedSchedule {
                roadmap_id,
                end_date: rows.last().map(|s| s.scheduled_date),
                schedules: rows,
                removed,
                skipped_completed,
            })
        })
    })
    .await?;

    info!(
        "User {} generated {} schedule rows for roadmap {}",
        user_id,
        generated.schedules.len(),
        roadmap_id
    );
    Ok(ApiResponse::created(generated))
}
