use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use diesel::dsl::count_star;
use diesel::prelude::*;
use log::info;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::middleware::{AdminUser, ApiJson, AuthenticatedUser, OptionalUser};
use crate::core::shared::models::{
    ApiResponse, Lesson, ProgressStatus, Roadmap, RoadmapLesson, RoadmapRegistration,
    REGISTRATION_ACTIVE,
};
use crate::core::shared::schema::{
    lessons, roadmap_lessons, roadmap_registrations, roadmaps, study_schedules, user_progress,
};
use crate::core::shared::state::AppState;
use crate::core::shared::utils::with_conn;
use crate::roadmaps::storage::{completed_lesson_ids, is_registered, load_visible_roadmap};
use crate::roadmaps::types::{
    CreateRoadmapRequest, CreatedRoadmap, MyRoadmap, RoadmapDetail, RoadmapLessonEntry,
    RoadmapSummary,
};
use crate::security::error_sanitizer::{ApiError, ApiResult};

type Created<T> = (StatusCode, Json<ApiResponse<T>>);

pub async fn handle_list_roadmaps(
    State(state): State<Arc<AppState>>,
    caller: OptionalUser,
) -> ApiResult<Json<ApiResponse<Vec<RoadmapSummary>>>> {
    let caller_id = caller.user_id();

    let summaries = with_conn(&state.conn, move |conn| {
        let rows: Vec<Roadmap> = roadmaps::table
            .filter(roadmaps::is_published.eq(true))
            .order((roadmaps::target_score.asc(), roadmaps::created_at.asc()))
            .select(Roadmap::as_select())
            .load(conn)?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let counts: HashMap<Uuid, i64> = roadmap_lessons::table
            .filter(roadmap_lessons::roadmap_id.eq_any(&ids))
            .group_by(roadmap_lessons::roadmap_id)
            .select((roadmap_lessons::roadmap_id, count_star()))
            .load::<(Uuid, i64)>(conn)?
            .into_iter()
            .collect();

        let registered: HashSet<Uuid> = match caller_id {
            Some(user_id) => roadmap_registrations::table
                .filter(roadmap_registrations::user_id.eq(user_id))
                .select(roadmap_registrations::roadmap_id)
                .load::<Uuid>(conn)?
                .into_iter()
                .collect(),
            None => HashSet::new(),
        };

        Ok(rows
            .into_iter()
            .map(|roadmap| RoadmapSummary {
                lesson_count: counts.get(&roadmap.id).copied().unwrap_or(0),
                is_registered: registered.contains(&roadmap.id),
                roadmap,
            })
            .collect::<Vec<_>>())
    })
    .await?;

    Ok(ApiResponse::ok(summaries))
}

pub async fn handle_get_roadmap(
    State(state): State<Arc<AppState>>,
    caller: OptionalUser,
    Path(roadmap_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<RoadmapDetail>>> {
    let role = caller.role();
    let caller_id = caller.user_id();

    let detail = with_conn(&state.conn, move |conn| {
        let roadmap = load_visible_roadmap(conn, roadmap_id, role)?;

        let mut query = roadmap_lessons::table
            .inner_join(lessons::table)
            .filter(roadmap_lessons::roadmap_id.eq(roadmap_id))
            .into_boxed();
        if !role.is_some_and(|r| r.is_admin()) {
            query = query.filter(lessons::is_published.eq(true));
        }
        let rows: Vec<(i32, Lesson)> = query
            .order(roadmap_lessons::order_index.asc())
            .select((roadmap_lessons::order_index, Lesson::as_select()))
            .load(conn)?;

        let (statuses, registered) = match caller_id {
            Some(user_id) => {
                let lesson_ids: Vec<Uuid> = rows.iter().map(|(_, l)| l.id).collect();
                let statuses: HashMap<Uuid, String> = user_progress::table
                    .filter(user_progress::user_id.eq(user_id))
                    .filter(user_progress::lesson_id.eq_any(&lesson_ids))
                    .select((user_progress::lesson_id, user_progress::status))
                    .load::<(Uuid, String)>(conn)?
                    .into_iter()
                    .collect();
                (statuses, is_registered(conn, user_id, roadmap_id)?)
            }
            None => (HashMap::new(), false),
        };

        let lessons = rows
            .into_iter()
            .map(|(position, lesson)| {
                let progress_status = caller_id.map(|_| {
                    statuses
                        .get(&lesson.id)
                        .map_or(ProgressStatus::NotStarted, |s| ProgressStatus::from(s.as_str()))
                });
                RoadmapLessonEntry {
                    is_locked: lesson.is_locked_for(role),
                    position,
                    progress_status,
                    lesson,
                }
            })
            .collect();

        Ok(RoadmapDetail {
            roadmap,
            lessons,
            is_registered: registered,
        })
    })
    .await?;

    Ok(ApiResponse::ok(detail))
}

pub async fn handle_register_roadmap(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(roadmap_id): Path<Uuid>,
) -> ApiResult<Created<RoadmapRegistration>> {
    let user_id = user.user_id;
    let role = Some(user.role);

    let registration = with_conn(&state.conn, move |conn| {
        load_visible_roadmap(conn, roadmap_id, role)?;
        if is_registered(conn, user_id, roadmap_id)? {
            return Err(ApiError::Conflict("Bạn đã đăng ký lộ trình này".to_string()));
        }

        let registration = RoadmapRegistration {
            id: Uuid::new_v4(),
            user_id,
            roadmap_id,
            status: REGISTRATION_ACTIVE.to_string(),
            registered_at: Utc::now(),
        };
        diesel::insert_into(roadmap_registrations::table)
            .values(&registration)
            .execute(conn)?;
        Ok(registration)
    })
    .await?;

    info!("User {} registered for roadmap {}", user_id, roadmap_id);
    Ok(ApiResponse::created(registration))
}

#[derive(Debug, serde::Serialize)]
pub struct Unregistered {
    pub roadmap_id: Uuid,
    pub schedules_removed: usize,
}

pub async fn handle_unregister_roadmap(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(roadmap_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Unregistered>>> {
    let user_id = user.user_id;

    let outcome = with_conn(&state.conn, move |conn| {
        conn.transaction::<_, ApiError, _>(|conn| {
            let deleted = diesel::delete(
                roadmap_registrations::table
                    .filter(roadmap_registrations::user_id.eq(user_id))
                    .filter(roadmap_registrations::roadmap_id.eq(roadmap_id)),
            )
            .execute(conn)?;
            if deleted == 0 {
                return Err(ApiError::NotFound("Registration".to_string()));
            }

            let schedules_removed = diesel::delete(
                study_schedules::table
                    .filter(study_schedules::user_id.eq(user_id))
                    .filter(study_schedules::roadmap_id.eq(roadmap_id))
                    .filter(study_schedules::is_completed.eq(false)),
            )
            .execute(conn)?;

            Ok(Unregistered {
                roadmap_id,
                schedules_removed,
            })
        })
    })
    .await?;

    info!(
        "User {} left roadmap {} ({} schedule rows removed)",
        user_id, roadmap_id, outcome.schedules_removed
    );
    Ok(ApiResponse::ok(outcome))
}

pub async fn handle_my_roadmaps(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
) -> ApiResult<Json<ApiResponse<Vec<MyRoadmap>>>> {
    let user_id = user.user_id;

    let mine = with_conn(&state.conn, move |conn| {
        let rows: Vec<(Roadmap, chrono::DateTime<Utc>)> = roadmap_registrations::table
            .inner_join(roadmaps::table)
            .filter(roadmap_registrations::user_id.eq(user_id))
            .order(roadmap_registrations::registered_at.desc())
            .select((Roadmap::as_select(), roadmap_registrations::registered_at))
            .load(conn)?;

        let ids: Vec<Uuid> = rows.iter().map(|(r, _)| r.id).collect();
        let mut lessons_by_roadmap: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
        for (roadmap_id, lesson_id) in roadmap_lessons::table
            .filter(roadmap_lessons::roadmap_id.eq_any(&ids))
            .select((roadmap_lessons::roadmap_id, roadmap_lessons::lesson_id))
            .load::<(Uuid, Uuid)>(conn)?
        {
            lessons_by_roadmap.entry(roadmap_id).or_default().push(lesson_id);
        }
        let completed: HashSet<Uuid> = completed_lesson_ids(conn, user_id)?.into_iter().collect();

        Ok(rows
            .into_iter()
            .map(|(roadmap, registered_at)| {
                let lesson_ids = lessons_by_roadmap.remove(&roadmap.id).unwrap_or_default();
                let done = lesson_ids.iter().filter(|id| completed.contains(id)).count();
                MyRoadmap::new(roadmap, registered_at, done as i64, lesson_ids.len() as i64)
            })
            .collect::<Vec<_>>())
    })
    .await?;

    Ok(ApiResponse::ok(mine))
}

pub async fn handle_create_roadmap(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    ApiJson(req): ApiJson<CreateRoadmapRequest>,
) -> ApiResult<Created<CreatedRoadmap>> {
    req.validate()?;

    let created = with_conn(&state.conn, move |conn| {
        conn.transaction::<_, ApiError, _>(|conn| {
            let known: HashSet<Uuid> = lessons::table
                .filter(lessons::id.eq_any(&req.lesson_ids))
                .select(lessons::id)
                .load::<Uuid>(conn)?
                .into_iter()
                .collect();
            if let Some(missing) = req.lesson_ids.iter().find(|id| !known.contains(id)) {
                return Err(ApiError::Validation(format!("Unknown lesson {}", missing)));
            }

            let roadmap = Roadmap {
                id: Uuid::new_v4(),
                title: req.title.trim().to_string(),
                description: req.description,
                target_score: req.target_score,
                level: req.level.unwrap_or_else(|| "beginner".to_string()),
                duration_weeks: req.duration_weeks.unwrap_or(4),
                is_published: req.is_published.unwrap_or(true),
                created_at: Utc::now(),
            };
            diesel::insert_into(roadmaps::table)
                .values(&roadmap)
                .execute(conn)?;

            let links: Vec<RoadmapLesson> = req
                .lesson_ids
                .iter()
                .enumerate()
                .map(|(i, lesson_id)| RoadmapLesson {
                    id: Uuid::new_v4(),
                    roadmap_id: roadmap.id,
                    lesson_id: *lesson_id,
                    order_index: i as i32 + 1,
                })
                .collect();
            diesel::insert_into(roadmap_lessons::table)
                .values(&links)
                .execute(conn)?;

            Ok(CreatedRoadmap {
                roadmap,
                lesson_ids: req.lesson_ids,
            })
        })
    })
    .await?;

    info!("Admin {} created roadmap {}", admin.user_id, created.roadmap.id);
    Ok(ApiResponse::created(created))
}
