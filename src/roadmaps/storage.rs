use diesel::prelude::*;
use uuid::Uuid;

use crate::core::shared::models::{ProgressStatus, Roadmap, UserRole};
use crate::core::shared::schema::{roadmap_lessons, roadmap_registrations, roadmaps, user_progress};
use crate::security::error_sanitizer::{ApiError, ApiResult};

/// Published roadmap, or any roadmap for admins.
pub fn load_visible_roadmap(
    conn: &mut PgConnection,
    roadmap_id: Uuid,
    role: Option<UserRole>,
) -> ApiResult<Roadmap> {
    let roadmap: Roadmap = roadmaps::table
        .find(roadmap_id)
        .select(Roadmap::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| ApiError::NotFound("Roadmap".to_string()))?;

    if !roadmap.is_published && !role.is_some_and(|r| r.is_admin()) {
        return Err(ApiError::NotFound("Roadmap".to_string()));
    }
    Ok(roadmap)
}

pub fn is_registered(conn: &mut PgConnection, user_id: Uuid, roadmap_id: Uuid) -> QueryResult<bool> {
    diesel::select(diesel::dsl::exists(
        roadmap_registrations::table
            .filter(roadmap_registrations::user_id.eq(user_id))
            .filter(roadmap_registrations::roadmap_id.eq(roadmap_id)),
    ))
    .get_result(conn)
}

/// Lesson ids of a roadmap in study order.
pub fn roadmap_lesson_ids(conn: &mut PgConnection, roadmap_id: Uuid) -> QueryResult<Vec<Uuid>> {
    roadmap_lessons::table
        .filter(roadmap_lessons::roadmap_id.eq(roadmap_id))
        .order(roadmap_lessons::order_index.asc())
        .select(roadmap_lessons::lesson_id)
        .load(conn)
}

pub fn completed_lesson_ids(conn: &mut PgConnection, user_id: Uuid) -> QueryResult<Vec<Uuid>> {
    user_progress::table
        .filter(user_progress::user_id.eq(user_id))
        .filter(user_progress::status.eq(ProgressStatus::Completed.as_str()))
        .select(user_progress::lesson_id)
        .load(conn)
}
