use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use diesel::prelude::*;
use log::info;
use std::sync::Arc;

use crate::auth::handlers::load_user;
use crate::core::middleware::{AdminUser, ApiJson, AuthenticatedUser};
use crate::core::shared::models::{ApiResponse, Pagination, User, UserProfile};
use crate::core::shared::schema::users;
use crate::core::shared::state::AppState;
use crate::core::shared::utils::{contains_pattern, with_conn};
use crate::security::error_sanitizer::{ApiError, ApiResult};
use crate::security::password::{hash_password, verify_password};
use crate::users::types::{ChangePasswordRequest, ListUsersQuery, UpdateProfileRequest};

pub async fn handle_get_profile(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
) -> ApiResult<Json<ApiResponse<UserProfile>>> {
    let user_id = user.user_id;
    let profile = with_conn(&state.conn, move |conn| load_user(conn, user_id)).await?;
    Ok(ApiResponse::ok(UserProfile::from(profile)))
}

pub async fn handle_update_profile(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    ApiJson(req): ApiJson<UpdateProfileRequest>,
) -> ApiResult<Json<ApiResponse<UserProfile>>> {
    req.validate()?;
    let user_id = user.user_id;
    let changes = req.into_changes();

    let updated = with_conn(&state.conn, move |conn| {
        diesel::update(users::table.find(user_id))
            .set(&changes)
            .returning(User::as_returning())
            .get_result(conn)
            .optional()?
            .ok_or_else(|| ApiError::NotFound("User".to_string()))
    })
    .await?;

    info!("User {} updated profile", user_id);
    Ok(ApiResponse::ok(UserProfile::from(updated)))
}

pub async fn handle_change_password(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    ApiJson(req): ApiJson<ChangePasswordRequest>,
) -> ApiResult<Json<ApiResponse<serde_json::Value>>> {
    req.validate()?;
    let user_id = user.user_id;

    with_conn(&state.conn, move |conn| {
        let current = load_user(conn, user_id)?;
        if !verify_password(&req.old_password, &current.password_hash)? {
            return Err(ApiError::Validation(
                "Mật khẩu hiện tại không đúng".to_string(),
            ));
        }

        diesel::update(users::table.find(user_id))
            .set((
                users::password_hash.eq(hash_password(&req.new_password)?),
                users::updated_at.eq(Utc::now()),
            ))
            .execute(conn)?;
        Ok(())
    })
    .await?;

    info!("User {} changed password", user_id);
    Ok(ApiResponse::ok(serde_json::json!({ "updated": true })))
}

pub async fn handle_list_users(
    State(state): State<Arc<AppState>>,
    AdminUser(_admin): AdminUser,
    Query(query): Query<ListUsersQuery>,
) -> ApiResult<Json<ApiResponse<Vec<UserProfile>>>> {
    let page = Pagination {
        limit: query.limit,
        offset: query.offset,
    };

    let profiles = with_conn(&state.conn, move |conn| {
        let mut db_query = users::table.into_boxed();

        if let Some(ref search) = query.search {
            let term = contains_pattern(search);
            db_query = db_query.filter(
                users::email
                    .ilike(term.clone())
                    .or(users::full_name.ilike(term)),
            );
        }
        if let Some(ref role) = query.role {
            db_query = db_query.filter(users::role.eq(role.clone()));
        }

        let rows: Vec<User> = db_query
            .select(User::as_select())
            .order(users::created_at.desc())
            .offset(page.offset())
            .limit(page.limit())
            .load(conn)?;
        Ok(rows.into_iter().map(UserProfile::from).collect())
    })
    .await?;

    Ok(ApiResponse::ok(profiles))
}
