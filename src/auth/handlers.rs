use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use diesel::prelude::*;
use log::info;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::types::{
    AuthResponse, LoginRequest, RefreshRequest, RegisterRequest, INVALID_CREDENTIALS,
};
use crate::core::middleware::{ApiJson, AuthenticatedUser};
use crate::core::shared::models::{ApiResponse, User, UserProfile, UserRole};
use crate::core::shared::schema::users;
use crate::core::shared::state::AppState;
use crate::core::shared::utils::with_conn;
use crate::security::error_sanitizer::{ApiError, ApiResult};
use crate::security::jwt::TokenPair;
use crate::security::password::{hash_password, verify_password};
use crate::security::validation::normalize_email;

pub(crate) fn issue_tokens(state: &AppState, user: &User) -> ApiResult<TokenPair> {
    Ok(state
        .jwt
        .generate_token_pair(user.id, &user.email, vec![user.role.clone()])?)
}

pub(crate) fn load_user(conn: &mut PgConnection, user_id: Uuid) -> ApiResult<User> {
    users::table
        .find(user_id)
        .select(User::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| ApiError::NotFound("User".to_string()))
}

pub async fn handle_register(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<AuthResponse>>)> {
    req.validate()?;
    let email = normalize_email(&req.email);

    let user = with_conn(&state.conn, move |conn| {
        let taken: bool = diesel::select(diesel::dsl::exists(
            users::table.filter(users::email.eq(&email)),
        ))
        .get_result(conn)?;
        if taken {
            return Err(ApiError::Conflict("Email đã được sử dụng".to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email,
            password_hash: hash_password(&req.password)?,
            full_name: req.full_name.trim().to_string(),
            role: UserRole::HocVien.as_str().to_string(),
            target_score: req.target_score,
            current_level: None,
            avatar_url: None,
            phone: None,
            created_at: now,
            updated_at: now,
            last_login_at: None,
        };

        diesel::insert_into(users::table)
            .values(&user)
            .execute(conn)?;
        Ok(user)
    })
    .await?;

    info!("Registered user {} ({})", user.id, user.email);
    let tokens = issue_tokens(&state, &user)?;
    Ok(ApiResponse::created(AuthResponse {
        user: UserProfile::from(user),
        tokens,
    }))
}

pub async fn handle_login(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<Json<ApiResponse<AuthResponse>>> {
    let email = normalize_email(&req.email);

    let user = with_conn(&state.conn, move |conn| {
        let found: Option<User> = users::table
            .filter(users::email.eq(&email))
            .select(User::as_select())
            .first(conn)
            .optional()?;

        let user = match found {
            Some(user) if verify_password(&req.password, &user.password_hash)? => user,
            _ => return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string())),
        };

        let user = diesel::update(users::table.find(user.id))
            .set(users::last_login_at.eq(Some(Utc::now())))
            .returning(User::as_returning())
            .get_result(conn)?;
        Ok(user)
    })
    .await?;

    info!("User {} logged in", user.id);
    let tokens = issue_tokens(&state, &user)?;
    Ok(ApiResponse::ok(AuthResponse {
        user: UserProfile::from(user),
        tokens,
    }))
}

pub async fn handle_refresh(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<RefreshRequest>,
) -> ApiResult<Json<ApiResponse<AuthResponse>>> {
    let claims = state
        .jwt
        .validate_refresh_token(&req.refresh_token)
        .await
        .map_err(|_| ApiError::Unauthorized("Invalid or expired refresh token".to_string()))?;
    let user_id = claims
        .user_id()
        .map_err(|_| ApiError::Unauthorized("Invalid or expired refresh token".to_string()))?;
    if !state.jwt.try_revoke(&claims).await {
        return Err(ApiError::Unauthorized(
            "Invalid or expired refresh token".to_string(),
        ));
    }

    let user = with_conn(&state.conn, move |conn| load_user(conn, user_id))
        .await
        .map_err(|e| match e {
            ApiError::NotFound(_) => ApiError::Unauthorized("Account no longer exists".to_string()),
            other => other,
        })?;

    let tokens = issue_tokens(&state, &user)?;
    Ok(ApiResponse::ok(AuthResponse {
        user: UserProfile::from(user),
        tokens,
    }))
}

pub async fn handle_logout(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    ApiJson(req): ApiJson<RefreshRequest>,
) -> ApiResult<Json<ApiResponse<serde_json::Value>>> {
    let claims = state
        .jwt
        .validate_refresh_token(&req.refresh_token)
        .await
        .map_err(|_| ApiError::Unauthorized("Invalid or expired refresh token".to_string()))?;

    if claims.sub != user.user_id.to_string() {
        return Err(ApiError::Forbidden(
            "Refresh token belongs to another account".to_string(),
        ));
    }

    if !state.jwt.try_revoke(&claims).await {
        return Err(ApiError::Unauthorized(
            "Invalid or expired refresh token".to_string(),
        ));
    }
    info!("User {} logged out", user.user_id);
    Ok(ApiResponse::ok(serde_json::json!({ "logged_out": true })))
}

pub async fn handle_me(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
) -> ApiResult<Json<ApiResponse<UserProfile>>> {
    let user_id = user.user_id;
    let profile = with_conn(&state.conn, move |conn| load_user(conn, user_id)).await?;
    Ok(ApiResponse::ok(UserProfile::from(profile)))
}
