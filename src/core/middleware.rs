use axum::{
    extract::{FromRequest, FromRequestParts, Request},
    http::{header::AUTHORIZATION, request::Parts},
    Json,
};
use diesel::prelude::*;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::core::shared::models::UserRole;
use crate::core::shared::schema::users;
use crate::core::shared::state::AppState;
use crate::core::shared::utils::with_conn;
use crate::security::error_sanitizer::ApiError;
use crate::security::jwt::{extract_bearer_token, Claims};

// ============================================================================
// User Context (Authentication)
// ============================================================================

/// Authenticated user extracted from a valid access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: UserRole,
}

impl AuthenticatedUser {
    pub fn new(user_id: Uuid, email: String, role: UserRole) -> Self {
        Self {
            user_id,
            email,
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ApiError::Forbidden("Admin role required".to_string()))
        }
    }

    /// Owners see their own records, admins see everyone's.
    pub fn can_view(&self, owner_id: Uuid) -> bool {
        self.user_id == owner_id || self.is_admin()
    }

    fn from_claims(claims: Claims) -> Result<Self, ApiError> {
        let user_id = claims
            .user_id()
            .map_err(|_| ApiError::Unauthorized("Invalid token subject".to_string()))?;
        let role = claims
            .roles
            .as_ref()
            .and_then(|roles| roles.first())
            .map(|r| UserRole::from(r.as_str()))
            .unwrap_or(UserRole::HocVien);

        Ok(Self::new(user_id, claims.email.unwrap_or_default(), role))
    }
}

fn bearer_from_parts(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(extract_bearer_token)
}

fn authenticate(parts: &Parts, state: &AppState) -> Result<AuthenticatedUser, ApiError> {
    let token = bearer_from_parts(parts)
        .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))?;

    let claims = state.jwt.validate_access_token(token).map_err(|e| {
        debug!("Rejected access token: {e}");
        ApiError::Unauthorized("Invalid or expired token".to_string())
    })?;

    AuthenticatedUser::from_claims(claims)
}

// ============================================================================
// Axum Extractors
// ============================================================================

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        authenticate(parts, state)
    }
}

/// Caller that may be anonymous. A missing or invalid token yields `None`.
#[derive(Debug, Clone)]
pub struct OptionalUser(pub Option<AuthenticatedUser>);

impl OptionalUser {
    pub fn role(&self) -> Option<UserRole> {
        self.0.as_ref().map(|u| u.role)
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.0.as_ref().map(|u| u.user_id)
    }
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for OptionalUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(authenticate(parts, state).ok()))
    }
}

/// Authenticated caller holding the admin role.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthenticatedUser);

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let user = authenticate(parts, state)?;
        user.require_admin()?;

        // Stored role overrides the token claim after a demotion.
        let user_id = user.user_id;
        let stored: Option<String> = with_conn(&state.conn, move |conn| {
            Ok(users::table
                .find(user_id)
                .select(users::role)
                .first(conn)
                .optional()?)
        })
        .await?;

        match stored.map(|role| UserRole::from(role.as_str())) {
            Some(role) if role.is_admin() => Ok(Self(user)),
            _ => {
                debug!("Admin token for {user_id} no longer matches a stored admin");
                Err(ApiError::Forbidden("Admin role required".to_string()))
            }
        }
    }
}

/// JSON body whose rejections use the standard error envelope (400).
#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::Validation(rejection.body_text())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::jwt::JwtManager;

    fn claims_for(role: &str) -> Claims {
        let manager =
            JwtManager::from_secret("middleware-test-secret-with-enough-length-0001").unwrap();
        let user_id = Uuid::new_v4();
        let pair = manager
            .generate_token_pair(user_id, "lan@example.com", vec![role.to_string()])
            .unwrap();
        manager.validate_access_token(&pair.access_token).unwrap()
    }

    #[test]
    fn test_from_claims_reads_role() {
        let user = AuthenticatedUser::from_claims(claims_for("premium")).unwrap();
        assert_eq!(user.role, UserRole::Premium);
        assert_eq!(user.email, "lan@example.com");
        assert!(user.role.can_access_premium());
        assert!(user.require_admin().is_err());
    }

    #[test]
    fn test_admin_can_view_anything() {
        let admin = AuthenticatedUser::from_claims(claims_for("admin")).unwrap();
        assert!(admin.can_view(Uuid::new_v4()));
        assert!(admin.require_admin().is_ok());

        let student = AuthenticatedUser::new(Uuid::new_v4(), String::new(), UserRole::HocVien);
        assert!(student.can_view(student.user_id));
        assert!(!student.can_view(Uuid::new_v4()));
    }

    #[test]
    fn test_optional_user_role() {
        assert_eq!(OptionalUser(None).role(), None);
        let user = AuthenticatedUser::new(Uuid::new_v4(), String::new(), UserRole::Admin);
        assert_eq!(OptionalUser(Some(user)).role(), Some(UserRole::Admin));
    }
}
