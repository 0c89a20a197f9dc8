//! Registration, login and token exchange.

pub mod handlers;
pub mod types;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::core::shared::state::AppState;
use crate::core::urls::ApiUrls;

pub use handlers::*;
pub use types::*;

pub fn configure_auth_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(ApiUrls::AUTH_REGISTER, post(handle_register))
        .route(ApiUrls::AUTH_LOGIN, post(handle_login))
        .route(ApiUrls::AUTH_REFRESH, post(handle_refresh))
        .route(ApiUrls::AUTH_LOGOUT, post(handle_logout))
        .route(ApiUrls::AUTH_ME, get(handle_me))
}
