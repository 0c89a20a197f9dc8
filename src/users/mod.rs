pub mod handlers;
pub mod types;

use axum::{
    routing::{get, patch},
    Router,
};
use std::sync::Arc;

use crate::core::shared::state::AppState;
use crate::core::urls::ApiUrls;

pub use handlers::*;
pub use types::*;

pub fn configure_user_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(ApiUrls::USERS, get(handle_list_users))
        .route(
            ApiUrls::USER_PROFILE,
            get(handle_get_profile).put(handle_update_profile),
        )
        .route(ApiUrls::USER_PASSWORD, patch(handle_change_password))
}
