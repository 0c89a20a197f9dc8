//! Personal study calendar, edited by hand or generated from a roadmap.

pub mod handlers;
pub mod planner;
pub mod types;

use axum::{
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;

use crate::core::shared::state::AppState;
use crate::core::urls::ApiUrls;

pub use handlers::*;
pub use types::*;

pub fn configure_schedule_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            ApiUrls::SCHEDULES,
            get(handle_list_schedules).post(handle_create_schedule),
        )
        .route(ApiUrls::SCHEDULE_GENERATE, post(handle_generate_schedule))
        .route(
            ApiUrls::SCHEDULE_BY_ID,
            patch(handle_update_schedule).delete(handle_delete_schedule),
        )
}
