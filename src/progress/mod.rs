//! Per-lesson progress and the learner dashboard.

pub mod estimate;
pub mod handlers;
pub mod streak;
pub mod tracker;
pub mod types;

use axum::{routing::get, Router};
use std::sync::Arc;

use crate::core::shared::state::AppState;
use crate::core::urls::ApiUrls;

pub use handlers::*;
pub use types::*;

pub fn configure_progress_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(ApiUrls::PROGRESS, get(handle_list_progress))
        .route(ApiUrls::PROGRESS_DASHBOARD, get(handle_dashboard))
}
