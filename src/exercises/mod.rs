//! Lesson submissions, scoring and stored results.

pub mod handlers;
pub mod scoring;
pub mod storage;
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

pub fn configure_exercise_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(ApiUrls::LESSON_SUBMIT, post(handle_submit_exercise))
        .route(ApiUrls::RESULTS, get(handle_list_results))
        .route(ApiUrls::RESULT_BY_ID, get(handle_get_result))
}
