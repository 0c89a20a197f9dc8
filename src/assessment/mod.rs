//! Rule-based feedback on results: score bands, canned comments and study
//! recommendations per lesson type.

pub mod handlers;
pub mod rules;
pub mod types;

use axum::{routing::get, Router};
use std::sync::Arc;

use crate::core::shared::state::AppState;
use crate::core::urls::ApiUrls;

pub use handlers::*;

pub fn configure_assessment_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(ApiUrls::ASSESSMENT_RESULT, get(handle_assess_result))
        .route(ApiUrls::ASSESSMENT_OVERVIEW, get(handle_assess_overview))
}
