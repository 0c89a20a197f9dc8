//! TOEIC lessons with their reading and listening passages and questions.
//!
//! Premium lessons are locked for accounts without the premium or admin
//! role: the detail, passage and submission routes answer 403 for them.

pub mod handlers;
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

pub fn configure_lesson_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            ApiUrls::LESSONS,
            get(handle_list_lessons).post(handle_create_lesson),
        )
        .route(ApiUrls::LESSON_BY_ID, get(handle_get_lesson))
        .route(ApiUrls::LESSON_READINGS, post(handle_add_reading))
        .route(ApiUrls::LESSON_LISTENINGS, post(handle_add_listening))
        .route(ApiUrls::LESSON_QUESTIONS, post(handle_add_question))
        .route(ApiUrls::READING_BY_ID, get(handle_get_reading))
        .route(ApiUrls::LISTENING_BY_ID, get(handle_get_listening))
}
