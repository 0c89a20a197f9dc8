//! Study roadmaps: ordered lesson sequences toward a target score, and the
//! learner registrations that schedules are generated from.

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

pub fn configure_roadmap_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            ApiUrls::ROADMAPS,
            get(handle_list_roadmaps).post(handle_create_roadmap),
        )
        .route(ApiUrls::ROADMAPS_MINE, get(handle_my_roadmaps))
        .route(ApiUrls::ROADMAP_BY_ID, get(handle_get_roadmap))
        .route(
            ApiUrls::ROADMAP_REGISTRATION,
            post(handle_register_roadmap).delete(handle_unregister_roadmap),
        )
}
