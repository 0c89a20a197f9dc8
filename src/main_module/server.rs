//! HTTP server initialization and routing

use axum::{routing::get, Router};
use log::{error, info};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::core::shared::state::AppState;
use crate::core::urls::ApiUrls;
use crate::security::create_cors_layer;
use crate::security::error_sanitizer::ApiError;

use super::{health_check, health_check_simple, shutdown_signal};

async fn route_not_found() -> ApiError {
    ApiError::NotFound("Route".to_string())
}

/// Full application router with every enabled module mounted.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    #[allow(unused_mut)]
    let mut api_router = Router::new()
        .route(ApiUrls::HEALTH, get(health_check_simple))
        .route(ApiUrls::API_HEALTH, get(health_check))
        .merge(crate::auth::configure_auth_routes())
        .merge(crate::users::configure_user_routes())
        .merge(crate::lessons::configure_lesson_routes())
        .merge(crate::exercises::configure_exercise_routes())
        .merge(crate::progress::configure_progress_routes())
        .merge(crate::roadmaps::configure_roadmap_routes());

    #[cfg(feature = "schedules")]
    {
        api_router = api_router.merge(crate::schedules::configure_schedule_routes());
    }

    #[cfg(feature = "assessment")]
    {
        api_router = api_router.merge(crate::assessment::configure_assessment_routes());
    }

    let cors = create_cors_layer(&app_state.config.server);

    api_router
        .fallback(route_not_found)
        .with_state(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn run_axum_server(app_state: Arc<AppState>) -> std::io::Result<()> {
    let addr = app_state.config.bind_address();
    let app = create_router(app_state);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            error!(
                "Failed to bind to {}: {} - is another instance running?",
                addr, e
            );
            return Err(e);
        }
    };

    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(std::io::Error::other)
}
