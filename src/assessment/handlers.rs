use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::assessment::types::{build_overall, OverallAssessment, ResultAssessment};
use crate::core::middleware::AuthenticatedUser;
use crate::core::shared::models::ApiResponse;
use crate::core::shared::state::AppState;
use crate::core::shared::utils::with_conn;
use crate::exercises::storage::load_result_detail;
use crate::progress::handlers::load_result_facts;
use crate::security::error_sanitizer::ApiResult;

pub async fn handle_assess_result(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(result_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<ResultAssessment>>> {
    let detail = with_conn(&state.conn, move |conn| load_result_detail(conn, result_id, &user)).await?;

    Ok(ApiResponse::ok(ResultAssessment::from(detail)))
}

pub async fn handle_assess_overview(
    State(state): State<Arc<AppState>>,
    user: AuthenticatedUser,
) -> ApiResult<Json<ApiResponse<OverallAssessment>>> {
    let user_id = user.user_id;

    let facts = with_conn(&state.conn, move |conn| Ok(load_result_facts(conn, user_id)?)).await?;

    Ok(ApiResponse::ok(build_overall(&facts)))
}
