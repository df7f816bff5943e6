//! Group endpoints.

use axum::{Router, extract::State, routing::get};
use quill_common::AppResult;
use quill_db::entities::group;

use crate::{middleware::AppState, response::ApiResponse};

/// List all groups.
async fn list(State(state): State<AppState>) -> AppResult<ApiResponse<Vec<group::Model>>> {
    Ok(ApiResponse::ok(state.group_service.list().await?))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/groups/", get(list))
}
