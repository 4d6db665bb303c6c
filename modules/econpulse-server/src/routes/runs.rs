use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use tracing::warn;

use crate::AppState;

#[derive(Deserialize)]
pub struct RunsQuery {
    limit: Option<i64>,
}

pub async fn recent(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RunsQuery>,
) -> impl IntoResponse {
    let limit = params.limit.unwrap_or(10);
    match state.runs.list_recent(limit).await {
        Ok(runs) => Json(serde_json::json!({ "success": true, "data": runs })).into_response(),
        Err(e) => {
            warn!(error = %e, "Failed to load collection runs");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "success": false, "error": "internal server error" })),
            )
                .into_response()
        }
    }
}
