use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{error, info};

use crate::AppState;

#[derive(Deserialize, Default)]
pub struct CollectRequest {
    date: Option<String>,
}

/// Manual trigger. Runs the pipeline inline and surfaces the run outcome
/// in the response, unlike the scheduled trigger which only logs it.
/// The body is optional: `{}` and an empty body both mean "yesterday".
pub async fn collect(
    State(state): State<Arc<AppState>>,
    body: axum::body::Bytes,
) -> impl IntoResponse {
    let request: CollectRequest = if body.is_empty() {
        CollectRequest::default()
    } else {
        match serde_json::from_slice(&body) {
            Ok(request) => request,
            Err(_) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(serde_json::json!({
                        "success": false,
                        "error": "body must be JSON like {\"date\": \"YYYY-MM-DD\"}",
                    })),
                )
                    .into_response();
            }
        }
    };
    let requested_date = request.date;

    let target = match requested_date {
        Some(raw) => match NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(_) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(serde_json::json!({
                        "success": false,
                        "error": "date must be YYYY-MM-DD",
                    })),
                )
                    .into_response();
            }
        },
        None => None,
    };

    info!(date = ?target, "Manual collection triggered");

    match state.collector.run(target).await {
        Ok(summary) => {
            Json(serde_json::json!({ "success": true, "data": summary })).into_response()
        }
        Err(e) => {
            error!(error = %e, "Manual collection failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "success": false, "error": e.to_string() })),
            )
                .into_response()
        }
    }
}
