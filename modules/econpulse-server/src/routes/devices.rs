use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use tracing::warn;

use crate::notify;
use crate::AppState;

#[derive(Deserialize)]
pub struct RegisterRequest {
    token: String,
    platform: Option<String>,
}

/// Register a device token for push notifications. Upserts by token.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterRequest>,
) -> impl IntoResponse {
    if body.token.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "success": false, "error": "token is required" })),
        )
            .into_response();
    }

    match state
        .devices
        .upsert(body.token.trim(), body.platform.as_deref())
        .await
    {
        Ok(id) => Json(serde_json::json!({ "success": true, "data": { "id": id } })).into_response(),
        Err(e) => {
            warn!(error = %e, "Failed to register device token");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "success": false, "error": "internal server error" })),
            )
                .into_response()
        }
    }
}

/// Send a test push to the news topic.
pub async fn notify_test(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let Some(fcm) = &state.fcm else {
        return (
            StatusCode::NOT_IMPLEMENTED,
            Json(serde_json::json!({ "success": false, "error": "FCM is not configured" })),
        )
            .into_response();
    };

    match fcm
        .send_to_topic(
            notify::NEWS_TOPIC,
            "EconPulse test",
            "Push notifications are working.",
            None,
        )
        .await
    {
        Ok(()) => Json(serde_json::json!({ "success": true })).into_response(),
        Err(e) => {
            warn!(error = %e, "Test push failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(serde_json::json!({ "success": false, "error": e.to_string() })),
            )
                .into_response()
        }
    }
}
