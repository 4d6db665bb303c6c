pub mod admin;
pub mod devices;
pub mod news;
pub mod runs;

use std::sync::Arc;

use axum::{
    extract::State,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use chrono::Utc;

use crate::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/news/today", get(news::today))
        .route("/api/news/latest", get(news::latest))
        .route("/api/news/date/{date}", get(news::by_date))
        .route("/api/news/{id}", get(news::detail).delete(news::remove))
        .route("/api/runs", get(runs::recent))
        .route("/api/admin/collect", post(admin::collect))
        .route("/api/devices", post(devices::register))
        .route("/api/notify/test", post(devices::notify_test))
        .with_state(state)
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
        "uptime_secs": state.started_at.elapsed().as_secs(),
    }))
}
