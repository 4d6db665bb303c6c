use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tracing::warn;

use crate::AppState;

#[derive(Deserialize)]
pub struct PageQuery {
    page: Option<i64>,
    limit: Option<i64>,
}

#[derive(Deserialize)]
pub struct LimitQuery {
    limit: Option<i64>,
}

fn error_response(status: StatusCode, message: &str) -> axum::response::Response {
    (
        status,
        Json(serde_json::json!({ "success": false, "error": message })),
    )
        .into_response()
}

fn internal_error() -> axum::response::Response {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
}

async fn list_for_date(
    state: &AppState,
    date: NaiveDate,
    params: PageQuery,
) -> axum::response::Response {
    let limit = params.limit.unwrap_or(20);
    let page = params.page.unwrap_or(1).max(1);
    let offset = (page - 1) * limit.clamp(1, 100);

    let records = match state.news.find_by_date(date, limit, offset).await {
        Ok(records) => records,
        Err(e) => {
            warn!(error = %e, "Failed to load news by date");
            return internal_error();
        }
    };
    let count = match state.news.count_by_date(date).await {
        Ok(count) => count,
        Err(e) => {
            warn!(error = %e, "Failed to count news by date");
            return internal_error();
        }
    };

    Json(serde_json::json!({
        "success": true,
        "data": records,
        "date": date.to_string(),
        "count": count,
        "page": page,
        "limit": limit.clamp(1, 100),
    }))
    .into_response()
}

pub async fn today(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageQuery>,
) -> impl IntoResponse {
    list_for_date(&state, Utc::now().date_naive(), params).await
}

pub async fn by_date(
    State(state): State<Arc<AppState>>,
    Path(date): Path<String>,
    Query(params): Query<PageQuery>,
) -> impl IntoResponse {
    let date = match NaiveDate::parse_from_str(&date, "%Y-%m-%d") {
        Ok(date) => date,
        Err(_) => return error_response(StatusCode::BAD_REQUEST, "date must be YYYY-MM-DD"),
    };
    list_for_date(&state, date, params).await
}

pub async fn latest(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LimitQuery>,
) -> impl IntoResponse {
    let limit = params.limit.unwrap_or(10);
    match state.news.find_latest(limit).await {
        Ok(records) => {
            Json(serde_json::json!({ "success": true, "data": records })).into_response()
        }
        Err(e) => {
            warn!(error = %e, "Failed to load latest news");
            internal_error()
        }
    }
}

pub async fn detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    match state.news.find_by_id(id).await {
        Ok(Some(record)) => {
            Json(serde_json::json!({ "success": true, "data": record })).into_response()
        }
        Ok(None) => error_response(StatusCode::NOT_FOUND, "news not found"),
        Err(e) => {
            warn!(id, error = %e, "Failed to load news detail");
            internal_error()
        }
    }
}

pub async fn remove(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    match state.news.soft_delete(id).await {
        Ok(true) => Json(serde_json::json!({ "success": true })).into_response(),
        Ok(false) => error_response(StatusCode::NOT_FOUND, "news not found"),
        Err(e) => {
            warn!(id, error = %e, "Failed to delete news");
            internal_error()
        }
    }
}
