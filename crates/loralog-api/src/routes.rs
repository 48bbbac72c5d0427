use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::{Json, Router};
use loralog_service::{QueryService, DEFAULT_LIMIT};
use loralog_store::MessageRecord;
use serde::Serialize;
use serde_json::json;

use crate::config::ApiConfig;
use crate::dashboard;
use crate::error::ApiError;

#[derive(Clone)]
struct ApiState {
    query: QueryService,
    dashboard: String,
}

/// Body of the message list endpoints.
#[derive(Debug, Serialize)]
pub struct MessagesResponse {
    pub count: usize,
    pub messages: Vec<MessageRecord>,
}

/// Build the full router.
pub fn router(query: QueryService, config: &ApiConfig) -> Router {
    let state = ApiState {
        query,
        dashboard: dashboard::render(config.refresh_interval),
    };

    Router::new()
        .route("/", get(index))
        .route("/api", get(api_index))
        .route("/api/messages", get(messages))
        .route("/api/messages/:limit", get(messages_with_limit))
        .route("/api/health", get(health))
        .with_state(state)
}

async fn index(State(state): State<ApiState>) -> Html<String> {
    Html(state.dashboard)
}

async fn api_index() -> impl IntoResponse {
    Json(json!({
        "name": "loralog API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            {
                "path": "/",
                "method": "GET",
                "description": "Web dashboard for monitoring messages"
            },
            {
                "path": "/api",
                "method": "GET",
                "description": "API index and available endpoints"
            },
            {
                "path": "/api/messages",
                "method": "GET",
                "description": "Get the last 100 messages",
                "example": "/api/messages"
            },
            {
                "path": "/api/messages/<limit>",
                "method": "GET",
                "description": "Get the last N messages",
                "example": "/api/messages/50"
            },
            {
                "path": "/api/health",
                "method": "GET",
                "description": "Health check endpoint"
            }
        ]
    }))
}

async fn messages(State(state): State<ApiState>) -> Result<Json<MessagesResponse>, ApiError> {
    fetch(state.query, DEFAULT_LIMIT).await
}

async fn messages_with_limit(
    State(state): State<ApiState>,
    Path(raw): Path<String>,
) -> Result<Json<MessagesResponse>, ApiError> {
    let limit: i64 = raw
        .trim()
        .parse()
        .map_err(|_| ApiError::BadLimit(raw.clone()))?;
    fetch(state.query, limit).await
}

async fn fetch(query: QueryService, limit: i64) -> Result<Json<MessagesResponse>, ApiError> {
    let records = tokio::task::spawn_blocking(move || query.recent(limit))
        .await
        .map_err(|err| ApiError::Task(err.to_string()))??;

    Ok(Json(MessagesResponse {
        count: records.len(),
        messages: records,
    }))
}

async fn health() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") })),
    )
}
