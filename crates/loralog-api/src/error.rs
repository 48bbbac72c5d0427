use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use loralog_service::QueryError;
use serde_json::json;

/// Failures surfaced to HTTP clients.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The path segment is not a positive integer.
    #[error("invalid limit: {0}")]
    BadLimit(String),

    /// The query service rejected or failed the request.
    #[error(transparent)]
    Query(#[from] QueryError),

    /// The blocking read task did not complete.
    #[error("query task failed: {0}")]
    Task(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadLimit(_) | ApiError::Query(QueryError::InvalidLimit(_)) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Query(QueryError::Store(_)) | ApiError::Task(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = if status == StatusCode::BAD_REQUEST {
            json!({ "error": self.to_string() })
        } else {
            // Read failures keep the list shape, with `error` set.
            json!({ "count": 0, "messages": [], "error": self.to_string() })
        };
        (status, Json(body)).into_response()
    }
}
