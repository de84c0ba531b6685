//! HTTP error responses.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use flowchart::FlowChartError;
use thiserror::Error;

/// An error surfaced to the HTTP caller as `{"error": "<message>"}`.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, message: message.into() }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self { status: StatusCode::NOT_FOUND, message: message.into() }
    }
}

impl From<FlowChartError> for ApiError {
    fn from(err: FlowChartError) -> Self {
        match err {
            FlowChartError::NotFound(_) => ApiError::not_found(err.to_string()),
            FlowChartError::Validation(_)
            | FlowChartError::DuplicateNodeId(_)
            | FlowChartError::UnknownNodeReference { .. } => ApiError::bad_request(err.to_string()),
        }
    }
}

/// Unparsable or mistyped request bodies are reported like any other bad
/// request instead of axum's plain-text rejection.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}
