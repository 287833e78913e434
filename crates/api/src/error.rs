//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use orchestrator::OrchestratorError;

/// API-level error type that maps to HTTP responses.
///
/// Responses carry a stable code alongside the message:
/// `{"error": {"code": "...", "message": "..."}}`.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Orchestration error.
    Orchestrator(OrchestratorError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "ORDER_NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "VALIDATION", msg),
            ApiError::Orchestrator(err) => orchestrator_error_to_response(err),
        };

        let body = serde_json::json!({ "error": { "code": code, "message": message } });
        (status, axum::Json(body)).into_response()
    }
}

fn orchestrator_error_to_response(err: OrchestratorError) -> (StatusCode, &'static str, String) {
    match &err {
        OrchestratorError::Domain(_) => (StatusCode::BAD_REQUEST, "VALIDATION", err.to_string()),
        OrchestratorError::NameUnavailable(_) => {
            (StatusCode::CONFLICT, "NAME_UNAVAILABLE", err.to_string())
        }
        OrchestratorError::OrderNotFound(_) => {
            (StatusCode::NOT_FOUND, "ORDER_NOT_FOUND", err.to_string())
        }
        OrchestratorError::RetryNotAllowed { .. } => {
            (StatusCode::BAD_REQUEST, "RETRY_NOT_ALLOWED", err.to_string())
        }
        OrchestratorError::Payment(_) => {
            (StatusCode::BAD_GATEWAY, "PAYMENT_ERROR", err.to_string())
        }
        _ => {
            tracing::error!(error = %err, "internal server error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL",
                "Something went wrong".to_string(),
            )
        }
    }
}

impl From<OrchestratorError> for ApiError {
    fn from(err: OrchestratorError) -> Self {
        ApiError::Orchestrator(err)
    }
}
