//! API error type and helpers.
//!
//! # Purpose and responsibility
//! Centralizes HTTP error response construction so every endpoint answers
//! failures with the same `{ "error", "code" }` body.
//!
//! # Key invariants and assumptions
//! - `status` matches the category named by `code`.
//! - Internal errors are logged server-side; the body carries only the
//!   caller-facing message.
use crate::api::types::ErrorResponse;
use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use std::fmt::Display;

/// Structured API error returned by handlers.
///
/// # Example
/// ```rust
/// use axum::http::StatusCode;
/// use folio::api::error::api_not_found;
///
/// let err = api_not_found("Projects not found");
/// assert_eq!(err.status, StatusCode::NOT_FOUND);
/// ```
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self.body)).into_response()
    }
}

fn api_error(status: StatusCode, code: &str, message: &str) -> ApiError {
    ApiError {
        status,
        body: ErrorResponse {
            error: message.to_string(),
            code: code.to_string(),
        },
    }
}

/// Build a 404 Not Found error.
pub fn api_not_found(message: &str) -> ApiError {
    api_error(StatusCode::NOT_FOUND, "not_found", message)
}

/// Build a 400 Bad Request error for malformed or missing input.
pub fn api_bad_request(message: &str) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, "bad_request", message)
}

/// Build a 403 Forbidden error.
pub fn api_forbidden(message: &str) -> ApiError {
    api_error(StatusCode::FORBIDDEN, "forbidden", message)
}

/// Build a 500 Internal Server Error, logging the underlying cause.
pub fn api_internal(message: &str, err: &dyn Display) -> ApiError {
    tracing::error!(error = %err, "{message}");
    api_internal_message(message)
}

/// Build a 500 Internal Server Error with no underlying cause to log.
pub fn api_internal_message(message: &str) -> ApiError {
    api_error(StatusCode::INTERNAL_SERVER_ERROR, "internal", message)
}
