//! # Error Handling
//!
//! This module defines custom error types and how they're converted to HTTP responses.
//!
//! ## Error Categories:
//! - **Internal**: Server-side problems (500 errors)
//! - **BadRequest / ValidationError**: Client sent invalid data (400 errors)
//! - **NotFound**: Requested resource doesn't exist (404 errors)
//! - **ConfigError**: Configuration problems (500 errors)
//! - **Upstream**: The external speech API failed or was unreachable (502 errors)
//! - **Storage**: Filesystem operations on the recording directories failed (500 errors)
//!
//! ## JSON Response Format:
//! All errors return JSON with a consistent structure:
//! ```json
//! {
//!   "error": {
//!     "type": "upstream_error",
//!     "message": "transcription request failed: 401 Unauthorized",
//!     "timestamp": "2025-01-01T12:00:00Z"
//!   }
//! }
//! ```

use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use std::fmt;

/// Custom error types for the application.
///
/// Each variant carries a human-readable message that ends up in the JSON
/// error envelope. Handlers return `AppResult<HttpResponse>` and rely on the
/// `ResponseError` impl below for the HTTP mapping.
#[derive(Debug)]
pub enum AppError {
    /// Internal server errors (lock poisoning, unexpected states, etc.)
    Internal(String),

    /// Client sent invalid or malformed data
    BadRequest(String),

    /// Requested resource was not found (e.g., unknown voice sample id)
    NotFound(String),

    /// Configuration file or environment variable problems
    ConfigError(String),

    /// User input failed validation rules
    ValidationError(String),

    /// The upstream speech API returned an error or could not be reached
    Upstream(String),

    /// Reading or writing the local recording directories failed
    Storage(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            AppError::Upstream(msg) => write!(f, "Upstream error: {}", msg),
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

/// Converts our custom errors into HTTP responses that clients can understand.
///
/// ## HTTP Status Code Mapping:
/// - Internal/ConfigError/Storage → 500 (Internal Server Error)
/// - BadRequest/ValidationError → 400 (Bad Request)
/// - NotFound → 404 (Not Found)
/// - Upstream → 502 (Bad Gateway)
impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let (status, error_type, message) = match self {
            AppError::Internal(msg) => (
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                msg.clone(),
            ),
            AppError::BadRequest(msg) => (
                actix_web::http::StatusCode::BAD_REQUEST,
                "bad_request",
                msg.clone(),
            ),
            AppError::NotFound(msg) => (
                actix_web::http::StatusCode::NOT_FOUND,
                "not_found",
                msg.clone(),
            ),
            AppError::ConfigError(msg) => (
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                "config_error",
                msg.clone(),
            ),
            AppError::ValidationError(msg) => (
                actix_web::http::StatusCode::BAD_REQUEST,
                "validation_error",
                msg.clone(),
            ),
            AppError::Upstream(msg) => (
                actix_web::http::StatusCode::BAD_GATEWAY,
                "upstream_error",
                msg.clone(),
            ),
            AppError::Storage(msg) => (
                actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
                "storage_error",
                msg.clone(),
            ),
        };

        HttpResponse::build(status).json(json!({
            "error": {
                "type": error_type,
                "message": message,
                "timestamp": chrono::Utc::now().to_rfc3339()
            }
        }))
    }
}

/// Automatic conversion from anyhow::Error to AppError.
///
/// The anyhow crate is used for general-purpose error handling inside the
/// non-HTTP modules; anything that bubbles up unclassified becomes a 500.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// JSON parsing errors are almost always due to the client sending malformed
/// data, so they map to 400 rather than 500.
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(format!("JSON parsing error: {}", err))
    }
}

/// Configuration loading can fail for various reasons (missing files, invalid
/// syntax, etc.); these are server-side issues.
impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(err.to_string())
    }
}

/// Transport-level failures talking to the speech API (connection refused,
/// timeouts, TLS errors) are upstream errors. HTTP-level upstream failures
/// are constructed explicitly in the speech client with status details.
impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Upstream(err.to_string())
    }
}

/// Filesystem failures on the recording/fingerprint directories.
impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

/// Type alias for Results that use our custom error type.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;

    /// Each error variant must map to its documented HTTP status.
    #[test]
    fn test_status_code_mapping() {
        let cases = [
            (AppError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (AppError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (AppError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (AppError::ConfigError("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (AppError::ValidationError("x".into()), StatusCode::BAD_REQUEST),
            (AppError::Upstream("x".into()), StatusCode::BAD_GATEWAY),
            (AppError::Storage("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(err.error_response().status(), expected, "{}", err);
        }
    }

    #[test]
    fn test_display_includes_message() {
        let err = AppError::Upstream("503 Service Unavailable".to_string());
        assert!(err.to_string().contains("503 Service Unavailable"));
    }
}
