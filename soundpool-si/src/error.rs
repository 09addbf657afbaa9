//! Error types for soundpool-si
//!
//! Maps the filing-core taxonomy onto HTTP: validation failures are caller
//! errors (400), storage failures are environment errors (500). Every
//! failure leaves through the same JSON envelope.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::ingest::IngestError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Filing pipeline failure; status depends on the error kind
    #[error(transparent)]
    Ingest(#[from] IngestError),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error(transparent)]
    Other(#[from] anyhow::Error),

    /// soundpool-common error
    #[error("Common error: {0}")]
    Common(#[from] soundpool_common::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Ingest(err) => {
                let code = match &err {
                    IngestError::MissingField(_) => "MISSING_FIELD",
                    IngestError::EmptyPayload => "EMPTY_PAYLOAD",
                    IngestError::DirectoryCreateFailed { .. } => "DIRECTORY_CREATE_FAILED",
                    IngestError::WriteFailed { .. } => "WRITE_FAILED",
                    IngestError::ShortWrite { .. } => "SHORT_WRITE",
                    IngestError::NameAllocationFailed { .. } => "NAME_ALLOCATION_FAILED",
                };
                let status = if err.is_validation() {
                    StatusCode::BAD_REQUEST
                } else {
                    StatusCode::INTERNAL_SERVER_ERROR
                };
                (status, code, err.to_string())
            }
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
            ApiError::Io(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "IO_ERROR",
                err.to_string(),
            ),
            ApiError::Other(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                err.to_string(),
            ),
            ApiError::Common(ref err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "COMMON_ERROR",
                err.to_string(),
            ),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
