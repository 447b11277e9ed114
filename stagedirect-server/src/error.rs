//! Error types for stagedirect-server
//!
//! Every handler returns [`ApiResult`]; failures become a JSON body
//! `{"error": {"code", "message"}}` with the matching HTTP status.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::services::merge::MergeError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Conflict (409) - e.g., deleting a company that still hosts internships
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Merge rolled back after its first write (500)
    #[error("Merge aborted during {stage}: {message}")]
    MergeAborted { stage: String, message: String },

    /// Merge committed but the refreshed list could not be read (500)
    #[error("Merge committed, reload failed: {0}")]
    MergeReloadFailed(String),

    /// Operation exceeded its time budget (504)
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Storage failure (500)
    #[error("Database error: {0}")]
    Database(String),
}

impl From<stagedirect_common::Error> for ApiError {
    fn from(err: stagedirect_common::Error) -> Self {
        use stagedirect_common::Error;

        if err.is_foreign_key_violation() {
            return ApiError::Conflict("record is still referenced by other records".to_string());
        }
        if err.is_unique_violation() {
            return ApiError::Conflict("record already exists".to_string());
        }

        match err {
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            Error::Database(e) => ApiError::Database(e.to_string()),
            Error::Config(msg) => ApiError::Internal(format!("configuration: {}", msg)),
            Error::Io(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        stagedirect_common::Error::from(err).into()
    }
}

impl From<MergeError> for ApiError {
    fn from(err: MergeError) -> Self {
        match err {
            MergeError::Validation(msg) => ApiError::BadRequest(msg),
            MergeError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            MergeError::Aborted { stage, source } => ApiError::MergeAborted {
                stage: stage.to_string(),
                message: source.to_string(),
            },
            MergeError::ReloadFailed(source) => ApiError::MergeReloadFailed(source.to_string()),
            MergeError::Timeout(_) => ApiError::Timeout(err.to_string()),
            MergeError::Storage(source) => ApiError::Database(source.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::MergeAborted { stage, message } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "MERGE_ABORTED",
                format!("merge rolled back during {}: {}", stage, message),
            ),
            ApiError::MergeReloadFailed(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "MERGE_RELOAD_FAILED",
                format!("merge committed but the list could not be reloaded: {}", msg),
            ),
            ApiError::Timeout(msg) => (StatusCode::GATEWAY_TIMEOUT, "TIMEOUT", msg),
            ApiError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg)
            }
            ApiError::Database(msg) => {
                error!("Database error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR", msg)
            }
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
