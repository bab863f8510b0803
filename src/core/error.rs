use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};

use crate::store::{StoreError, StoreErrorKind};

/// Application-wide Result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Main application error type
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    /// Caller supplied a malformed or incomplete domain object.
    /// Raised before any store I/O is attempted.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Failure reported by the document store, surfaced unmodified
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        let error_message = self.to_string();

        HttpResponse::build(status_code).json(serde_json::json!({
            "error": {
                "message": error_message,
                "code": status_code.as_u16(),
            }
        }))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Store(err) => store_status_code(err.kind),
            AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Json(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn store_status_code(kind: StoreErrorKind) -> StatusCode {
    match kind {
        StoreErrorKind::NotFound => StatusCode::NOT_FOUND,
        StoreErrorKind::Conflict => StatusCode::CONFLICT,
        StoreErrorKind::PreconditionFailed => StatusCode::PRECONDITION_FAILED,
        StoreErrorKind::Throttled => StatusCode::TOO_MANY_REQUESTS,
        StoreErrorKind::BadRequest => StatusCode::BAD_REQUEST,
        StoreErrorKind::Unavailable | StoreErrorKind::Transport => StatusCode::SERVICE_UNAVAILABLE,
        StoreErrorKind::Unauthorized
        | StoreErrorKind::Serialization
        | StoreErrorKind::Other => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// Helper functions for common error scenarios
impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        AppError::NotFound(resource.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        AppError::Configuration(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }

    /// True when the store reported the addressed document as missing
    pub fn is_store_not_found(&self) -> bool {
        matches!(self, AppError::Store(err) if err.is_not_found())
    }
}
