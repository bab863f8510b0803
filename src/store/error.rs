use std::fmt;

/// Result type for document store calls
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Classification of a document store failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    /// No document (or container) at the addressed id + partition
    NotFound,
    /// A document with the same id already exists in the partition
    Conflict,
    PreconditionFailed,
    /// Request rate too large
    Throttled,
    Unauthorized,
    /// Malformed request, e.g. a partition key that does not match the document
    BadRequest,
    /// Service unavailable or request timed out
    Unavailable,
    /// Connection-level failure before a response was received
    Transport,
    /// Response body could not be decoded
    Serialization,
    Other,
}

impl StoreErrorKind {
    /// Classify an HTTP status returned by the store
    pub fn from_status(status: u16) -> Self {
        match status {
            400 => StoreErrorKind::BadRequest,
            401 | 403 => StoreErrorKind::Unauthorized,
            404 => StoreErrorKind::NotFound,
            409 => StoreErrorKind::Conflict,
            412 => StoreErrorKind::PreconditionFailed,
            429 => StoreErrorKind::Throttled,
            408 | 449 | 503 => StoreErrorKind::Unavailable,
            _ => StoreErrorKind::Other,
        }
    }
}

impl fmt::Display for StoreErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StoreErrorKind::NotFound => "not_found",
            StoreErrorKind::Conflict => "conflict",
            StoreErrorKind::PreconditionFailed => "precondition_failed",
            StoreErrorKind::Throttled => "throttled",
            StoreErrorKind::Unauthorized => "unauthorized",
            StoreErrorKind::BadRequest => "bad_request",
            StoreErrorKind::Unavailable => "unavailable",
            StoreErrorKind::Transport => "transport",
            StoreErrorKind::Serialization => "serialization",
            StoreErrorKind::Other => "other",
        };
        f.write_str(name)
    }
}

/// Sub-status sent with a 404 when the database or collection that owns the
/// addressed document does not exist
pub const SUB_STATUS_OWNER_MISSING: u32 = 1003;

/// Failure returned by the document store, with whatever detail the
/// store provided (HTTP status, sub-status, error code).
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}{}: {message}", status_detail(.status, .sub_status))]
pub struct StoreError {
    pub kind: StoreErrorKind,
    pub status: Option<u16>,
    pub sub_status: Option<u32>,
    pub code: Option<String>,
    pub message: String,
}

impl StoreError {
    pub fn new(kind: StoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            sub_status: None,
            code: None,
            message: message.into(),
        }
    }

    /// Build an error from a non-success store response
    pub fn from_status(
        status: u16,
        sub_status: Option<u32>,
        code: Option<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind: StoreErrorKind::from_status(status),
            status: Some(status),
            sub_status,
            code,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::from_status(404, None, Some("NotFound".to_string()), message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::from_status(409, None, Some("Conflict".to_string()), message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::from_status(400, None, Some("BadRequest".to_string()), message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Transport, message)
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Serialization, message)
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == StoreErrorKind::NotFound
    }

    /// Not-found for the addressed document itself. A 404 caused by a
    /// missing database or collection does not qualify.
    pub fn is_document_not_found(&self) -> bool {
        self.is_not_found() && self.sub_status != Some(SUB_STATUS_OWNER_MISSING)
    }

    pub fn is_conflict(&self) -> bool {
        self.kind == StoreErrorKind::Conflict
    }
}

fn status_detail(status: &Option<u16>, sub_status: &Option<u32>) -> String {
    match (status, sub_status) {
        (Some(status), Some(sub_status)) => format!(" (status {}, sub-status {})", status, sub_status),
        (Some(status), None) => format!(" (status {})", status),
        (None, _) => String::new(),
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::serialization(err.to_string())
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            StoreError::new(StoreErrorKind::Unavailable, format!("request timed out: {}", err))
        } else if err.is_decode() {
            StoreError::serialization(err.to_string())
        } else {
            StoreError::transport(err.to_string())
        }
    }
}
