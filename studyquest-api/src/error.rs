//! Boundary error type and its JSON shape.

use serde::Serialize;
use studyquest_core::QuestError;
use thiserror::Error;

/// Errors surfaced to API callers.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The engine rejected or failed the operation.
    #[error(transparent)]
    Quest(#[from] QuestError),

    /// The request could not be decoded.
    #[error("malformed request: {0}")]
    BadRequest(String),

    /// A retryable failure persisted through every attempt.
    #[error("gave up after {attempts} attempts: {source}")]
    RetriesExhausted {
        /// Attempts made, including the first.
        attempts: u32,
        /// The last failure.
        #[source]
        source: QuestError,
    },
}

impl ApiError {
    /// Stable machine-readable kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Quest(err) => err.kind(),
            Self::BadRequest(_) => "bad_request",
            Self::RetriesExhausted { .. } => "busy",
        }
    }

    /// The `{success: false, reason, kind}` body for this error.
    #[must_use]
    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            success: false,
            reason: self.to_string(),
            kind: self.kind(),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::BadRequest(err.to_string())
    }
}

/// Serialized failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    /// Always `false`.
    pub success: bool,
    /// Human-readable cause.
    pub reason: String,
    /// Machine-readable cause.
    pub kind: &'static str,
}

/// Result alias for boundary operations.
pub type Result<T> = std::result::Result<T, ApiError>;
