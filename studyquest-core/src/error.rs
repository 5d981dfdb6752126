//! Error types for the StudyQuest core library.

use thiserror::Error;

use crate::types::RecordId;

/// Top-level error type for all StudyQuest operations.
#[derive(Error, Debug)]
pub enum QuestError {
    /// Caller input was rejected before any state changed.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A record with the given ID does not exist.
    ///
    /// Only surfaced when strict removal is enabled; by default a missing
    /// record is a no-op.
    #[error("Record not found: {0}")]
    RecordNotFound(RecordId),

    /// The character row moved on since it was read.
    #[error("Snapshot version conflict: expected version {expected}")]
    Conflict {
        /// Version the writer read before computing its update.
        expected: i64,
    },

    /// A persisted row violates a domain invariant.
    #[error("Invalid persisted data: {0}")]
    InvalidData(String),

    /// SQLite persistence error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl QuestError {
    /// Short machine-readable tag for this error, used by boundary layers.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::RecordNotFound(_) => "not_found",
            Self::Conflict { .. } => "conflict",
            Self::InvalidData(_) => "invalid_data",
            Self::Database(_) => "storage",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
        }
    }

    /// Whether retrying the same operation may succeed.
    ///
    /// True for version conflicts and for SQLite busy/locked failures.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Conflict { .. } => true,
            Self::Database(rusqlite::Error::SqliteFailure(err, _)) => matches!(
                err.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            ),
            _ => false,
        }
    }
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, QuestError>;
