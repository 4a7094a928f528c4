//! Error types for the store module.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Event decoding error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Appended events do not continue the journal.
    #[error("event sequence gap: expected seq {expected}, got {got}")]
    SequenceGap { expected: u64, got: u64 },

    /// Invalid data in storage.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// A lock guarding the store was poisoned.
    #[error("store lock poisoned: {0}")]
    Lock(String),

    /// A blocking task failed to complete.
    #[error("blocking task failed: {0}")]
    Task(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),
}

impl From<lending_registry_core::CoreError> for StoreError {
    fn from(e: lending_registry_core::CoreError) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
