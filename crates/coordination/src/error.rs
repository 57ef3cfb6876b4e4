//! Coordination store error types.

use thiserror::Error;

/// Coordination store operation errors.
#[derive(Debug, Error)]
pub enum CoordinationError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for coordination store operations.
pub type CoordinationResult<T> = std::result::Result<T, CoordinationError>;
