//! Storage gateway error types.

use thiserror::Error;

/// Storage gateway operation errors.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("bucket not found: {0}")]
    NotFound(String),

    #[error("bucket already exists: {0}")]
    AlreadyExists(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("S3 error: {0}")]
    S3(#[from] Box<dyn std::error::Error + Send + Sync>),

    #[error("invalid bucket name: {0}")]
    InvalidBucket(String),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for storage gateway operations.
pub type GatewayResult<T> = std::result::Result<T, GatewayError>;
