//! Error types for the core domain.

use thiserror::Error;

/// Core domain error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid site name: {0}")]
    InvalidSiteName(String),

    #[error("invalid user id: {0}")]
    InvalidUserId(String),

    #[error("invalid site key: {0}")]
    InvalidSiteKey(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
