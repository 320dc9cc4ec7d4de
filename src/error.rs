//! Error types for filerelay.

use thiserror::Error;

/// Common error type for filerelay.
#[derive(Error, Debug)]
pub enum RelayError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Validation error for caller input (missing or unsafe parameters).
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Upload exceeded the configured size limit (in bytes).
    #[error("payload exceeds limit of {0} bytes")]
    PayloadTooLarge(u64),

    /// Directory listing produced no files.
    #[error("no files found in path {0}")]
    EmptyDirectory(String),

    /// Outbound forwarding error.
    #[error("forward error: {0}")]
    Forward(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for RelayError {
    fn from(e: reqwest::Error) -> Self {
        RelayError::Forward(e.to_string())
    }
}

/// Result type alias for filerelay operations.
pub type Result<T> = std::result::Result<T, RelayError>;
