//! Common error types for jockey

use thiserror::Error;

/// Common result type for jockey operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared across jockey processes
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Outbound HTTP delivery error
    #[error("HTTP error: {0}")]
    Http(String),

    /// Wire payload (de)serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
