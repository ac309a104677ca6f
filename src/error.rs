//! Error types for tabletkv
//!
//! Provides a unified error type for all operations.
//!
//! A missing key is not an error: lookups return `Ok(None)`, and a
//! deleted key surfaces as a tombstoned [`KeyValue`](crate::KeyValue).

use thiserror::Error;

/// Result type alias using KvError
pub type Result<T> = std::result::Result<T, KvError>;

/// Unified error type for tabletkv operations
#[derive(Debug, Error)]
pub enum KvError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Encoding Errors
    // -------------------------------------------------------------------------
    /// Malformed encoding local to one decode call: bad type tag,
    /// truncated buffer, log record checksum or sequencing failure.
    #[error("Format error: {0}")]
    Format(String),

    // -------------------------------------------------------------------------
    // Container Errors
    // -------------------------------------------------------------------------
    /// Structural corruption of a tablet. The tablet is treated as corrupt.
    #[error("Tablet validation error: {0}")]
    Validation(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl KvError {
    pub(crate) fn format(msg: impl Into<String>) -> Self {
        KvError::Format(msg.into())
    }

    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        KvError::Validation(msg.into())
    }
}
