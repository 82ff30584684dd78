//! Error types for multifetch
//!
//! This module provides the error handling for the library:
//! - Configuration errors that fail fast before any task is launched
//! - Transport errors (connect, read, write, local file I/O)
//! - Protocol errors (malformed frames, oversized file names)
//!
//! Per-task failures never surface as errors to the caller — a task converts
//! every failure into its own `Failed` terminal state. These types are used
//! at construction time and inside the tasks themselves.

use thiserror::Error;

/// Result type alias for multifetch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for multifetch
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "read_chunk_size")
        key: Option<String>,
    },

    /// Failed to open a connection to the server
    #[error("failed to connect to {endpoint}: {source}")]
    Connect {
        /// The `host:port` target that could not be reached
        endpoint: String,
        /// The underlying socket error
        source: std::io::Error,
    },

    /// I/O error (socket read/write or local file write)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Wire protocol violation
    #[error("protocol error: {0}")]
    Protocol(String),

    /// A bounded operation exceeded its deadline
    #[error("timed out during {0}")]
    Timeout(String),

    /// The download was cancelled before reaching a natural terminal state
    #[error("download cancelled")]
    Cancelled,
}

impl Error {
    /// Build a configuration error for a specific key.
    pub(crate) fn config(key: &str, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.to_string()),
        }
    }
}
