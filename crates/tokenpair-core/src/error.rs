//! Error types for `tokenpair` core library.

use thiserror::Error;

/// Result type alias using the core `Error`.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for `tokenpair` operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Global tracing subscriber could not be installed
    #[error("Tracing setup error: {0}")]
    Tracing(String),

    /// Layered configuration did not deserialize
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
