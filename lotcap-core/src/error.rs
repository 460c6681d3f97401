//! Common error types for lotcap

use thiserror::Error;

/// Common result type for lotcap operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type shared by the calculator and the cache layers
///
/// Missing optional zoning data is deliberately NOT an error: a constraint
/// that cannot be evaluated becomes a skip note on the analysis and lowers
/// its confidence. Errors are reserved for invalid input, storage failures,
/// and exhausted waits on in-flight computations.
#[derive(Error, Debug)]
pub enum Error {
    /// Negative/non-finite numeric input, missing required geometry,
    /// or a malformed district key. Rejected before evaluation.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The caller-supplied parameter provider failed. Waiters on the same
    /// cache key receive this instead of re-running the provider.
    #[error("Parameter provider error: {0}")]
    Provider(String),

    /// Timed out waiting for another caller's in-flight computation.
    /// Transient: retry later. The wait never starts a duplicate computation.
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization error (wraps serde_json::Error)
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
