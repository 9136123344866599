//! Error types for studio operations.

use thiserror::Error;

/// Result type for studio operations.
pub type StudioResult<T> = Result<T, StudioError>;

/// Errors that can occur in scene, ledger and progress operations.
#[derive(Debug, Error)]
pub enum StudioError {
    /// Object not found in the scene.
    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    /// Invalid operation on an object (e.g. touching the background).
    #[error("Invalid operation on object: {0}")]
    InvalidOperation(String),

    /// A raster or vector payload could not be decoded.
    #[error("Failed to decode payload: {0}")]
    Decode(String),

    /// A persisted layout is structurally invalid.
    #[error("Corrupt layout: {0}")]
    CorruptLayout(String),

    /// Scene serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The credit balance does not cover the requested amount.
    #[error("Insufficient credits: balance {balance}, required {required}")]
    InsufficientCredits {
        /// Balance at the time of the request.
        balance: u64,
        /// Amount that was requested.
        required: u64,
    },

    /// The key-value store failed to read or write.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<std::io::Error> for StudioError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}
