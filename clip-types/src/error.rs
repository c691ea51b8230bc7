//! Error types for clipsync wire handling.

use thiserror::Error;

/// Errors that can occur while encoding or decoding clipsync messages.
#[derive(Debug, Error)]
pub enum SyncError {
    /// JSON serialization failed
    #[error("serialization failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// JSON deserialization failed
    #[error("deserialization failed: {0}")]
    Deserialization(#[source] serde_json::Error),

    /// Wire object is not a JSON object
    #[error("wire message must be a JSON object")]
    NotAnObject,

    /// Invalid data format
    #[error("invalid data: {0}")]
    InvalidData(String),
}
