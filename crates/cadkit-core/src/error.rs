//! Error types for cadkit geometry

use thiserror::Error;

/// Result type alias using cadkit's geometry Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in geometry operations
#[derive(Error, Debug)]
pub enum Error {
    /// An alignment token does not name a recognized axis and sign
    #[error("Malformed face spec {token:?}: {reason}")]
    MalformedFaceSpec { token: String, reason: &'static str },

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Native shape (de)serialization failed
    #[error("Shape serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
