//! Cache errors

use cadkit_core::Artifact;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CacheError>;

#[derive(Error, Debug)]
pub enum CacheError {
    /// An entry exists but cannot be decoded. Never silently rebuilt.
    #[error("Corrupted cache entry {}: {reason}", path.display())]
    Corrupted { path: PathBuf, reason: String },

    /// The builder produced something that has no cache payload
    #[error("Unsupported cache type: builder returned {found}")]
    UnsupportedCacheType { found: String },

    /// An argument cannot be folded into a cache key
    #[error("Unsupported cache argument of type {found}")]
    UnsupportedArgument { found: String },

    /// The artifact was built but could not be written back.
    /// The artifact is still usable; see [`CacheError::into_artifact`].
    #[error("Failed to write cache entry {}: {source}", path.display())]
    WriteFailed {
        path: PathBuf,
        artifact: Box<Artifact>,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Core(#[from] cadkit_core::Error),

    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CacheError {
    /// Recover the freshly built artifact from a failed write
    pub fn into_artifact(self) -> Option<Artifact> {
        match self {
            CacheError::WriteFailed { artifact, .. } => Some(*artifact),
            _ => None,
        }
    }
}
