//! Persistent storage for exported parts

use crate::error::PartError;
use cadkit_cache::write_atomic;
use cadkit_core::Shape;
use std::path::{Path, PathBuf};

/// Extension of exported part files
pub const PART_EXTENSION: &str = "json";

/// Writes exported shapes as `{stem}-{name}.json`, or `{stem}.json` for the
/// untitled export, under one root directory
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, stem: &str, name: &str) -> PathBuf {
        if name.is_empty() {
            self.root.join(format!("{stem}.{PART_EXTENSION}"))
        } else {
            self.root.join(format!("{stem}-{name}.{PART_EXTENSION}"))
        }
    }

    pub fn persist(&self, stem: &str, name: &str, shape: &Shape) -> Result<PathBuf, PartError> {
        let path = self.path_for(stem, name);
        let bytes = shape.to_bytes()?;
        write_atomic(&path, &bytes).map_err(|source| PartError::Persist {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    /// Read back a part written by [`ArtifactStore::persist`]
    pub fn load(&self, stem: &str, name: &str) -> Result<Shape, PartError> {
        let path = self.path_for(stem, name);
        let bytes = std::fs::read(&path).map_err(|source| PartError::Persist {
            path: path.clone(),
            source,
        })?;
        Ok(Shape::from_bytes(&bytes)?)
    }
}
