//! On-disk artifact cache
//!
//! Each entry is one JSON file named after its key. Entries are written to a
//! temporary file in the cache directory and renamed into place, so a reader
//! sees either the complete entry or none at all.

use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::key::{CacheCall, CacheKey};
use cadkit_core::{Artifact, ArtifactKind, Shape};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Version of the entry file layout
pub const ENTRY_FORMAT: u32 = 1;

const ENTRY_EXTENSION: &str = "json";

/// The record stored in each entry file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub format: u32,
    pub kind: ArtifactKind,
    /// Native serialization of the artifact
    pub payload: String,
}

impl CacheEntry {
    pub fn from_artifact(artifact: &Artifact) -> Result<Self> {
        let payload = String::from_utf8(artifact.to_payload()?).map_err(io::Error::other)?;
        Ok(Self {
            format: ENTRY_FORMAT,
            kind: artifact.kind(),
            payload,
        })
    }

    pub fn to_artifact(&self) -> cadkit_core::Result<Artifact> {
        Artifact::from_payload(self.kind, self.payload.as_bytes())
    }
}

/// Content-addressed store of built artifacts
#[derive(Debug, Clone)]
pub struct ArtifactCache {
    root: PathBuf,
    enabled: bool,
}

impl ArtifactCache {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            root: config.dir.clone(),
            enabled: config.enabled,
        }
    }

    /// An enabled cache rooted at `root`
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            enabled: true,
        }
    }

    /// A cache that always builds and never touches disk
    pub fn disabled() -> Self {
        Self {
            root: PathBuf::new(),
            enabled: false,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.root.join(format!("{key}.{ENTRY_EXTENSION}"))
    }

    /// Load an entry. `Ok(None)` when absent, `Corrupted` when undecodable.
    pub fn load(&self, key: &CacheKey) -> Result<Option<Artifact>> {
        let path = self.path_for(key);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            // A root that is not a directory holds no entries; writing will
            // report the real problem
            Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory) => {
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let corrupted = |reason: String| CacheError::Corrupted {
            path: path.clone(),
            reason,
        };

        let entry: CacheEntry =
            serde_json::from_slice(&bytes).map_err(|e| corrupted(e.to_string()))?;
        if entry.format != ENTRY_FORMAT {
            return Err(corrupted(format!(
                "entry format {} (expected {ENTRY_FORMAT})",
                entry.format
            )));
        }
        let artifact = entry.to_artifact().map_err(|e| corrupted(e.to_string()))?;
        Ok(Some(artifact))
    }

    /// Write an entry atomically and return its path
    pub fn store(&self, key: &CacheKey, artifact: &Artifact) -> Result<PathBuf> {
        let bytes = encode_entry(artifact)?;
        let path = self.path_for(key);
        write_atomic(&path, &bytes)?;
        Ok(path)
    }

    /// Return the cached artifact for `call`, building and storing it on a
    /// miss.
    ///
    /// A failed write yields [`CacheError::WriteFailed`] carrying the built
    /// artifact. Builder errors pass through untouched.
    pub fn get_or_build<F, E>(&self, call: &CacheCall, build: F) -> std::result::Result<Artifact, E>
    where
        F: FnOnce() -> std::result::Result<Artifact, E>,
        E: From<CacheError>,
    {
        if !self.enabled {
            return build();
        }

        let key = call.key()?;
        if let Some(artifact) = self.load(&key)? {
            tracing::debug!("Cache hit for {} ({})", call.builder.name, key);
            return Ok(artifact);
        }

        tracing::debug!("Cache miss for {} ({}), building", call.builder.name, key);
        let artifact = build()?;

        let bytes = encode_entry(&artifact)?;
        let path = self.path_for(&key);
        match write_atomic(&path, &bytes) {
            Ok(()) => {
                tracing::debug!("Cached {} at {}", call.builder.name, path.display());
                Ok(artifact)
            }
            Err(source) => Err(CacheError::WriteFailed {
                path,
                artifact: Box::new(artifact),
                source,
            }
            .into()),
        }
    }

    /// [`ArtifactCache::get_or_build`] for builders of a single solid
    pub fn get_or_build_shape<F, E>(&self, call: &CacheCall, build: F) -> std::result::Result<Shape, E>
    where
        F: FnOnce() -> std::result::Result<Shape, E>,
        E: From<CacheError>,
    {
        match self.get_or_build(call, || build().map(Artifact::Solid))? {
            Artifact::Solid(shape) => Ok(shape),
            Artifact::Compound(_) => Err(CacheError::Corrupted {
                path: call.key().map(|k| self.path_for(&k)).unwrap_or_default(),
                reason: "expected a solid, found a compound".to_string(),
            }
            .into()),
        }
    }

    /// Keys of every entry on disk, sorted
    pub fn entries(&self) -> Result<Vec<CacheKey>> {
        let dir = match fs::read_dir(&self.root) {
            Ok(dir) => dir,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut keys = Vec::new();
        for entry in dir {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(ENTRY_EXTENSION) {
                continue;
            }
            if let Some(key) = path.file_stem().and_then(|s| s.to_str()).and_then(CacheKey::parse) {
                keys.push(key);
            }
        }
        keys.sort();
        Ok(keys)
    }

    /// Delete every entry, returning how many were removed
    pub fn clear(&self) -> Result<usize> {
        let keys = self.entries()?;
        for key in &keys {
            fs::remove_file(self.path_for(key))?;
        }
        tracing::debug!("Cleared {} cache entries from {}", keys.len(), self.root.display());
        Ok(keys.len())
    }
}

fn encode_entry(artifact: &Artifact) -> Result<Vec<u8>> {
    let entry = CacheEntry::from_artifact(artifact)?;
    serde_json::to_vec_pretty(&entry).map_err(|e| CacheError::Core(e.into()))
}

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Write `bytes` to `path` through a temporary sibling and a rename.
///
/// Parent directories are created as needed. The temporary name is unique
/// per process and call, so concurrent writers never share one.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    fs::create_dir_all(dir)?;

    let name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no file name"))?;
    let temp = dir.join(format!(
        ".{}.{}.{}.tmp",
        name.to_string_lossy(),
        std::process::id(),
        TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));

    let result = fs::write(&temp, bytes).and_then(|()| fs::rename(&temp, path));
    if result.is_err() {
        let _ = fs::remove_file(&temp);
    }
    result
}
