//! Shared state behind a running part script
//!
//! One `Workshop` is shared (through `Arc`) by the engine and every native
//! function it registers. It holds the capture stack, the stack of scripts
//! currently executing, the `show` guard and the export log of the current
//! top-level run.
//!
//! Locks are only taken for short bookkeeping steps and are never held while
//! script code runs, so nested imports can reach the same state.

use crate::capture::{CaptureStack, EarlyExit};
use crate::config::WorkshopConfig;
use crate::error::PartError;
use crate::store::ArtifactStore;
use cadkit_cache::{ArtifactCache, digest_hex};
use cadkit_core::Shape;
use parking_lot::Mutex;
use std::path::{Path, PathBuf};

/// Stem used when exporting outside any script file
const ANONYMOUS_STEM: &str = "part";

/// A script that is currently executing
#[derive(Debug, Clone)]
pub struct ScriptFrame {
    pub path: PathBuf,
    pub stem: String,
    /// BLAKE3 digest of the script source
    pub digest: String,
}

pub struct Workshop {
    config: WorkshopConfig,
    cache: ArtifactCache,
    store: ArtifactStore,
    captures: CaptureStack,
    frames: Mutex<Vec<ScriptFrame>>,
    shown: Mutex<Option<Shape>>,
    exported: Mutex<Vec<PathBuf>>,
}

impl Workshop {
    pub fn new(config: WorkshopConfig) -> Self {
        Self {
            cache: ArtifactCache::new(&config.cache),
            store: ArtifactStore::new(&config.out_dir),
            captures: CaptureStack::new(),
            frames: Mutex::new(Vec::new()),
            shown: Mutex::new(None),
            exported: Mutex::new(Vec::new()),
            config,
        }
    }

    pub fn config(&self) -> &WorkshopConfig {
        &self.config
    }

    pub fn cache(&self) -> &ArtifactCache {
        &self.cache
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub fn captures(&self) -> &CaptureStack {
        &self.captures
    }

    /// Resolve an `import_part` path against the parts directory
    pub fn resolve_part(&self, script: impl AsRef<Path>) -> PathBuf {
        let path = script.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.config.parts_dir.join(path)
        }
    }

    // === Script frames ===

    /// Mark `path` as executing until the guard drops.
    ///
    /// Fails with [`PartError::ImportCycle`] if `path` is already executing
    /// further up the stack.
    pub fn enter_script(&self, path: &Path, source: &str) -> Result<FrameGuard<'_>, PartError> {
        let path = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        let stem = path
            .file_stem()
            .map_or_else(|| ANONYMOUS_STEM.to_string(), |s| s.to_string_lossy().into_owned());

        let mut frames = self.frames.lock();
        if let Some(start) = frames.iter().position(|f| f.path == path) {
            let mut chain: Vec<PathBuf> = frames[start..].iter().map(|f| f.path.clone()).collect();
            chain.push(path);
            return Err(PartError::ImportCycle { chain });
        }
        frames.push(ScriptFrame {
            path,
            stem,
            digest: digest_hex(source.as_bytes()),
        });
        Ok(FrameGuard { shop: self })
    }

    pub fn current_frame(&self) -> Option<ScriptFrame> {
        self.frames.lock().last().cloned()
    }

    pub fn script_depth(&self) -> usize {
        self.frames.lock().len()
    }

    // === Top-level run state ===

    /// Forget the previous run's shown shape and exports
    pub fn begin_run(&self) {
        *self.shown.lock() = None;
        self.exported.lock().clear();
    }

    pub fn shown(&self) -> Option<Shape> {
        self.shown.lock().clone()
    }

    pub fn exported(&self) -> Vec<PathBuf> {
        self.exported.lock().clone()
    }

    /// Export `shape` under `name` (empty for untitled).
    ///
    /// Under a capture the shape is recorded and the exit signal returned
    /// when it is the wanted one. Otherwise it is written to the store.
    pub fn export(&self, shape: &Shape, name: &str) -> Result<Option<EarlyExit>, PartError> {
        if self.captures.is_active() {
            return Ok(self.captures.record(name, shape.clone()));
        }

        let stem = self
            .current_frame()
            .map_or_else(|| ANONYMOUS_STEM.to_string(), |f| f.stem);
        let path = self.store.persist(&stem, name, shape)?;
        tracing::info!("Exported {}", path.display());
        self.exported.lock().push(path);
        Ok(None)
    }

    /// Display hook. Only the first call of a top-level run counts; calls
    /// made while importing are ignored.
    pub fn show(&self, shape: &Shape) {
        if self.captures.is_active() {
            return;
        }
        let mut shown = self.shown.lock();
        if shown.is_none() {
            let size = shape.bounding_box().size();
            tracing::info!("Showing part ({:.2} x {:.2} x {:.2})", size.x, size.y, size.z);
            *shown = Some(shape.clone());
        }
    }
}

impl std::fmt::Debug for Workshop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workshop")
            .field("config", &self.config)
            .field("capture_depth", &self.captures.depth())
            .field("script_depth", &self.script_depth())
            .finish_non_exhaustive()
    }
}

/// Pops its script frame when dropped
pub struct FrameGuard<'a> {
    shop: &'a Workshop,
}

impl Drop for FrameGuard<'_> {
    fn drop(&mut self) {
        self.shop.frames.lock().pop();
    }
}
