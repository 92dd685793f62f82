//! cadkit script - Rhai part scripts
//!
//! A part script builds shapes and hands them out by name. Run directly, its
//! exports are written to the output directory. Imported from another
//! script, it runs under a capture and stops as soon as the requested name
//! is exported.
//!
//! ## Example Script
//!
//! ```rhai
//! fn hook(width) {
//!     let base = cuboid(width, 10.0, 2.0);
//!     let arm = cuboid(width, 2.0, 12.0).align(base, "<X >Y :>Z");
//!     base.union(arm)
//! }
//!
//! let plate = import_part("command_strip_plate.rhai", "flat-female");
//! let part = cached(Fn("hook"), [30.0]).align(plate, "-X -Y :>Z");
//!
//! part.export_part("hook");
//! show(part.union(plate));
//! ```
//!
//! Numbers passed to shape functions are floats (`10.0`, not `10`); option
//! maps such as `#{ dx: 1 }` accept either.

pub mod cache_bridge;
pub mod capture;
pub mod config;
pub mod engine;
pub mod part_api;
pub mod runner;
pub mod shape_api;
pub mod store;
pub mod workshop;

mod error;

pub use capture::{CaptureGuard, CaptureSession, CaptureStack, EarlyExit};
pub use config::WorkshopConfig;
pub use engine::{PartRun, ScriptEngine};
pub use error::PartError;
pub use part_api::register_part_api;
pub use runner::ScriptOutcome;
pub use shape_api::register_shape_api;
pub use store::ArtifactStore;
pub use workshop::{ScriptFrame, Workshop};

// Re-export for convenience
pub use cadkit_core::Shape;
