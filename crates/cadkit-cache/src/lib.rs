//! # cadkit cache
//!
//! Memoizes expensive part builders on disk. A builder call is identified by
//! a [`CacheKey`] derived from the builder's identity and its arguments; the
//! built [`Artifact`](cadkit_core::Artifact) is stored under that key and
//! returned directly on later calls.
//!
//! ```rust,ignore
//! use cadkit_cache::{ArtifactCache, BuilderId, CacheCall, CacheError};
//! use cadkit_core::Shape;
//!
//! let cache = ArtifactCache::at("/tmp/parts-cache");
//! let call = CacheCall::new(BuilderId::new("washer").with_version(2))
//!     .arg(12.0)
//!     .kwarg("thickness", 1.5);
//!
//! let washer = cache.get_or_build_shape(&call, || {
//!     Ok::<_, CacheError>(Shape::cylinder(1.5, 12.0).cut(&Shape::cylinder(2.0, 4.0)))
//! })?;
//! ```

pub mod config;
pub mod key;
pub mod store;

mod error;

pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use key::{BuilderId, CacheArg, CacheCall, CacheKey, KEY_FORMAT_VERSION, digest_bytes, digest_hex};
pub use store::{ArtifactCache, CacheEntry, write_atomic};
