//! # cadkit core
//!
//! Immutable solid shapes and the geometry helpers part scripts are built
//! from.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cadkit_core::prelude::*;
//!
//! let plate = Shape::cuboid(60.0, 40.0, 2.0);
//! let post = Shape::cylinder(20.0, 4.0)
//!     .align(&plate, "-X -Y :>Z")?;
//!
//! let part = plate.union(&post);
//! println!("{:?}", part.bounding_box());
//! ```
//!
//! ## Units and Conventions
//!
//! - **Distances**: millimetres by convention, nothing enforces it
//! - **Angles**: rotation helpers take **degrees**
//! - **Precision**: all geometry uses `f64`
//! - **Coordinate system**: right-handed, Z-up; cylinders and tori are built
//!   around the Z axis

pub mod align;
pub mod artifact;
pub mod bbox;
pub mod compose;
pub mod shape;

mod error;

pub use align::{FaceMode, FaceSpec, align};
pub use artifact::{Artifact, ArtifactKind, Compound};
pub use bbox::{Axis, BoundingBox, Side};
pub use compose::{ShapeExt, measure, repeat, solid_box, surface_grow, union_all};
pub use error::{Error, Result};
pub use shape::{BooleanOp, Shape, Solid};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::align::{FaceMode, FaceSpec, align};
    pub use crate::artifact::{Artifact, ArtifactKind, Compound};
    pub use crate::bbox::{Axis, BoundingBox, Side};
    pub use crate::compose::{ShapeExt, union_all};
    pub use crate::shape::{BooleanOp, Shape};

    // Math (re-export glam)
    pub use glam::DVec3;

    // Error handling
    pub use crate::{Error, Result};
}
