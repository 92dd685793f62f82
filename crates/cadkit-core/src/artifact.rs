//! Cacheable build results
//!
//! A builder produces either a single solid or a compound of several. Both
//! round-trip through a native byte payload tagged with their kind.

use crate::bbox::BoundingBox;
use crate::error::Result;
use crate::shape::{Shape, Solid, decode_json};
use serde::{Deserialize, Serialize};

/// Which variant a payload decodes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Solid,
    Compound,
}

/// Several solids kept side by side without fusing them
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Compound {
    parts: Vec<Shape>,
}

impl Compound {
    pub fn new(parts: Vec<Shape>) -> Self {
        Self { parts }
    }

    pub fn parts(&self) -> &[Shape] {
        &self.parts
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Box around every part; `None` when empty
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        self.parts
            .iter()
            .map(Shape::bounding_box)
            .reduce(|a, b| a.union(&b))
    }

    /// Union of all parts; `None` when empty
    pub fn fuse(&self) -> Option<Shape> {
        self.parts.iter().cloned().reduce(|a, b| a.union(&b))
    }
}

/// A build result that can be stored in the artifact cache
#[derive(Debug, Clone, PartialEq)]
pub enum Artifact {
    Solid(Shape),
    Compound(Compound),
}

impl From<Shape> for Artifact {
    fn from(shape: Shape) -> Self {
        Artifact::Solid(shape)
    }
}

impl From<Compound> for Artifact {
    fn from(compound: Compound) -> Self {
        Artifact::Compound(compound)
    }
}

impl Artifact {
    pub fn kind(&self) -> ArtifactKind {
        match self {
            Artifact::Solid(_) => ArtifactKind::Solid,
            Artifact::Compound(_) => ArtifactKind::Compound,
        }
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        match self {
            Artifact::Solid(shape) => Some(shape.bounding_box()),
            Artifact::Compound(compound) => compound.bounding_box(),
        }
    }

    /// Encode to the native payload. Compounds encode as a list of trees.
    pub fn to_payload(&self) -> Result<Vec<u8>> {
        match self {
            Artifact::Solid(shape) => shape.to_bytes(),
            Artifact::Compound(compound) => {
                let trees: Vec<&Solid> = compound.parts.iter().map(Shape::solid).collect();
                Ok(serde_json::to_vec(&trees)?)
            }
        }
    }

    /// Decode a payload produced by [`Artifact::to_payload`]
    pub fn from_payload(kind: ArtifactKind, bytes: &[u8]) -> Result<Self> {
        match kind {
            ArtifactKind::Solid => Ok(Artifact::Solid(Shape::from_bytes(bytes)?)),
            ArtifactKind::Compound => {
                let trees: Vec<Solid> = decode_json(bytes)?;
                let parts = trees.into_iter().map(Shape::from_solid).collect();
                Ok(Artifact::Compound(Compound::new(parts)))
            }
        }
    }

    /// Collapse to a single shape, fusing compounds
    pub fn into_shape(self) -> Option<Shape> {
        match self {
            Artifact::Solid(shape) => Some(shape),
            Artifact::Compound(compound) => compound.fuse(),
        }
    }
}
