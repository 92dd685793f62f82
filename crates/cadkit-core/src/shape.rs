//! Solid shapes
//!
//! A [`Shape`] is an immutable handle to a constructive-solid-geometry tree.
//! Every operation returns a new handle; subtrees are shared through `Arc`,
//! so cloning and composing shapes never copies or mutates existing geometry.
//!
//! ## Example
//!
//! ```rust,ignore
//! use cadkit_core::prelude::*;
//!
//! let plate = Shape::cuboid(40.0, 20.0, 2.0);
//! let hole = Shape::cylinder(2.0, 3.0);
//! let part = plate.cut(&hole).rotate_axis(Axis::X, 90.0);
//! ```

use crate::bbox::{Axis, BoundingBox, Side};
use crate::error::Result;
use glam::{DAffine3, DMat3, DVec3};
use rayon::prelude::*;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Samples per axis used by [`Shape::volume`]
pub const VOLUME_RESOLUTION: usize = 64;

/// A node of the solid tree. Primitives are centered on the origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Solid {
    // Primitives
    Cuboid {
        size: [f64; 3],
    },
    /// Axis along Z
    Cylinder {
        radius: f64,
        height: f64,
    },
    Sphere {
        radius: f64,
    },
    /// Lies in the XY plane, axis along Z
    Torus {
        major_radius: f64,
        minor_radius: f64,
    },

    // Boolean operations. Chains of the same operation are kept flat so
    // long unions stay one level deep.
    Union {
        parts: Vec<Arc<Solid>>,
    },
    /// `base` with every tool removed
    Cut {
        base: Arc<Solid>,
        tools: Vec<Arc<Solid>>,
    },
    Intersect {
        parts: Vec<Arc<Solid>>,
    },

    // Rigid transform, column-major affine matrix
    Transform {
        inner: Arc<Solid>,
        matrix: [f64; 12],
    },
}

/// Boolean combination of two shapes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanOp {
    Union,
    Cut,
    Intersect,
}

/// Immutable handle to a solid
#[derive(Debug, Clone)]
pub struct Shape {
    solid: Arc<Solid>,
}

impl PartialEq for Shape {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.solid, &other.solid) || self.solid == other.solid
    }
}

impl From<Solid> for Shape {
    fn from(solid: Solid) -> Self {
        Self::from_solid(solid)
    }
}

impl Shape {
    pub fn from_solid(solid: Solid) -> Self {
        Self {
            solid: Arc::new(solid),
        }
    }

    /// The underlying solid tree
    pub fn solid(&self) -> &Solid {
        &self.solid
    }

    // === Primitives ===

    /// Box with the given edge lengths, centered on the origin
    pub fn cuboid(x: f64, y: f64, z: f64) -> Self {
        Self::from_solid(Solid::Cuboid { size: [x, y, z] })
    }

    pub fn cube(size: f64) -> Self {
        Self::cuboid(size, size, size)
    }

    /// Cylinder along Z, centered on the origin
    pub fn cylinder(height: f64, radius: f64) -> Self {
        Self::from_solid(Solid::Cylinder { radius, height })
    }

    pub fn sphere(radius: f64) -> Self {
        Self::from_solid(Solid::Sphere { radius })
    }

    /// Torus in the XY plane
    pub fn torus(major_radius: f64, minor_radius: f64) -> Self {
        Self::from_solid(Solid::Torus {
            major_radius,
            minor_radius,
        })
    }

    // === Boolean Operations ===

    /// Combine two shapes. An operand that is already a node of the same
    /// operation is spliced in rather than nested.
    pub fn combine(&self, op: BooleanOp, other: &Shape) -> Shape {
        let b = Arc::clone(&other.solid);
        Self::from_solid(match (op, self.solid.as_ref()) {
            (BooleanOp::Union, _) => Solid::Union {
                parts: flatten(op, &self.solid, &b),
            },
            (BooleanOp::Intersect, _) => Solid::Intersect {
                parts: flatten(op, &self.solid, &b),
            },
            (BooleanOp::Cut, Solid::Cut { base, tools }) => {
                let mut tools = tools.clone();
                tools.push(b);
                Solid::Cut {
                    base: Arc::clone(base),
                    tools,
                }
            }
            (BooleanOp::Cut, _) => Solid::Cut {
                base: Arc::clone(&self.solid),
                tools: vec![b],
            },
        })
    }

    /// Union: combine two shapes (OR)
    pub fn union(&self, other: &Shape) -> Shape {
        self.combine(BooleanOp::Union, other)
    }

    /// Cut `other` out of `self`
    pub fn cut(&self, other: &Shape) -> Shape {
        self.combine(BooleanOp::Cut, other)
    }

    /// Keep only where both shapes overlap (AND)
    pub fn intersect(&self, other: &Shape) -> Shape {
        self.combine(BooleanOp::Intersect, other)
    }

    // === Transforms ===

    /// Apply an affine transform. Stacked transforms fold into one node.
    pub fn transform(&self, affine: DAffine3) -> Shape {
        if affine == DAffine3::IDENTITY {
            return self.clone();
        }
        let (inner, combined) = match self.solid.as_ref() {
            Solid::Transform { inner, matrix } => (
                Arc::clone(inner),
                affine * DAffine3::from_cols_array(matrix),
            ),
            _ => (Arc::clone(&self.solid), affine),
        };
        Self::from_solid(Solid::Transform {
            inner,
            matrix: combined.to_cols_array(),
        })
    }

    pub fn translate(&self, offset: DVec3) -> Shape {
        self.transform(DAffine3::from_translation(offset))
    }

    /// Rotate about an axis through the origin
    pub fn rotate(&self, axis: DVec3, degrees: f64) -> Shape {
        for principal in Axis::ALL {
            if axis == principal.unit() {
                return self.rotate_axis(principal, degrees);
            }
        }
        match axis.try_normalize() {
            Some(axis) => self.transform(DAffine3::from_axis_angle(axis, degrees.to_radians())),
            None => self.clone(),
        }
    }

    /// Rotate about one principal axis through the origin.
    ///
    /// Quarter turns use exact sines and cosines so rotated boxes keep
    /// exact bounds.
    pub fn rotate_axis(&self, axis: Axis, degrees: f64) -> Shape {
        let (s, c) = sin_cos_degrees(degrees);
        let m = match axis {
            Axis::X => DMat3::from_cols(
                DVec3::new(1.0, 0.0, 0.0),
                DVec3::new(0.0, c, s),
                DVec3::new(0.0, -s, c),
            ),
            Axis::Y => DMat3::from_cols(
                DVec3::new(c, 0.0, -s),
                DVec3::new(0.0, 1.0, 0.0),
                DVec3::new(s, 0.0, c),
            ),
            Axis::Z => DMat3::from_cols(
                DVec3::new(c, s, 0.0),
                DVec3::new(-s, c, 0.0),
                DVec3::new(0.0, 0.0, 1.0),
            ),
        };
        self.transform(DAffine3::from_mat3(m))
    }

    // === Measurement ===

    pub fn bounding_box(&self) -> BoundingBox {
        eval_bounds(&self.solid)
    }

    /// Bounding box collapsed onto one extreme along `axis`
    pub fn face(&self, axis: Axis, side: Side) -> BoundingBox {
        self.bounding_box().face(axis, side)
    }

    /// Point-membership test (boundary counts as inside)
    pub fn contains(&self, p: DVec3) -> bool {
        eval_contains(&self.solid, p)
    }

    /// Volume estimated by sampling cell centers of a regular grid over the
    /// bounding box. Deterministic for a given tree.
    pub fn volume(&self) -> f64 {
        let bounds = self.bounding_box();
        let size = bounds.size();
        if size.min_element() <= 0.0 {
            return 0.0;
        }

        let res = VOLUME_RESOLUTION;
        let step = size / res as f64;
        let inside = (0..res * res * res)
            .into_par_iter()
            .filter(|&idx| {
                let x = idx % res;
                let y = (idx / res) % res;
                let z = idx / (res * res);
                let cell = DVec3::new(x as f64, y as f64, z as f64) + DVec3::splat(0.5);
                eval_contains(&self.solid, bounds.min + cell * step)
            })
            .count();

        inside as f64 * step.x * step.y * step.z
    }

    // === Native serialization ===

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self.solid.as_ref())?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Shape> {
        let solid: Solid = decode_json(bytes)?;
        Ok(Self::from_solid(solid))
    }
}

/// Decode JSON without serde_json's nesting limit. Trees nest one level per
/// alternating operation, so anything `to_bytes` wrote must read back.
pub(crate) fn decode_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let mut de = serde_json::Deserializer::from_slice(bytes);
    de.disable_recursion_limit();
    let value = T::deserialize(&mut de)?;
    de.end()?;
    Ok(value)
}

/// Operands of an n-ary union or intersection, splicing nodes of the same kind
fn flatten(op: BooleanOp, a: &Arc<Solid>, b: &Arc<Solid>) -> Vec<Arc<Solid>> {
    let mut parts = Vec::new();
    for solid in [a, b] {
        match (op, solid.as_ref()) {
            (BooleanOp::Union, Solid::Union { parts: inner })
            | (BooleanOp::Intersect, Solid::Intersect { parts: inner }) => {
                parts.extend(inner.iter().cloned());
            }
            _ => parts.push(Arc::clone(solid)),
        }
    }
    parts
}

/// Sine and cosine of an angle in degrees, exact on multiples of 90
fn sin_cos_degrees(degrees: f64) -> (f64, f64) {
    let quarter_turns = degrees / 90.0;
    if quarter_turns.fract() == 0.0 {
        match (quarter_turns as i64).rem_euclid(4) {
            0 => (0.0, 1.0),
            1 => (1.0, 0.0),
            2 => (0.0, -1.0),
            _ => (-1.0, 0.0),
        }
    } else {
        degrees.to_radians().sin_cos()
    }
}

fn eval_bounds(solid: &Solid) -> BoundingBox {
    match solid {
        Solid::Cuboid { size } => {
            BoundingBox::from_center(DVec3::ZERO, DVec3::from_array(*size).abs() * 0.5)
        }

        Solid::Cylinder { radius, height } => BoundingBox::from_center(
            DVec3::ZERO,
            DVec3::new(radius.abs(), radius.abs(), height.abs() * 0.5),
        ),

        Solid::Sphere { radius } => BoundingBox::from_center(DVec3::ZERO, DVec3::splat(radius.abs())),

        Solid::Torus {
            major_radius,
            minor_radius,
        } => {
            let r = major_radius.abs() + minor_radius.abs();
            BoundingBox::from_center(DVec3::ZERO, DVec3::new(r, r, minor_radius.abs()))
        }

        Solid::Union { parts } => fold_bounds(parts, |acc, b| acc.union(&b)),

        // Cutting can only shrink the minuend
        Solid::Cut { base, .. } => eval_bounds(base),

        Solid::Intersect { parts } => fold_bounds(parts, |acc, b| acc.intersection(&b)),

        Solid::Transform { inner, matrix } => {
            let affine = DAffine3::from_cols_array(matrix);
            if let Solid::Sphere { radius } = inner.as_ref() {
                // Rigid transforms keep a sphere's box tight
                return BoundingBox::from_center(affine.translation, DVec3::splat(radius.abs()));
            }
            transform_bounds(&eval_bounds(inner), &affine)
        }
    }
}

fn fold_bounds(parts: &[Arc<Solid>], f: impl Fn(BoundingBox, BoundingBox) -> BoundingBox) -> BoundingBox {
    parts
        .iter()
        .map(|part| eval_bounds(part))
        .reduce(f)
        .unwrap_or_else(|| BoundingBox::new(DVec3::ZERO, DVec3::ZERO))
}

fn transform_bounds(bounds: &BoundingBox, affine: &DAffine3) -> BoundingBox {
    let corners = (0..8).map(|i| {
        let pick = |bit: usize, axis: usize| {
            if i & bit == 0 {
                bounds.min[axis]
            } else {
                bounds.max[axis]
            }
        };
        affine.transform_point3(DVec3::new(pick(1, 0), pick(2, 1), pick(4, 2)))
    });
    BoundingBox::from_points(corners).unwrap_or(*bounds)
}

fn eval_contains(solid: &Solid, p: DVec3) -> bool {
    match solid {
        Solid::Cuboid { size } => (p.abs() - DVec3::from_array(*size).abs() * 0.5).max_element() <= 0.0,

        Solid::Cylinder { radius, height } => {
            p.x * p.x + p.y * p.y <= radius * radius && p.z.abs() <= height.abs() * 0.5
        }

        Solid::Sphere { radius } => p.length_squared() <= radius * radius,

        Solid::Torus {
            major_radius,
            minor_radius,
        } => {
            let q = (p.x * p.x + p.y * p.y).sqrt() - major_radius;
            q * q + p.z * p.z <= minor_radius * minor_radius
        }

        Solid::Union { parts } => parts.iter().any(|part| eval_contains(part, p)),

        Solid::Cut { base, tools } => {
            eval_contains(base, p) && !tools.iter().any(|tool| eval_contains(tool, p))
        }

        Solid::Intersect { parts } => parts.iter().all(|part| eval_contains(part, p)),

        Solid::Transform { inner, matrix } => {
            let local = DAffine3::from_cols_array(matrix).inverse().transform_point3(p);
            eval_contains(inner, local)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn cuboid_bounds_are_centered() {
        let b = Shape::cuboid(2.0, 4.0, 6.0).bounding_box();
        assert_eq!(b.min, DVec3::new(-1.0, -2.0, -3.0));
        assert_eq!(b.max, DVec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn translate_moves_bounds() {
        let b = Shape::cube(2.0)
            .translate(DVec3::new(10.0, 0.0, -5.0))
            .bounding_box();
        assert_eq!(b.center(), DVec3::new(10.0, 0.0, -5.0));
    }

    #[test]
    fn stacked_transforms_fold() {
        let s = Shape::cube(1.0)
            .translate(DVec3::X)
            .translate(DVec3::Y)
            .rotate_axis(Axis::Z, 90.0);
        match s.solid() {
            Solid::Transform { inner, .. } => assert!(matches!(inner.as_ref(), Solid::Cuboid { .. })),
            other => panic!("expected a single transform node, got {other:?}"),
        }
        // (1, 1, 0) rotated a quarter turn about Z lands on (-1, 1, 0)
        let c = s.bounding_box().center();
        assert_relative_eq!(c.x, -1.0);
        assert_relative_eq!(c.y, 1.0);
    }

    #[test]
    fn quarter_turn_keeps_exact_bounds() {
        // Cylinder along Z, laid along Y after a quarter turn about X
        let b = Shape::cylinder(10.0, 2.0)
            .rotate_axis(Axis::X, 90.0)
            .bounding_box();
        assert_eq!(b.min, DVec3::new(-2.0, -5.0, -2.0));
        assert_eq!(b.max, DVec3::new(2.0, 5.0, 2.0));
    }

    #[test]
    fn rotate_with_principal_vector_matches_rotate_axis() {
        let a = Shape::cuboid(1.0, 2.0, 3.0).rotate(DVec3::Y, -90.0);
        let b = Shape::cuboid(1.0, 2.0, 3.0).rotate_axis(Axis::Y, -90.0);
        assert_eq!(a, b);
    }

    #[test]
    fn cut_keeps_minuend_bounds() {
        let plate = Shape::cuboid(10.0, 10.0, 2.0);
        let hole = Shape::cylinder(20.0, 2.0);
        let b = plate.cut(&hole).bounding_box();
        assert_eq!(b, plate.bounding_box());
        assert!(!plate.cut(&hole).contains(DVec3::ZERO));
        assert!(plate.cut(&hole).contains(DVec3::new(4.0, 4.0, 0.0)));
    }

    #[test]
    fn volume_of_cube() {
        assert_relative_eq!(Shape::cube(10.0).volume(), 1000.0, max_relative = 1e-9);
    }

    #[test]
    fn volume_of_sphere_is_close() {
        let expected = 4.0 / 3.0 * std::f64::consts::PI * 8.0;
        assert_relative_eq!(Shape::sphere(2.0).volume(), expected, max_relative = 0.02);
    }

    #[test]
    fn torus_membership() {
        let t = Shape::torus(5.0, 1.0);
        assert!(t.contains(DVec3::new(5.0, 0.0, 0.0)));
        assert!(!t.contains(DVec3::ZERO));
        assert_relative_eq!(t.bounding_box().zlen(), 2.0);
        assert_relative_eq!(t.bounding_box().xlen(), 12.0);
    }

    #[test]
    fn native_bytes_roundtrip() {
        let s = Shape::cuboid(1.5, 2.0, 0.1)
            .union(&Shape::sphere(0.3).translate(DVec3::new(0.1, 0.2, 0.3)))
            .rotate(DVec3::new(1.0, 1.0, 0.0), 33.0);
        let back = Shape::from_bytes(&s.to_bytes().unwrap()).unwrap();
        assert_eq!(back, s);
        assert_eq!(back.bounding_box(), s.bounding_box());
    }

    #[test]
    fn chained_operations_stay_flat() {
        let row = (0..5).fold(Shape::cube(1.0), |acc, i| {
            acc.union(&Shape::cube(1.0).translate(DVec3::X * f64::from(i)))
        });
        assert!(matches!(row.solid(), Solid::Union { parts } if parts.len() == 6));

        let drilled = Shape::cube(10.0)
            .cut(&Shape::cylinder(20.0, 1.0))
            .cut(&Shape::sphere(1.0).translate(DVec3::X * 4.0));
        assert!(matches!(drilled.solid(), Solid::Cut { tools, .. } if tools.len() == 2));
        assert!(!drilled.contains(DVec3::new(4.0, 0.0, 3.0)));
        assert!(drilled.contains(DVec3::new(-4.0, -4.0, 0.0)));
    }

    #[test]
    fn deeply_nested_tree_reads_back() {
        // Alternating operations cannot be flattened, so this nests far past
        // serde_json's default limit of 128
        let deep = (0..80).fold(Shape::cube(1.0), |acc, i| {
            acc.union(&Shape::sphere(0.5))
                .translate(DVec3::X)
                .intersect(&Shape::cube(f64::from(1000 + i)))
        });
        let back = Shape::from_bytes(&deep.to_bytes().unwrap()).unwrap();
        assert_eq!(back, deep);
    }

    #[test]
    fn garbage_bytes_are_rejected() {
        assert!(Shape::from_bytes(b"{\"op\":\"hypercube\"}").is_err());
    }
}
