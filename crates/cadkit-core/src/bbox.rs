//! Axis-aligned bounding boxes and the axis/side vocabulary used to address
//! their faces

use glam::DVec3;
use std::fmt;

/// One of the three principal axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Component index into a `DVec3`
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// Unit vector along this axis
    pub fn unit(self) -> DVec3 {
        match self {
            Axis::X => DVec3::X,
            Axis::Y => DVec3::Y,
            Axis::Z => DVec3::Z,
        }
    }

    /// Parse an uppercase axis letter
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'X' => Some(Axis::X),
            'Y' => Some(Axis::Y),
            'Z' => Some(Axis::Z),
            _ => None,
        }
    }

    /// The two axes other than this one, in X, Y, Z order
    pub fn others(self) -> [Axis; 2] {
        match self {
            Axis::X => [Axis::Y, Axis::Z],
            Axis::Y => [Axis::X, Axis::Z],
            Axis::Z => [Axis::X, Axis::Y],
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
        };
        f.write_str(name)
    }
}

/// Which extreme of a box along an axis: `<` is `Min`, `>` is `Max`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Min,
    Max,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::Min => Side::Max,
            Side::Max => Side::Min,
        }
    }

    /// The face-spec symbol for this side
    pub fn symbol(self) -> char {
        match self {
            Side::Min => '<',
            Side::Max => '>',
        }
    }
}

/// Axis-Aligned Bounding Box
///
/// `min <= max` holds on every axis. A box may be flat (`min == max`) on an
/// axis, which is what the face of a planar shape looks like.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: DVec3,
    pub max: DVec3,
}

impl BoundingBox {
    /// Create a box from two opposite corners, in any order
    pub fn new(a: DVec3, b: DVec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Create from center and half-extents
    pub fn from_center(center: DVec3, half_extents: DVec3) -> Self {
        Self::new(center - half_extents, center + half_extents)
    }

    /// Smallest box containing every point; `None` for an empty iterator
    pub fn from_points<I: IntoIterator<Item = DVec3>>(points: I) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;
        let (min, max) = points.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
        Some(Self { min, max })
    }

    /// Merge two bounding boxes
    pub fn union(&self, other: &BoundingBox) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Overlap of two boxes. Disjoint boxes collapse to a flat box instead of
    /// inverting.
    pub fn intersection(&self, other: &BoundingBox) -> Self {
        let min = self.min.max(other.min);
        let max = self.max.min(other.max).max(min);
        Self { min, max }
    }

    /// The same box moved by `offset`
    pub fn translated(&self, offset: DVec3) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    /// Get the size of the bounding box
    pub fn size(&self) -> DVec3 {
        self.max - self.min
    }

    /// Get the center of the bounding box
    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    /// Length along one axis
    pub fn length(&self, axis: Axis) -> f64 {
        self.max[axis.index()] - self.min[axis.index()]
    }

    /// Coordinate of one extreme along an axis
    pub fn extreme(&self, axis: Axis, side: Side) -> f64 {
        match side {
            Side::Min => self.min[axis.index()],
            Side::Max => self.max[axis.index()],
        }
    }

    /// The box collapsed onto one of its extremes along `axis`.
    ///
    /// Curved shapes have no flat face at their extreme; collapsing the box
    /// gives every shape a planar stand-in at exactly that coordinate.
    pub fn face(&self, axis: Axis, side: Side) -> Self {
        let value = self.extreme(axis, side);
        let i = axis.index();
        let mut min = self.min;
        let mut max = self.max;
        min[i] = value;
        max[i] = value;
        Self { min, max }
    }

    /// Whether the box has zero length on `axis`
    pub fn is_flat(&self, axis: Axis) -> bool {
        self.length(axis) == 0.0
    }

    /// Whether `p` lies inside or on the boundary
    pub fn contains(&self, p: DVec3) -> bool {
        p.cmpge(self.min).all() && p.cmple(self.max).all()
    }

    pub fn xmin(&self) -> f64 {
        self.min.x
    }

    pub fn xmax(&self) -> f64 {
        self.max.x
    }

    pub fn ymin(&self) -> f64 {
        self.min.y
    }

    pub fn ymax(&self) -> f64 {
        self.max.y
    }

    pub fn zmin(&self) -> f64 {
        self.min.z
    }

    pub fn zmax(&self) -> f64 {
        self.max.z
    }

    pub fn xlen(&self) -> f64 {
        self.length(Axis::X)
    }

    pub fn ylen(&self) -> f64 {
        self.length(Axis::Y)
    }

    pub fn zlen(&self) -> f64 {
        self.length(Axis::Z)
    }
}
