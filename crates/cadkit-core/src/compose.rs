//! Composition helpers built on alignment and booleans

use crate::align::{FaceMode, FaceSpec, align};
use crate::bbox::{Axis, Side};
use crate::error::{Error, Result};
use crate::shape::Shape;
use glam::DVec3;

/// Union every present shape, skipping `None`. `None` when nothing remains.
pub fn union_all<I, T>(shapes: I) -> Option<Shape>
where
    I: IntoIterator<Item = T>,
    T: Into<Option<Shape>>,
{
    shapes
        .into_iter()
        .filter_map(Into::<Option<Shape>>::into)
        .reduce(|acc, s| acc.union(&s))
}

/// `n` copies spaced by `step`, centered so the run straddles the input.
///
/// The first copy sits `n / 2` (integer division) steps back, so even counts
/// lean one step towards the positive side. `None` when `n` is zero.
pub fn repeat(shape: &Shape, n: usize, step: DVec3) -> Option<Shape> {
    let first = step * -((n / 2) as f64);
    union_all((0..n).map(|i| shape.translate(first + step * i as f64)))
}

/// Box around `shape` anchored at its minimum corner.
///
/// Non-zero components of `size_override` replace the box length on that
/// axis. With `inverse`, the shape is cut out of the box.
pub fn solid_box(shape: &Shape, size_override: DVec3, inverse: bool) -> Shape {
    let extents = shape.bounding_box().size();
    let size = DVec3::select(size_override.cmpne(DVec3::ZERO), size_override.abs(), extents);

    let anchor: Vec<FaceSpec> = Axis::ALL
        .into_iter()
        .map(|axis| FaceSpec::flush(axis, Side::Min))
        .collect();
    let block = align(&Shape::cuboid(size.x, size.y, size.z), shape, &anchor, DVec3::ZERO);

    if inverse { block.cut(shape) } else { block }
}

/// Evaluate a measurement list such as `"X Y 4"`.
///
/// Axis letters yield the bounding-box length on that axis; anything else
/// must be a number.
pub fn measure(shape: &Shape, spec: &str) -> Result<Vec<f64>> {
    let bounds = shape.bounding_box();
    spec.split_whitespace()
        .map(|token| {
            let mut chars = token.chars();
            if let (Some(c), None) = (chars.next(), chars.next()) {
                if let Some(axis) = Axis::from_char(c) {
                    return Ok(bounds.length(axis));
                }
            }
            token.parse::<f64>().map_err(|_| {
                Error::InvalidParameter(format!("measure: {token:?} is neither an axis nor a number"))
            })
        })
        .collect()
}

/// A slab `amount` thick lying against one face of `shape`, covering its
/// box on the other two axes. `face` is a flush token such as `"<Z"`.
pub fn surface_grow(shape: &Shape, face: &str, amount: f64) -> Result<Shape> {
    let spec = FaceSpec::parse(face)?;
    let FaceMode::Flush(side) = spec.mode else {
        return Err(Error::InvalidParameter(format!(
            "surface_grow needs a face like '<Z' or '>X', got {face:?}"
        )));
    };
    if amount.partial_cmp(&0.0) != Some(std::cmp::Ordering::Greater) {
        return Err(Error::InvalidParameter(format!(
            "surface_grow amount must be positive, got {amount}"
        )));
    }

    let mut size = shape.bounding_box().size();
    size[spec.axis.index()] = amount;

    let [a, b] = spec.axis.others();
    let specs = [
        FaceSpec::flush(a, Side::Min),
        FaceSpec::flush(b, Side::Min),
        FaceSpec::staggered(spec.axis, side),
    ];
    Ok(align(&Shape::cuboid(size.x, size.y, size.z), shape, &specs, DVec3::ZERO))
}

/// Bounding-box lengths on all three axes
pub fn extents(shape: &Shape) -> DVec3 {
    shape.bounding_box().size()
}

/// Method-call sugar for the alignment and composition helpers
pub trait ShapeExt {
    /// Align to `target` with a token list such as `"<X :>Z"`
    fn align(&self, target: &Shape, specs: &str) -> Result<Shape>;

    /// Align with pre-parsed specs and an explicit offset
    fn align_by(&self, target: &Shape, specs: &[FaceSpec], offset: DVec3) -> Shape;

    fn repeat(&self, n: usize, step: DVec3) -> Option<Shape>;

    fn solid_box(&self) -> Shape;

    /// The empty space inside this shape's box
    fn inverse_box(&self) -> Shape;

    fn measure(&self, spec: &str) -> Result<Vec<f64>>;

    fn surface_grow(&self, face: &str, amount: f64) -> Result<Shape>;

    fn extents(&self) -> DVec3;
}

impl ShapeExt for Shape {
    fn align(&self, target: &Shape, specs: &str) -> Result<Shape> {
        Ok(align(self, target, &FaceSpec::parse_list(specs)?, DVec3::ZERO))
    }

    fn align_by(&self, target: &Shape, specs: &[FaceSpec], offset: DVec3) -> Shape {
        align(self, target, specs, offset)
    }

    fn repeat(&self, n: usize, step: DVec3) -> Option<Shape> {
        repeat(self, n, step)
    }

    fn solid_box(&self) -> Shape {
        solid_box(self, DVec3::ZERO, false)
    }

    fn inverse_box(&self) -> Shape {
        solid_box(self, DVec3::ZERO, true)
    }

    fn measure(&self, spec: &str) -> Result<Vec<f64>> {
        measure(self, spec)
    }

    fn surface_grow(&self, face: &str, amount: f64) -> Result<Shape> {
        surface_grow(self, face, amount)
    }

    fn extents(&self) -> DVec3 {
        extents(self)
    }
}
