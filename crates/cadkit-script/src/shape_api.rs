//! Rhai API for shapes, alignment and composition
//!
//! Everything here is pure geometry. Functions that touch the workshop
//! (export, import, caching) live in `part_api`.

use cadkit_core::prelude::*;
use cadkit_core::{compose, measure, solid_box, surface_grow};
use rhai::{Array, Dynamic, Engine, EvalAltResult, INT, Map};

type RhaiResult<T> = std::result::Result<T, Box<EvalAltResult>>;

fn script_err(e: impl std::fmt::Display) -> Box<EvalAltResult> {
    e.to_string().into()
}

/// Read a number that may have been written as an integer
fn number(value: &Dynamic, what: &str) -> RhaiResult<f64> {
    value
        .as_float()
        .or_else(|_| value.as_int().map(|i| i as f64))
        .map_err(|found| script_err(format!("{what} must be a number, got {found}")))
}

/// Optional numeric field of an options map
fn map_number(map: &Map, key: &str, default: f64) -> RhaiResult<f64> {
    map.get(key).map_or(Ok(default), |v| number(v, key))
}

fn map_offset(map: &Map) -> RhaiResult<DVec3> {
    Ok(DVec3::new(
        map_number(map, "dx", 0.0)?,
        map_number(map, "dy", 0.0)?,
        map_number(map, "dz", 0.0)?,
    ))
}

fn shape_or_unit(shape: Option<Shape>) -> Dynamic {
    shape.map_or(Dynamic::UNIT, Dynamic::from)
}

// ============================================================================
// Primitives
// ============================================================================

fn cuboid(x: f64, y: f64, z: f64) -> Shape {
    Shape::cuboid(x, y, z)
}

fn cube(size: f64) -> Shape {
    Shape::cube(size)
}

fn cylinder(height: f64, radius: f64) -> Shape {
    Shape::cylinder(height, radius)
}

fn sphere(radius: f64) -> Shape {
    Shape::sphere(radius)
}

fn torus(major_radius: f64, minor_radius: f64) -> Shape {
    Shape::torus(major_radius, minor_radius)
}

// ============================================================================
// Booleans and transforms
// ============================================================================

fn union(shape: &mut Shape, other: Shape) -> Shape {
    shape.union(&other)
}

fn cut(shape: &mut Shape, other: Shape) -> Shape {
    shape.cut(&other)
}

fn intersect(shape: &mut Shape, other: Shape) -> Shape {
    shape.intersect(&other)
}

fn translate(shape: &mut Shape, x: f64, y: f64, z: f64) -> Shape {
    shape.translate(DVec3::new(x, y, z))
}

fn translate_x(shape: &mut Shape, x: f64) -> Shape {
    translate(shape, x, 0.0, 0.0)
}

fn translate_y(shape: &mut Shape, y: f64) -> Shape {
    translate(shape, 0.0, y, 0.0)
}

fn translate_z(shape: &mut Shape, z: f64) -> Shape {
    translate(shape, 0.0, 0.0, z)
}

/// `rotate_axis("X", 90.0)`
fn rotate_axis(shape: &mut Shape, axis: &str, degrees: f64) -> RhaiResult<Shape> {
    let mut chars = axis.chars();
    match (chars.next().and_then(Axis::from_char), chars.next()) {
        (Some(axis), None) => Ok(shape.rotate_axis(axis, degrees)),
        _ => Err(script_err(format!("rotate_axis: expected X, Y or Z, got {axis:?}"))),
    }
}

fn rotate(shape: &mut Shape, x: f64, y: f64, z: f64, degrees: f64) -> Shape {
    shape.rotate(DVec3::new(x, y, z), degrees)
}

// ============================================================================
// Alignment
// ============================================================================

fn align(shape: &mut Shape, target: Shape, specs: &str) -> RhaiResult<Shape> {
    shape.align(&target, specs).map_err(script_err)
}

fn align_offset(
    shape: &mut Shape,
    target: Shape,
    specs: &str,
    dx: f64,
    dy: f64,
    dz: f64,
) -> RhaiResult<Shape> {
    let specs = FaceSpec::parse_list(specs).map_err(script_err)?;
    Ok(shape.align_by(&target, &specs, DVec3::new(dx, dy, dz)))
}

/// `align(target, "<X", #{ dx: 1.0 })`
fn align_options(shape: &mut Shape, target: Shape, specs: &str, options: Map) -> RhaiResult<Shape> {
    let specs = FaceSpec::parse_list(specs).map_err(script_err)?;
    Ok(shape.align_by(&target, &specs, map_offset(&options)?))
}

// ============================================================================
// Composition
// ============================================================================

/// Union an array of shapes, skipping `()` entries. `()` when empty.
fn union_all(shapes: Array) -> RhaiResult<Dynamic> {
    let shapes = shapes
        .into_iter()
        .map(|item| {
            if item.is_unit() {
                Ok(None)
            } else {
                let found = item.type_name();
                item.try_cast::<Shape>()
                    .map(Some)
                    .ok_or_else(|| script_err(format!("union_all: expected shapes, got {found}")))
            }
        })
        .collect::<RhaiResult<Vec<Option<Shape>>>>()?;
    Ok(shape_or_unit(compose::union_all(shapes)))
}

fn repeat_step(shape: &mut Shape, n: INT, dx: f64, dy: f64, dz: f64) -> Dynamic {
    let n = usize::try_from(n).unwrap_or(0);
    shape_or_unit(shape.repeat(n, DVec3::new(dx, dy, dz)))
}

/// `repeat(3, #{ x: 10.0 })`
fn repeat_options(shape: &mut Shape, n: INT, step: Map) -> RhaiResult<Dynamic> {
    let n = usize::try_from(n).unwrap_or(0);
    let step = DVec3::new(
        map_number(&step, "x", 0.0)?,
        map_number(&step, "y", 0.0)?,
        map_number(&step, "z", 0.0)?,
    );
    Ok(shape_or_unit(shape.repeat(n, step)))
}

fn solid_box_plain(shape: &mut Shape) -> Shape {
    shape.solid_box()
}

fn inverse_box(shape: &mut Shape) -> Shape {
    shape.inverse_box()
}

/// `solid_box(#{ inverse: true, y: 2.0 })`
fn solid_box_options(shape: &mut Shape, options: Map) -> RhaiResult<Shape> {
    let inverse = match options.get("inverse") {
        Some(v) => v
            .as_bool()
            .map_err(|found| script_err(format!("inverse must be a bool, got {found}")))?,
        None => false,
    };
    let size = DVec3::new(
        map_number(&options, "x", 0.0)?,
        map_number(&options, "y", 0.0)?,
        map_number(&options, "z", 0.0)?,
    );
    Ok(solid_box(shape, size, inverse))
}

/// A single token yields a number, several yield an array
fn measure_spec(shape: &mut Shape, spec: &str) -> RhaiResult<Dynamic> {
    let values = measure(shape, spec).map_err(script_err)?;
    Ok(match values.as_slice() {
        [single] => Dynamic::from_float(*single),
        _ => values.into_iter().map(Dynamic::from_float).collect::<Array>().into(),
    })
}

fn grow(shape: &mut Shape, face: &str, amount: f64) -> RhaiResult<Shape> {
    surface_grow(shape, face, amount).map_err(script_err)
}

// ============================================================================
// Measurement
// ============================================================================

fn bbox(shape: &mut Shape) -> BoundingBox {
    shape.bounding_box()
}

fn volume(shape: &mut Shape) -> f64 {
    shape.volume()
}

fn extents(shape: &mut Shape) -> Array {
    let size = shape.extents();
    vec![size.x.into(), size.y.into(), size.z.into()]
}

fn describe(shape: &mut Shape) -> String {
    let b = shape.bounding_box();
    format!(
        "Shape({:.3} x {:.3} x {:.3} at [{:.3}, {:.3}, {:.3}])",
        b.xlen(),
        b.ylen(),
        b.zlen(),
        b.xmin(),
        b.ymin(),
        b.zmin()
    )
}

/// Register all shape functions with a Rhai engine
pub fn register_shape_api(engine: &mut Engine) {
    engine
        .register_type_with_name::<Shape>("Shape")
        .register_fn("to_string", describe)
        .register_fn("to_debug", describe);

    engine
        .register_type_with_name::<BoundingBox>("BoundingBox")
        .register_get("xmin", |b: &mut BoundingBox| b.xmin())
        .register_get("xmax", |b: &mut BoundingBox| b.xmax())
        .register_get("ymin", |b: &mut BoundingBox| b.ymin())
        .register_get("ymax", |b: &mut BoundingBox| b.ymax())
        .register_get("zmin", |b: &mut BoundingBox| b.zmin())
        .register_get("zmax", |b: &mut BoundingBox| b.zmax())
        .register_get("xlen", |b: &mut BoundingBox| b.xlen())
        .register_get("ylen", |b: &mut BoundingBox| b.ylen())
        .register_get("zlen", |b: &mut BoundingBox| b.zlen());

    // === Primitive constructors ===
    engine.register_fn("cuboid", cuboid);
    engine.register_fn("cube", cube);
    engine.register_fn("cylinder", cylinder);
    engine.register_fn("sphere", sphere);
    engine.register_fn("torus", torus);

    // === Boolean operations ===
    engine.register_fn("union", union);
    engine.register_fn("cut", cut);
    engine.register_fn("intersect", intersect);

    // === Transforms ===
    engine.register_fn("translate", translate);
    engine.register_fn("translate_x", translate_x);
    engine.register_fn("translate_y", translate_y);
    engine.register_fn("translate_z", translate_z);
    engine.register_fn("rotate_axis", rotate_axis);
    engine.register_fn("rotate", rotate);

    // === Alignment ===
    engine.register_fn("align", align);
    engine.register_fn("align", align_offset);
    engine.register_fn("align", align_options);

    // === Composition ===
    engine.register_fn("union_all", union_all);
    engine.register_fn("repeat", repeat_step);
    engine.register_fn("repeat", repeat_options);
    engine.register_fn("solid_box", solid_box_plain);
    engine.register_fn("solid_box", solid_box_options);
    engine.register_fn("inverse_box", inverse_box);
    engine.register_fn("surface_grow", grow);

    // === Measurement ===
    engine.register_fn("measure", measure_spec);
    engine.register_fn("bbox", bbox);
    engine.register_fn("volume", volume);
    engine.register_fn("extents", extents);
}
