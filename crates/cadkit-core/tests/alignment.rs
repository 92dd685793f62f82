//! Alignment properties checked across a mix of flat and curved shapes

// Tests are allowed to use expect/unwrap for cleaner error messages
#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

use approx::assert_relative_eq;
use cadkit_core::prelude::*;

const EPS: f64 = 1e-9;

fn shapes() -> Vec<(&'static str, Shape)> {
    vec![
        ("cuboid", Shape::cuboid(3.0, 5.0, 7.0)),
        ("sphere", Shape::sphere(2.5).translate(DVec3::new(4.0, -1.0, 9.0))),
        ("cylinder", Shape::cylinder(12.0, 1.5).rotate_axis(Axis::Y, 90.0)),
        ("torus", Shape::torus(6.0, 1.0).translate(DVec3::new(-3.0, 2.0, 0.5))),
        (
            "plate",
            Shape::cuboid(40.0, 30.0, 2.0).cut(&Shape::cylinder(10.0, 4.0)),
        ),
        (
            "tilted",
            Shape::cuboid(2.0, 4.0, 1.0).rotate(DVec3::new(1.0, 1.0, 1.0), 30.0),
        ),
    ]
}

#[test]
fn self_alignment_is_a_no_op() {
    for (name, s) in shapes() {
        let before = s.bounding_box();
        for token in ["<X", ">X", "<Y", ">Y", "<Z", ">Z"] {
            let after = s.align(&s, token).unwrap().bounding_box();
            assert!(
                (after.min - before.min).abs().max_element() < EPS
                    && (after.max - before.max).abs().max_element() < EPS,
                "{name} moved when aligned to itself on {token}"
            );
        }
    }
}

#[test]
fn flush_alignment_meets_target_extreme() {
    for (_, a) in shapes() {
        for (_, b) in shapes() {
            for axis in Axis::ALL {
                for side in [Side::Min, Side::Max] {
                    let spec = FaceSpec::flush(axis, side);
                    let before = a.bounding_box();
                    let after = a.align_by(&b, &[spec], DVec3::ZERO).bounding_box();
                    let target = b.bounding_box();

                    assert_relative_eq!(
                        after.extreme(axis, side),
                        target.extreme(axis, side),
                        epsilon = EPS
                    );
                    for other in axis.others() {
                        assert_relative_eq!(
                            after.extreme(other, Side::Min),
                            before.extreme(other, Side::Min),
                            epsilon = EPS
                        );
                    }
                    assert_relative_eq!(after.length(axis), before.length(axis), epsilon = EPS);
                }
            }
        }
    }
}

#[test]
fn staggered_alignment_touches() {
    for (_, a) in shapes() {
        for (_, b) in shapes() {
            let after = a.align(&b, ":>Y").unwrap().bounding_box();
            assert_relative_eq!(after.ymin(), b.bounding_box().ymax(), epsilon = EPS);

            let after = a.align(&b, ":<Z").unwrap().bounding_box();
            assert_relative_eq!(after.zmax(), b.bounding_box().zmin(), epsilon = EPS);
        }
    }
}

#[test]
fn centered_alignment_matches_midpoints() {
    for (_, a) in shapes() {
        for (_, b) in shapes() {
            let after = a.align(&b, "-X -Z").unwrap().bounding_box();
            let target = b.bounding_box();
            assert_relative_eq!(after.center().x, target.center().x, epsilon = EPS);
            assert_relative_eq!(after.center().z, target.center().z, epsilon = EPS);
            assert_relative_eq!(after.ymin(), a.bounding_box().ymin(), epsilon = EPS);
        }
    }
}

#[test]
fn stacking_parts_on_a_plate() {
    let plate = Shape::cuboid(60.0, 40.0, 2.0);
    let post = Shape::cylinder(20.0, 4.0)
        .align(&plate, "<X <Y :>Z")
        .unwrap();
    let b = post.bounding_box();
    assert_relative_eq!(b.xmin(), -30.0);
    assert_relative_eq!(b.ymin(), -20.0);
    assert_relative_eq!(b.zmin(), 1.0);
    assert_relative_eq!(b.zmax(), 21.0);

    let part = plate.union(&post);
    assert_relative_eq!(part.bounding_box().zlen(), 22.0);
    assert!(part.contains(DVec3::new(-26.0, -16.0, 10.0)));
}

#[test]
fn malformed_list_reports_the_bad_token() {
    let s = Shape::cube(1.0);
    match s.align(&s, "<X >q") {
        Err(Error::MalformedFaceSpec { token, .. }) => assert_eq!(token, ">q"),
        other => panic!("expected MalformedFaceSpec, got {other:?}"),
    }
}
