//! Bounding-box alignment
//!
//! Positions one shape relative to another with short face tokens:
//!
//! | Token  | Meaning                                                  |
//! |--------|----------------------------------------------------------|
//! | `<X`   | source min X meets target min X (flush)                  |
//! | `>Z`   | source max Z meets target max Z (flush)                  |
//! | `:>Y`  | source min Y meets target max Y (staggered, touching)    |
//! | `:<Y`  | source max Y meets target min Y (staggered, touching)    |
//! | `-X`   | midpoints on X coincide (centered)                       |
//!
//! Tokens are applied left to right against the already-moved source, so a
//! later token on the same axis wins.

use crate::bbox::{Axis, Side};
use crate::error::{Error, Result};
use crate::shape::Shape;
use glam::DVec3;
use std::fmt;
use std::str::FromStr;

/// How the source is placed against the target on one axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaceMode {
    /// Same extreme on both shapes
    Flush(Side),
    /// Opposite extremes touch; `Side` names the target's extreme
    Staggered(Side),
    /// Midpoints coincide
    Centered,
}

/// One parsed alignment token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FaceSpec {
    pub axis: Axis,
    pub mode: FaceMode,
}

impl FaceSpec {
    pub fn flush(axis: Axis, side: Side) -> Self {
        Self {
            axis,
            mode: FaceMode::Flush(side),
        }
    }

    pub fn staggered(axis: Axis, side: Side) -> Self {
        Self {
            axis,
            mode: FaceMode::Staggered(side),
        }
    }

    pub fn centered(axis: Axis) -> Self {
        Self {
            axis,
            mode: FaceMode::Centered,
        }
    }

    /// Parse one token such as `<X`, `:>Y` or `-Z`
    pub fn parse(token: &str) -> Result<Self> {
        let malformed = |reason| Error::MalformedFaceSpec {
            token: token.to_string(),
            reason,
        };

        let mut chars = token.chars();
        let (staggered, sign) = match chars.next() {
            Some(':') => (true, chars.next()),
            first => (false, first),
        };

        let centered = match sign {
            Some('<' | '>') => false,
            Some('-') if !staggered => true,
            Some('-') => return Err(malformed("staggered alignment cannot be centered")),
            Some(_) => return Err(malformed("expected '<', '>' or '-' before the axis")),
            None => return Err(malformed("missing direction and axis")),
        };

        let axis = match chars.next() {
            Some(c) => Axis::from_char(c).ok_or_else(|| malformed("axis must be X, Y or Z"))?,
            None => return Err(malformed("missing axis")),
        };

        if chars.next().is_some() {
            return Err(malformed("unexpected characters after the axis"));
        }

        let side = if sign == Some('<') { Side::Min } else { Side::Max };
        Ok(match (centered, staggered) {
            (true, _) => Self::centered(axis),
            (false, true) => Self::staggered(axis, side),
            (false, false) => Self::flush(axis, side),
        })
    }

    /// Parse a whitespace-separated token list. Empty input yields no specs.
    pub fn parse_list(specs: &str) -> Result<Vec<Self>> {
        specs.split_whitespace().map(Self::parse).collect()
    }

    /// Extremes compared on the source and the target
    fn sides(self) -> (Side, Side) {
        match self.mode {
            FaceMode::Flush(side) => (side, side),
            FaceMode::Staggered(side) => (side.opposite(), side),
            FaceMode::Centered => (Side::Min, Side::Min),
        }
    }
}

impl FromStr for FaceSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for FaceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mode {
            FaceMode::Flush(side) => write!(f, "{}{}", side.symbol(), self.axis),
            FaceMode::Staggered(side) => write!(f, ":{}{}", side.symbol(), self.axis),
            FaceMode::Centered => write!(f, "-{}", self.axis),
        }
    }
}

/// Translate `source` so each spec's extreme meets `target`'s, then add
/// `offset`.
///
/// Both boxes are collapsed onto the compared extreme before measuring, so
/// curved shapes align on their true extent rather than on a face that
/// does not exist.
pub fn align(source: &Shape, target: &Shape, specs: &[FaceSpec], offset: DVec3) -> Shape {
    let source_box = source.bounding_box();
    let target_box = target.bounding_box();

    let mut shift = DVec3::ZERO;
    for spec in specs {
        let axis = spec.axis;
        let i = axis.index();
        let moved = source_box.translated(shift);
        let (source_side, target_side) = spec.sides();

        let delta = target_box.face(axis, target_side).min[i] - moved.face(axis, source_side).min[i];
        shift[i] += delta;

        if spec.mode == FaceMode::Centered {
            shift[i] += (target_box.length(axis) - moved.length(axis)) * 0.5;
        }
    }

    source.translate(shift + offset)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn specs(s: &str) -> Vec<FaceSpec> {
        FaceSpec::parse_list(s).unwrap()
    }

    #[test]
    fn parse_grammar() {
        assert_eq!(FaceSpec::parse("<X").unwrap(), FaceSpec::flush(Axis::X, Side::Min));
        assert_eq!(FaceSpec::parse(">Z").unwrap(), FaceSpec::flush(Axis::Z, Side::Max));
        assert_eq!(
            FaceSpec::parse(":>Y").unwrap(),
            FaceSpec::staggered(Axis::Y, Side::Max)
        );
        assert_eq!(FaceSpec::parse("-Z").unwrap(), FaceSpec::centered(Axis::Z));
        assert_eq!(specs("  <X\t:<Y  -Z ").len(), 3);
        assert!(specs("").is_empty());
    }

    #[test]
    fn display_matches_token() {
        for token in ["<X", ">Y", ":<Z", ":>X", "-Y"] {
            assert_eq!(FaceSpec::parse(token).unwrap().to_string(), token);
        }
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        for token in ["", "X", "<", "<x", "<W", ":-X", "::<X", "<XY", "+X", ":"] {
            match FaceSpec::parse(token) {
                Err(Error::MalformedFaceSpec { token: t, .. }) => assert_eq!(t, token),
                other => panic!("{token:?} should be malformed, got {other:?}"),
            }
        }
    }

    #[test]
    fn flush_moves_only_the_named_axis() {
        let target = Shape::cuboid(10.0, 10.0, 10.0);
        let source = Shape::cube(2.0).translate(DVec3::new(30.0, 7.0, -3.0));
        let out = align(&source, &target, &specs(">X"), DVec3::ZERO).bounding_box();
        assert_relative_eq!(out.xmax(), 5.0);
        assert_relative_eq!(out.ymin(), 6.0);
        assert_relative_eq!(out.zmin(), -4.0);
    }

    #[test]
    fn staggered_touches_without_overlap() {
        let target = Shape::cuboid(10.0, 4.0, 10.0);
        let source = Shape::cube(2.0);
        let above = align(&source, &target, &specs(":>Y"), DVec3::ZERO).bounding_box();
        assert_relative_eq!(above.ymin(), 2.0);
        let below = align(&source, &target, &specs(":<Y"), DVec3::ZERO).bounding_box();
        assert_relative_eq!(below.ymax(), -2.0);
    }

    #[test]
    fn centered_matches_midpoints() {
        let target = Shape::cuboid(10.0, 2.0, 2.0).translate(DVec3::new(20.0, 0.0, 0.0));
        let source = Shape::cuboid(3.0, 1.0, 1.0);
        let out = align(&source, &target, &specs("-X"), DVec3::ZERO).bounding_box();
        assert_relative_eq!(out.center().x, 20.0);
        assert_relative_eq!(out.xlen(), 3.0);
    }

    #[test]
    fn curved_shapes_use_their_extreme() {
        let plate = Shape::cuboid(20.0, 20.0, 2.0);
        let ball = Shape::sphere(3.0).translate(DVec3::new(1.0, 2.0, 50.0));
        let out = align(&ball, &plate, &specs(":>Z"), DVec3::ZERO).bounding_box();
        assert_relative_eq!(out.zmin(), 1.0);
        assert_relative_eq!(out.center().x, 1.0);

        let rod = Shape::cylinder(10.0, 1.0);
        let out = align(&rod, &plate, &specs("<X"), DVec3::ZERO).bounding_box();
        assert_relative_eq!(out.xmin(), -10.0);
    }

    #[test]
    fn later_spec_on_same_axis_wins() {
        let target = Shape::cuboid(10.0, 10.0, 10.0);
        let source = Shape::cube(2.0);
        let out = align(&source, &target, &specs("<X >X"), DVec3::ZERO).bounding_box();
        assert_relative_eq!(out.xmax(), 5.0);
    }

    #[test]
    fn offset_is_added_after_alignment() {
        let target = Shape::cube(10.0);
        let source = Shape::cube(2.0);
        let out = align(&source, &target, &specs("<X"), DVec3::new(1.5, -2.0, 0.0)).bounding_box();
        assert_relative_eq!(out.xmin(), -3.5);
        assert_relative_eq!(out.ymin(), -3.0);
    }

    #[test]
    fn empty_specs_only_offset() {
        let s = Shape::cube(1.0);
        let out = align(&s, &Shape::cube(9.0), &[], DVec3::new(0.0, 0.0, 4.0));
        assert_relative_eq!(out.bounding_box().center().z, 4.0);
    }
}
