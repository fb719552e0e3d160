// Copyright (c) 2019 Georg Brandl.  Licensed under the Apache License,
// Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at
// your option. This file may not be copied, modified, or distributed except
// according to those terms.

use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::ast::{LoadPolarity, Mirroring};
use crate::coord::{Offset, Point};

/// Polarity of resolved geometry.
///
/// Regions carry their own variants so that a renderer can tell filled
/// contours from stroked geometry.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Display, Serialize, Deserialize)]
pub enum Polarity {
    Dark,
    Clear,
    DarkRegion,
    ClearRegion,
}

impl Default for Polarity {
    fn default() -> Self { Polarity::Dark }
}

impl Polarity {
    pub fn to_region_variant(self) -> Self {
        match self {
            Polarity::Dark | Polarity::DarkRegion => Polarity::DarkRegion,
            Polarity::Clear | Polarity::ClearRegion => Polarity::ClearRegion,
        }
    }

    pub fn inverted(self) -> Self {
        match self {
            Polarity::Dark => Polarity::Clear,
            Polarity::Clear => Polarity::Dark,
            Polarity::DarkRegion => Polarity::ClearRegion,
            Polarity::ClearRegion => Polarity::DarkRegion,
        }
    }

    pub fn is_clear(self) -> bool {
        matches!(self, Polarity::Clear | Polarity::ClearRegion)
    }
}

impl From<LoadPolarity> for Polarity {
    fn from(p: LoadPolarity) -> Self {
        match p {
            LoadPolarity::Dark => Polarity::Dark,
            LoadPolarity::Clear => Polarity::Clear,
        }
    }
}

/// Interpolation mode for D01.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Display, Serialize, Deserialize)]
pub enum DrawMode {
    Linear,
    Clockwise,
    CounterClockwise,
}

impl Default for DrawMode {
    fn default() -> Self { DrawMode::Linear }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Display, Serialize, Deserialize)]
pub enum QuadrantMode {
    Single,
    Multi,
}

impl Default for QuadrantMode {
    fn default() -> Self { QuadrantMode::Single }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Display, Serialize, Deserialize)]
pub enum ArcDirection {
    Clockwise,
    CounterClockwise,
}

impl DrawMode {
    pub fn arc_direction(self) -> Option<ArcDirection> {
        match self {
            DrawMode::Linear => None,
            DrawMode::Clockwise => Some(ArcDirection::Clockwise),
            DrawMode::CounterClockwise => Some(ArcDirection::CounterClockwise),
        }
    }
}

/// The object transformation set by LM, LR and LS.
///
/// Applied in that order: mirroring, then rotation (degrees, counter
/// clockwise), then scaling, all about the origin of the object.
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct Transform {
    pub mirroring: Mirroring,
    pub rotation: f64,
    pub scaling: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Transform { mirroring: Mirroring::None, rotation: 0.0, scaling: 1.0 }
    }
}

impl Transform {
    pub fn is_identity(&self) -> bool {
        self.mirroring == Mirroring::None && self.rotation == 0.0 && self.scaling == 1.0
    }

    /// Whether the transform reverses orientation (turns CW arcs into CCW).
    pub fn flips(&self) -> bool {
        matches!(self.mirroring, Mirroring::X | Mirroring::Y)
    }

    /// Apply the transform to a vector relative to the object origin.
    pub fn apply(&self, p: Point) -> Point {
        if self.is_identity() {
            return p;
        }
        let (mut x, mut y) = (p.x.0 as f64, p.y.0 as f64);
        match self.mirroring {
            Mirroring::None => (),
            Mirroring::X => x = -x,
            Mirroring::Y => y = -y,
            Mirroring::XY => { x = -x; y = -y; }
        }
        if self.rotation != 0.0 {
            let (sin, cos) = self.rotation.to_radians().sin_cos();
            let rx = x * cos - y * sin;
            y = x * sin + y * cos;
            x = rx;
        }
        x *= self.scaling;
        y *= self.scaling;
        Point::new(Offset(x.round() as i64), Offset(y.round() as i64))
    }

    /// The transform equivalent to applying `inner` first, then `self`.
    ///
    /// Mirroring composes exactly; the rotation of the inner transform is
    /// reflected when the outer one flips orientation.
    pub fn compose(&self, inner: &Transform) -> Transform {
        let (ox, oy) = mirror_flags(self.mirroring);
        let (ix, iy) = mirror_flags(inner.mirroring);
        let inner_rotation = if ox != oy { -inner.rotation } else { inner.rotation };
        Transform {
            mirroring: mirroring_from_flags(ox != ix, oy != iy),
            rotation: (self.rotation + inner_rotation) % 360.0,
            scaling: self.scaling * inner.scaling,
        }
    }
}

fn mirror_flags(m: Mirroring) -> (bool, bool) {
    match m {
        Mirroring::None => (false, false),
        Mirroring::X => (true, false),
        Mirroring::Y => (false, true),
        Mirroring::XY => (true, true),
    }
}

fn mirroring_from_flags(x: bool, y: bool) -> Mirroring {
    match (x, y) {
        (false, false) => Mirroring::None,
        (true, false) => Mirroring::X,
        (false, true) => Mirroring::Y,
        (true, true) => Mirroring::XY,
    }
}

/// Kinds of nested buffer frames.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Display, Serialize, Deserialize)]
pub enum FrameKind {
    #[strum(serialize = "region")]
    Region,
    #[strum(serialize = "aperture block")]
    Block,
    #[strum(serialize = "step and repeat")]
    StepRepeat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_order() {
        let t = Transform { mirroring: Mirroring::X, rotation: 90.0, scaling: 2.0 };
        // mirror (1,0) -> (-1,0), rotate -> (0,-1), scale -> (0,-2)
        assert_eq!(t.apply(Point::from_mm(1.0, 0.0)), Point::from_mm(0.0, -2.0));
        assert!(t.flips());
        assert!(Transform::default().is_identity());
    }

    #[test]
    fn compose_matches_sequential() {
        let outer = Transform { mirroring: Mirroring::Y, rotation: 30.0, scaling: 1.5 };
        let inner = Transform { mirroring: Mirroring::X, rotation: 45.0, scaling: 2.0 };
        let p = Point::from_mm(1.25, -0.5);
        let seq = outer.apply(inner.apply(p));
        let comp = outer.compose(&inner).apply(p);
        assert!((seq.x.0 - comp.x.0).abs() <= 2);
        assert!((seq.y.0 - comp.y.0).abs() <= 2);
    }
}
