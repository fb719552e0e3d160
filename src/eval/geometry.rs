// Copyright (c) 2019 Georg Brandl.  Licensed under the Apache License,
// Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at
// your option. This file may not be copied, modified, or distributed except
// according to those terms.

//! Arc center resolution.

use crate::coord::{Offset, Point};
use super::enums::{ArcDirection, QuadrantMode};
use super::error::ErrType;

/// Sweeps this close to a quarter turn still count as single-quadrant.
const SWEEP_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedArc {
    pub center: Point,
    /// Degrees swept from start to end in the arc's direction.
    pub sweep: f64,
}

fn angle(center: Point, p: Point) -> f64 {
    ((p.y - center.y).0 as f64).atan2((p.x - center.x).0 as f64).to_degrees()
}

fn radius(center: Point, p: Point) -> f64 {
    ((p.x - center.x).0 as f64).hypot((p.y - center.y).0 as f64)
}

/// Angle swept around `center` from `start` to `end`, in `[0, 360)`.
pub fn sweep_angle(center: Point, start: Point, end: Point, dir: ArcDirection) -> f64 {
    let (a0, a1) = (angle(center, start), angle(center, end));
    let delta = match dir {
        ArcDirection::CounterClockwise => a1 - a0,
        ArcDirection::Clockwise => a0 - a1,
    };
    let sweep = delta.rem_euclid(360.0);
    // rounding can land just below a full turn for identical angles
    if 360.0 - sweep < SWEEP_TOLERANCE { 0.0 } else { sweep }
}

/// Find the center and sweep of an arc from `start` to `end` with the
/// given I/J offsets.
///
/// In multi-quadrant mode the offsets are signed and an arc ending at its
/// start is a full circle.  In single-quadrant mode they are unsigned, and the
/// center is the candidate with a sweep of at most 90 degrees that best
/// matches the start and end radius.
pub fn resolve_arc(start: Point, end: Point, i: Offset, j: Offset,
                   dir: ArcDirection, quadrant: QuadrantMode) -> Result<ResolvedArc, ErrType> {
    match quadrant {
        QuadrantMode::Multi => {
            let center = start + Point::new(i, j);
            if center == start {
                return Err(ErrType::InvalidArc);
            }
            let sweep = if start == end { 360.0 } else { sweep_angle(center, start, end, dir) };
            Ok(ResolvedArc { center, sweep: if sweep == 0.0 { 360.0 } else { sweep } })
        }
        QuadrantMode::Single => {
            let (i, j) = (i.abs(), j.abs());
            let candidates = [(i, j), (-i, j), (i, -j), (-i, -j)];
            candidates.iter()
                .map(|&(ci, cj)| start + Point::new(ci, cj))
                .filter_map(|center| {
                    let sweep = sweep_angle(center, start, end, dir);
                    if sweep <= 90.0 + SWEEP_TOLERANCE {
                        let mismatch = (radius(center, start) - radius(center, end)).abs();
                        Some((mismatch, ResolvedArc { center, sweep }))
                    } else {
                        None
                    }
                })
                .min_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal))
                .map(|(_, arc)| arc)
                .ok_or(ErrType::InvalidArc)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(x: f64, y: f64) -> Point {
        Point::from_mm(x, y)
    }

    #[test]
    fn multi_quadrant() {
        let mm = Offset::from_mm;
        let arc = resolve_arc(pt(1.0, 0.0), pt(0.0, 1.0), mm(-1.0), mm(0.0),
                              ArcDirection::CounterClockwise, QuadrantMode::Multi).unwrap();
        assert_eq!(arc.center, pt(0.0, 0.0));
        assert!((arc.sweep - 90.0).abs() < 1e-9);

        let arc = resolve_arc(pt(1.0, 0.0), pt(0.0, 1.0), mm(-1.0), mm(0.0),
                              ArcDirection::Clockwise, QuadrantMode::Multi).unwrap();
        assert!((arc.sweep - 270.0).abs() < 1e-9);

        let full = resolve_arc(pt(1.0, 0.0), pt(1.0, 0.0), mm(-1.0), mm(0.0),
                               ArcDirection::Clockwise, QuadrantMode::Multi).unwrap();
        assert_eq!(full.sweep, 360.0);
    }

    #[test]
    fn single_quadrant_picks_center() {
        let mm = Offset::from_mm;
        // quarter circle from (1,0) to (0,1) counterclockwise around the origin
        let arc = resolve_arc(pt(1.0, 0.0), pt(0.0, 1.0), mm(1.0), mm(0.0),
                              ArcDirection::CounterClockwise, QuadrantMode::Single).unwrap();
        assert_eq!(arc.center, pt(0.0, 0.0));
        // the same points clockwise go around (1,1)
        let arc = resolve_arc(pt(1.0, 0.0), pt(0.0, 1.0), mm(0.0), mm(1.0),
                              ArcDirection::Clockwise, QuadrantMode::Single).unwrap();
        assert_eq!(arc.center, pt(1.0, 1.0));
        assert!((arc.sweep - 90.0).abs() < 1e-9);
    }
}
