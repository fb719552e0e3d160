// Copyright (c) 2019 Georg Brandl.  Licensed under the Apache License,
// Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at
// your option. This file may not be copied, modified, or distributed except
// according to those terms.

//! Resolved drawing commands and the nested buffers collecting them.

use std::collections::BTreeMap;
use itertools::iproduct;
use serde::{Deserialize, Serialize};

use crate::ast::ApertureId;
use crate::coord::{CoordinateError, Offset, Point};
use super::aperture::ApertureRegistry;
use super::enums::*;
use super::error::ErrType;

/// Object attributes attached to a command, name to comma-joined value.
pub type Attributes = BTreeMap<String, String>;

/// A drawing command with absolute coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum DrawCommand {
    Flash(Flash),
    Line(Line),
    Arc(Arc),
    Region(Region),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flash {
    pub aperture: ApertureId,
    pub position: Point,
    pub polarity: Polarity,
    pub transform: Transform,
    pub attributes: Attributes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    /// `None` for region outlines drawn without an aperture.
    pub aperture: Option<ApertureId>,
    pub start: Point,
    pub end: Point,
    pub width: Offset,
    pub polarity: Polarity,
    pub attributes: Attributes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arc {
    pub aperture: Option<ApertureId>,
    pub start: Point,
    pub end: Point,
    pub center: Point,
    /// Center relative to the start point.
    pub center_offset: Point,
    pub direction: ArcDirection,
    pub quadrant: QuadrantMode,
    /// Swept angle in degrees, in `(0, 360]` except for zero-length
    /// single-quadrant arcs.
    pub sweep: f64,
    pub width: Offset,
    pub polarity: Polarity,
    pub attributes: Attributes,
}

/// A filled area bounded by one or more closed contours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub contours: Vec<Contour>,
    pub polarity: Polarity,
    pub attributes: Attributes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contour {
    pub start: Point,
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Segment {
    Line { end: Point },
    Arc { end: Point, center: Point, direction: ArcDirection, sweep: f64 },
}

impl Segment {
    pub fn end(&self) -> Point {
        match self {
            Segment::Line { end } | Segment::Arc { end, .. } => *end,
        }
    }

    fn map_points(&mut self, f: &impl Fn(Point) -> PointResult, flip: bool) -> Result<(), CoordinateError> {
        match self {
            Segment::Line { end } => *end = f(*end)?,
            Segment::Arc { end, center, direction, .. } => {
                *end = f(*end)?;
                *center = f(*center)?;
                if flip {
                    *direction = flipped(*direction);
                }
            }
        }
        Ok(())
    }
}

type PointResult = Result<Point, CoordinateError>;

fn out_of_range(p: Point) -> CoordinateError {
    CoordinateError::Overflow(p.to_string())
}

fn flipped(dir: ArcDirection) -> ArcDirection {
    match dir {
        ArcDirection::Clockwise => ArcDirection::CounterClockwise,
        ArcDirection::CounterClockwise => ArcDirection::Clockwise,
    }
}

impl DrawCommand {
    pub fn polarity(&self) -> Polarity {
        match self {
            DrawCommand::Flash(c) => c.polarity,
            DrawCommand::Line(c) => c.polarity,
            DrawCommand::Arc(c) => c.polarity,
            DrawCommand::Region(c) => c.polarity,
        }
    }

    pub fn attributes(&self) -> &Attributes {
        match self {
            DrawCommand::Flash(c) => &c.attributes,
            DrawCommand::Line(c) => &c.attributes,
            DrawCommand::Arc(c) => &c.attributes,
            DrawCommand::Region(c) => &c.attributes,
        }
    }

    pub fn invert_polarity(&mut self) {
        let p = match self {
            DrawCommand::Flash(c) => &mut c.polarity,
            DrawCommand::Line(c) => &mut c.polarity,
            DrawCommand::Arc(c) => &mut c.polarity,
            DrawCommand::Region(c) => &mut c.polarity,
        };
        *p = p.inverted();
    }

    /// Move all points by `by`.  Fails if a point leaves the range of
    /// lengths; the command is then partly moved and should be dropped.
    pub fn translate(&mut self, by: Point) -> Result<(), CoordinateError> {
        self.map_points(|p| p.checked_add(by).ok_or_else(|| out_of_range(p)), false)
    }

    /// Apply an object transform about the origin.
    ///
    /// Widths are scaled, flashes compose the transform with their own, and
    /// mirroring reverses the direction of arcs.
    pub fn transform(&mut self, t: &Transform) -> Result<(), CoordinateError> {
        if t.is_identity() {
            return Ok(());
        }
        self.map_points(|p| {
            let q = t.apply(p);
            if q.in_range() { Ok(q) } else { Err(out_of_range(p)) }
        }, t.flips())?;
        match self {
            DrawCommand::Flash(c) => c.transform = t.compose(&c.transform),
            DrawCommand::Line(c) => c.width = c.width.scaled(t.scaling),
            DrawCommand::Arc(c) => c.width = c.width.scaled(t.scaling),
            DrawCommand::Region(_) => (),
        }
        Ok(())
    }

    fn map_points(&mut self, f: impl Fn(Point) -> PointResult, flip: bool) -> Result<(), CoordinateError> {
        match self {
            DrawCommand::Flash(c) => c.position = f(c.position)?,
            DrawCommand::Line(c) => {
                c.start = f(c.start)?;
                c.end = f(c.end)?;
            }
            DrawCommand::Arc(c) => {
                c.start = f(c.start)?;
                c.end = f(c.end)?;
                c.center = f(c.center)?;
                c.center_offset = c.center - c.start;
                if flip {
                    c.direction = flipped(c.direction);
                }
            }
            DrawCommand::Region(c) => {
                for contour in &mut c.contours {
                    contour.start = f(contour.start)?;
                    for seg in &mut contour.segments {
                        seg.map_points(&f, flip)?;
                    }
                }
            }
        }
        Ok(())
    }
}

/// An axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point,
    pub max: Point,
}

impl BoundingBox {
    pub fn width(&self) -> Offset {
        Offset(self.max.x.0.saturating_sub(self.min.x.0))
    }

    pub fn height(&self) -> Offset {
        Offset(self.max.y.0.saturating_sub(self.min.y.0))
    }
}

#[derive(Default)]
struct Extents(Option<BoundingBox>);

impl Extents {
    fn add(&mut self, p: Point, hx: Offset, hy: Offset) {
        // scaled widths are not range checked
        let lo = Point::new(Offset(p.x.0.saturating_sub(hx.0)), Offset(p.y.0.saturating_sub(hy.0)));
        let hi = Point::new(Offset(p.x.0.saturating_add(hx.0)), Offset(p.y.0.saturating_add(hy.0)));
        let b = self.0.get_or_insert(BoundingBox { min: lo, max: hi });
        b.min = Point::new(b.min.x.min(lo.x), b.min.y.min(lo.y));
        b.max = Point::new(b.max.x.max(hi.x), b.max.y.max(hi.y));
    }

    /// Arcs contribute their full circle, which is never too small.
    fn add_arc(&mut self, start: Point, center: Point, margin: Offset) {
        let d = start - center;
        let r = Offset(((d.x.0 as f64).hypot(d.y.0 as f64).ceil() as i64).saturating_add(margin.0));
        self.add(center, r, r);
    }
}

/// An ordered list of resolved commands.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandBuffer {
    commands: Vec<DrawCommand>,
}

impl CommandBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_command(&mut self, cmd: DrawCommand) {
        self.commands.push(cmd);
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn into_commands(self) -> Vec<DrawCommand> {
        self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<DrawCommand> {
        self.commands.iter()
    }

    /// Extents of all geometry, or `None` for an empty buffer.
    ///
    /// Strokes include their half width and flashes of standard apertures
    /// their shape; macro flashes only contribute their position.
    pub fn bounding_box(&self, apertures: &ApertureRegistry) -> Option<BoundingBox> {
        let mut ext = Extents::default();
        for cmd in &self.commands {
            match cmd {
                DrawCommand::Flash(f) => {
                    let (hx, hy) = apertures.get(f.aperture).ok()
                        .and_then(|a| a.shape.half_extent())
                        .unwrap_or((Offset::ZERO, Offset::ZERO));
                    let (hx, hy) = if f.transform.rotation % 180.0 == 0.0 {
                        (hx, hy)
                    } else {
                        let r = Offset((hx.0 as f64).hypot(hy.0 as f64).ceil() as i64);
                        (r, r)
                    };
                    let s = f.transform.scaling;
                    ext.add(f.position, hx.scaled(s), hy.scaled(s));
                }
                DrawCommand::Line(l) => {
                    let h = Offset(l.width.0 / 2);
                    ext.add(l.start, h, h);
                    ext.add(l.end, h, h);
                }
                DrawCommand::Arc(a) => ext.add_arc(a.start, a.center, Offset(a.width.0 / 2)),
                DrawCommand::Region(r) => {
                    for contour in &r.contours {
                        let mut pos = contour.start;
                        ext.add(pos, Offset::ZERO, Offset::ZERO);
                        for seg in &contour.segments {
                            match seg {
                                Segment::Line { end } => ext.add(*end, Offset::ZERO, Offset::ZERO),
                                Segment::Arc { center, .. } =>
                                    ext.add_arc(pos, *center, Offset::ZERO),
                            }
                            pos = seg.end();
                        }
                    }
                }
            }
        }
        ext.0
    }
}

impl IntoIterator for CommandBuffer {
    type Item = DrawCommand;
    type IntoIter = std::vec::IntoIter<DrawCommand>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.into_iter()
    }
}

impl<'a> IntoIterator for &'a CommandBuffer {
    type Item = &'a DrawCommand;
    type IntoIter = std::slice::Iter<'a, DrawCommand>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.iter()
    }
}

impl Extend<DrawCommand> for CommandBuffer {
    fn extend<I: IntoIterator<Item = DrawCommand>>(&mut self, iter: I) {
        self.commands.extend(iter)
    }
}

/// Repetition grid of a step-and-repeat block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    pub x_repeat: u32,
    pub y_repeat: u32,
    pub x_step: Offset,
    pub y_step: Offset,
}

#[derive(Debug, Clone, PartialEq)]
enum Frame {
    Region { contours: Vec<Contour>, current: Option<Contour> },
    Block { id: ApertureId, buffer: CommandBuffer },
    StepRepeat { grid: Grid, buffer: CommandBuffer },
}

impl Frame {
    fn kind(&self) -> FrameKind {
        match self {
            Frame::Region { .. } => FrameKind::Region,
            Frame::Block { .. } => FrameKind::Block,
            Frame::StepRepeat { .. } => FrameKind::StepRepeat,
        }
    }
}

fn replicate(frame: &Frame, max_commands: u64) -> Result<Vec<DrawCommand>, ErrType> {
    let (grid, buffer) = match frame {
        Frame::StepRepeat { grid, buffer } => (grid, buffer),
        frame => return Err(ErrType::NotOpen(frame.kind())),
    };
    if buffer.is_empty() {
        return Ok(vec![]);
    }
    let total = u64::from(grid.x_repeat).checked_mul(u64::from(grid.y_repeat))
        .and_then(|n| n.checked_mul(buffer.len() as u64));
    let total = match total {
        Some(n) if n <= max_commands => n,
        _ => return Err(ErrType::StepRepeatTooLarge {
            x_repeat: grid.x_repeat,
            y_repeat: grid.y_repeat,
            commands: buffer.len(),
            limit: max_commands,
        }),
    };
    let mut result = Vec::with_capacity(total as usize);
    for (ix, iy) in iproduct!(0..i64::from(grid.x_repeat), 0..i64::from(grid.y_repeat)) {
        let step = |s: Offset, i: i64| s.checked_mul(i)
            .ok_or_else(|| CoordinateError::Overflow(format!("{} x {}", s, i)));
        let by = Point::new(step(grid.x_step, ix)?, step(grid.y_step, iy)?);
        for cmd in buffer {
            let mut cmd = cmd.clone();
            cmd.translate(by)?;
            result.push(cmd);
        }
    }
    Ok(result)
}

/// The main buffer together with the stack of open regions, blocks and
/// step-and-repeats.
///
/// The innermost open frame receives new commands; a region only takes
/// contour segments, so visible commands pass to the frame below it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BufferStack {
    main: CommandBuffer,
    frames: Vec<Frame>,
}

impl BufferStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_command(&mut self, cmd: DrawCommand) {
        let target = self.frames.iter_mut().rev().find_map(|frame| match frame {
            Frame::Block { buffer, .. } | Frame::StepRepeat { buffer, .. } => Some(buffer),
            Frame::Region { .. } => None,
        });
        target.unwrap_or(&mut self.main).add_command(cmd);
    }

    pub fn in_region(&self) -> bool {
        matches!(self.frames.last(), Some(Frame::Region { .. }))
    }

    pub fn is_open(&self, kind: FrameKind) -> bool {
        self.frames.iter().any(|f| f.kind() == kind)
    }

    pub fn depth(&self, kind: FrameKind) -> usize {
        self.frames.iter().filter(|f| f.kind() == kind).count()
    }

    /// The innermost open frame kind.
    pub fn innermost(&self) -> Option<FrameKind> {
        self.frames.last().map(Frame::kind)
    }

    pub fn open_region(&mut self) -> Result<(), ErrType> {
        if self.in_region() {
            return Err(ErrType::RegionAlreadyOpen);
        }
        self.frames.push(Frame::Region { contours: vec![], current: None });
        Ok(())
    }

    /// Append a segment to the current contour, starting a new contour at
    /// `from` if none is in progress.
    pub fn add_segment(&mut self, from: Point, seg: Segment) -> Result<(), ErrType> {
        match self.frames.last_mut() {
            Some(Frame::Region { current, .. }) => {
                current.get_or_insert_with(|| Contour { start: from, segments: vec![] })
                       .segments.push(seg);
                Ok(())
            }
            _ => Err(ErrType::NotOpen(FrameKind::Region)),
        }
    }

    /// Finish the current contour; the next segment starts a new one.
    pub fn end_contour(&mut self) -> Result<(), ErrType> {
        match self.frames.last_mut() {
            Some(Frame::Region { contours, current }) => {
                contours.extend(current.take());
                Ok(())
            }
            _ => Err(ErrType::NotOpen(FrameKind::Region)),
        }
    }

    /// Close the region and emit it to the enclosing buffer, unless it has
    /// no contours.
    pub fn close_region(&mut self, polarity: Polarity, attributes: Attributes) -> Result<(), ErrType> {
        let mut contours = match self.pop(FrameKind::Region)? {
            Frame::Region { contours, current } => {
                let mut contours = contours;
                contours.extend(current);
                contours
            }
            frame => return Err(ErrType::NotOpen(frame.kind())),
        };
        contours.retain(|c| !c.segments.is_empty());
        if !contours.is_empty() {
            self.add_command(DrawCommand::Region(Region {
                contours,
                polarity: polarity.to_region_variant(),
                attributes,
            }));
        }
        Ok(())
    }

    /// Check if a block with this id is being defined.
    pub fn is_block_open(&self, id: ApertureId) -> bool {
        self.frames.iter().any(|f| matches!(f, Frame::Block { id: open, .. } if *open == id))
    }

    pub fn open_block(&mut self, id: ApertureId) -> Result<(), ErrType> {
        if self.in_region() {
            return Err(ErrType::NotAllowedInRegion("AB"));
        }
        if self.is_block_open(id) {
            return Err(ErrType::ApertureRedefined(id));
        }
        self.frames.push(Frame::Block { id, buffer: CommandBuffer::new() });
        Ok(())
    }

    /// Close the innermost block, returning its id and captured commands.
    pub fn close_block(&mut self) -> Result<(ApertureId, CommandBuffer), ErrType> {
        match self.pop(FrameKind::Block)? {
            Frame::Block { id, buffer } => Ok((id, buffer)),
            frame => Err(ErrType::NotOpen(frame.kind())),
        }
    }

    pub fn open_step_repeat(&mut self, grid: Grid) -> Result<(), ErrType> {
        if self.in_region() {
            return Err(ErrType::NotAllowedInRegion("SR"));
        }
        if self.is_open(FrameKind::StepRepeat) {
            return Err(ErrType::StepRepeatNested);
        }
        self.frames.push(Frame::StepRepeat { grid, buffer: CommandBuffer::new() });
        Ok(())
    }

    /// Close the step-and-repeat and replicate its commands over the grid
    /// into the enclosing buffer.
    ///
    /// At most `max_commands` commands are produced.  On error the
    /// step-and-repeat stays open.
    pub fn close_step_repeat(&mut self, max_commands: u64) -> Result<(), ErrType> {
        let frame = self.pop(FrameKind::StepRepeat)?;
        match replicate(&frame, max_commands) {
            Ok(commands) => {
                for cmd in commands {
                    self.add_command(cmd);
                }
                Ok(())
            }
            Err(e) => {
                self.frames.push(frame);
                Err(e)
            }
        }
    }

    /// Drop all open frames and return the main buffer.
    pub fn into_main(self) -> CommandBuffer {
        self.main
    }

    pub fn main(&self) -> &CommandBuffer {
        &self.main
    }

    fn pop(&mut self, kind: FrameKind) -> Result<Frame, ErrType> {
        match self.frames.last().map(Frame::kind) {
            Some(top) if top == kind => self.frames.pop().ok_or(ErrType::NotOpen(kind)),
            Some(top) if self.is_open(kind) => Err(ErrType::MismatchedClose { closing: kind, open: top }),
            _ => Err(ErrType::NotOpen(kind)),
        }
    }
}
