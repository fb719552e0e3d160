// Copyright (c) 2019 Georg Brandl.  Licensed under the Apache License,
// Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at
// your option. This file may not be copied, modified, or distributed except
// according to those terms.

mod aperture;
mod buffer;
mod enums;
mod error;
mod geometry;
mod macros;

use std::collections::BTreeMap;
use log::{debug, info, warn};
use serde::Serialize;

use crate::ast::*;
use crate::config::{Config, InterpreterOptions, NumericOptions, OnError};
use crate::coord::{Axis, CoordinateError, CoordinateFormat, Notation, Offset, Packed, Point, Unit};
use crate::span::{Span, Spanned};

pub use self::aperture::*;
pub use self::buffer::*;
pub use self::enums::*;
pub use self::error::*;
pub use self::geometry::{resolve_arc, sweep_angle, ResolvedArc};
pub use self::macros::{eval_expr, instantiate, Vars};

/// Interpreter state, as seen after each command.
#[derive(Debug, Clone, Serialize)]
pub struct State {
    pub format: Option<CoordinateFormat>,
    pub unit: Option<Unit>,
    pub notation: Notation,
    pub position: Point,
    pub draw_mode: DrawMode,
    pub quadrant_mode: QuadrantMode,
    pub polarity: Polarity,
    pub transform: Transform,
    pub apertures: ApertureRegistry,
    pub macros: BTreeMap<String, MacroDefinition>,
    pub file_attributes: Attributes,
    /// Attributes attached to every following draw command.
    pub object_attributes: Attributes,
    pub region_active: bool,
    pub block_depth: usize,
    pub step_repeat: Option<StepRepeat>,
    pub image_name: Option<String>,
    pub image_polarity: Option<ImagePolarity>,
    pub axis_select: Option<AxisSelect>,
    pub reached_program_stop: bool,
    pub reached_optional_stop: bool,
    pub reached_end_of_file: bool,
}

impl Default for State {
    fn default() -> Self {
        State {
            format: None,
            unit: None,
            notation: Notation::Absolute,
            position: Point::ORIGIN,
            draw_mode: DrawMode::default(),
            quadrant_mode: QuadrantMode::default(),
            polarity: Polarity::default(),
            transform: Transform::default(),
            apertures: ApertureRegistry::new(),
            macros: BTreeMap::new(),
            file_attributes: Attributes::new(),
            object_attributes: Attributes::new(),
            region_active: false,
            block_depth: 0,
            step_repeat: None,
            image_name: None,
            image_polarity: None,
            axis_select: None,
            reached_program_stop: false,
            reached_optional_stop: false,
            reached_end_of_file: false,
        }
    }
}

/// The part of the state saved by SR and restored at its close.
#[derive(Debug, Clone)]
struct Graphics {
    position: Point,
    draw_mode: DrawMode,
    quadrant_mode: QuadrantMode,
    polarity: Polarity,
    transform: Transform,
    aperture: Option<ApertureId>,
}

/// Result of evaluating one command.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Continue,
    /// The command failed and was skipped according to the error policy.
    Skipped(EvalError),
}

/// Result of a whole pass.
#[derive(Debug, Clone, Serialize)]
pub struct Output {
    pub commands: CommandBuffer,
    pub state: State,
}

/// The Evaluator replays the commands of a Gerber file, keeping track of the
/// graphics state and collecting resolved drawing commands.
///
/// Commands are evaluated strictly in order.  A command that fails leaves
/// the state as it was before; whether the failure aborts the pass depends
/// on the configured `on_error` policy.
pub struct Evaluator {
    options: InterpreterOptions,
    numeric: NumericOptions,
    state: State,
    buffers: BufferStack,
    saved: Option<Graphics>,
    last_span: Span,
    evaluated: usize,
    skipped: usize,
}

impl Evaluator {
    pub fn new(config: &Config) -> Self {
        Evaluator {
            options: config.interpreter.clone(),
            numeric: config.numeric.clone(),
            state: State::default(),
            buffers: BufferStack::new(),
            saved: None,
            last_span: Span::default(),
            evaluated: 0,
            skipped: 0,
        }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn buffers(&self) -> &BufferStack {
        &self.buffers
    }

    /// Evaluate all commands of the file.
    pub fn eval(&mut self, file: &File) -> Result<(), EvalError> {
        self.eval_until(file, |_| false).map(drop)
    }

    /// Evaluate commands until `stop` returns true for the state after a
    /// command.  Returns the number of commands evaluated.
    pub fn eval_until<F>(&mut self, file: &File, mut stop: F) -> Result<usize, EvalError>
    where F: FnMut(&State) -> bool
    {
        for (n, command) in file.commands.iter().enumerate() {
            self.eval_command(command)?;
            if stop(&self.state) {
                return Ok(n + 1);
            }
        }
        Ok(file.commands.len())
    }

    /// Evaluate a single command, applying the error policy.
    pub fn eval_command(&mut self, command: &Spanned<Command>) -> Result<Step, EvalError> {
        self.last_span = command.span;
        self.evaluated += 1;
        let result = self.exec(&command.node);
        self.state.region_active = self.buffers.in_region();
        self.state.block_depth = self.buffers.depth(FrameKind::Block);
        match result {
            Ok(()) => Ok(Step::Continue),
            Err(errtype) => {
                let err = errtype.at(command.span);
                match self.options.on_error {
                    OnError::Raise => Err(err),
                    OnError::Warn => {
                        warn!("{}; skipping {}", err, command.node);
                        self.skipped += 1;
                        Ok(Step::Skipped(err))
                    }
                    OnError::Ignore => {
                        self.skipped += 1;
                        Ok(Step::Skipped(err))
                    }
                }
            }
        }
    }

    /// End the pass and return the collected commands with the final state.
    pub fn finish(mut self) -> Result<Output, EvalError> {
        if let Some(kind) = self.buffers.innermost() {
            let err = ErrType::UnclosedAtEnd(kind).at(self.last_span);
            match self.options.on_error {
                OnError::Raise => return Err(err),
                OnError::Warn => warn!("{}; discarding unclosed commands", err),
                OnError::Ignore => (),
            }
            self.state.region_active = false;
            self.state.block_depth = 0;
            self.state.step_repeat = None;
            if let Some(saved) = self.saved.take() {
                self.restore_graphics(saved);
            }
        }
        let commands = self.buffers.into_main();
        info!("evaluated {} commands ({} skipped), {} draw commands, {} apertures",
              self.evaluated, self.skipped, commands.len(), self.state.apertures.len());
        Ok(Output { commands, state: self.state })
    }

    // -- private API --

    fn exec(&mut self, command: &Command) -> Result<(), ErrType> {
        match command {
            Command::Plot(c) => self.plot(c)?,
            Command::Move(c) => self.move_to(c)?,
            Command::Flash(c) => self.flash(c)?,
            Command::SelectAperture(id) => self.state.apertures.select(*id)?,

            Command::Linear => self.state.draw_mode = DrawMode::Linear,
            Command::Clockwise => self.state.draw_mode = DrawMode::Clockwise,
            Command::CounterClockwise => self.state.draw_mode = DrawMode::CounterClockwise,
            Command::Comment(_) => (),
            Command::RegionStart => self.buffers.open_region()?,
            Command::RegionEnd => {
                let attributes = self.state.object_attributes.clone();
                self.buffers.close_region(self.state.polarity, attributes)?;
            }
            Command::SelectAperturePrefix | Command::PrepareFlash =>
                debug!("ignoring deprecated {}", command),
            Command::UnitInch => self.state.unit = Some(Unit::Inches),
            Command::UnitMillimeter => self.state.unit = Some(Unit::Millimeters),
            Command::SingleQuadrant => self.state.quadrant_mode = QuadrantMode::Single,
            Command::MultiQuadrant => self.state.quadrant_mode = QuadrantMode::Multi,
            Command::AbsoluteNotation => self.state.notation = Notation::Absolute,
            Command::IncrementalNotation => self.state.notation = Notation::Incremental,

            Command::ProgramStop => self.state.reached_program_stop = true,
            Command::OptionalStop => self.state.reached_optional_stop = true,
            Command::EndOfFile => self.state.reached_end_of_file = true,

            Command::FormatSpec(format) => {
                if self.state.format.is_some() {
                    return Err(ErrType::FormatRedefined);
                }
                self.state.format = Some(*format);
                self.state.notation = format.notation;
            }
            Command::UnitMode(unit) => self.state.unit = Some(*unit),
            Command::ApertureDefine(def) => self.define_aperture(def)?,
            Command::MacroDefine(def) => {
                if self.state.macros.contains_key(&def.name) {
                    return Err(ErrType::MacroRedefined(def.name.clone()));
                }
                self.state.macros.insert(def.name.clone(), def.clone());
            }
            Command::BlockOpen(id) => {
                if self.state.apertures.contains(*id) {
                    return Err(ErrType::ApertureRedefined(*id));
                }
                self.buffers.open_block(*id)?;
            }
            Command::BlockClose => {
                let (id, buffer) = self.buffers.close_block()?;
                let aperture = Aperture { shape: Shape::Block(buffer), attributes: Attributes::new() };
                self.state.apertures.define(id, aperture)?;
            }
            Command::StepRepeatOpen(sr) => {
                let unit = self.state.unit.ok_or(ErrType::UnitNotSet)?;
                self.buffers.open_step_repeat(Grid {
                    x_repeat: sr.x_repeat,
                    y_repeat: sr.y_repeat,
                    x_step: Offset::try_from_units(sr.x_step, unit)?,
                    y_step: Offset::try_from_units(sr.y_step, unit)?,
                })?;
                self.saved = Some(self.graphics());
                self.state.step_repeat = Some(sr.clone());
            }
            Command::StepRepeatClose => {
                self.buffers.close_step_repeat(self.options.max_step_repeat_commands)?;
                if let Some(saved) = self.saved.take() {
                    self.restore_graphics(saved);
                }
                self.state.step_repeat = None;
            }
            Command::LoadPolarity(p) => self.state.polarity = (*p).into(),
            Command::LoadMirroring(m) => self.state.transform.mirroring = *m,
            Command::LoadRotation(angle) => self.state.transform.rotation = *angle,
            Command::LoadScaling(factor) => self.state.transform.scaling = *factor,

            Command::FileAttribute(attr) => {
                self.state.file_attributes.insert(attr.name.clone(), attr.fields.join(","));
            }
            Command::ApertureAttribute(attr) => match self.state.apertures.current_mut() {
                Some(aperture) => {
                    aperture.attributes.insert(attr.name.clone(), attr.fields.join(","));
                }
                None => debug!("no aperture selected for attribute {}", attr.name),
            },
            Command::ObjectAttribute(attr) => {
                self.state.object_attributes.insert(attr.name.clone(), attr.fields.join(","));
            }
            Command::DeleteAttribute(Some(name)) => {
                self.state.object_attributes.remove(name);
                if let Some(aperture) = self.state.apertures.current_mut() {
                    aperture.attributes.remove(name);
                }
            }
            Command::DeleteAttribute(None) => {
                self.state.object_attributes.clear();
                if let Some(aperture) = self.state.apertures.current_mut() {
                    aperture.attributes.clear();
                }
            }

            Command::ImagePolarity(p) => self.state.image_polarity = Some(*p),
            Command::ImageName(name) => self.state.image_name = Some(name.clone()),
            Command::LoadName(name) => debug!("layer name {}", name),
            Command::AxisSelect(axes) => self.state.axis_select = Some(*axes),
            Command::ImageRotation(angle) => if *angle != 0 {
                warn!("ignoring deprecated image rotation {}", command);
            },
            Command::MirrorImage(values) | Command::ImageOffset(values) => {
                if values.a.unwrap_or(0.0) != 0.0 || values.b.unwrap_or(0.0) != 0.0 {
                    warn!("ignoring deprecated {}", command);
                }
            }
            Command::ScaleFactor(values) => {
                if values.a.unwrap_or(1.0) != 1.0 || values.b.unwrap_or(1.0) != 1.0 {
                    warn!("ignoring deprecated {}", command);
                }
            }
        }
        Ok(())
    }

    fn graphics(&self) -> Graphics {
        Graphics {
            position: self.state.position,
            draw_mode: self.state.draw_mode,
            quadrant_mode: self.state.quadrant_mode,
            polarity: self.state.polarity,
            transform: self.state.transform,
            aperture: self.state.apertures.current_id(),
        }
    }

    fn restore_graphics(&mut self, g: Graphics) {
        self.state.position = g.position;
        self.state.draw_mode = g.draw_mode;
        self.state.quadrant_mode = g.quadrant_mode;
        self.state.polarity = g.polarity;
        self.state.transform = g.transform;
        self.state.apertures.restore_selection(g.aperture);
    }

    fn format(&self) -> Result<(CoordinateFormat, Unit), ErrType> {
        let format = self.state.format.ok_or(ErrType::FormatNotSet)?;
        let unit = self.state.unit.ok_or(ErrType::UnitNotSet)?;
        Ok((format, unit))
    }

    fn resolve(&self, axis: Axis, packed: &Packed) -> Result<Offset, ErrType> {
        let (format, unit) = self.format()?;
        let enforce = self.numeric.coordinate_digit_budget_enforcement;
        Ok(format.resolve(axis, packed, unit, enforce)?)
    }

    /// The point a D01/D02/D03 moves to.  Missing X or Y keep the current
    /// value.
    fn resolve_target(&self, c: &Coordinates) -> Result<Point, ErrType> {
        let pos = self.state.position;
        let incremental = self.state.notation == Notation::Incremental;
        let coord = |axis: Axis, packed: &Option<Packed>, current: Offset| -> Result<Offset, ErrType> {
            match packed {
                None => Ok(current),
                Some(p) if incremental => current.checked_add(self.resolve(axis, p)?)
                    .ok_or_else(|| CoordinateError::Overflow(p.to_string()).into()),
                Some(p) => self.resolve(axis, p),
            }
        };
        Ok(Point::new(coord(Axis::X, &c.x, pos.x)?, coord(Axis::Y, &c.y, pos.y)?))
    }

    /// The I/J center offset of an arc; missing values are zero.
    fn resolve_center_offset(&self, c: &Coordinates) -> Result<(Offset, Offset), ErrType> {
        let offset = |axis: Axis, packed: &Option<Packed>| match packed {
            None => Ok(Offset::ZERO),
            Some(p) => self.resolve(axis, p),
        };
        Ok((offset(Axis::X, &c.i)?, offset(Axis::Y, &c.j)?))
    }

    fn stroke_width(&self, id: ApertureId, aperture: &Aperture) -> Offset {
        let width = aperture.shape.line_width().unwrap_or_else(|| {
            warn!("aperture {} cannot be used for strokes, using zero width", id);
            Offset::ZERO
        });
        width.scaled(self.state.transform.scaling)
    }

    fn stroke(&self, start: Point, segment: &Segment, aperture: Option<ApertureId>,
              width: Offset, polarity: Polarity) -> DrawCommand {
        let attributes = self.state.object_attributes.clone();
        match *segment {
            Segment::Line { end } =>
                DrawCommand::Line(Line { aperture, start, end, width, polarity, attributes }),
            Segment::Arc { end, center, direction, sweep } => DrawCommand::Arc(Arc {
                aperture,
                start,
                end,
                center,
                center_offset: center - start,
                direction,
                quadrant: self.state.quadrant_mode,
                sweep,
                width,
                polarity,
                attributes,
            }),
        }
    }

    fn plot(&mut self, c: &Coordinates) -> Result<(), ErrType> {
        let start = self.state.position;
        let end = self.resolve_target(c)?;
        let segment = match self.state.draw_mode.arc_direction() {
            None => Segment::Line { end },
            Some(direction) => {
                let (i, j) = self.resolve_center_offset(c)?;
                let arc = resolve_arc(start, end, i, j, direction, self.state.quadrant_mode)?;
                Segment::Arc { end, center: arc.center, direction, sweep: arc.sweep }
            }
        };
        if self.buffers.in_region() {
            if self.options.draw_region_outlines {
                let (id, width) = match self.state.apertures.current() {
                    Ok((id, aperture)) => (Some(id), self.stroke_width(id, aperture)),
                    Err(_) => (None, Offset::ZERO),
                };
                let polarity = self.state.polarity.to_region_variant();
                let outline = self.stroke(start, &segment, id, width, polarity);
                self.buffers.add_command(outline);
            }
            self.buffers.add_segment(start, segment)?;
        } else {
            let (id, aperture) = self.state.apertures.current()?;
            let width = self.stroke_width(id, aperture);
            let cmd = self.stroke(start, &segment, Some(id), width, self.state.polarity);
            self.buffers.add_command(cmd);
        }
        self.state.position = end;
        Ok(())
    }

    fn move_to(&mut self, c: &Coordinates) -> Result<(), ErrType> {
        let target = self.resolve_target(c)?;
        if self.buffers.in_region() {
            self.buffers.end_contour()?;
        }
        self.state.position = target;
        Ok(())
    }

    fn flash(&mut self, c: &Coordinates) -> Result<(), ErrType> {
        if self.buffers.in_region() {
            return Err(ErrType::NotAllowedInRegion("D03"));
        }
        let position = self.resolve_target(c)?;
        let (id, aperture) = self.state.apertures.current()?;
        let transform = self.state.transform;
        let commands: Vec<DrawCommand> = match &aperture.shape {
            Shape::Block(buffer) => {
                let invert = self.state.polarity.is_clear();
                buffer.iter().cloned().map(|mut cmd| -> Result<DrawCommand, CoordinateError> {
                    cmd.transform(&transform)?;
                    cmd.translate(position)?;
                    if invert {
                        cmd.invert_polarity();
                    }
                    Ok(cmd)
                }).collect::<Result<_, CoordinateError>>()?
            }
            _ => vec![DrawCommand::Flash(Flash {
                aperture: id,
                position,
                polarity: self.state.polarity,
                transform,
                attributes: self.state.object_attributes.clone(),
            })],
        };
        for cmd in commands {
            self.buffers.add_command(cmd);
        }
        self.state.position = position;
        Ok(())
    }

    fn define_aperture(&mut self, def: &ApertureDefinition) -> Result<(), ErrType> {
        let unit = self.state.unit.ok_or(ErrType::UnitNotSet)?;
        if self.state.apertures.contains(def.id) || self.buffers.is_block_open(def.id) {
            return Err(ErrType::ApertureRedefined(def.id));
        }
        let macros = &self.state.macros;
        let shape = Shape::from_template(&def.template, unit, |name, params| {
            let mac = macros.get(name).ok_or_else(|| ErrType::MacroNotFound(name.into()))?;
            Ok(Shape::Macro { name: name.into(), unit, primitives: instantiate(mac, params)? })
        })?;
        self.state.apertures.define(def.id, Aperture { shape, attributes: Attributes::new() })
    }
}

/// Interpret a whole file with the given configuration.
pub fn interpret(file: &File, config: &Config) -> Result<Output, EvalError> {
    let mut evaluator = Evaluator::new(config);
    evaluator.eval(file)?;
    evaluator.finish()
}
