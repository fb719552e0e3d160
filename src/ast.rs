// Copyright (c) 2019 Georg Brandl.  Licensed under the Apache License,
// Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at
// your option. This file may not be copied, modified, or distributed except
// according to those terms.

//! The abstract syntax tree of a Gerber file.
//!
//! The `Display` implementations produce the canonical form of every node,
//! which parses back into an equal tree.

use std::fmt::{self, Display, Formatter};
use serde::{Deserialize, Serialize};
use strum_macros::EnumString;
use thiserror::Error;

use crate::coord::{CoordinateFormat, Packed, Unit};
use crate::span::{Span, Spanned};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct File {
    pub filename: String,
    pub commands: Vec<Spanned<Command>>,
}

/// Aperture number as used in `Dnn` codes; always at least 10.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApertureId(pub u32);

/// Coordinate words of a D01/D02/D03 operation.  I and J only occur on D01.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub x: Option<Packed>,
    pub y: Option<Packed>,
    pub i: Option<Packed>,
    pub j: Option<Packed>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    // D codes
    Plot(Coordinates),                  // D01
    Move(Coordinates),                  // D02
    Flash(Coordinates),                 // D03
    SelectAperture(ApertureId),         // Dnn

    // G codes
    Linear,                             // G01
    Clockwise,                          // G02
    CounterClockwise,                   // G03
    Comment(String),                    // G04
    RegionStart,                        // G36
    RegionEnd,                          // G37
    SelectAperturePrefix,               // G54
    PrepareFlash,                       // G55
    UnitInch,                           // G70
    UnitMillimeter,                     // G71
    SingleQuadrant,                     // G74
    MultiQuadrant,                      // G75
    AbsoluteNotation,                   // G90
    IncrementalNotation,                // G91

    // M codes
    ProgramStop,                        // M00
    OptionalStop,                       // M01
    EndOfFile,                          // M02

    // Extended commands
    FormatSpec(CoordinateFormat),       // FS
    UnitMode(Unit),                     // MO
    ApertureDefine(ApertureDefinition), // AD
    MacroDefine(MacroDefinition),       // AM
    BlockOpen(ApertureId),              // AB
    BlockClose,
    StepRepeatOpen(StepRepeat),         // SR
    StepRepeatClose,
    LoadPolarity(LoadPolarity),         // LP
    LoadMirroring(Mirroring),           // LM
    LoadRotation(f64),                  // LR
    LoadScaling(f64),                   // LS
    FileAttribute(Attribute),           // TF
    ApertureAttribute(Attribute),       // TA
    ObjectAttribute(Attribute),         // TO
    DeleteAttribute(Option<String>),    // TD

    // Deprecated extended commands
    ImagePolarity(ImagePolarity),       // IP
    ImageName(String),                  // IN
    LoadName(String),                   // LN
    AxisSelect(AxisSelect),             // AS
    ImageRotation(u32),                 // IR
    MirrorImage(AxisValues),            // MI
    ImageOffset(AxisValues),            // OF
    ScaleFactor(AxisValues),            // SF
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApertureDefinition {
    pub id: ApertureId,
    pub template: Template,
}

/// Shape of an aperture definition.  Sizes are in the file's unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Template {
    Circle { diameter: f64, hole: Option<f64> },
    Rectangle { x: f64, y: f64, hole: Option<f64> },
    Obround { x: f64, y: f64, hole: Option<f64> },
    Polygon { diameter: f64, vertices: u32, rotation: Option<f64>, hole: Option<f64> },
    Macro { name: String, params: Vec<f64> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroDefinition {
    pub name: String,
    pub body: Vec<Spanned<MacroStatement>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MacroStatement {
    Comment(String),
    Assign(u32, Expr),
    Primitive(Primitive<Expr>),
}

/// A macro primitive.  In a macro body the values are expressions, after
/// instantiating an aperture they are numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Primitive<T> {
    Circle { exposure: T, diameter: T, center: (T, T), rotation: Option<T> },
    VectorLine { exposure: T, width: T, start: (T, T), end: (T, T), rotation: T },
    CenterLine { exposure: T, width: T, height: T, center: (T, T), rotation: T },
    LowerLeftLine { exposure: T, width: T, height: T, lower_left: (T, T), rotation: T },
    Outline { exposure: T, vertices: T, points: Vec<(T, T)>, rotation: T },
    Polygon { exposure: T, vertices: T, center: (T, T), diameter: T, rotation: T },
    Moire {
        center: (T, T),
        outer_diameter: T,
        ring_thickness: T,
        gap: T,
        max_rings: T,
        crosshair_thickness: T,
        crosshair_length: T,
        rotation: T,
    },
    Thermal { center: (T, T), outer_diameter: T, inner_diameter: T, gap: T, rotation: T },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PrimitiveError {
    #[error("unknown macro primitive code {0}")]
    UnknownCode(u32),
    #[error("macro primitive {code} cannot have {count} parameters")]
    Arity { code: u32, count: usize },
}

/// An arithmetic expression in a macro body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    Num(f64),
    Var(u32),
    UnOp(UnOp, Box<Expr>),
    BinOp(Op, Box<Expr>, Box<Expr>),
    Paren(Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Op {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnOp {
    Plus,
    Minus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRepeat {
    pub x_repeat: u32,
    pub y_repeat: u32,
    pub x_step: f64,
    pub y_step: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Serialize, Deserialize)]
pub enum LoadPolarity {
    #[strum(serialize = "D")]
    Dark,
    #[strum(serialize = "C")]
    Clear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Serialize, Deserialize)]
pub enum Mirroring {
    #[strum(serialize = "N")]
    None,
    #[strum(serialize = "X")]
    X,
    #[strum(serialize = "Y")]
    Y,
    #[strum(serialize = "XY")]
    XY,
}

impl Default for Mirroring {
    fn default() -> Self { Mirroring::None }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Serialize, Deserialize)]
pub enum ImagePolarity {
    #[strum(serialize = "POS")]
    Positive,
    #[strum(serialize = "NEG")]
    Negative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Serialize, Deserialize)]
pub enum AxisSelect {
    #[strum(serialize = "AXBY")]
    AxBy,
    #[strum(serialize = "AYBX")]
    AyBx,
}

/// The optional `A` and `B` values of MI, OF and SF.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AxisValues {
    pub a: Option<f64>,
    pub b: Option<f64>,
}

// ----- constructors and helpers

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Expr { kind, span }
    }

    pub fn num(value: f64) -> Self {
        Expr::new(ExprKind::Num(value), Span::default())
    }

    pub fn var(index: u32) -> Self {
        Expr::new(ExprKind::Var(index), Span::default())
    }

    pub fn binop(op: Op, lhs: Expr, rhs: Expr) -> Self {
        let span = lhs.span.union(&rhs.span);
        Expr::new(ExprKind::BinOp(op, Box::new(lhs), Box::new(rhs)), span)
    }

    /// Direct subexpressions, in source order.
    pub fn children(&self) -> Vec<&Expr> {
        match &self.kind {
            ExprKind::Num(_) | ExprKind::Var(_) => vec![],
            ExprKind::UnOp(_, arg) | ExprKind::Paren(arg) => vec![arg],
            ExprKind::BinOp(_, lhs, rhs) => vec![lhs, rhs],
        }
    }
}

impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

/// Hands out the parameters of a primitive one by one.
struct Params<T> {
    iter: std::vec::IntoIter<T>,
    code: u32,
    count: usize,
}

impl<T> Params<T> {
    fn arity(&self) -> PrimitiveError {
        PrimitiveError::Arity { code: self.code, count: self.count }
    }

    fn next(&mut self) -> Result<T, PrimitiveError> {
        match self.iter.next() {
            Some(v) => Ok(v),
            None => Err(self.arity()),
        }
    }

    fn pair(&mut self) -> Result<(T, T), PrimitiveError> {
        Ok((self.next()?, self.next()?))
    }

    fn finish<R>(mut self, result: R) -> Result<R, PrimitiveError> {
        match self.iter.next() {
            Some(_) => Err(self.arity()),
            None => Ok(result),
        }
    }
}

impl<T> Primitive<T> {
    /// Build a primitive from its code and positional parameters.
    pub fn from_values(code: u32, values: Vec<T>) -> Result<Self, PrimitiveError> {
        let count = values.len();
        let mut p = Params { iter: values.into_iter(), code, count };
        let prim = match code {
            1 => Primitive::Circle {
                exposure: p.next()?,
                diameter: p.next()?,
                center: p.pair()?,
                rotation: p.iter.next(),
            },
            2 | 20 => Primitive::VectorLine {
                exposure: p.next()?,
                width: p.next()?,
                start: p.pair()?,
                end: p.pair()?,
                rotation: p.next()?,
            },
            21 => Primitive::CenterLine {
                exposure: p.next()?,
                width: p.next()?,
                height: p.next()?,
                center: p.pair()?,
                rotation: p.next()?,
            },
            22 => Primitive::LowerLeftLine {
                exposure: p.next()?,
                width: p.next()?,
                height: p.next()?,
                lower_left: p.pair()?,
                rotation: p.next()?,
            },
            4 => {
                let exposure = p.next()?;
                let vertices = p.next()?;
                let mut rest: Vec<T> = p.iter.by_ref().collect();
                // start point, at least one more point, and the rotation
                if rest.len() < 5 || rest.len() % 2 == 0 {
                    return Err(p.arity());
                }
                let rotation = match rest.pop() {
                    Some(r) => r,
                    None => return Err(p.arity()),
                };
                let mut points = Vec::with_capacity(rest.len() / 2);
                let mut coords = rest.into_iter();
                while let (Some(x), Some(y)) = (coords.next(), coords.next()) {
                    points.push((x, y));
                }
                Primitive::Outline { exposure, vertices, points, rotation }
            }
            5 => Primitive::Polygon {
                exposure: p.next()?,
                vertices: p.next()?,
                center: p.pair()?,
                diameter: p.next()?,
                rotation: p.next()?,
            },
            6 => Primitive::Moire {
                center: p.pair()?,
                outer_diameter: p.next()?,
                ring_thickness: p.next()?,
                gap: p.next()?,
                max_rings: p.next()?,
                crosshair_thickness: p.next()?,
                crosshair_length: p.next()?,
                rotation: p.next()?,
            },
            7 => Primitive::Thermal {
                center: p.pair()?,
                outer_diameter: p.next()?,
                inner_diameter: p.next()?,
                gap: p.next()?,
                rotation: p.next()?,
            },
            _ => return Err(PrimitiveError::UnknownCode(code)),
        };
        p.finish(prim)
    }

    pub fn code(&self) -> u32 {
        match self {
            Primitive::Circle { .. } => 1,
            Primitive::VectorLine { .. } => 20,
            Primitive::CenterLine { .. } => 21,
            Primitive::LowerLeftLine { .. } => 22,
            Primitive::Outline { .. } => 4,
            Primitive::Polygon { .. } => 5,
            Primitive::Moire { .. } => 6,
            Primitive::Thermal { .. } => 7,
        }
    }

    /// All parameters in the order they are written.
    pub fn values(&self) -> Vec<&T> {
        match self {
            Primitive::Circle { exposure, diameter, center, rotation } => {
                let mut v = vec![exposure, diameter, &center.0, &center.1];
                v.extend(rotation);
                v
            }
            Primitive::VectorLine { exposure, width, start, end, rotation } =>
                vec![exposure, width, &start.0, &start.1, &end.0, &end.1, rotation],
            Primitive::CenterLine { exposure, width, height, center, rotation } =>
                vec![exposure, width, height, &center.0, &center.1, rotation],
            Primitive::LowerLeftLine { exposure, width, height, lower_left, rotation } =>
                vec![exposure, width, height, &lower_left.0, &lower_left.1, rotation],
            Primitive::Outline { exposure, vertices, points, rotation } => {
                let mut v = vec![exposure, vertices];
                for (x, y) in points {
                    v.push(x);
                    v.push(y);
                }
                v.push(rotation);
                v
            }
            Primitive::Polygon { exposure, vertices, center, diameter, rotation } =>
                vec![exposure, vertices, &center.0, &center.1, diameter, rotation],
            Primitive::Moire { center, outer_diameter, ring_thickness, gap, max_rings,
                               crosshair_thickness, crosshair_length, rotation } =>
                vec![&center.0, &center.1, outer_diameter, ring_thickness, gap, max_rings,
                     crosshair_thickness, crosshair_length, rotation],
            Primitive::Thermal { center, outer_diameter, inner_diameter, gap, rotation } =>
                vec![&center.0, &center.1, outer_diameter, inner_diameter, gap, rotation],
        }
    }

    /// Convert every parameter, keeping the primitive's shape.
    pub fn try_map<U, E, F>(&self, f: F) -> Result<Primitive<U>, E>
    where F: FnMut(&T) -> Result<U, E>, E: From<PrimitiveError>
    {
        let values = self.values().into_iter().map(f).collect::<Result<Vec<U>, E>>()?;
        Ok(Primitive::from_values(self.code(), values)?)
    }
}

// ----- canonical formatting

impl Display for File {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        for command in &self.commands {
            writeln!(f, "{}", command.node)?;
        }
        Ok(())
    }
}

impl Display for ApertureId {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "D{}", self.0)
    }
}

impl Display for Coordinates {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        for (letter, value) in [("X", &self.x), ("Y", &self.y), ("I", &self.i), ("J", &self.j)].iter() {
            if let Some(value) = value {
                write!(f, "{}{}", letter, value)?;
            }
        }
        Ok(())
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Command::Plot(c) => write!(f, "{}D01*", c),
            Command::Move(c) => write!(f, "{}D02*", c),
            Command::Flash(c) => write!(f, "{}D03*", c),
            Command::SelectAperture(id) => write!(f, "{}*", id),
            Command::Linear => f.write_str("G01*"),
            Command::Clockwise => f.write_str("G02*"),
            Command::CounterClockwise => f.write_str("G03*"),
            Command::Comment(text) => write!(f, "G04{}*", text),
            Command::RegionStart => f.write_str("G36*"),
            Command::RegionEnd => f.write_str("G37*"),
            Command::SelectAperturePrefix => f.write_str("G54*"),
            Command::PrepareFlash => f.write_str("G55*"),
            Command::UnitInch => f.write_str("G70*"),
            Command::UnitMillimeter => f.write_str("G71*"),
            Command::SingleQuadrant => f.write_str("G74*"),
            Command::MultiQuadrant => f.write_str("G75*"),
            Command::AbsoluteNotation => f.write_str("G90*"),
            Command::IncrementalNotation => f.write_str("G91*"),
            Command::ProgramStop => f.write_str("M00*"),
            Command::OptionalStop => f.write_str("M01*"),
            Command::EndOfFile => f.write_str("M02*"),
            Command::FormatSpec(format) => write!(f, "%{}*%", format),
            Command::UnitMode(unit) => write!(f, "%MO{}*%", unit),
            Command::ApertureDefine(def) => write!(f, "%AD{}*%", def),
            Command::MacroDefine(def) => write!(f, "%{}%", def),
            Command::BlockOpen(id) => write!(f, "%AB{}*%", id),
            Command::BlockClose => f.write_str("%AB*%"),
            Command::StepRepeatOpen(sr) => write!(f, "%SRX{}Y{}I{}J{}*%",
                                                  sr.x_repeat, sr.y_repeat, sr.x_step, sr.y_step),
            Command::StepRepeatClose => f.write_str("%SR*%"),
            Command::LoadPolarity(p) => write!(f, "%LP{}*%", match p {
                LoadPolarity::Dark => "D",
                LoadPolarity::Clear => "C",
            }),
            Command::LoadMirroring(m) => write!(f, "%LM{}*%", match m {
                Mirroring::None => "N",
                Mirroring::X => "X",
                Mirroring::Y => "Y",
                Mirroring::XY => "XY",
            }),
            Command::LoadRotation(angle) => write!(f, "%LR{}*%", angle),
            Command::LoadScaling(factor) => write!(f, "%LS{}*%", factor),
            Command::FileAttribute(attr) => write!(f, "%TF{}*%", attr),
            Command::ApertureAttribute(attr) => write!(f, "%TA{}*%", attr),
            Command::ObjectAttribute(attr) => write!(f, "%TO{}*%", attr),
            Command::DeleteAttribute(name) => write!(f, "%TD{}*%", name.as_deref().unwrap_or("")),
            Command::ImagePolarity(p) => write!(f, "%IP{}*%", match p {
                ImagePolarity::Positive => "POS",
                ImagePolarity::Negative => "NEG",
            }),
            Command::ImageName(name) => write!(f, "%IN{}*%", name),
            Command::LoadName(name) => write!(f, "%LN{}*%", name),
            Command::AxisSelect(axes) => write!(f, "%AS{}*%", match axes {
                AxisSelect::AxBy => "AXBY",
                AxisSelect::AyBx => "AYBX",
            }),
            Command::ImageRotation(angle) => write!(f, "%IR{}*%", angle),
            Command::MirrorImage(values) => write!(f, "%MI{}*%", values),
            Command::ImageOffset(values) => write!(f, "%OF{}*%", values),
            Command::ScaleFactor(values) => write!(f, "%SF{}*%", values),
        }
    }
}

impl Display for ApertureDefinition {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.id)?;
        let (name, values) = match &self.template {
            Template::Circle { diameter, hole } => {
                let mut v = vec![*diameter];
                v.extend(hole);
                ("C", v)
            }
            Template::Rectangle { x, y, hole } => {
                let mut v = vec![*x, *y];
                v.extend(hole);
                ("R", v)
            }
            Template::Obround { x, y, hole } => {
                let mut v = vec![*x, *y];
                v.extend(hole);
                ("O", v)
            }
            Template::Polygon { diameter, vertices, rotation, hole } => {
                let mut v = vec![*diameter, *vertices as f64];
                match (rotation, hole) {
                    (Some(r), Some(h)) => v.extend(&[*r, *h]),
                    (None, Some(h)) => v.extend(&[0., *h]),
                    (Some(r), None) => v.push(*r),
                    (None, None) => (),
                }
                ("P", v)
            }
            Template::Macro { name, params } => (name.as_str(), params.clone()),
        };
        f.write_str(name)?;
        for (i, value) in values.iter().enumerate() {
            write!(f, "{}{}", if i == 0 { "," } else { "X" }, value)?;
        }
        Ok(())
    }
}

impl Display for MacroDefinition {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        writeln!(f, "AM{}*", self.name)?;
        for stmt in &self.body {
            writeln!(f, "{}*", stmt.node)?;
        }
        Ok(())
    }
}

impl Display for MacroStatement {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            MacroStatement::Comment(text) => write!(f, "0 {}", text),
            MacroStatement::Assign(n, value) => write!(f, "${}={}", n, value),
            MacroStatement::Primitive(prim) => write!(f, "{}", prim),
        }
    }
}

impl<T: Display> Display for Primitive<T> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.code())?;
        for value in self.values() {
            write!(f, ",{}", value)?;
        }
        Ok(())
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match &self.kind {
            ExprKind::Num(n) => write!(f, "{}", n),
            ExprKind::Var(n) => write!(f, "${}", n),
            ExprKind::UnOp(op, arg) => write!(f, "{}{}", match op {
                UnOp::Plus => "+",
                UnOp::Minus => "-",
            }, arg),
            ExprKind::BinOp(op, lhs, rhs) => write!(f, "{}{}{}", lhs, op, rhs),
            ExprKind::Paren(arg) => write!(f, "({})", arg),
        }
    }
}

impl Display for Op {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(match self {
            Op::Add => "+",
            Op::Sub => "-",
            Op::Mul => "x",
            Op::Div => "/",
        })
    }
}

impl Display for Attribute {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(&self.name)?;
        for field in &self.fields {
            write!(f, ",{}", field)?;
        }
        Ok(())
    }
}

impl Display for AxisValues {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        if let Some(a) = self.a {
            write!(f, "A{}", a)?;
        }
        if let Some(b) = self.b {
            write!(f, "B{}", b)?;
        }
        Ok(())
    }
}
