// Copyright (c) 2019 Georg Brandl.  Licensed under the Apache License,
// Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at
// your option. This file may not be copied, modified, or distributed except
// according to those terms.

//! Coordinate formats and the fixed-point representation of lengths.
//!
//! Coordinates in a Gerber file are packed digit strings without a decimal
//! point; their meaning depends on the format specification (`FS`) and unit
//! (`MO`) given earlier in the file.  The parser therefore keeps them as
//! [`Packed`] strings and the interpreter converts them with
//! [`CoordinateFormat::resolve`] into exact [`Offset`] values.

use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use thiserror::Error;

/// The unit of all lengths in a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
pub enum Unit {
    #[strum(serialize = "MM")]
    Millimeters,
    #[strum(serialize = "IN")]
    Inches,
}

/// Which zeros may be omitted from packed coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
pub enum ZeroOmission {
    #[strum(serialize = "L")]
    Leading,
    #[strum(serialize = "T")]
    Trailing,
}

/// Whether coordinates are absolute or relative to the current point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
pub enum Notation {
    #[strum(serialize = "A")]
    Absolute,
    #[strum(serialize = "I")]
    Incremental,
}

/// Digit layout of one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AxisFormat {
    pub integer: u8,
    pub decimal: u8,
}

impl AxisFormat {
    pub const MAX_DIGITS: u8 = 7;

    pub fn budget(&self) -> usize {
        (self.integer + self.decimal) as usize
    }
}

/// The coordinate format declared by `FS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CoordinateFormat {
    pub zeros: ZeroOmission,
    pub notation: Notation,
    pub x: AxisFormat,
    pub y: AxisFormat,
}

/// Coordinate axis, for picking the digit layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Axis {
    X, Y,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordinateError {
    #[error("coordinate has no digits")]
    TooShort,
    #[error("coordinate {digits:?} has more than the {budget} digits of the format")]
    TooLong { digits: String, budget: usize },
    #[error("invalid character in coordinate {0:?}")]
    InvalidDigit(String),
    #[error("coordinate {0:?} is out of range")]
    Overflow(String),
    #[error("{value} cannot be written with {decimal} decimal digits in {unit}")]
    NotRepresentable { value: Offset, decimal: u8, unit: Unit },
}

/// An unresolved coordinate: optional sign followed by the packed digits, as
/// written in the file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Packed(pub String);

impl Packed {
    pub fn new(digits: impl Into<String>) -> Self {
        Packed(digits.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Packed {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A length in fixed point: an integer count of 10⁻⁹ mm.
///
/// Every millimeter value with up to nine decimals and every inch value with
/// up to eight decimals is represented exactly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Offset(pub i64);

impl Offset {
    pub const ZERO: Offset = Offset(0);
    pub const PER_MM: i64 = 1_000_000_000;
    pub const PER_INCH: i64 = 25_400_000_000;
    /// Largest magnitude of a length taken from a file (10⁹ mm).  Sums of a
    /// few lengths in range cannot overflow.
    pub const LIMIT: i64 = 1_000_000_000_000_000_000;

    pub fn from_mm(mm: f64) -> Self {
        Offset((mm * Self::PER_MM as f64).round() as i64)
    }

    /// Convert a decimal value given in the file's unit, rounding to the
    /// nearest representable length.
    pub fn from_units(value: f64, unit: Unit) -> Self {
        match unit {
            Unit::Millimeters => Offset::from_mm(value),
            Unit::Inches => Offset((value * Self::PER_INCH as f64).round() as i64),
        }
    }

    /// Like `from_units`, but rejects values outside `±LIMIT`.
    pub fn try_from_units(value: f64, unit: Unit) -> Result<Self, CoordinateError> {
        let offset = Offset::from_units(value, unit);
        if value.is_finite() && offset.in_range() {
            Ok(offset)
        } else {
            Err(CoordinateError::Overflow(value.to_string()))
        }
    }

    pub fn in_range(self) -> bool {
        self.0.unsigned_abs() <= Self::LIMIT as u64
    }

    /// Addition that fails when the result leaves `±LIMIT`.
    pub fn checked_add(self, rhs: Offset) -> Option<Offset> {
        self.0.checked_add(rhs.0).map(Offset).filter(|o| o.in_range())
    }

    pub fn checked_mul(self, rhs: i64) -> Option<Offset> {
        self.0.checked_mul(rhs).map(Offset).filter(|o| o.in_range())
    }

    pub fn as_mm(self) -> f64 {
        self.0 as f64 / Self::PER_MM as f64
    }

    pub fn as_inches(self) -> f64 {
        self.0 as f64 / Self::PER_INCH as f64
    }

    pub fn as_units(self, unit: Unit) -> f64 {
        match unit {
            Unit::Millimeters => self.as_mm(),
            Unit::Inches => self.as_inches(),
        }
    }

    pub fn abs(self) -> Self {
        Offset(self.0.abs())
    }

    /// Scale by a float factor, rounding to the nearest unit.
    pub fn scaled(self, factor: f64) -> Self {
        if factor == 1.0 {
            self
        } else {
            Offset((self.0 as f64 * factor).round() as i64)
        }
    }
}

impl fmt::Display for Offset {
    /// Exact decimal millimeters, e.g. `-1.25mm`.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let int = abs / Self::PER_MM as u64;
        let frac = abs % Self::PER_MM as u64;
        if frac == 0 {
            write!(f, "{}{}mm", sign, int)
        } else {
            let frac = format!("{:09}", frac);
            write!(f, "{}{}.{}mm", sign, int, frac.trim_end_matches('0'))
        }
    }
}

impl Add for Offset {
    type Output = Offset;
    fn add(self, rhs: Offset) -> Offset { Offset(self.0 + rhs.0) }
}

impl Sub for Offset {
    type Output = Offset;
    fn sub(self, rhs: Offset) -> Offset { Offset(self.0 - rhs.0) }
}

impl Neg for Offset {
    type Output = Offset;
    fn neg(self) -> Offset { Offset(-self.0) }
}

impl Mul<i64> for Offset {
    type Output = Offset;
    fn mul(self, rhs: i64) -> Offset { Offset(self.0 * rhs) }
}

/// A point (or a vector) in the plane.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: Offset,
    pub y: Offset,
}

impl Point {
    pub const ORIGIN: Point = Point { x: Offset::ZERO, y: Offset::ZERO };

    pub fn new(x: Offset, y: Offset) -> Self {
        Point { x, y }
    }

    pub fn from_mm(x: f64, y: f64) -> Self {
        Point { x: Offset::from_mm(x), y: Offset::from_mm(y) }
    }

    pub fn as_mm(self) -> (f64, f64) {
        (self.x.as_mm(), self.y.as_mm())
    }

    pub fn in_range(self) -> bool {
        self.x.in_range() && self.y.in_range()
    }

    pub fn checked_add(self, rhs: Point) -> Option<Point> {
        Some(Point::new(self.x.checked_add(rhs.x)?, self.y.checked_add(rhs.y)?))
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point { Point::new(self.x + rhs.x, self.y + rhs.y) }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point { Point::new(self.x - rhs.x, self.y - rhs.y) }
}

/// Size of one digit unit, in `Offset` units, for the given decimal count.
fn digit_scale(decimal: u8, unit: Unit) -> i64 {
    // `decimal` is limited to 7 by the parser, so both powers stay positive
    match unit {
        Unit::Millimeters => 10i64.pow(9 - decimal as u32),
        Unit::Inches => 254 * 10i64.pow(8 - decimal as u32),
    }
}

impl CoordinateFormat {
    pub fn axis(&self, axis: Axis) -> AxisFormat {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }

    /// Convert a packed coordinate into a length.
    ///
    /// With `enforce_budget`, strings longer than the declared digit count are
    /// rejected; otherwise they are taken to have more integer digits.
    pub fn resolve(&self, axis: Axis, packed: &Packed, unit: Unit,
                   enforce_budget: bool) -> Result<Offset, CoordinateError> {
        let layout = self.axis(axis);
        let text = packed.as_str();
        let (negative, digits) = match text.as_bytes().first() {
            Some(b'-') => (true, &text[1..]),
            Some(b'+') => (false, &text[1..]),
            _ => (false, text),
        };
        if digits.is_empty() {
            return Err(CoordinateError::TooShort);
        }
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CoordinateError::InvalidDigit(text.into()));
        }
        let budget = layout.budget();
        if digits.len() > budget && enforce_budget {
            return Err(CoordinateError::TooLong { digits: text.into(), budget });
        }
        let overflow = || CoordinateError::Overflow(text.into());
        let padded;
        let digits = match self.zeros {
            ZeroOmission::Leading => digits,
            ZeroOmission::Trailing => {
                padded = format!("{:0<width$}", digits, width = budget);
                &padded
            }
        };
        // extra digits beyond the budget widen the integer part
        let units: i64 = digits.parse().map_err(|_| overflow())?;
        let value = units.checked_mul(digit_scale(layout.decimal, unit))
            .map(|v| Offset(if negative { -v } else { v }))
            .filter(|o| o.in_range())
            .ok_or_else(overflow)?;
        Ok(value)
    }

    /// Produce the shortest packed string that resolves to `value`.
    pub fn unresolve(&self, axis: Axis, value: Offset, unit: Unit) -> Result<Packed, CoordinateError> {
        let layout = self.axis(axis);
        let scale = digit_scale(layout.decimal, unit);
        if value.0 % scale != 0 {
            return Err(CoordinateError::NotRepresentable { value, decimal: layout.decimal, unit });
        }
        let units = (value.0 / scale).unsigned_abs();
        let budget = layout.budget();
        let mut digits = units.to_string();
        if digits.len() > budget {
            return Err(CoordinateError::TooLong { digits, budget });
        }
        if self.zeros == ZeroOmission::Trailing {
            digits = format!("{:0>width$}", digits, width = budget);
            let trimmed = digits.trim_end_matches('0');
            digits = if trimmed.is_empty() { "0".into() } else { trimmed.into() };
        }
        if value.0 < 0 {
            digits.insert(0, '-');
        }
        Ok(Packed(digits))
    }
}

impl fmt::Display for CoordinateFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "FS{}{}X{}{}Y{}{}", self.zeros, self.notation,
               self.x.integer, self.x.decimal, self.y.integer, self.y.decimal)
    }
}
