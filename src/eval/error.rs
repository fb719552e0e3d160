// Copyright (c) 2019 Georg Brandl.  Licensed under the Apache License,
// Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at
// your option. This file may not be copied, modified, or distributed except
// according to those terms.

use thiserror::Error;

use crate::ast::{ApertureId, PrimitiveError};
use crate::coord::CoordinateError;
use crate::span::Span;
use super::enums::FrameKind;

/// An interpretation error, located at the offending command.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Error at {span}: {errtype}")]
pub struct EvalError {
    pub span: Span,
    pub errtype: ErrType,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ErrType {
    #[error("coordinate format is not set")]
    FormatNotSet,
    #[error("coordinate format cannot be redefined")]
    FormatRedefined,
    #[error("unit is not set")]
    UnitNotSet,
    #[error("aperture {0} is not defined")]
    ApertureNotFound(ApertureId),
    #[error("aperture {0} is already defined")]
    ApertureRedefined(ApertureId),
    #[error("no aperture is selected")]
    ApertureNotSelected,
    #[error("macro {0:?} is not defined")]
    MacroNotFound(String),
    #[error("macro {0:?} is already defined")]
    MacroRedefined(String),
    #[error("macro variable ${0} is not bound")]
    UnboundVariable(u32),
    #[error("division by zero attempted")]
    DivByZero,
    #[error("invalid macro primitive: {0}")]
    InvalidPrimitive(String),
    #[error(transparent)]
    Coordinate(#[from] CoordinateError),
    #[error("no {0} is open")]
    NotOpen(FrameKind),
    #[error("cannot close {closing} while {open} is open")]
    MismatchedClose { closing: FrameKind, open: FrameKind },
    #[error("step and repeat cannot be nested")]
    StepRepeatNested,
    #[error("a region is already open")]
    RegionAlreadyOpen,
    #[error("{0} is not allowed inside a region")]
    NotAllowedInRegion(&'static str),
    #[error("step and repeat of {x_repeat}x{y_repeat} copies of {commands} commands exceeds the limit of {limit}")]
    StepRepeatTooLarge { x_repeat: u32, y_repeat: u32, commands: usize, limit: u64 },
    #[error("{0} is still open at end of file")]
    UnclosedAtEnd(FrameKind),
    #[error("no arc center fits the given offsets")]
    InvalidArc,
}

impl From<PrimitiveError> for ErrType {
    fn from(e: PrimitiveError) -> Self {
        ErrType::InvalidPrimitive(e.to_string())
    }
}

impl ErrType {
    pub fn at(self, span: Span) -> EvalError {
        EvalError { span, errtype: self }
    }
}
