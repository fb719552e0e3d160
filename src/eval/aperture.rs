// Copyright (c) 2019 Georg Brandl.  Licensed under the Apache License,
// Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at
// your option. This file may not be copied, modified, or distributed except
// according to those terms.

use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};

use crate::ast::{ApertureId, Primitive, Template};
use crate::coord::{Offset, Unit};
use super::buffer::{Attributes, CommandBuffer};
use super::error::ErrType;

/// A defined aperture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aperture {
    pub shape: Shape,
    pub attributes: Attributes,
}

/// Resolved aperture geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Circle { diameter: Offset, hole: Option<Offset> },
    Rectangle { x: Offset, y: Offset, hole: Option<Offset> },
    Obround { x: Offset, y: Offset, hole: Option<Offset> },
    Polygon { diameter: Offset, vertices: u32, rotation: f64, hole: Option<Offset> },
    /// An instantiated macro.  Primitive values are in `unit`.
    Macro { name: String, unit: Unit, primitives: Vec<Primitive<f64>> },
    Block(CommandBuffer),
}

impl Shape {
    /// Convert a template, leaving macro templates to `instantiate`.
    pub fn from_template<F>(template: &Template, unit: Unit, instantiate: F) -> Result<Shape, ErrType>
    where F: FnOnce(&str, &[f64]) -> Result<Shape, ErrType>
    {
        let len = |v: f64| Offset::try_from_units(v, unit);
        let hole = |h: &Option<f64>| h.map(len).transpose();
        Ok(match template {
            Template::Circle { diameter, hole: h } =>
                Shape::Circle { diameter: len(*diameter)?, hole: hole(h)? },
            Template::Rectangle { x, y, hole: h } =>
                Shape::Rectangle { x: len(*x)?, y: len(*y)?, hole: hole(h)? },
            Template::Obround { x, y, hole: h } =>
                Shape::Obround { x: len(*x)?, y: len(*y)?, hole: hole(h)? },
            Template::Polygon { diameter, vertices, rotation, hole: h } =>
                Shape::Polygon { diameter: len(*diameter)?, vertices: *vertices,
                                 rotation: rotation.unwrap_or(0.0), hole: hole(h)? },
            Template::Macro { name, params } => instantiate(name, params)?,
        })
    }

    /// Width of strokes drawn with this aperture; `None` if the shape
    /// cannot stroke.
    pub fn line_width(&self) -> Option<Offset> {
        match self {
            Shape::Circle { diameter, .. } | Shape::Polygon { diameter, .. } => Some(*diameter),
            Shape::Rectangle { x, y, .. } | Shape::Obround { x, y, .. } => Some((*x).min(*y)),
            Shape::Macro { .. } | Shape::Block(_) => None,
        }
    }

    /// Half width and half height of a flash, for standard shapes.
    pub fn half_extent(&self) -> Option<(Offset, Offset)> {
        let half = |o: Offset| Offset(o.0 / 2);
        match self {
            Shape::Circle { diameter, .. } | Shape::Polygon { diameter, .. } =>
                Some((half(*diameter), half(*diameter))),
            Shape::Rectangle { x, y, .. } | Shape::Obround { x, y, .. } => Some((half(*x), half(*y))),
            Shape::Macro { .. } | Shape::Block(_) => None,
        }
    }
}

/// All apertures of a file, and the currently selected one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApertureRegistry {
    apertures: BTreeMap<ApertureId, Aperture>,
    current: Option<ApertureId>,
}

impl ApertureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, id: ApertureId, aperture: Aperture) -> Result<(), ErrType> {
        if self.apertures.contains_key(&id) {
            return Err(ErrType::ApertureRedefined(id));
        }
        self.apertures.insert(id, aperture);
        Ok(())
    }

    pub fn contains(&self, id: ApertureId) -> bool {
        self.apertures.contains_key(&id)
    }

    pub fn get(&self, id: ApertureId) -> Result<&Aperture, ErrType> {
        self.apertures.get(&id).ok_or(ErrType::ApertureNotFound(id))
    }

    pub fn get_mut(&mut self, id: ApertureId) -> Result<&mut Aperture, ErrType> {
        self.apertures.get_mut(&id).ok_or(ErrType::ApertureNotFound(id))
    }

    /// Make the aperture current.
    pub fn select(&mut self, id: ApertureId) -> Result<(), ErrType> {
        self.get(id)?;
        self.current = Some(id);
        Ok(())
    }

    pub fn current_id(&self) -> Option<ApertureId> {
        self.current
    }

    /// The current aperture, failing if none is selected.
    pub fn current(&self) -> Result<(ApertureId, &Aperture), ErrType> {
        let id = self.current.ok_or(ErrType::ApertureNotSelected)?;
        Ok((id, self.get(id)?))
    }

    pub fn current_mut(&mut self) -> Option<&mut Aperture> {
        let id = self.current?;
        self.apertures.get_mut(&id)
    }

    /// Restore a selection saved earlier; the id must still be defined.
    pub(crate) fn restore_selection(&mut self, id: Option<ApertureId>) {
        self.current = id.filter(|id| self.apertures.contains_key(id));
    }

    pub fn len(&self) -> usize {
        self.apertures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apertures.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item=(ApertureId, &Aperture)> {
        self.apertures.iter().map(|(id, ap)| (*id, ap))
    }
}
