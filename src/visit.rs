// Copyright (c) 2019 Georg Brandl.  Licensed under the Apache License,
// Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at
// your option. This file may not be copied, modified, or distributed except
// according to those terms.

//! Traversal of the syntax tree.
//!
//! Implement [`Visitor`] and override the methods for the node kinds of
//! interest; all others do nothing.  The structural methods (`visit_file`,
//! `visit_command`, `visit_macro_statement`, `visit_expr`) walk into the
//! children by default, so an override can call the matching `walk_*`
//! function to keep descending.

use crate::ast::*;
use crate::coord::{CoordinateFormat, Unit};
use crate::span::{Span, Spanned};

#[allow(unused_variables)]
pub trait Visitor<'ast> {
    fn visit_file(&mut self, file: &'ast File) {
        walk_file(self, file)
    }

    fn visit_command(&mut self, command: &'ast Spanned<Command>) {
        walk_command(self, command)
    }

    fn visit_macro_statement(&mut self, stmt: &'ast Spanned<MacroStatement>) {
        walk_macro_statement(self, stmt)
    }

    fn visit_expr(&mut self, expr: &'ast Expr) {
        walk_expr(self, expr)
    }

    // D codes
    fn visit_plot(&mut self, coords: &'ast Coordinates, span: &'ast Span) {}
    fn visit_move(&mut self, coords: &'ast Coordinates, span: &'ast Span) {}
    fn visit_flash(&mut self, coords: &'ast Coordinates, span: &'ast Span) {}
    fn visit_select_aperture(&mut self, id: ApertureId, span: &'ast Span) {}

    // G codes
    fn visit_linear(&mut self, span: &'ast Span) {}
    fn visit_clockwise(&mut self, span: &'ast Span) {}
    fn visit_counter_clockwise(&mut self, span: &'ast Span) {}
    fn visit_comment(&mut self, text: &'ast str, span: &'ast Span) {}
    fn visit_region_start(&mut self, span: &'ast Span) {}
    fn visit_region_end(&mut self, span: &'ast Span) {}
    fn visit_select_aperture_prefix(&mut self, span: &'ast Span) {}
    fn visit_prepare_flash(&mut self, span: &'ast Span) {}
    fn visit_unit_inch(&mut self, span: &'ast Span) {}
    fn visit_unit_millimeter(&mut self, span: &'ast Span) {}
    fn visit_single_quadrant(&mut self, span: &'ast Span) {}
    fn visit_multi_quadrant(&mut self, span: &'ast Span) {}
    fn visit_absolute_notation(&mut self, span: &'ast Span) {}
    fn visit_incremental_notation(&mut self, span: &'ast Span) {}

    // M codes
    fn visit_program_stop(&mut self, span: &'ast Span) {}
    fn visit_optional_stop(&mut self, span: &'ast Span) {}
    fn visit_end_of_file(&mut self, span: &'ast Span) {}

    // extended commands
    fn visit_format_spec(&mut self, format: &'ast CoordinateFormat, span: &'ast Span) {}
    fn visit_unit_mode(&mut self, unit: Unit, span: &'ast Span) {}
    fn visit_aperture_define(&mut self, def: &'ast ApertureDefinition, span: &'ast Span) {}
    fn visit_macro_define(&mut self, def: &'ast MacroDefinition, span: &'ast Span) {}
    fn visit_block_open(&mut self, id: ApertureId, span: &'ast Span) {}
    fn visit_block_close(&mut self, span: &'ast Span) {}
    fn visit_step_repeat_open(&mut self, sr: &'ast StepRepeat, span: &'ast Span) {}
    fn visit_step_repeat_close(&mut self, span: &'ast Span) {}
    fn visit_load_polarity(&mut self, polarity: LoadPolarity, span: &'ast Span) {}
    fn visit_load_mirroring(&mut self, mirroring: Mirroring, span: &'ast Span) {}
    fn visit_load_rotation(&mut self, angle: f64, span: &'ast Span) {}
    fn visit_load_scaling(&mut self, factor: f64, span: &'ast Span) {}
    fn visit_file_attribute(&mut self, attr: &'ast Attribute, span: &'ast Span) {}
    fn visit_aperture_attribute(&mut self, attr: &'ast Attribute, span: &'ast Span) {}
    fn visit_object_attribute(&mut self, attr: &'ast Attribute, span: &'ast Span) {}
    fn visit_delete_attribute(&mut self, name: Option<&'ast str>, span: &'ast Span) {}

    // deprecated extended commands
    fn visit_image_polarity(&mut self, polarity: ImagePolarity, span: &'ast Span) {}
    fn visit_image_name(&mut self, name: &'ast str, span: &'ast Span) {}
    fn visit_load_name(&mut self, name: &'ast str, span: &'ast Span) {}
    fn visit_axis_select(&mut self, axes: AxisSelect, span: &'ast Span) {}
    fn visit_image_rotation(&mut self, angle: u32, span: &'ast Span) {}
    fn visit_mirror_image(&mut self, values: &'ast AxisValues, span: &'ast Span) {}
    fn visit_image_offset(&mut self, values: &'ast AxisValues, span: &'ast Span) {}
    fn visit_scale_factor(&mut self, values: &'ast AxisValues, span: &'ast Span) {}

    // macro bodies
    fn visit_macro_comment(&mut self, text: &'ast str, span: &'ast Span) {}
    fn visit_assignment(&mut self, var: u32, value: &'ast Expr, span: &'ast Span) {}
    fn visit_primitive(&mut self, prim: &'ast Primitive<Expr>, span: &'ast Span) {}

    // expressions
    fn visit_number(&mut self, value: f64, span: &'ast Span) {}
    fn visit_variable(&mut self, var: u32, span: &'ast Span) {}
    fn visit_unary(&mut self, op: UnOp, arg: &'ast Expr, span: &'ast Span) {}
    fn visit_binary(&mut self, op: Op, lhs: &'ast Expr, rhs: &'ast Expr, span: &'ast Span) {}
    fn visit_paren(&mut self, arg: &'ast Expr, span: &'ast Span) {}
}

pub fn walk_file<'ast, V: Visitor<'ast> + ?Sized>(v: &mut V, file: &'ast File) {
    for command in &file.commands {
        v.visit_command(command);
    }
}

pub fn walk_command<'ast, V: Visitor<'ast> + ?Sized>(v: &mut V, command: &'ast Spanned<Command>) {
    let span = &command.span;
    match &command.node {
        Command::Plot(c) => v.visit_plot(c, span),
        Command::Move(c) => v.visit_move(c, span),
        Command::Flash(c) => v.visit_flash(c, span),
        Command::SelectAperture(id) => v.visit_select_aperture(*id, span),
        Command::Linear => v.visit_linear(span),
        Command::Clockwise => v.visit_clockwise(span),
        Command::CounterClockwise => v.visit_counter_clockwise(span),
        Command::Comment(text) => v.visit_comment(text, span),
        Command::RegionStart => v.visit_region_start(span),
        Command::RegionEnd => v.visit_region_end(span),
        Command::SelectAperturePrefix => v.visit_select_aperture_prefix(span),
        Command::PrepareFlash => v.visit_prepare_flash(span),
        Command::UnitInch => v.visit_unit_inch(span),
        Command::UnitMillimeter => v.visit_unit_millimeter(span),
        Command::SingleQuadrant => v.visit_single_quadrant(span),
        Command::MultiQuadrant => v.visit_multi_quadrant(span),
        Command::AbsoluteNotation => v.visit_absolute_notation(span),
        Command::IncrementalNotation => v.visit_incremental_notation(span),
        Command::ProgramStop => v.visit_program_stop(span),
        Command::OptionalStop => v.visit_optional_stop(span),
        Command::EndOfFile => v.visit_end_of_file(span),
        Command::FormatSpec(format) => v.visit_format_spec(format, span),
        Command::UnitMode(unit) => v.visit_unit_mode(*unit, span),
        Command::ApertureDefine(def) => v.visit_aperture_define(def, span),
        Command::MacroDefine(def) => {
            v.visit_macro_define(def, span);
            for stmt in &def.body {
                v.visit_macro_statement(stmt);
            }
        }
        Command::BlockOpen(id) => v.visit_block_open(*id, span),
        Command::BlockClose => v.visit_block_close(span),
        Command::StepRepeatOpen(sr) => v.visit_step_repeat_open(sr, span),
        Command::StepRepeatClose => v.visit_step_repeat_close(span),
        Command::LoadPolarity(p) => v.visit_load_polarity(*p, span),
        Command::LoadMirroring(m) => v.visit_load_mirroring(*m, span),
        Command::LoadRotation(angle) => v.visit_load_rotation(*angle, span),
        Command::LoadScaling(factor) => v.visit_load_scaling(*factor, span),
        Command::FileAttribute(attr) => v.visit_file_attribute(attr, span),
        Command::ApertureAttribute(attr) => v.visit_aperture_attribute(attr, span),
        Command::ObjectAttribute(attr) => v.visit_object_attribute(attr, span),
        Command::DeleteAttribute(name) => v.visit_delete_attribute(name.as_deref(), span),
        Command::ImagePolarity(p) => v.visit_image_polarity(*p, span),
        Command::ImageName(name) => v.visit_image_name(name, span),
        Command::LoadName(name) => v.visit_load_name(name, span),
        Command::AxisSelect(axes) => v.visit_axis_select(*axes, span),
        Command::ImageRotation(angle) => v.visit_image_rotation(*angle, span),
        Command::MirrorImage(values) => v.visit_mirror_image(values, span),
        Command::ImageOffset(values) => v.visit_image_offset(values, span),
        Command::ScaleFactor(values) => v.visit_scale_factor(values, span),
    }
}

pub fn walk_macro_statement<'ast, V: Visitor<'ast> + ?Sized>(v: &mut V,
                                                            stmt: &'ast Spanned<MacroStatement>) {
    let span = &stmt.span;
    match &stmt.node {
        MacroStatement::Comment(text) => v.visit_macro_comment(text, span),
        MacroStatement::Assign(var, value) => {
            v.visit_assignment(*var, value, span);
            v.visit_expr(value);
        }
        MacroStatement::Primitive(prim) => {
            v.visit_primitive(prim, span);
            for value in prim.values() {
                v.visit_expr(value);
            }
        }
    }
}

pub fn walk_expr<'ast, V: Visitor<'ast> + ?Sized>(v: &mut V, expr: &'ast Expr) {
    let span = &expr.span;
    match &expr.kind {
        ExprKind::Num(value) => v.visit_number(*value, span),
        ExprKind::Var(var) => v.visit_variable(*var, span),
        ExprKind::UnOp(op, arg) => v.visit_unary(*op, arg, span),
        ExprKind::BinOp(op, lhs, rhs) => v.visit_binary(*op, lhs, rhs, span),
        ExprKind::Paren(arg) => v.visit_paren(arg, span),
    }
    for child in expr.children() {
        v.visit_expr(child);
    }
}
