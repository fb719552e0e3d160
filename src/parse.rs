// Copyright (c) 2019 Georg Brandl.  Licensed under the Apache License,
// Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at
// your option. This file may not be copied, modified, or distributed except
// according to those terms.

use std::str::FromStr;
use itertools::Itertools;
use log::warn;
use pest_derive::Parser;
use pest::{Parser, Span as PestSpan, error::{Error, ErrorVariant, InputLocation, LineColLocation},
           iterators::{Pair, Pairs}};
use thiserror::Error;

use crate::ast::*;
use crate::config::GrammarOptions;
use crate::coord::{AxisFormat, CoordinateFormat, Packed, Unit};
use crate::span::{LineIndex, Span, Spanned};

#[derive(Parser)]
#[grammar = "gerber.pest"]
pub struct GerberParser;

/// A structural error: the source does not follow the Gerber syntax, or a
/// command carries values that cannot be represented.
#[derive(Debug, Error)]
#[error("{inner}")]
pub struct ParseError {
    inner: Box<Error<Rule>>,
}

impl ParseError {
    /// Byte offset of the error in the input.
    pub fn offset(&self) -> usize {
        match self.inner.location {
            InputLocation::Pos(pos) => pos,
            InputLocation::Span((start, _)) => start,
        }
    }

    /// 1-based line and column of the error.
    pub fn line_col(&self) -> (usize, usize) {
        match self.inner.line_col {
            LineColLocation::Pos(pos) => pos,
            LineColLocation::Span(start, _) => start,
        }
    }

    pub fn pest_error(&self) -> &Error<Rule> {
        &self.inner
    }

    fn with_path(self, path: &str) -> Self {
        ParseError { inner: Box::new((*self.inner).with_path(path)) }
    }
}

impl From<Error<Rule>> for ParseError {
    fn from(e: Error<Rule>) -> Self {
        ParseError { inner: Box::new(e.renamed_rules(describe_rule)) }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

fn err<T>(span: PestSpan, msg: impl Into<String>) -> ParseResult<T> {
    Err(Error::new_from_span(ErrorVariant::CustomError { message: msg.into() }, span).into())
}

/// Names of grammar rules as shown in "expected ..." messages.
fn describe_rule(rule: &Rule) -> String {
    match rule {
        Rule::EOI => "end of input",
        Rule::extended => "extended command",
        Rule::comment => "G04 comment",
        Rule::code_stmt => "G code",
        Rule::operation_stmt => "D01/D02/D03 operation",
        Rule::select_stmt | Rule::aperture_id => "aperture number",
        Rule::m_stmt => "M code",
        Rule::packed => "coordinate digits",
        Rule::decimal => "decimal number",
        Rule::integer => "integer",
        Rule::name => "name",
        Rule::attr_name => "attribute name",
        Rule::expr | Rule::sum | Rule::difference | Rule::product |
        Rule::quotient | Rule::unary => "expression",
        Rule::fs_digits => "two digits",
        _ => return format!("{:?}", rule),
    }.into()
}

fn first<'i>(pair: Pair<'i, Rule>) -> ParseResult<Pair<'i, Rule>> {
    let span = pair.as_span();
    match pair.into_inner().next() {
        Some(child) => Ok(child),
        None => err(span, "missing value"),
    }
}

fn parse_value<T: FromStr>(pair: &Pair<Rule>) -> ParseResult<T> {
    match pair.as_str().parse() {
        Ok(v) => Ok(v),
        Err(_) => err(pair.as_span(), format!("invalid value {:?}", pair.as_str())),
    }
}

fn parse_enum<T: FromStr>(pair: Pair<Rule>) -> ParseResult<T> {
    parse_value(&first(pair)?)
}

fn make_aperture_id(pair: &Pair<Rule>) -> ParseResult<ApertureId> {
    match pair.as_str()[1..].parse() {
        Ok(n) => Ok(ApertureId(n)),
        Err(_) => err(pair.as_span(), "aperture number out of range"),
    }
}

fn make_decimals(pairs: Pairs<Rule>) -> ParseResult<Vec<f64>> {
    pairs.map(|p| parse_value(&p)).collect()
}

fn make_axis_format(pair: &Pair<Rule>) -> ParseResult<AxisFormat> {
    let digits = pair.as_str().as_bytes();
    let format = AxisFormat { integer: digits[0] - b'0', decimal: digits[1] - b'0' };
    let range = 1..=AxisFormat::MAX_DIGITS;
    if !range.contains(&format.integer) || !range.contains(&format.decimal) {
        return err(pair.as_span(), format!("coordinate digit counts must be between 1 and {}",
                                            AxisFormat::MAX_DIGITS));
    }
    Ok(format)
}

fn make_format(pair: Pair<Rule>) -> ParseResult<CoordinateFormat> {
    let (zeros, notation, x, y) = pair.into_inner().collect_tuple().expect("children");
    Ok(CoordinateFormat {
        zeros: parse_value(&zeros)?,
        notation: parse_value(&notation)?,
        x: make_axis_format(&x)?,
        y: make_axis_format(&y)?,
    })
}

fn make_template(pair: Pair<Rule>) -> ParseResult<Template> {
    let span = pair.as_span();
    let rule = pair.as_rule();
    if rule == Rule::ad_macro {
        let mut inner = pair.into_inner();
        let name = inner.next().expect("macro name").as_str().to_string();
        return Ok(Template::Macro { name, params: make_decimals(inner)? });
    }
    let values = make_decimals(pair.into_inner())?;
    let opt = |i: usize| values.get(i).copied();
    Ok(match rule {
        Rule::ad_circle => Template::Circle { diameter: values[0], hole: opt(1) },
        Rule::ad_rectangle => Template::Rectangle { x: values[0], y: values[1], hole: opt(2) },
        Rule::ad_obround => Template::Obround { x: values[0], y: values[1], hole: opt(2) },
        Rule::ad_polygon => {
            let vertices = values[1];
            if vertices.fract() != 0. || !(3. ..=12.).contains(&vertices) {
                return err(span, "polygon apertures need 3 to 12 vertices");
            }
            Template::Polygon { diameter: values[0], vertices: vertices as u32,
                                rotation: opt(2), hole: opt(3) }
        }
        _ => unreachable!()
    })
}

fn make_step_repeat(pair: Pair<Rule>) -> ParseResult<StepRepeat> {
    let mut sr = StepRepeat { x_repeat: 1, y_repeat: 1, x_step: 0., y_step: 0. };
    for field in pair.into_inner() {
        let rule = field.as_rule();
        let value = first(field)?;
        match rule {
            Rule::sr_x => sr.x_repeat = parse_value(&value)?,
            Rule::sr_y => sr.y_repeat = parse_value(&value)?,
            Rule::sr_i => sr.x_step = parse_value(&value)?,
            Rule::sr_j => sr.y_step = parse_value(&value)?,
            _ => unreachable!()
        }
        if sr.x_repeat == 0 || sr.y_repeat == 0 {
            return err(value.as_span(), "repeat counts must be at least 1");
        }
    }
    Ok(sr)
}

fn make_attribute(pair: Pair<Rule>) -> ParseResult<Attribute> {
    let mut inner = pair.into_inner();
    let name = inner.next().expect("attribute name").as_str().to_string();
    Ok(Attribute { name, fields: inner.map(|p| p.as_str().to_string()).collect() })
}

fn make_axis_values(pair: Pair<Rule>) -> ParseResult<AxisValues> {
    let mut values = AxisValues::default();
    for item in pair.into_inner() {
        let rule = item.as_rule();
        let value = Some(parse_value(&first(item)?)?);
        match rule {
            Rule::a_value => values.a = value,
            _ => values.b = value,
        }
    }
    Ok(values)
}

fn make_coordinates(pairs: Pairs<Rule>) -> ParseResult<(Coordinates, Pair<Rule>)> {
    let mut coords = Coordinates::default();
    let mut code = None;
    for pair in pairs {
        let rule = pair.as_rule();
        if matches!(rule, Rule::d01 | Rule::d02 | Rule::d03) {
            code = Some(pair);
            continue;
        }
        let value = Some(Packed::new(first(pair)?.as_str()));
        match rule {
            Rule::coord_x => coords.x = value,
            Rule::coord_y => coords.y = value,
            Rule::coord_i => coords.i = value,
            _ => coords.j = value,
        }
    }
    Ok((coords, code.expect("operation code")))
}

fn make_operation(pair: Pair<Rule>) -> ParseResult<Command> {
    let (coords, code) = make_coordinates(pair.into_inner())?;
    Ok(match code.as_rule() {
        Rule::d01 => Command::Plot(coords),
        Rule::d02 => Command::Move(coords),
        _ => Command::Flash(coords),
    })
}

fn make_g_code(pair: &Pair<Rule>) -> Command {
    match pair.as_rule() {
        Rule::g01 => Command::Linear,
        Rule::g02 => Command::Clockwise,
        Rule::g03 => Command::CounterClockwise,
        Rule::g36 => Command::RegionStart,
        Rule::g37 => Command::RegionEnd,
        Rule::g54 => Command::SelectAperturePrefix,
        Rule::g55 => Command::PrepareFlash,
        Rule::g70 => Command::UnitInch,
        Rule::g71 => Command::UnitMillimeter,
        Rule::g74 => Command::SingleQuadrant,
        Rule::g75 => Command::MultiQuadrant,
        Rule::g90 => Command::AbsoluteNotation,
        Rule::g91 => Command::IncrementalNotation,
        _ => unreachable!()
    }
}

fn make_ext_command(pair: Pair<Rule>) -> ParseResult<Command> {
    Ok(match pair.as_rule() {
        Rule::fs => Command::FormatSpec(make_format(pair)?),
        Rule::mo => Command::UnitMode(parse_enum::<Unit>(pair)?),
        Rule::ad => {
            let (id, template) = pair.into_inner().collect_tuple().expect("children");
            Command::ApertureDefine(ApertureDefinition {
                id: make_aperture_id(&id)?,
                template: make_template(template)?,
            })
        }
        Rule::ab_open => Command::BlockOpen(make_aperture_id(&first(pair)?)?),
        Rule::ab_close => Command::BlockClose,
        Rule::sr_open => Command::StepRepeatOpen(make_step_repeat(pair)?),
        Rule::sr_close => Command::StepRepeatClose,
        Rule::lp => Command::LoadPolarity(parse_enum(pair)?),
        Rule::lm => Command::LoadMirroring(parse_enum(pair)?),
        Rule::lr => Command::LoadRotation(parse_value(&first(pair)?)?),
        Rule::ls => Command::LoadScaling(parse_value(&first(pair)?)?),
        Rule::tf => Command::FileAttribute(make_attribute(pair)?),
        Rule::ta => Command::ApertureAttribute(make_attribute(pair)?),
        Rule::to => Command::ObjectAttribute(make_attribute(pair)?),
        Rule::td => Command::DeleteAttribute(pair.into_inner().next().map(|p| p.as_str().to_string())),
        Rule::image_polarity => Command::ImagePolarity(parse_enum(pair)?),
        Rule::image_name => Command::ImageName(first(pair)?.as_str().to_string()),
        Rule::load_name => Command::LoadName(first(pair)?.as_str().to_string()),
        Rule::axis_select => Command::AxisSelect(parse_enum(pair)?),
        Rule::image_rotation => Command::ImageRotation(parse_value(&first(pair)?)?),
        Rule::mirror_image => Command::MirrorImage(make_axis_values(pair)?),
        Rule::image_offset => Command::ImageOffset(make_axis_values(pair)?),
        Rule::scale_factor => Command::ScaleFactor(make_axis_values(pair)?),
        _ => unreachable!()
    })
}

/// Builds the tree from the parsed pairs.  Keeps the line index needed to
/// attach spans.
struct Builder<'a> {
    index: LineIndex,
    options: &'a GrammarOptions,
    commands: Vec<Spanned<Command>>,
}

impl<'a> Builder<'a> {
    fn span(&self, span: PestSpan) -> Span {
        self.index.span(span.start(), span.end())
    }

    fn push(&mut self, command: Command, span: Span) {
        self.commands.push(Spanned::new(command, span));
    }

    fn make_expr(&self, pair: Pair<Rule>) -> ParseResult<Expr> {
        let span = pair.as_span();
        match pair.as_rule() {
            Rule::expr => self.make_expr(first(pair)?),
            Rule::sum | Rule::difference | Rule::product | Rule::quotient => {
                let op = match pair.as_rule() {
                    Rule::sum => Op::Add,
                    Rule::difference => Op::Sub,
                    Rule::product => Op::Mul,
                    _ => Op::Div,
                };
                let mut operands = pair.into_inner();
                let lhs = self.make_expr(operands.next().expect("operand"))?;
                // left-associative
                operands.try_fold(lhs, |lhs, rhs| -> ParseResult<Expr> {
                    Ok(Expr::binop(op, lhs, self.make_expr(rhs)?))
                })
            }
            Rule::unary => {
                let mut parts = pair.into_inner().collect::<Vec<_>>();
                let atom = parts.pop().expect("operand");
                let mut expr = self.make_expr(atom)?;
                for sign in parts.into_iter().rev() {
                    let op = if sign.as_str() == "-" { UnOp::Minus } else { UnOp::Plus };
                    let span = self.index.span(sign.as_span().start(), expr.span.end);
                    expr = Expr::new(ExprKind::UnOp(op, Box::new(expr)), span);
                }
                Ok(expr)
            }
            Rule::paren => {
                let inner = self.make_expr(first(pair)?)?;
                Ok(Expr::new(ExprKind::Paren(Box::new(inner)), self.span(span)))
            }
            Rule::number => Ok(Expr::new(ExprKind::Num(parse_value(&pair)?), self.span(span))),
            Rule::variable => {
                let index = self.make_var_index(pair)?;
                Ok(Expr::new(ExprKind::Var(index), self.span(span)))
            }
            _ => unreachable!()
        }
    }

    fn make_var_index(&self, pair: Pair<Rule>) -> ParseResult<u32> {
        let index_pair = first(pair)?;
        match index_pair.as_str().parse() {
            Ok(n) if n >= 1 => Ok(n),
            _ => err(index_pair.as_span(), "macro variables are numbered from $1"),
        }
    }

    fn make_macro_stmt(&self, pair: Pair<Rule>) -> ParseResult<Spanned<MacroStatement>> {
        let span = self.span(pair.as_span());
        let stmt = match pair.as_rule() {
            Rule::macro_comment => {
                let text = first(pair)?.as_str();
                MacroStatement::Comment(text.strip_prefix(' ').unwrap_or(text).to_string())
            }
            Rule::assignment => {
                let (var, value) = pair.into_inner().collect_tuple().expect("children");
                MacroStatement::Assign(self.make_var_index(var)?, self.make_expr(value)?)
            }
            Rule::primitive => {
                let pest_span = pair.as_span();
                let mut inner = pair.into_inner();
                let code = parse_value(&inner.next().expect("primitive code"))?;
                let values = inner.map(|p| self.make_expr(p)).collect::<ParseResult<Vec<_>>>()?;
                match Primitive::from_values(code, values) {
                    Ok(prim) => MacroStatement::Primitive(prim),
                    Err(e) => return err(pest_span, e.to_string()),
                }
            }
            _ => unreachable!()
        };
        Ok(Spanned::new(stmt, span))
    }

    fn make_macro(&self, pair: Pair<Rule>) -> ParseResult<MacroDefinition> {
        let mut inner = pair.into_inner();
        let name = inner.next().expect("macro name").as_str().to_string();
        let body = inner.map(|p| self.make_macro_stmt(p)).collect::<ParseResult<_>>()?;
        Ok(MacroDefinition { name, body })
    }

    fn add_extended(&mut self, pair: Pair<'_, Rule>) -> ParseResult<()> {
        let outer = self.span(pair.as_span());
        let (base, text) = (pair.as_span().start(), pair.as_str());
        let inner = pair.into_inner().collect::<Vec<_>>();
        let single = inner.len() == 1;
        for cmd in inner {
            // a lone command gets the span including the percent signs,
            // others extend up to their terminator
            let span = if single {
                outer
            } else {
                let (start, end) = (cmd.as_span().start(), cmd.as_span().end());
                let end = text[end - base..].find('*').map_or(end, |i| end + i + 1);
                self.index.span(start, end)
            };
            let command = if cmd.as_rule() == Rule::am {
                Command::MacroDefine(self.make_macro(cmd)?)
            } else {
                make_ext_command(cmd)?
            };
            self.push(command, span);
        }
        Ok(())
    }

    fn add_code_stmt(&mut self, pair: Pair<'_, Rule>) -> ParseResult<()> {
        let pest_span = pair.as_span();
        let span = self.span(pest_span);
        let mut inner = pair.into_inner();
        let code = inner.next().expect("G code");
        match inner.next() {
            None => self.push(make_g_code(&code), span),
            Some(rest) => {
                if !self.options.allow_combined_g_d_codes {
                    if self.options.enable_lenient_recovery {
                        warn!("{}: dropping combined G/D code {:?}", span, pest_span.as_str());
                        return Ok(());
                    }
                    return err(pest_span, "G and D codes must be separate commands");
                }
                let code_span = self.span(code.as_span());
                self.push(make_g_code(&code), code_span);
                // the D code part runs up to the terminating asterisk
                let rest_span = self.index.span(rest.as_span().start(), span.end);
                let command = match rest.as_rule() {
                    Rule::aperture_id => Command::SelectAperture(make_aperture_id(&rest)?),
                    _ => make_operation(rest)?,
                };
                self.push(command, rest_span);
            }
        }
        Ok(())
    }

    fn add_statement(&mut self, pair: Pair<'_, Rule>) -> ParseResult<()> {
        let pest_span = pair.as_span();
        let span = self.span(pest_span);
        match pair.as_rule() {
            Rule::extended => self.add_extended(pair)?,
            Rule::code_stmt => self.add_code_stmt(pair)?,
            Rule::comment => {
                let (_, text) = pair.into_inner().collect_tuple().expect("children");
                self.push(Command::Comment(text.as_str().to_string()), span);
            }
            Rule::operation_stmt => self.push(make_operation(first(pair)?)?, span),
            Rule::select_stmt => {
                let id = make_aperture_id(&first(pair)?)?;
                self.push(Command::SelectAperture(id), span);
            }
            Rule::m_stmt => {
                let command = match first(pair)?.as_rule() {
                    Rule::m00 => Command::ProgramStop,
                    Rule::m01 => Command::OptionalStop,
                    _ => Command::EndOfFile,
                };
                self.push(command, span);
            }
            Rule::junk => warn!("{}: skipping invalid command {:?}", span, pest_span.as_str()),
            Rule::EOI => (),
            _ => unreachable!()
        }
        Ok(())
    }
}

/// Parse a Gerber file with the default options.
pub fn parse(filename: &str, input: &str) -> ParseResult<File> {
    parse_with(filename, input, &GrammarOptions::default())
}

pub fn parse_with(filename: &str, input: &str, options: &GrammarOptions) -> ParseResult<File> {
    let rule = if options.enable_lenient_recovery { Rule::file_lenient } else { Rule::file };
    let statements = GerberParser::parse(rule, input).map_err(|e| e.with_path(filename))?;
    let mut builder = Builder { index: LineIndex::new(input), options, commands: vec![] };
    for statement in statements {
        builder.add_statement(statement).map_err(|e| e.with_path(filename))?;
    }
    Ok(File { filename: filename.into(), commands: builder.commands })
}
