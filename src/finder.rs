// Copyright (c) 2019 Georg Brandl.  Licensed under the Apache License,
// Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at
// your option. This file may not be copied, modified, or distributed except
// according to those terms.

//! Lookup of AST nodes and interpreter state by source position.

use crate::ast::{Command, Expr, File, MacroStatement};
use crate::config::Config;
use crate::eval::{EvalError, Evaluator, State};
use crate::span::{Span, Spanned};
use crate::visit::{walk_expr, walk_macro_statement, Visitor};

/// A reference to a node found at a position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeRef<'a> {
    Command(&'a Spanned<Command>),
    MacroStatement(&'a Spanned<MacroStatement>),
    Expr(&'a Expr),
}

impl<'a> NodeRef<'a> {
    pub fn span(&self) -> Span {
        match self {
            NodeRef::Command(c) => c.span,
            NodeRef::MacroStatement(s) => s.span,
            NodeRef::Expr(e) => e.span,
        }
    }
}

/// The result of a lookup: index of the top-level command, and the deepest
/// node containing the position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Found<'a> {
    pub index: usize,
    pub node: NodeRef<'a>,
}

pub struct NodeFinder<'a> {
    file: &'a File,
    // end position of every command, in source order
    ends: Vec<(usize, usize)>,
}

struct Deepest<'a> {
    line: usize,
    column: usize,
    found: NodeRef<'a>,
}

impl<'a> Visitor<'a> for Deepest<'a> {
    fn visit_macro_statement(&mut self, stmt: &'a Spanned<MacroStatement>) {
        if stmt.span.contains(self.line, self.column) {
            self.found = NodeRef::MacroStatement(stmt);
            walk_macro_statement(self, stmt);
        }
    }

    fn visit_expr(&mut self, expr: &'a Expr) {
        if expr.span.contains(self.line, self.column) {
            self.found = NodeRef::Expr(expr);
            walk_expr(self, expr);
        }
    }
}

impl<'a> NodeFinder<'a> {
    pub fn new(file: &'a File) -> Self {
        let ends = file.commands.iter().map(|c| (c.span.end_line, c.span.end_column)).collect();
        NodeFinder { file, ends }
    }

    /// Find the deepest node containing the 1-based position.
    pub fn find(&self, line: usize, column: usize) -> Option<Found<'a>> {
        // first command ending after the position
        let index = match self.ends.binary_search(&(line, column)) {
            Ok(n) => n + 1,
            Err(n) => n,
        };
        let command = self.file.commands.get(index)?;
        if !command.span.contains(line, column) {
            return None;
        }
        let mut visitor = Deepest { line, column, found: NodeRef::Command(command) };
        visitor.visit_command(command);
        Some(Found { index, node: visitor.found })
    }

    /// The interpreter state right after the command at the position.
    pub fn state_at_position(&self, line: usize, column: usize,
                             config: &Config) -> Result<Option<State>, EvalError> {
        match self.find(line, column) {
            Some(found) => state_at(self.file, found.index + 1, config).map(Some),
            None => Ok(None),
        }
    }
}

/// Replay the first `count` commands and return the resulting state.
pub fn state_at(file: &File, count: usize, config: &Config) -> Result<State, EvalError> {
    let mut evaluator = Evaluator::new(config);
    for command in file.commands.iter().take(count) {
        evaluator.eval_command(command)?;
    }
    Ok(evaluator.state().clone())
}
