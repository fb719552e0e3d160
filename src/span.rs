// Copyright (c) 2019 Georg Brandl.  Licensed under the Apache License,
// Version 2.0 <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0>
// or the MIT license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at
// your option. This file may not be copied, modified, or distributed except
// according to those terms.

//! Source locations attached to AST nodes.

use std::fmt;
use serde::{Deserialize, Serialize};

/// A region of the source text.
///
/// Offsets are byte offsets; lines and columns are 1-based, the end position
/// is exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
    pub end_line: usize,
    pub end_column: usize,
}

impl Span {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Check if the 1-based position lies within the span.
    pub fn contains(&self, line: usize, column: usize) -> bool {
        let pos = (line, column);
        (self.line, self.column) <= pos && pos < (self.end_line, self.end_column)
    }

    /// Return the smallest span covering both spans.
    pub fn union(&self, other: &Span) -> Span {
        let (first, last) = (self.min_by_start(other), self.max_by_end(other));
        Span {
            start: first.start,
            line: first.line,
            column: first.column,
            end: last.end,
            end_line: last.end_line,
            end_column: last.end_column,
        }
    }

    fn min_by_start<'a>(&'a self, other: &'a Span) -> &'a Span {
        if other.start < self.start { other } else { self }
    }

    fn max_by_end<'a>(&'a self, other: &'a Span) -> &'a Span {
        if other.end > self.end { other } else { self }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Maps byte offsets of one source text to line/column positions.
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(text.match_indices('\n').map(|(i, _)| i + 1));
        LineIndex { line_starts }
    }

    /// Return the 1-based line and column of a byte offset.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(n) => n,
            Err(n) => n - 1,
        };
        (line + 1, offset - self.line_starts[line] + 1)
    }

    pub fn span(&self, start: usize, end: usize) -> Span {
        let (line, column) = self.line_col(start);
        let (end_line, end_column) = self.line_col(end);
        Span { start, end, line, column, end_line, end_column }
    }
}

/// A node together with the span it was parsed from.
///
/// Equality only considers the node, so that trees parsed from differently
/// laid out sources compare equal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Spanned { node, span }
    }

    /// Wrap a node that has no source, e.g. one built programmatically.
    pub fn bare(node: T) -> Self {
        Spanned { node, span: Span::default() }
    }
}

impl<T: PartialEq> PartialEq for Spanned<T> {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
    }
}
