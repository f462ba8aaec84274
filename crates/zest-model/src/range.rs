//! Source ranges used to anchor symbols and answer cursor queries.

use std::fmt;
use zest_parser::token::Span;

/// A 1-based line/column position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
    /// 1-based line.
    pub line: u32,
    /// 1-based column.
    pub column: u32,
}

impl Position {
    /// Create a new position.
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// An immutable source range, attached once at symbol creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    /// 1-based first line.
    pub line: u32,
    /// 1-based first column.
    pub column: u32,
    /// 1-based last line.
    pub last_line: u32,
    /// 1-based column just past the end.
    pub last_column: u32,
}

impl Range {
    /// Create a new range.
    pub fn new(line: u32, column: u32, last_line: u32, last_column: u32) -> Self {
        Self { line, column, last_line, last_column }
    }

    /// The range covered by a CST span.
    pub fn of(span: Span) -> Self {
        Self {
            line: span.line,
            column: span.column,
            last_line: span.last_line,
            last_column: span.last_column,
        }
    }

    /// Whether `pos` falls inside this range.
    ///
    /// The end coordinate is half-open per line; a position sitting
    /// exactly on the end column is only included when it equals the
    /// start column as well (a degenerate range).
    pub fn contains_position(&self, pos: Position) -> bool {
        if self.line <= pos.line && pos.line < self.last_line {
            true
        } else if self.line == pos.line && pos.line == self.last_line {
            (self.column <= pos.column && pos.column < self.last_column)
                || (self.column == pos.column && pos.column == self.last_column)
        } else {
            false
        }
    }

    /// Whether `other` is fully inside this range.
    pub fn contains_range(&self, other: &Range) -> bool {
        self.line <= other.line
            && self.last_line >= other.last_line
            && self.column <= other.column
            && self.last_column >= other.last_column
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}:{}-{}:{}>", self.line, self.column, self.last_line, self.last_column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multi_line_containment() {
        let range = Range::new(1, 5, 3, 2);
        assert!(range.contains_position(Position::new(2, 1)));
        assert!(range.contains_position(Position::new(1, 5)));
        assert!(!range.contains_position(Position::new(3, 2)));
        assert!(!range.contains_position(Position::new(4, 1)));
    }

    #[test]
    fn single_line_containment_is_half_open() {
        let range = Range::new(1, 5, 1, 8);
        assert!(range.contains_position(Position::new(1, 5)));
        assert!(range.contains_position(Position::new(1, 7)));
        assert!(!range.contains_position(Position::new(1, 8)));
    }

    #[test]
    fn degenerate_range_contains_its_point() {
        let range = Range::new(2, 4, 2, 4);
        assert!(range.contains_position(Position::new(2, 4)));
    }

    #[test]
    fn range_containment() {
        let outer = Range::new(1, 1, 5, 10);
        let inner = Range::new(2, 3, 2, 7);
        assert!(outer.contains_range(&inner));
        assert!(!inner.contains_range(&outer));
    }
}
