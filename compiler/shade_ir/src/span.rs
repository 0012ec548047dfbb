//! Source location spans.

use std::fmt;

use crate::Name;

/// A 1-based line / 0-based column pair.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default, PartialOrd, Ord)]
pub struct Position {
    pub line: u32,
    pub col: u32,
}

impl Position {
    #[inline]
    pub const fn new(line: u32, col: u32) -> Self {
        Position { line, col }
    }
}

/// Source location span.
///
/// Rendered as `file:startLine:startCol-endLine:endCol`. Synthesized nodes
/// carry the default span, which has no file and renders as `<unknown>`.
#[derive(Clone, Eq, PartialEq, Hash, Default)]
pub struct Span {
    pub file: Option<Name>,
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(file: Option<Name>, start: Position, end: Position) -> Self {
        Span { file, start, end }
    }

    /// Span in an anonymous file.
    pub fn at(start: (u32, u32), end: (u32, u32)) -> Self {
        Span {
            file: None,
            start: Position::new(start.0, start.1),
            end: Position::new(end.0, end.1),
        }
    }

    #[must_use]
    pub fn with_file(mut self, file: impl Into<Name>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn is_dummy(&self) -> bool {
        *self == Span::default()
    }

    /// Smallest span covering both `self` and `other`.
    #[must_use]
    pub fn merge(&self, other: &Span) -> Span {
        Span {
            file: self.file.clone().or_else(|| other.file.clone()),
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let file = self.file.as_ref().map_or("<unknown>", Name::as_str);
        write!(
            f,
            "{file}:{}:{}-{}:{}",
            self.start.line, self.start.col, self.end.line, self.end.col
        )
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Span({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_format() {
        let span = Span::at((3, 4), (3, 17)).with_file("kernels.py");
        assert_eq!(span.to_string(), "kernels.py:3:4-3:17");
    }

    #[test]
    fn display_without_file() {
        assert_eq!(Span::at((1, 0), (2, 5)).to_string(), "<unknown>:1:0-2:5");
    }

    #[test]
    fn merge_covers_both() {
        let a = Span::at((1, 4), (1, 9)).with_file("k.py");
        let b = Span::at((1, 12), (2, 1));
        let merged = a.merge(&b);
        assert_eq!(merged.to_string(), "k.py:1:4-2:1");
    }

    #[test]
    fn default_is_dummy() {
        assert!(Span::default().is_dummy());
        assert!(!Span::at((1, 0), (1, 1)).is_dummy());
    }
}
