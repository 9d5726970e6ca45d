//! Declaration sites.

use std::fmt;

/// Where the extractor found a declaration, as `line:column`.
///
/// Spans are opaque to resolution. They are carried so that a duplicate
/// diagnostic can point at both sites.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Span {
    pub line: u32,
    pub column: u32,
}

impl Span {
    pub const fn point(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// Whether the extractor supplied no position.
    pub fn is_unknown(&self) -> bool {
        self.line == 0
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unknown() {
            f.write_str("<unknown>")
        } else {
            write!(f, "{}:{}", self.line, self.column)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_line_and_column() {
        assert_eq!(Span::point(3, 15).to_string(), "3:15");
        assert_eq!(Span::default().to_string(), "<unknown>");
    }

    #[test]
    fn orders_by_line_first() {
        assert!(Span::point(1, 40) < Span::point(2, 1));
        assert!(Span::point(2, 1) < Span::point(2, 3));
    }
}
