//! Line/column addressing for buffer positions.
//!
//! Every located property value carries a `Span` telling exactly where its
//! source text sits in the buffer. Locations are zero-based and count
//! characters (Unicode scalar values), not bytes.

use std::fmt;

/// A character position in a line-addressed buffer.
///
/// Ordering is line-major, then column. A `char_index` equal to the line's
/// length addresses the position immediately before the line terminator.
///
/// # Example
///
/// ```rust
/// use appxaml_core::span::Location;
///
/// assert!(Location::new(0, 40) < Location::new(1, 0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Location {
    /// Zero-based line number.
    pub line_index: usize,
    /// Zero-based character offset within the line.
    pub char_index: usize,
}

impl Location {
    /// Create a location from a line and a character offset.
    #[inline]
    pub const fn new(line_index: usize, char_index: usize) -> Self {
        Self {
            line_index,
            char_index,
        }
    }

    /// The 1-based position used in user-facing messages.
    #[inline]
    pub const fn position(self) -> Position {
        Position {
            line: self.line_index + 1,
            column: self.char_index + 1,
        }
    }
}

/// A half-open range `[start, end)` of buffer locations.
///
/// Spans may cross line boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// First location covered (inclusive).
    pub start: Location,
    /// Location just past the covered text (exclusive).
    pub end: Location,
}

impl Span {
    /// Create a span from two locations. `start` must not be after `end`.
    #[inline]
    pub fn new(start: Location, end: Location) -> Self {
        debug_assert!(start <= end, "span start {start:?} is after end {end:?}");
        Self { start, end }
    }

    /// An empty span at `at`, used for pure insertions.
    #[inline]
    pub const fn empty(at: Location) -> Self {
        Self { start: at, end: at }
    }

    /// Check if this span covers no text.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Check if the span covers `location`.
    #[inline]
    pub fn contains(&self, location: Location) -> bool {
        location >= self.start && location < self.end
    }

    /// Check if the span lies on a single line.
    #[inline]
    pub fn is_single_line(&self) -> bool {
        self.start.line_index == self.end.line_index
    }
}

/// A 1-based line/column pair for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    /// 1-based line number.
    pub line: usize,
    /// 1-based column number.
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {} column {}", self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locations_order_line_major() {
        assert!(Location::new(0, 99) < Location::new(1, 0));
        assert!(Location::new(2, 3) < Location::new(2, 4));
        assert_eq!(Location::new(1, 1), Location::new(1, 1));
    }

    #[test]
    fn span_contains_is_half_open() {
        let span = Span::new(Location::new(0, 2), Location::new(1, 1));
        assert!(span.contains(Location::new(0, 2)));
        assert!(span.contains(Location::new(0, 50)));
        assert!(span.contains(Location::new(1, 0)));
        assert!(!span.contains(Location::new(1, 1)));
        assert!(!span.is_single_line());
    }

    #[test]
    fn position_is_one_based() {
        let pos = Location::new(0, 0).position();
        assert_eq!(pos, Position { line: 1, column: 1 });
        assert_eq!(pos.to_string(), "line 1 column 1");
    }
}
