//! The line-addressed text store edited by a [`Document`](crate::Document).
//!
//! Hosts own the text. The editor only reads lines and replaces spans, one
//! atomic splice per operation. [`RopeBuffer`] is the in-memory
//! implementation used by the CLI and the tests.

use std::borrow::Cow;
use std::fmt;

use ropey::Rope;

use crate::error::{Error, Result};
use crate::span::{Location, Span};

/// A mutable, line-oriented text store.
pub trait LineAddressedBuffer {
    /// Number of lines. A trailing line terminator starts a final empty line.
    fn line_count(&self) -> usize;

    /// Text of line `index` without its terminator.
    ///
    /// `index` must be less than [`line_count`](Self::line_count).
    fn line(&self, index: usize) -> Cow<'_, str>;

    /// Replace the text covered by `span` with `text`.
    ///
    /// Must be atomic: on error the buffer is unchanged.
    fn replace_span(&mut self, span: Span, text: &str) -> Result<()>;

    /// The full text, terminators included.
    fn snapshot(&self) -> String;
}

/// The newline sequence used when an edit has to break a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    /// Unix-style LF (`'\n'`).
    #[default]
    Lf,
    /// Windows-style CRLF (`"\r\n"`).
    Crlf,
    /// Classic Mac OS CR (`'\r'`).
    Cr,
}

impl LineEnding {
    /// Detect the line ending to use for new lines in `text`.
    ///
    /// Any CRLF in the input selects [`LineEnding::Crlf`]. Lone CRs with no
    /// LF at all select [`LineEnding::Cr`]. Everything else is
    /// [`LineEnding::Lf`].
    pub fn detect_in_text(text: &str) -> Self {
        if text.contains("\r\n") {
            Self::Crlf
        } else if text.contains('\r') && !text.contains('\n') {
            Self::Cr
        } else {
            Self::Lf
        }
    }

    /// The newline characters.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::Crlf => "\r\n",
            Self::Cr => "\r",
        }
    }
}

/// A rope-backed [`LineAddressedBuffer`].
///
/// Recognized line breaks are LF, CRLF and a lone CR.
///
/// # Example
///
/// ```rust
/// use appxaml_core::buffer::{LineAddressedBuffer, RopeBuffer};
///
/// let buffer = RopeBuffer::from("<Application>\r\n</Application>");
/// assert_eq!(buffer.line_count(), 2);
/// assert_eq!(buffer.line(0), "<Application>");
/// ```
#[derive(Debug, Clone, Default)]
pub struct RopeBuffer {
    rope: Rope,
}

impl RopeBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self { rope: Rope::new() }
    }

    /// Length of line `index` in chars, excluding its terminator.
    fn line_len(&self, index: usize) -> usize {
        let line = self.rope.line(index);
        let mut len = line.len_chars();
        if len > 0 && line.char(len - 1) == '\n' {
            len -= 1;
        }
        if len > 0 && line.char(len - 1) == '\r' {
            len -= 1;
        }
        len
    }

    /// Convert a location to a rope char index, if it addresses existing text.
    fn char_index(&self, location: Location) -> Option<usize> {
        if location.line_index >= self.rope.len_lines() {
            return None;
        }
        if location.char_index > self.line_len(location.line_index) {
            return None;
        }
        Some(self.rope.line_to_char(location.line_index) + location.char_index)
    }

    /// The line ending new lines should use in this buffer.
    pub fn line_ending(&self) -> LineEnding {
        LineEnding::detect_in_text(&self.snapshot())
    }
}

impl From<&str> for RopeBuffer {
    fn from(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
        }
    }
}

impl fmt::Display for RopeBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for chunk in self.rope.chunks() {
            f.write_str(chunk)?;
        }
        Ok(())
    }
}

impl LineAddressedBuffer for RopeBuffer {
    fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    fn line(&self, index: usize) -> Cow<'_, str> {
        let len = self.line_len(index);
        self.rope.line(index).slice(..len).into()
    }

    fn replace_span(&mut self, span: Span, text: &str) -> Result<()> {
        let (start, end) = match (self.char_index(span.start), self.char_index(span.end)) {
            (Some(start), Some(end)) if start <= end => (start, end),
            _ => return Err(Error::invalid_span(span)),
        };

        tracing::trace!(start, end, len = text.len(), "replacing buffer span");
        self.rope.remove(start..end);
        self.rope.insert(start, text);
        Ok(())
    }

    fn snapshot(&self) -> String {
        self.rope.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_exclude_terminators() {
        let buffer = RopeBuffer::from("a\r\nbb\ncc\r");
        assert_eq!(buffer.line_count(), 4);
        assert_eq!(buffer.line(0), "a");
        assert_eq!(buffer.line(1), "bb");
        assert_eq!(buffer.line(2), "cc");
        assert_eq!(buffer.line(3), "");
    }

    #[test]
    fn replace_across_lines() {
        let mut buffer = RopeBuffer::from("one\r\ntwo\r\nthree");
        let span = Span::new(Location::new(0, 1), Location::new(2, 2));
        buffer.replace_span(span, "X").unwrap();
        assert_eq!(buffer.snapshot(), "oXree");
    }

    #[test]
    fn replace_at_end_of_line_keeps_terminator() {
        let mut buffer = RopeBuffer::from("ab\r\ncd");
        buffer
            .replace_span(Span::empty(Location::new(0, 2)), "!")
            .unwrap();
        assert_eq!(buffer.snapshot(), "ab!\r\ncd");
    }

    #[test]
    fn out_of_range_span_is_rejected_without_change() {
        let mut buffer = RopeBuffer::from("ab\ncd");
        let span = Span::new(Location::new(0, 1), Location::new(0, 3));
        let err = buffer.replace_span(span, "zz").unwrap_err();
        assert!(matches!(err, Error::InvalidSpan { .. }));
        assert_eq!(buffer.snapshot(), "ab\ncd");

        let span = Span::empty(Location::new(5, 0));
        assert!(buffer.replace_span(span, "zz").is_err());
    }

    #[test]
    fn detects_line_ending() {
        assert_eq!(RopeBuffer::from("a\nb").line_ending(), LineEnding::Lf);
        assert_eq!(RopeBuffer::from("a\r\nb").line_ending(), LineEnding::Crlf);
        assert_eq!(RopeBuffer::from("a\rb\r").line_ending(), LineEnding::Cr);
        assert_eq!(RopeBuffer::from("a\rb\nc").line_ending(), LineEnding::Lf);
        assert_eq!(LineEnding::Crlf.as_str(), "\r\n");
        assert_eq!(LineEnding::Cr.as_str(), "\r");
    }
}
