//! Per-call text snapshot with line/column addressing.
//!
//! A `SourceText` copies the buffer's lines once, joined with `'\n'`, so the
//! scanners can work on one contiguous `&str` while every result maps back to
//! buffer [`Location`]s. The real terminators are kept per line: they never
//! matter for scanning, but [`SourceText::slice`] puts them back when text is
//! reported verbatim, and [`LineEnding`] decides inserted line breaks.
//!
//! A snapshot is built at the start of each public operation and dropped at
//! its end. Nothing here survives an edit.

use std::borrow::Cow;

use memchr::memchr2;

use crate::buffer::{LineAddressedBuffer, LineEnding};
use crate::span::{Location, Position, Span};

/// Joined line text plus the byte offset of each line start.
#[derive(Debug, Clone)]
pub struct SourceText {
    text: String,
    line_starts: Vec<usize>,
    /// Terminator following each line except the last.
    terminators: Vec<&'static str>,
    line_ending: LineEnding,
}

/// The terminators of `text` in order: CRLF, LF or a lone CR.
fn split_terminators(text: &str) -> Vec<&'static str> {
    let bytes = text.as_bytes();
    let mut terminators = Vec::new();
    let mut pos = 0;
    while let Some(i) = memchr2(b'\r', b'\n', &bytes[pos..]) {
        let at = pos + i;
        if bytes[at] == b'\n' {
            terminators.push("\n");
            pos = at + 1;
        } else if bytes.get(at + 1) == Some(&b'\n') {
            terminators.push("\r\n");
            pos = at + 2;
        } else {
            terminators.push("\r");
            pos = at + 1;
        }
    }
    terminators
}

impl SourceText {
    /// Snapshot the current contents of `buffer`.
    pub fn capture<B: LineAddressedBuffer + ?Sized>(buffer: &B) -> Self {
        let count = buffer.line_count();
        let mut source = Self::from_lines((0..count).map(|i| buffer.line(i)));
        if count > 1 {
            let snapshot = buffer.snapshot();
            let terminators = split_terminators(&snapshot);
            if terminators.len() == count - 1 {
                source.terminators = terminators;
            } else {
                tracing::warn!(
                    lines = count,
                    terminators = terminators.len(),
                    "buffer lines do not match its terminators; reporting LF"
                );
            }
            source.line_ending = LineEnding::detect_in_text(&snapshot);
        }
        source
    }

    /// Build a snapshot from already-split lines.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut text = String::new();
        let mut line_starts = Vec::new();
        for (i, line) in lines.into_iter().enumerate() {
            if i > 0 {
                text.push('\n');
            }
            line_starts.push(text.len());
            text.push_str(line.as_ref());
        }
        if line_starts.is_empty() {
            line_starts.push(0);
        }
        let terminators = vec!["\n"; line_starts.len() - 1];
        Self {
            text,
            line_starts,
            terminators,
            line_ending: LineEnding::Lf,
        }
    }

    /// The joined text.
    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of lines in the snapshot.
    #[inline]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Newline sequence for inserted line breaks.
    #[inline]
    pub fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    /// Text of line `index` (no terminator).
    pub fn line(&self, index: usize) -> &str {
        let start = self.line_starts[index];
        let end = self
            .line_starts
            .get(index + 1)
            .map_or(self.text.len(), |next| next - 1);
        &self.text[start..end]
    }

    /// Byte offset where line `index` begins.
    #[inline]
    pub fn line_start(&self, index: usize) -> usize {
        self.line_starts[index]
    }

    /// Convert a byte offset into the joined text to a buffer location.
    pub fn location(&self, offset: usize) -> Location {
        let offset = offset.min(self.text.len());
        let line_index = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        let start = self.line_starts[line_index];
        Location::new(line_index, self.text[start..offset].chars().count())
    }

    /// Convert a buffer location to a byte offset, if it addresses text in
    /// the snapshot.
    pub fn offset(&self, location: Location) -> Option<usize> {
        if location.line_index >= self.line_count() {
            return None;
        }
        let line = self.line(location.line_index);
        let start = self.line_start(location.line_index);
        if location.char_index == 0 {
            return Some(start);
        }
        line.char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(line.len()))
            .nth(location.char_index)
            .map(|i| start + i)
    }

    /// 1-based position of a byte offset.
    #[inline]
    pub fn position(&self, offset: usize) -> Position {
        self.location(offset).position()
    }

    /// Exact buffer text for the byte range `start..end` of the joined text,
    /// with the original line terminators restored.
    pub fn slice(&self, start: usize, end: usize) -> Cow<'_, str> {
        let first = self.location(start).line_index;
        let last = self.location(end).line_index;
        if self.terminators[first..last].iter().all(|t| *t == "\n") {
            return Cow::Borrowed(&self.text[start..end]);
        }

        let mut out = String::with_capacity(end - start + (last - first));
        let mut pos = start;
        for line in first..last {
            let next = self.line_starts[line + 1];
            out.push_str(&self.text[pos..next - 1]);
            out.push_str(self.terminators[line]);
            pos = next;
        }
        out.push_str(&self.text[pos..end]);
        Cow::Owned(out)
    }

    /// Buffer span covering the byte range `start..end`.
    #[inline]
    pub fn span(&self, start: usize, end: usize) -> Span {
        Span::new(self.location(start), self.location(end))
    }
}
