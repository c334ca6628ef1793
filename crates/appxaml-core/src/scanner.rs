//! Quote-aware scanning of raw start-tag text.
//!
//! This layer never relies on the reader's view of the document. It works on
//! the exact characters of the snapshot so that edits land on the original
//! bytes: the closing bracket of a tag, and the exact quoted span of an
//! attribute value.

use memchr::memchr;

use crate::error::{Error, Result};
use crate::source::SourceText;
use crate::span::Location;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuoteState {
    None,
    InSingle,
    InDouble,
}

/// Find the character closing the start tag that begins at or after `from`.
///
/// Returns the offset of the `/` of a trailing `/>`, or of the `>`. Quote
/// state carries across lines and is never reset, so junk before the real
/// tag is scanned exactly as written. Returns `None` when the text runs out.
pub fn find_closing_bracket(text: &str, from: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut state = QuoteState::None;
    let mut pos = from;

    while pos < bytes.len() {
        match (state, bytes[pos]) {
            (QuoteState::None, b'\'') => state = QuoteState::InSingle,
            (QuoteState::None, b'"') => state = QuoteState::InDouble,
            (QuoteState::InSingle, b'\'') | (QuoteState::InDouble, b'"') => {
                state = QuoteState::None
            }
            (QuoteState::None, b'/') if bytes.get(pos + 1) == Some(&b'>') => return Some(pos),
            (QuoteState::None, b'>') => return Some(pos),
            _ => {}
        }
        pos += 1;
    }
    None
}

/// Location form of [`find_closing_bracket`].
pub fn find_closing_location(source: &SourceText, from: Location) -> Option<Location> {
    let start = source.offset(from)?;
    find_closing_bracket(source.text(), start).map(|offset| source.location(offset))
}

/// An attribute found by re-scanning raw tag text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawAttribute {
    /// Offset of the first character of the attribute name.
    pub name_start: usize,
    /// Offset of the opening quote.
    pub value_start: usize,
    /// Offset just past the closing quote.
    pub value_end: usize,
}

impl RawAttribute {
    /// Byte range of the value between its quotes.
    pub fn inner(&self) -> std::ops::Range<usize> {
        self.value_start + 1..self.value_end - 1
    }
}

#[inline]
fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

fn skip_space(bytes: &[u8], mut pos: usize) -> usize {
    while pos < bytes.len() && is_space(bytes[pos]) {
        pos += 1;
    }
    pos
}

/// Re-scan the start tag at `tag_start` for the first attribute whose name
/// satisfies `wanted`.
///
/// Whitespace of any kind and amount may surround `=`. Values must be
/// delimited by a matching single or double quote and may span lines. A
/// missing or unterminated quote is malformed markup.
pub fn find_attribute<F>(
    source: &SourceText,
    tag_start: usize,
    wanted: F,
) -> Result<Option<RawAttribute>>
where
    F: Fn(&str) -> bool,
{
    let text = source.text();
    let bytes = text.as_bytes();

    let mut pos = tag_start + 1;
    while pos < bytes.len() && !is_space(bytes[pos]) && !matches!(bytes[pos], b'/' | b'>') {
        pos += 1;
    }

    loop {
        pos = skip_space(bytes, pos);
        match bytes.get(pos) {
            None => {
                return Err(Error::malformed(
                    "start tag is not closed",
                    source.position(tag_start),
                ))
            }
            Some(b'>') => return Ok(None),
            Some(b'/') if bytes.get(pos + 1) == Some(&b'>') => return Ok(None),
            _ => {}
        }

        let name_start = pos;
        while pos < bytes.len()
            && !is_space(bytes[pos])
            && !matches!(bytes[pos], b'=' | b'/' | b'>')
        {
            pos += 1;
        }
        if pos == name_start {
            return Err(Error::malformed(
                "expected an attribute name",
                source.position(pos),
            ));
        }
        let name = &text[name_start..pos];

        pos = skip_space(bytes, pos);
        if bytes.get(pos) != Some(&b'=') {
            return Err(Error::malformed(
                format!("expected '=' after attribute '{name}'"),
                source.position(pos),
            ));
        }
        pos = skip_space(bytes, pos + 1);

        let quote = match bytes.get(pos) {
            Some(&q) if q == b'"' || q == b'\'' => q,
            _ => {
                return Err(Error::malformed(
                    format!("expected a quoted value for attribute '{name}'"),
                    source.position(pos),
                ))
            }
        };
        let value_start = pos;
        let Some(close) = memchr(quote, &bytes[value_start + 1..]) else {
            return Err(Error::malformed(
                format!("value of attribute '{name}' is not terminated"),
                source.position(value_start),
            ));
        };
        let value_end = value_start + 1 + close + 1;

        if wanted(name) {
            tracing::trace!(name, value_start, value_end, "attribute located by rescan");
            return Ok(Some(RawAttribute {
                name_start,
                value_start,
                value_end,
            }));
        }
        pos = value_end;
    }
}
