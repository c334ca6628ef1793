//! Character entity and CDATA handling for property values.
//!
//! - `escape` writes the five predefined entities: &amp; &lt; &gt; &apos; &quot;
//! - `unescape` decodes them (plus numeric character references) and expands
//!   `<![CDATA[...]]>` sections in place
//!
//! Both return `Cow::Borrowed` when the input needs no change.

use std::borrow::Cow;

use memchr::{memchr, memchr2, memmem};

use crate::error::{Error, Result};
use crate::span::Position;

const CDATA_OPEN: &str = "<![CDATA[";
const CDATA_CLOSE: &str = "]]>";

/// Escape a value for use inside a quoted attribute or element content.
///
/// Only `& < > ' "` are replaced; everything else, `=` included, is kept.
///
/// ```rust
/// use appxaml_core::entities::escape;
///
/// assert_eq!(escape("a<b & 'c'"), "a&lt;b &amp; &apos;c&apos;");
/// ```
pub fn escape(value: &str) -> Cow<'_, str> {
    let needs_escape = value
        .bytes()
        .any(|b| matches!(b, b'&' | b'<' | b'>' | b'\'' | b'"'));
    if !needs_escape {
        return Cow::Borrowed(value);
    }

    let mut out = String::with_capacity(value.len() + 16);
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("&apos;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Decode entities and expand CDATA sections.
///
/// Unknown named entities and stray `&` are kept verbatim. An unterminated
/// CDATA section is malformed; the error position is relative to `value`.
///
/// ```rust
/// use appxaml_core::entities::unescape;
///
/// let decoded = unescape("R&#228;k<![CDATA[<sm&ouml;rg>]]>&amp;s").unwrap();
/// assert_eq!(decoded, "Räk<sm&ouml;rg>&s");
/// ```
pub fn unescape(value: &str) -> Result<Cow<'_, str>> {
    let bytes = value.as_bytes();
    if memchr2(b'&', b'<', bytes).is_none() {
        return Ok(Cow::Borrowed(value));
    }

    let mut out = String::with_capacity(value.len());
    let mut pos = 0;
    while let Some(rel) = memchr2(b'&', b'<', &bytes[pos..]) {
        let at = pos + rel;
        out.push_str(&value[pos..at]);

        if bytes[at] == b'<' {
            if value[at..].starts_with(CDATA_OPEN) {
                let body = at + CDATA_OPEN.len();
                let Some(end) = memmem::find(&bytes[body..], CDATA_CLOSE.as_bytes()) else {
                    return Err(Error::malformed(
                        "unterminated CDATA section",
                        position_in(value, at),
                    ));
                };
                out.push_str(&value[body..body + end]);
                pos = body + end + CDATA_CLOSE.len();
            } else {
                out.push('<');
                pos = at + 1;
            }
            continue;
        }

        match memchr(b';', &bytes[at..]).and_then(|semi| {
            decode_entity(&value[at + 1..at + semi]).map(|c| (c, semi))
        }) {
            Some((decoded, semi)) => {
                out.push(decoded);
                pos = at + semi + 1;
            }
            None => {
                out.push('&');
                pos = at + 1;
            }
        }
    }
    out.push_str(&value[pos..]);
    Ok(Cow::Owned(out))
}

/// Decode a single entity body (without `&` and `;`).
pub(crate) fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let digits = entity.strip_prefix('#')?;
            let codepoint = match digits.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => digits.parse::<u32>().ok()?,
            };
            char::from_u32(codepoint).filter(|&c| c != '\0')
        }
    }
}

/// 1-based position of a byte offset within a standalone string.
fn position_in(value: &str, offset: usize) -> Position {
    let before = &value[..offset];
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    Position {
        line: memchr::memchr_iter(b'\n', before.as_bytes()).count() + 1,
        column: before[line_start..].chars().count() + 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_empty_and_plain_borrow() {
        assert_eq!(escape(""), "");
        assert!(matches!(escape("Window1.xaml"), Cow::Borrowed(_)));
    }

    #[test]
    fn escape_all_five() {
        assert_eq!(escape(r#"&<>'""#), "&amp;&lt;&gt;&apos;&quot;");
    }

    #[test]
    fn escape_keeps_equals_tab_and_non_ascii() {
        assert_eq!(escape("a=b\tRäksmörgås"), "a=b\tRäksmörgås");
    }

    #[test]
    fn unescape_named_entities() {
        let decoded = unescape("&quot;Startup&amp;Window&quot;.xaml").unwrap();
        assert_eq!(decoded, "\"Startup&Window\".xaml");
        assert_eq!(unescape("&lt;&gt;&apos;").unwrap(), "<>'");
    }

    #[test]
    fn unescape_keeps_unknown_and_stray_ampersands() {
        assert_eq!(unescape("a & b").unwrap(), "a & b");
        assert_eq!(unescape("&nbsp;&amp").unwrap(), "&nbsp;&amp");
    }

    #[test]
    fn unescape_numeric_references() {
        assert_eq!(unescape("&#65;&#x42;&#X43;").unwrap(), "ABC");
        assert_eq!(unescape("&#xZZ;").unwrap(), "&#xZZ;");
    }

    #[test]
    fn unescape_expands_cdata_in_place() {
        let decoded = unescape("Räk<![CDATA[smörg]]>ås.xaml").unwrap();
        assert_eq!(decoded, "Räksmörgås.xaml");

        let decoded = unescape("<![CDATA[&amp;]]>&amp;<![CDATA[]]>").unwrap();
        assert_eq!(decoded, "&amp;&");
    }

    #[test]
    fn unescape_unterminated_cdata_is_malformed() {
        let err = unescape("ok\n  <![CDATA[never closed").unwrap_err();
        assert_eq!(err.position(), Some(Position { line: 2, column: 3 }));
    }

    #[test]
    fn unescape_reverses_escape() {
        for value in ["", "plain", "a&b", "<tag attr='x'>", "\"q\" & 'a'", "Ä > Ö"] {
            assert_eq!(unescape(&escape(value)).unwrap(), value);
        }
    }
}
