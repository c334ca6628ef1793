//! Forward-only well-formedness reader.
//!
//! The reader walks the snapshot once, producing one [`Event`] per markup
//! construct and failing at the first construct that is not well-formed. It
//! is used to validate the document and to navigate to the root element and
//! its children. Its offsets are good enough for navigation; exact edit
//! boundaries are always recovered by [`crate::scanner`].
//!
//! Checks performed:
//! - start/end tag nesting and a single root element
//! - quoted, `<`-free attribute values and unique attribute names
//! - terminated comments, CDATA sections, processing instructions, DOCTYPE
//! - entity references limited to the predefined and numeric forms
//! - no character data outside the root element

use memchr::{memchr, memmem};

use crate::entities::decode_entity;
use crate::error::{Error, Result};
use crate::source::SourceText;

/// An attribute as seen by the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribute<'a> {
    /// Attribute name, prefix included.
    pub name: &'a str,
    /// Raw value between the quotes, entities not decoded.
    pub value: &'a str,
}

/// A start tag, or an empty-element tag when `self_closing` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTag<'a> {
    /// Element name, prefix included.
    pub name: &'a str,
    /// Offset of the opening `<`.
    pub start: usize,
    /// Offset just past the closing `>`.
    pub end: usize,
    /// Number of open ancestor elements; the root has depth 0.
    pub depth: usize,
    /// The tag ends in `/>`.
    pub self_closing: bool,
    /// Attributes in document order.
    pub attributes: Vec<Attribute<'a>>,
}

/// One markup construct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event<'a> {
    /// `<?...?>`, including the XML declaration.
    ProcessingInstruction { start: usize },
    /// `<!DOCTYPE ...>`
    Doctype { start: usize },
    /// `<!--...-->`
    Comment { start: usize, end: usize },
    /// A start or empty-element tag.
    StartTag(StartTag<'a>),
    /// `</name>`
    EndTag {
        name: &'a str,
        start: usize,
        end: usize,
        depth: usize,
    },
    /// Character data, entities not decoded.
    Text { text: &'a str, start: usize },
    /// The payload of a `<![CDATA[...]]>` section.
    CData { content: &'a str, start: usize },
}

/// Pull reader over a [`SourceText`].
pub struct Reader<'a> {
    source: &'a SourceText,
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
    open: Vec<(&'a str, usize)>,
    root_closed: bool,
}

#[inline]
fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

fn is_name_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == ':'
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | ':' | '-' | '.' | '\u{B7}')
}

impl<'a> Reader<'a> {
    /// Create a reader positioned at the start of `source`, past a leading
    /// byte order mark.
    pub fn new(source: &'a SourceText) -> Self {
        let text = source.text();
        let pos = if text.starts_with('\u{feff}') {
            '\u{feff}'.len_utf8()
        } else {
            0
        };
        Self {
            source,
            text,
            bytes: text.as_bytes(),
            pos,
            open: Vec::new(),
            root_closed: false,
        }
    }

    /// Number of currently open elements.
    #[inline]
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    fn error(&self, message: impl Into<String>, offset: usize) -> Error {
        Error::malformed(message, self.source.position(offset))
    }

    fn find(&self, from: usize, needle: &str) -> Option<usize> {
        memmem::find(&self.bytes[from..], needle.as_bytes()).map(|i| from + i)
    }

    /// Read the next event, or `None` once the whole text has been consumed.
    pub fn next_event(&mut self) -> Result<Option<Event<'a>>> {
        if self.pos >= self.bytes.len() {
            if let Some(&(name, start)) = self.open.last() {
                return Err(self.error(
                    format!("unexpected end of file; element '{name}' is not closed"),
                    start,
                ));
            }
            return Ok(None);
        }

        if self.bytes[self.pos] != b'<' {
            return self.read_text().map(Some);
        }

        let start = self.pos;
        let rest = &self.text[start..];
        let event = if rest.starts_with("<?") {
            let end = self
                .find(start + 2, "?>")
                .ok_or_else(|| self.error("processing instruction is not terminated", start))?;
            self.pos = end + 2;
            Event::ProcessingInstruction { start }
        } else if rest.starts_with("<!--") {
            let end = self
                .find(start + 4, "-->")
                .ok_or_else(|| self.error("comment is not terminated", start))?;
            if let Some(dashes) = self.find(start + 4, "--").filter(|&d| d < end) {
                return Err(self.error("'--' is not allowed inside a comment", dashes));
            }
            self.pos = end + 3;
            Event::Comment { start, end: self.pos }
        } else if rest.starts_with("<![CDATA[") {
            if self.open.is_empty() {
                return Err(self.error("CDATA section outside the root element", start));
            }
            let body = start + "<![CDATA[".len();
            let end = self
                .find(body, "]]>")
                .ok_or_else(|| self.error("CDATA section is not terminated", start))?;
            self.pos = end + 3;
            Event::CData {
                content: &self.text[body..end],
                start,
            }
        } else if rest.starts_with("<!DOCTYPE") {
            self.read_doctype(start)?
        } else if rest.starts_with("<!") {
            return Err(self.error("unrecognized markup declaration", start));
        } else if rest.starts_with("</") {
            self.read_end_tag(start)?
        } else {
            Event::StartTag(self.read_start_tag(start)?)
        };
        Ok(Some(event))
    }

    fn read_text(&mut self) -> Result<Event<'a>> {
        let start = self.pos;
        let end = memchr(b'<', &self.bytes[start..]).map_or(self.bytes.len(), |i| start + i);
        let text = &self.text[start..end];
        self.pos = end;

        if self.open.is_empty() {
            if let Some(i) = text.bytes().position(|b| !is_space(b)) {
                return Err(self.error("data at the root level is invalid", start + i));
            }
        } else {
            if let Some(i) = memmem::find(text.as_bytes(), b"]]>") {
                return Err(self.error("']]>' is not allowed in content", start + i));
            }
            self.check_references(text, start)?;
        }
        Ok(Event::Text { text, start })
    }

    fn read_doctype(&mut self, start: usize) -> Result<Event<'a>> {
        if !self.open.is_empty() || self.root_closed {
            return Err(self.error("DOCTYPE must precede the root element", start));
        }
        let mut depth = 0usize;
        let mut pos = start + 2;
        while pos < self.bytes.len() {
            match self.bytes[pos] {
                b'[' => depth += 1,
                b']' => depth = depth.saturating_sub(1),
                b'>' if depth == 0 => {
                    self.pos = pos + 1;
                    return Ok(Event::Doctype { start });
                }
                _ => {}
            }
            pos += 1;
        }
        Err(self.error("DOCTYPE declaration is not terminated", start))
    }

    fn read_name(&mut self) -> Option<&'a str> {
        let start = self.pos;
        let mut chars = self.text[start..].char_indices();
        match chars.next() {
            Some((_, c)) if is_name_start(c) => {}
            _ => return None,
        }
        let len = chars
            .find(|&(_, c)| !is_name_char(c))
            .map_or(self.text.len() - start, |(i, _)| i);
        self.pos = start + len;
        Some(&self.text[start..start + len])
    }

    fn skip_space(&mut self) -> bool {
        let before = self.pos;
        while self.pos < self.bytes.len() && is_space(self.bytes[self.pos]) {
            self.pos += 1;
        }
        self.pos > before
    }

    fn read_end_tag(&mut self, start: usize) -> Result<Event<'a>> {
        self.pos = start + 2;
        let name = self
            .read_name()
            .ok_or_else(|| self.error("expected an element name in end tag", self.pos))?;
        self.skip_space();
        if self.bytes.get(self.pos) != Some(&b'>') {
            return Err(self.error(format!("end tag '{name}' is not closed"), self.pos));
        }
        self.pos += 1;

        match self.open.pop() {
            Some((open, _)) if open == name => {}
            Some((open, _)) => {
                return Err(self.error(
                    format!("end tag '{name}' does not match start tag '{open}'"),
                    start,
                ))
            }
            None => return Err(self.error(format!("unexpected end tag '{name}'"), start)),
        }
        if self.open.is_empty() {
            self.root_closed = true;
        }
        Ok(Event::EndTag {
            name,
            start,
            end: self.pos,
            depth: self.open.len(),
        })
    }

    fn read_start_tag(&mut self, start: usize) -> Result<StartTag<'a>> {
        if self.root_closed {
            return Err(self.error("only one root element is allowed", start));
        }
        self.pos = start + 1;
        let name = self
            .read_name()
            .ok_or_else(|| self.error("expected an element name", self.pos))?;

        let mut attributes: Vec<Attribute<'a>> = Vec::new();
        loop {
            let spaced = self.skip_space();
            match self.bytes.get(self.pos) {
                None => {
                    return Err(self.error(format!("start tag '{name}' is not closed"), start))
                }
                Some(b'>') => {
                    self.pos += 1;
                    break;
                }
                Some(b'/') => {
                    if self.bytes.get(self.pos + 1) != Some(&b'>') {
                        return Err(self.error("expected '>' after '/'", self.pos + 1));
                    }
                    self.pos += 2;
                    let tag = StartTag {
                        name,
                        start,
                        end: self.pos,
                        depth: self.open.len(),
                        self_closing: true,
                        attributes,
                    };
                    if self.open.is_empty() {
                        self.root_closed = true;
                    }
                    return Ok(tag);
                }
                _ if !spaced => {
                    return Err(self.error("expected whitespace between attributes", self.pos))
                }
                _ => {}
            }

            let attribute = self.read_attribute()?;
            if attributes.iter().any(|a| a.name == attribute.name) {
                return Err(self.error(
                    format!("duplicate attribute '{}'", attribute.name),
                    self.pos,
                ));
            }
            attributes.push(attribute);
        }

        let depth = self.open.len();
        self.open.push((name, start));
        Ok(StartTag {
            name,
            start,
            end: self.pos,
            depth,
            self_closing: false,
            attributes,
        })
    }

    fn read_attribute(&mut self) -> Result<Attribute<'a>> {
        let name = self
            .read_name()
            .ok_or_else(|| self.error("expected an attribute name", self.pos))?;
        self.skip_space();
        if self.bytes.get(self.pos) != Some(&b'=') {
            return Err(self.error(format!("expected '=' after attribute '{name}'"), self.pos));
        }
        self.pos += 1;
        self.skip_space();

        let quote = match self.bytes.get(self.pos) {
            Some(&q) if q == b'"' || q == b'\'' => q,
            _ => {
                return Err(self.error(
                    format!("expected a quoted value for attribute '{name}'"),
                    self.pos,
                ))
            }
        };
        let value_start = self.pos + 1;
        let value_end = memchr(quote, &self.bytes[value_start..])
            .map(|i| value_start + i)
            .ok_or_else(|| {
                self.error(format!("value of attribute '{name}' is not terminated"), self.pos)
            })?;
        let value = &self.text[value_start..value_end];
        if let Some(i) = memchr(b'<', value.as_bytes()) {
            return Err(self.error("'<' is not allowed in an attribute value", value_start + i));
        }
        self.check_references(value, value_start)?;
        self.pos = value_end + 1;
        Ok(Attribute { name, value })
    }

    fn check_references(&self, text: &str, base: usize) -> Result<()> {
        let bytes = text.as_bytes();
        let mut pos = 0;
        while let Some(i) = memchr(b'&', &bytes[pos..]) {
            let at = pos + i;
            let known = memchr(b';', &bytes[at..])
                .and_then(|semi| decode_entity(&text[at + 1..at + semi]).map(|_| semi));
            match known {
                Some(semi) => pos = at + semi + 1,
                None => return Err(self.error("reference to an undefined entity", base + at)),
            }
        }
        Ok(())
    }
}
