//! Finding a property of the root element.
//!
//! A property can be written in attribute syntax on the root start tag, or as
//! a property element directly under the root:
//!
//! ```xml
//! <Application StartupUri="MainWindow.xaml">
//! <Application>
//!     <Application.StartupUri>MainWindow.xaml</Application.StartupUri>
//! </Application>
//! ```
//!
//! The first occurrence in document order wins. The reader is used to reach
//! the root and to confirm the property exists; exact spans come from the
//! scanner.

use crate::entities::unescape;
use crate::error::{Error, Result};
use crate::reader::{Event, Reader, StartTag};
use crate::scanner;
use crate::source::SourceText;
use crate::span::{Location, Span};

/// How a located property is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertySyntax {
    /// `Name="value"` on the root start tag.
    Attribute {
        /// The original delimiter, `'` or `"`.
        quote: char,
    },
    /// `<Root.Name>value</Root.Name>` under the root.
    Element {
        /// Full element name, e.g. `Application.StartupUri`.
        name: String,
        /// Location of the element's opening `<`.
        start: Location,
        /// The element is written as `<Root.Name/>`.
        self_closing: bool,
    },
}

/// A property value found in the document.
///
/// Built fresh by every lookup; spans go stale after any edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyOccurrence {
    /// Exact source text, original line terminators included. Attribute
    /// values include their quotes; element values are the verbatim content
    /// between the tags.
    pub raw_text: String,
    /// `raw_text` with entities decoded and CDATA expanded. Line breaks read
    /// as `\n`. Element content is trimmed of surrounding whitespace.
    pub decoded_value: String,
    /// Bounds of `raw_text` in the buffer. Empty for a self-closed element,
    /// positioned at its `/>`.
    pub span: Span,
    /// Which syntax the property uses.
    pub syntax: PropertySyntax,
}

/// Result of a lookup: the root's position plus the property, if present.
#[derive(Debug, Clone)]
pub(crate) struct Lookup {
    /// Offset of the root start tag's `<`.
    pub root_start: usize,
    pub occurrence: Option<PropertyOccurrence>,
}

/// Check whether `candidate` names `property` on `root`, either bare or
/// qualified as `root.property`.
pub fn is_property_name(candidate: &str, root: &str, property: &str) -> bool {
    candidate == property
        || candidate
            .strip_prefix(root)
            .and_then(|rest| rest.strip_prefix('.'))
            == Some(property)
}

/// Advance `reader` to the root start tag, failing if the first element is
/// not named `root`.
pub(crate) fn read_root<'a>(reader: &mut Reader<'a>, root: &str) -> Result<StartTag<'a>> {
    loop {
        match reader.next_event()? {
            Some(Event::StartTag(tag)) if tag.name == root => return Ok(tag),
            Some(Event::StartTag(_)) | None => return Err(Error::missing_root(root)),
            Some(_) => {}
        }
    }
}

fn trim_markup_space(s: &str) -> &str {
    s.trim_matches(|c| matches!(c, ' ' | '\t' | '\n' | '\r'))
}

/// Locate `property` on the root element named `root`.
pub(crate) fn locate(source: &SourceText, root: &str, property: &str) -> Result<Lookup> {
    let mut reader = Reader::new(source);
    let root_tag = read_root(&mut reader, root)?;
    let root_start = root_tag.start;

    let wanted = |name: &str| is_property_name(name, root, property);
    if root_tag.attributes.iter().any(|a| wanted(a.name)) {
        let occurrence = attribute_occurrence(source, root_start, &wanted)?;
        return Ok(Lookup {
            root_start,
            occurrence: Some(occurrence),
        });
    }
    if root_tag.self_closing {
        return Ok(Lookup {
            root_start,
            occurrence: None,
        });
    }

    let element_name = format!("{root}.{property}");
    loop {
        match reader.next_event()? {
            Some(Event::StartTag(tag)) if tag.depth == 1 && tag.name == element_name => {
                let occurrence = element_occurrence(source, &mut reader, tag)?;
                return Ok(Lookup {
                    root_start,
                    occurrence: Some(occurrence),
                });
            }
            Some(Event::EndTag { depth: 0, .. }) | None => {
                return Ok(Lookup {
                    root_start,
                    occurrence: None,
                })
            }
            Some(_) => {}
        }
    }
}

fn attribute_occurrence<F>(
    source: &SourceText,
    root_start: usize,
    wanted: &F,
) -> Result<PropertyOccurrence>
where
    F: Fn(&str) -> bool,
{
    let attr = scanner::find_attribute(source, root_start, wanted)?.ok_or_else(|| {
        Error::malformed(
            "attribute reported by the reader was not found in the start tag",
            source.position(root_start),
        )
    })?;

    let text = source.text();
    let raw_text = source.slice(attr.value_start, attr.value_end);
    let decoded_value = unescape(&text[attr.inner()])?.into_owned();
    let quote = raw_text.chars().next().unwrap_or('"');

    tracing::trace!(raw = %raw_text, "property found in attribute syntax");
    Ok(PropertyOccurrence {
        raw_text: raw_text.into_owned(),
        decoded_value,
        span: source.span(attr.value_start, attr.value_end),
        syntax: PropertySyntax::Attribute { quote },
    })
}

fn element_occurrence(
    source: &SourceText,
    reader: &mut Reader<'_>,
    tag: StartTag<'_>,
) -> Result<PropertyOccurrence> {
    let name = tag.name.to_string();
    let start = source.location(tag.start);

    if tag.self_closing {
        let slash = tag.end - 2;
        return Ok(PropertyOccurrence {
            raw_text: String::new(),
            decoded_value: String::new(),
            span: Span::empty(source.location(slash)),
            syntax: PropertySyntax::Element {
                name,
                start,
                self_closing: true,
            },
        });
    }

    let content_start = tag.end;
    let mut decoded = String::new();
    let content_end = loop {
        match reader.next_event()? {
            Some(Event::Text { text, .. }) => decoded.push_str(&unescape(text)?),
            Some(Event::CData { content, .. }) => decoded.push_str(content),
            Some(Event::EndTag { start, depth: 1, .. }) => break start,
            Some(Event::StartTag(child)) => {
                return Err(Error::malformed(
                    format!("property element '{name}' cannot contain element '{}'", child.name),
                    source.position(child.start),
                ))
            }
            Some(_) => {}
            None => {
                return Err(Error::malformed(
                    format!("property element '{name}' is not closed"),
                    source.position(tag.start),
                ))
            }
        }
    };

    let raw_text = source.slice(content_start, content_end);
    tracing::trace!(raw = %raw_text, "property found in element syntax");
    Ok(PropertyOccurrence {
        raw_text: raw_text.into_owned(),
        decoded_value: trim_markup_space(&decoded).to_string(),
        span: source.span(content_start, content_end),
        syntax: PropertySyntax::Element {
            name,
            start,
            self_closing: false,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn source(text: &str) -> SourceText {
        SourceText::from_lines(text.split('\n'))
    }

    fn find(text: &str, property: &str) -> Result<Option<PropertyOccurrence>> {
        locate(&source(text), "Application", property).map(|l| l.occurrence)
    }

    #[test]
    fn property_name_forms() {
        assert!(is_property_name("StartupUri", "Application", "StartupUri"));
        assert!(is_property_name("Application.StartupUri", "Application", "StartupUri"));
        assert!(!is_property_name("Application2.StartupUri", "Application", "StartupUri"));
        assert!(!is_property_name("ApplicationStartupUri", "Application", "StartupUri"));
        assert!(!is_property_name("x:StartupUri", "Application", "StartupUri"));
    }

    #[test]
    fn attribute_span_includes_quotes() {
        let occ = find("<Application StartupUri='Main.xaml'/>", "StartupUri")
            .unwrap()
            .unwrap();
        assert_eq!(occ.raw_text, "'Main.xaml'");
        assert_eq!(occ.decoded_value, "Main.xaml");
        assert_eq!(occ.span.start, Location::new(0, 24));
        assert_eq!(occ.span.end, Location::new(0, 35));
        assert_eq!(occ.syntax, PropertySyntax::Attribute { quote: '\'' });
    }

    #[test]
    fn qualified_attribute_is_found() {
        let occ = find("<Application Application.StartupUri=\"a.xaml\"/>", "StartupUri")
            .unwrap()
            .unwrap();
        assert_eq!(occ.decoded_value, "a.xaml");
    }

    #[test]
    fn other_qualifier_is_ignored() {
        let occ = find("<Application Application2.StartupUri=\"a.xaml\"/>", "StartupUri").unwrap();
        assert!(occ.is_none());
    }

    #[test]
    fn bare_child_element_is_not_a_property() {
        let occ = find("<Application><StartupUri>a</StartupUri></Application>", "StartupUri")
            .unwrap();
        assert!(occ.is_none());
    }

    #[test]
    fn grandchild_property_element_is_ignored() {
        let text = "<Application><X><Application.StartupUri>a</Application.StartupUri></X></Application>";
        assert!(find(text, "StartupUri").unwrap().is_none());
    }

    #[test]
    fn element_raw_is_verbatim_and_decoded_is_trimmed() {
        let text = "<Application>\n  <Application.StartupUri>\n    a &amp; b\n  </Application.StartupUri>\n</Application>";
        let occ = find(text, "StartupUri").unwrap().unwrap();
        assert_eq!(occ.raw_text, "\n    a &amp; b\n  ");
        assert_eq!(occ.decoded_value, "a & b");
        assert_eq!(occ.span.start, Location::new(1, 26));
        assert_eq!(occ.span.end, Location::new(3, 2));
    }

    #[test]
    fn self_closed_element_is_empty() {
        let text = "<Application>\n<Application.StartupUri />\n</Application>";
        let occ = find(text, "StartupUri").unwrap().unwrap();
        assert_eq!(occ.raw_text, "");
        assert_eq!(occ.decoded_value, "");
        assert!(occ.span.is_empty());
        assert_eq!(occ.span.start, Location::new(1, 24));
    }

    #[test]
    fn comments_are_kept_raw_but_not_decoded() {
        let text = "<Application><Application.StartupUri>a<!-- b -->c</Application.StartupUri></Application>";
        let occ = find(text, "StartupUri").unwrap().unwrap();
        assert_eq!(occ.raw_text, "a<!-- b -->c");
        assert_eq!(occ.decoded_value, "ac");
    }

    #[test]
    fn child_element_in_property_is_malformed() {
        let text = "<Application><Application.StartupUri><A/></Application.StartupUri></Application>";
        let err = find(text, "StartupUri").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedMarkup);
    }

    #[test]
    fn wrong_root_is_missing_root() {
        let err = find("<!-- c -->\n<NotApplication/>", "StartupUri").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRootElement);
    }

    #[test]
    fn attribute_wins_over_element() {
        let text = "<Application StartupUri=\"attr\"><Application.StartupUri>elem</Application.StartupUri></Application>";
        let occ = find(text, "StartupUri").unwrap().unwrap();
        assert_eq!(occ.decoded_value, "attr");
    }
}
