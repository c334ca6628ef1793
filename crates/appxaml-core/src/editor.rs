//! Planning format-preserving splices.
//!
//! Every function here is pure: it reads a [`SourceText`] and returns the
//! single [`Edit`] that performs the change. The document applies it with one
//! `replace_span` call, so a failure while planning never touches the buffer.

use crate::entities::escape;
use crate::error::{Error, Result};
use crate::locator::{PropertyOccurrence, PropertySyntax};
use crate::scanner::find_closing_bracket;
use crate::source::SourceText;
use crate::span::{Location, Span};

/// One atomic replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    /// Text to replace.
    pub span: Span,
    /// Replacement text.
    pub text: String,
}

impl Edit {
    /// Check whether applying this edit would leave `source` unchanged.
    pub fn is_noop(&self, source: &SourceText) -> bool {
        match (source.offset(self.span.start), source.offset(self.span.end)) {
            (Some(start), Some(end)) => source.slice(start, end) == self.text.as_str(),
            _ => false,
        }
    }
}

/// Offset of the `/` when the start tag at `start` is self-closed.
fn self_closing_slash(
    source: &SourceText,
    start: Location,
    element: &str,
) -> Result<Option<usize>> {
    let not_closed = || {
        Error::malformed(
            format!("start tag of element '{element}' is not closed"),
            start.position(),
        )
    };
    let offset = source.offset(start).ok_or_else(not_closed)?;
    let close = find_closing_bracket(source.text(), offset).ok_or_else(not_closed)?;
    Ok((source.text().as_bytes()[close] == b'/').then_some(close))
}

/// Plan the rewrite of a self-closed `<element/>` into `<element></element>`.
///
/// Returns `None` when the tag already has a separate end tag.
pub fn plan_start_and_end_tags(
    source: &SourceText,
    start: Location,
    element: &str,
) -> Result<Option<Edit>> {
    Ok(self_closing_slash(source, start, element)?.map(|slash| Edit {
        span: source.span(slash, slash + 2),
        text: format!("></{element}>"),
    }))
}

/// Plan replacing an existing property's value with `value`.
///
/// Attribute values are re-quoted with `"`. Element content becomes a single
/// line; a self-closed element gains an end tag in the same splice.
pub fn plan_value_edit(
    source: &SourceText,
    occurrence: &PropertyOccurrence,
    value: &str,
) -> Result<Edit> {
    let escaped = escape(value);
    let edit = match &occurrence.syntax {
        PropertySyntax::Attribute { .. } => Edit {
            span: occurrence.span,
            text: format!("\"{escaped}\""),
        },
        PropertySyntax::Element {
            name,
            start,
            self_closing: true,
        } => match plan_start_and_end_tags(source, *start, name)? {
            Some(mut edit) => {
                edit.text.insert_str(1, &escaped);
                edit
            }
            None => Edit {
                span: occurrence.span,
                text: escaped.into_owned(),
            },
        },
        PropertySyntax::Element { .. } => Edit {
            span: occurrence.span,
            text: escaped.into_owned(),
        },
    };
    Ok(edit)
}

fn leading_space(line: &str) -> &str {
    &line[..line.len() - line.trim_start_matches([' ', '\t']).len()]
}

/// Plan inserting `name="value"` on the root start tag beginning at
/// `root_start`.
///
/// When the tag's closing bracket sits alone on its line, the attribute gets
/// its own line indented like the last attribute line. Otherwise it is added
/// inline after the last attribute, separated by one space.
pub fn plan_insertion(
    source: &SourceText,
    root_start: usize,
    name: &str,
    value: &str,
) -> Result<Edit> {
    let root = source.location(root_start);
    let close = find_closing_bracket(source.text(), root_start).ok_or_else(|| {
        Error::malformed("start tag of the root element is not closed", root.position())
    })?;
    let close_at = source.location(close);
    let attribute = format!("{name}=\"{}\"", escape(value));

    let line_start = source.line_start(close_at.line_index);
    let before_close = &source.text()[line_start..close];

    if close_at.line_index > root.line_index && before_close.trim().is_empty() {
        let indent_line = (root.line_index..close_at.line_index)
            .rev()
            .map(|i| source.line(i))
            .find(|line| !line.trim().is_empty())
            .unwrap_or_default();
        let text = format!(
            "{}{attribute}{}",
            leading_space(indent_line),
            source.line_ending().as_str()
        );
        tracing::debug!(line = close_at.line_index, "inserting attribute on its own line");
        return Ok(Edit {
            span: Span::empty(Location::new(close_at.line_index, 0)),
            text,
        });
    }

    let at = line_start + before_close.trim_end_matches([' ', '\t']).len();
    tracing::debug!(line = close_at.line_index, "inserting attribute inline");
    Ok(Edit {
        span: Span::empty(source.location(at)),
        text: format!(" {attribute}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::locate;

    fn source(text: &str) -> SourceText {
        SourceText::from_lines(text.split('\n'))
    }

    fn apply(text: &str, edit: &Edit) -> String {
        let src = source(text);
        let start = src.offset(edit.span.start).unwrap();
        let end = src.offset(edit.span.end).unwrap();
        format!("{}{}{}", &text[..start], edit.text, &text[end..])
    }

    fn set(text: &str, property: &str, value: &str) -> String {
        let src = source(text);
        let lookup = locate(&src, "Application", property).unwrap();
        let edit = match lookup.occurrence {
            Some(occ) => plan_value_edit(&src, &occ, value).unwrap(),
            None => plan_insertion(&src, lookup.root_start, property, value).unwrap(),
        };
        apply(text, &edit)
    }

    #[test]
    fn attribute_value_is_requoted() {
        assert_eq!(
            set("<Application  StartupUri = 'a.xaml'  />", "StartupUri", "b&c"),
            "<Application  StartupUri = \"b&amp;c\"  />"
        );
    }

    #[test]
    fn element_content_collapses_to_one_line() {
        let text = "<Application>\n  <Application.StartupUri>\n    old\n  </Application.StartupUri>\n</Application>";
        assert_eq!(
            set(text, "StartupUri", "new"),
            "<Application>\n  <Application.StartupUri>new</Application.StartupUri>\n</Application>"
        );
    }

    #[test]
    fn self_closed_element_gains_end_tag_and_value() {
        let text = "<Application>\n  <Application.StartupUri />\n</Application>";
        assert_eq!(
            set(text, "StartupUri", "a<b"),
            "<Application>\n  <Application.StartupUri >a&lt;b</Application.StartupUri>\n</Application>"
        );
    }

    #[test]
    fn inline_insertion_after_last_attribute() {
        assert_eq!(
            set("<Application foo='blah' >\n</Application>", "StartupUri", "New.xaml"),
            "<Application foo='blah' StartupUri=\"New.xaml\" >\n</Application>"
        );
        assert_eq!(
            set("<Application/>", "StartupUri", "New.xaml"),
            "<Application StartupUri=\"New.xaml\"/>"
        );
    }

    #[test]
    fn multiline_insertion_matches_indentation() {
        let text = "<Application\n    x:Class=\"App\"\n    foo='blah'\n    >\n</Application>";
        assert_eq!(
            set(text, "StartupUri", "New.xaml"),
            "<Application\n    x:Class=\"App\"\n    foo='blah'\n    StartupUri=\"New.xaml\"\n    >\n</Application>"
        );
    }

    #[test]
    fn ensure_is_noop_for_explicit_end_tag() {
        let src = source("<Application.StartupUri a='/>'></Application.StartupUri>");
        let edit = plan_start_and_end_tags(&src, Location::new(0, 0), "Application.StartupUri").unwrap();
        assert_eq!(edit, None);
    }

    #[test]
    fn ensure_reports_start_location_when_unclosed() {
        let src = source("<Application>\n  <Application.StartupUri a='x");
        let err = plan_start_and_end_tags(&src, Location::new(1, 2), "Application.StartupUri").unwrap_err();
        let pos = err.position().unwrap();
        assert_eq!((pos.line, pos.column), (2, 3));
    }

    #[test]
    fn noop_detection() {
        let src = source("<Application StartupUri=\"a\"/>");
        let lookup = locate(&src, "Application", "StartupUri").unwrap();
        let edit = plan_value_edit(&src, &lookup.occurrence.unwrap(), "a").unwrap();
        assert!(edit.is_noop(&src));
    }
}
