use crate::span::{Position, Span};
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Error kinds for categorizing failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The text is not well-formed markup
    MalformedMarkup,
    /// Well-formed markup without the expected root element
    MissingRootElement,
    /// A buffer splice addressed text outside the buffer
    InvalidSpan,
}

/// Errors raised while reading or editing an application document.
///
/// A missing property is not an error; lookups return `Ok(None)` for that.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("{message} near {position}.")]
    /// The markup could not be scanned. Always carries a location.
    MalformedMarkup {
        /// Human-readable description of the problem.
        message: String,
        /// 1-based location of the problem.
        position: Position,
    },

    #[error("Could not find the expected root element \"{root}\" in the application definition file.")]
    /// No `root` element appears before the first other element.
    MissingRootElement {
        /// The root element name that was expected.
        root: String,
    },

    #[error("span {}:{}..{}:{} is outside the buffer", .span.start.line_index, .span.start.char_index, .span.end.line_index, .span.end.char_index)]
    /// A replacement span does not address existing buffer text.
    InvalidSpan {
        /// The offending span.
        span: Span,
    },
}

impl Error {
    /// Create a malformed-markup error.
    pub fn malformed(message: impl Into<String>, position: Position) -> Self {
        Self::MalformedMarkup {
            message: message.into(),
            position,
        }
    }

    /// Create an error for a document without the expected root element.
    pub fn missing_root(root: impl Into<String>) -> Self {
        Self::MissingRootElement { root: root.into() }
    }

    /// Create an error for a span outside the buffer.
    pub fn invalid_span(span: Span) -> Self {
        Self::InvalidSpan { span }
    }

    /// Get the error category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedMarkup { .. } => ErrorKind::MalformedMarkup,
            Self::MissingRootElement { .. } => ErrorKind::MissingRootElement,
            Self::InvalidSpan { .. } => ErrorKind::InvalidSpan,
        }
    }

    /// The 1-based location of the error, when one is known.
    pub fn position(&self) -> Option<Position> {
        match self {
            Self::MalformedMarkup { position, .. } => Some(*position),
            _ => None,
        }
    }
}
