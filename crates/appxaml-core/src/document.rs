//! The application document: reads and writes root-element properties in a
//! buffer without disturbing anything else in it.
//!
//! A `Document` keeps nothing but the buffer reference and its options.
//! Every call snapshots the buffer, re-scans it, and performs at most one
//! `replace_span`, so edits made by others between calls are always seen.

use crate::buffer::LineAddressedBuffer;
use crate::editor::{self, Edit};
use crate::error::{Error, Result};
use crate::locator::{self, PropertyOccurrence};
use crate::properties::{ShutdownMode, SHUTDOWN_MODE, STARTUP_URI};
use crate::reader::{Event, Reader};
use crate::source::SourceText;
use crate::span::Location;

/// Name of the root element of an application definition.
pub const DEFAULT_ROOT_ELEMENT: &str = "Application";

/// Settings for a [`Document`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentOptions {
    /// Expected root element name. Property elements are named
    /// `<root_element>.<Property>`.
    pub root_element: String,
}

impl Default for DocumentOptions {
    fn default() -> Self {
        Self {
            root_element: DEFAULT_ROOT_ELEMENT.to_string(),
        }
    }
}

impl DocumentOptions {
    /// Create options with the default root element.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different root element name.
    pub fn with_root_element(mut self, name: impl Into<String>) -> Self {
        self.root_element = name.into();
        self
    }
}

/// An application definition bound to a buffer.
///
/// # Example
///
/// ```rust
/// use appxaml_core::{Document, RopeBuffer};
///
/// let mut buffer = RopeBuffer::from("<Application StartupUri='Main.xaml' />");
/// let mut doc = Document::new(&mut buffer);
///
/// assert_eq!(doc.property_value("StartupUri").unwrap().as_deref(), Some("Main.xaml"));
/// doc.set_property("StartupUri", "Other.xaml").unwrap();
/// assert_eq!(buffer.to_string(), "<Application StartupUri=\"Other.xaml\" />");
/// ```
pub struct Document<'b, B: LineAddressedBuffer + ?Sized> {
    buffer: &'b mut B,
    options: DocumentOptions,
}

impl<'b, B: LineAddressedBuffer + ?Sized> Document<'b, B> {
    /// Bind a document to `buffer` with default options.
    pub fn new(buffer: &'b mut B) -> Self {
        Self::with_options(buffer, DocumentOptions::default())
    }

    /// Bind a document to `buffer`.
    pub fn with_options(buffer: &'b mut B, options: DocumentOptions) -> Self {
        Self { buffer, options }
    }

    /// The options in use.
    pub fn options(&self) -> &DocumentOptions {
        &self.options
    }

    /// The underlying buffer.
    pub fn buffer(&self) -> &B {
        &*self.buffer
    }

    fn snapshot(&self) -> SourceText {
        SourceText::capture(&*self.buffer)
    }

    fn apply(&mut self, source: &SourceText, edit: Edit) -> Result<()> {
        if edit.is_noop(source) {
            tracing::debug!("edit leaves the buffer unchanged; skipping");
            return Ok(());
        }
        tracing::debug!(
            line = edit.span.start.line_index,
            column = edit.span.start.char_index,
            len = edit.text.len(),
            "applying edit"
        );
        self.buffer.replace_span(edit.span, &edit.text)
    }

    /// Check that the whole document is well-formed and that its first
    /// element is the expected root.
    pub fn verify_valid(&self) -> Result<()> {
        let source = self.snapshot();
        let mut reader = Reader::new(&source);
        let mut root = None;
        while let Some(event) = reader.next_event()? {
            if let Event::StartTag(tag) = event {
                root.get_or_insert(tag.name);
            }
        }
        match root {
            Some(name) if name == self.options.root_element => Ok(()),
            _ => Err(Error::missing_root(&self.options.root_element)),
        }
    }

    /// Find a property of the root element in attribute or property-element
    /// syntax. Returns `Ok(None)` when it is written in neither.
    ///
    /// Markup after the property is not read.
    pub fn find_property(&self, name: &str) -> Result<Option<PropertyOccurrence>> {
        let source = self.snapshot();
        Ok(locator::locate(&source, &self.options.root_element, name)?.occurrence)
    }

    /// The decoded value of a property, if present.
    pub fn property_value(&self, name: &str) -> Result<Option<String>> {
        Ok(self.find_property(name)?.map(|p| p.decoded_value))
    }

    /// Set a property, keeping all other text intact.
    ///
    /// An existing value is replaced in place; an absent property is added
    /// as an attribute of the root start tag. Setting an absent property to
    /// the empty string changes nothing.
    ///
    /// Only the markup up to the property is checked. An existing attribute
    /// is rewritten even if the document is malformed further on, while an
    /// insertion reads the whole root element first and fails on the same
    /// document. Call [`verify_valid`](Self::verify_valid) first to reject
    /// malformed documents before any edit.
    pub fn set_property(&mut self, name: &str, value: &str) -> Result<()> {
        let source = self.snapshot();
        let lookup = locator::locate(&source, &self.options.root_element, name)?;
        let edit = match lookup.occurrence {
            Some(occurrence) => editor::plan_value_edit(&source, &occurrence, value)?,
            None if value.is_empty() => {
                tracing::debug!(property = name, "absent property set to empty; nothing to do");
                return Ok(());
            }
            None => editor::plan_insertion(&source, lookup.root_start, name, value)?,
        };
        tracing::debug!(property = name, "setting property");
        self.apply(&source, edit)
    }

    /// Rewrite the element whose start tag begins at `location` from
    /// `<element/>` to `<element></element>`. Does nothing if the element
    /// already has an end tag.
    pub fn ensure_start_and_end_tags(
        &mut self,
        location: Location,
        element: &str,
    ) -> Result<()> {
        let source = self.snapshot();
        match editor::plan_start_and_end_tags(&source, location, element)? {
            Some(edit) => self.apply(&source, edit),
            None => Ok(()),
        }
    }

    /// The `StartupUri` property.
    pub fn startup_uri(&self) -> Result<Option<String>> {
        self.property_value(STARTUP_URI)
    }

    /// Set the `StartupUri` property.
    pub fn set_startup_uri(&mut self, uri: &str) -> Result<()> {
        self.set_property(STARTUP_URI, uri)
    }

    /// The `ShutdownMode` property. Absent or empty values are `None`.
    pub fn shutdown_mode(&self) -> Result<Option<ShutdownMode>> {
        let Some(occurrence) = self.find_property(SHUTDOWN_MODE)? else {
            return Ok(None);
        };
        if occurrence.decoded_value.trim().is_empty() {
            return Ok(None);
        }
        occurrence
            .decoded_value
            .parse::<ShutdownMode>()
            .map(Some)
            .map_err(|err| Error::malformed(err.to_string(), occurrence.span.start.position()))
    }

    /// Set the `ShutdownMode` property.
    pub fn set_shutdown_mode(&mut self, mode: ShutdownMode) -> Result<()> {
        self.set_property(SHUTDOWN_MODE, mode.as_str())
    }
}
