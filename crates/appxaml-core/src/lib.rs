//! # appxaml Core
//!
//! A format-preserving editor for the properties of an application
//! definition file (`App.xaml`).
//!
//! Properties of the root `Application` element can be written as attributes
//! or as property elements. This crate finds them, decodes them, and rewrites
//! them with a single splice that leaves every other character of the file
//! alone: indentation, quote style, comments and line endings all survive.
//!
//! ## Quick Start
//!
//! ```rust
//! use appxaml_core::{Document, RopeBuffer};
//!
//! let input = "<Application x:Class=\"App\"\n             StartupUri='MainWindow.xaml'>\n</Application>\n";
//! let mut buffer = RopeBuffer::from(input);
//! let mut doc = Document::new(&mut buffer);
//!
//! assert_eq!(doc.startup_uri().unwrap().as_deref(), Some("MainWindow.xaml"));
//! doc.set_startup_uri("Views/Shell.xaml").unwrap();
//!
//! assert_eq!(
//!     buffer.to_string(),
//!     "<Application x:Class=\"App\"\n             StartupUri=\"Views/Shell.xaml\">\n</Application>\n"
//! );
//! ```
//!
//! ## Errors
//!
//! A missing property is `Ok(None)`. Malformed markup and a missing root
//! element are errors, and a failed call never modifies the buffer:
//!
//! ```rust
//! use appxaml_core::{Document, ErrorKind, RopeBuffer};
//!
//! let mut buffer = RopeBuffer::from("<NotApplication/>");
//! let doc = Document::new(&mut buffer);
//! assert_eq!(doc.verify_valid().unwrap_err().kind(), ErrorKind::MissingRootElement);
//! ```

pub mod buffer;
pub mod document;
pub mod editor;
pub mod entities;
pub mod error;
pub mod locator;
pub mod properties;
pub mod reader;
pub mod scanner;
pub mod source;
pub mod span;

pub use buffer::{LineAddressedBuffer, LineEnding, RopeBuffer};
pub use document::{Document, DocumentOptions, DEFAULT_ROOT_ELEMENT};
pub use entities::{escape, unescape};
pub use error::{Error, ErrorKind, Result};
pub use locator::{PropertyOccurrence, PropertySyntax};
pub use properties::{ShutdownMode, SHUTDOWN_MODE, STARTUP_URI};
pub use span::{Location, Position, Span};
