//! appxaml CLI - Read, edit and validate application definition files
//!
//! Usage:
//!   appxaml [OPTIONS] <COMMAND>
//!
//! Commands:
//!   get       Print the value of a root-element property
//!   set       Set a root-element property, keeping all other text intact
//!   validate  Check the file for malformed markup and the expected root

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{bail, Context};
use appxaml_core::{
    Document, DocumentOptions, LineAddressedBuffer, Position, PropertySyntax, RopeBuffer,
    DEFAULT_ROOT_ELEMENT,
};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

const BOM: char = '\u{feff}';

#[derive(Parser)]
#[command(name = "appxaml")]
#[command(author, version, about, long_about = None)]
#[command(
    after_help = "EXAMPLES:\n    appxaml get App.xaml StartupUri\n    appxaml set App.xaml StartupUri Views/MainWindow.xaml\n    appxaml --json validate App.xaml"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Expected root element name
    #[arg(long, global = true, default_value = DEFAULT_ROOT_ELEMENT)]
    root_element: String,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    json: bool,

    /// Log edit decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the decoded value of a property
    Get {
        /// Application definition file
        file: PathBuf,
        /// Property name, e.g. StartupUri
        property: String,
    },
    /// Set a property in place
    Set {
        /// Application definition file
        file: PathBuf,
        /// Property name, e.g. StartupUri
        property: String,
        /// New value, unescaped
        value: String,
        /// Print the updated document instead of writing it
        #[arg(long)]
        dry_run: bool,
    },
    /// Check that the file is well-formed and has the expected root
    Validate {
        /// Application definition file
        file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("error: {:#}", e);
            process::exit(1);
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();
}

/// Runs the selected command. `Ok(false)` means the command completed but
/// the file failed validation.
fn run(cli: &Cli) -> anyhow::Result<bool> {
    let options = DocumentOptions::new().with_root_element(cli.root_element.as_str());
    match &cli.command {
        Commands::Get { file, property } => cmd_get(file, property, options, cli.json),
        Commands::Set {
            file,
            property,
            value,
            dry_run,
        } => cmd_set(file, property, value, options, *dry_run),
        Commands::Validate { file } => cmd_validate(file, options, cli.json),
    }
}

// ============================================================================
// File I/O
// ============================================================================

/// File contents with any byte order mark split off.
struct LoadedFile {
    bom: bool,
    buffer: RopeBuffer,
}

fn load(path: &Path) -> anyhow::Result<LoadedFile> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read '{}'", path.display()))?;
    let (bom, body) = match text.strip_prefix(BOM) {
        Some(rest) => (true, rest),
        None => (false, text.as_str()),
    };
    tracing::debug!(path = %path.display(), bytes = body.len(), bom, "loaded file");
    Ok(LoadedFile {
        bom,
        buffer: RopeBuffer::from(body),
    })
}

fn render(file: &LoadedFile) -> String {
    let mut out = String::new();
    if file.bom {
        out.push(BOM);
    }
    out.push_str(&file.buffer.snapshot());
    out
}

// ============================================================================
// Get Command
// ============================================================================

#[derive(Serialize)]
struct JsonLocation {
    line: usize,
    column: usize,
}

impl From<Position> for JsonLocation {
    fn from(position: Position) -> Self {
        Self {
            line: position.line,
            column: position.column,
        }
    }
}

#[derive(Serialize)]
struct JsonSpan {
    start: JsonLocation,
    end: JsonLocation,
}

#[derive(Serialize)]
struct GetOutput<'a> {
    property: &'a str,
    found: bool,
    value: Option<String>,
    raw: Option<String>,
    syntax: Option<&'static str>,
    span: Option<JsonSpan>,
}

fn cmd_get(
    path: &Path,
    property: &str,
    options: DocumentOptions,
    json: bool,
) -> anyhow::Result<bool> {
    let mut file = load(path)?;
    let doc = Document::with_options(&mut file.buffer, options);
    let occurrence = doc
        .find_property(property)
        .with_context(|| format!("failed to read '{}'", path.display()))?;

    if json {
        let output = match occurrence {
            Some(occ) => GetOutput {
                property,
                found: true,
                syntax: Some(match occ.syntax {
                    PropertySyntax::Attribute { .. } => "attribute",
                    PropertySyntax::Element { .. } => "element",
                }),
                span: Some(JsonSpan {
                    start: occ.span.start.position().into(),
                    end: occ.span.end.position().into(),
                }),
                value: Some(occ.decoded_value),
                raw: Some(occ.raw_text),
            },
            None => GetOutput {
                property,
                found: false,
                value: None,
                raw: None,
                syntax: None,
                span: None,
            },
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if let Some(occ) = occurrence {
        println!("{}", occ.decoded_value);
    }

    Ok(true)
}

// ============================================================================
// Set Command
// ============================================================================

fn cmd_set(
    path: &Path,
    property: &str,
    value: &str,
    options: DocumentOptions,
    dry_run: bool,
) -> anyhow::Result<bool> {
    if property.is_empty() {
        bail!("property name must not be empty");
    }

    let mut file = load(path)?;
    let before = file.buffer.snapshot();
    Document::with_options(&mut file.buffer, options)
        .set_property(property, value)
        .with_context(|| format!("failed to set {} in '{}'", property, path.display()))?;

    if dry_run {
        print!("{}", render(&file));
        return Ok(true);
    }

    if file.buffer.snapshot() == before {
        tracing::debug!(path = %path.display(), "no change; file not written");
        return Ok(true);
    }

    fs::write(path, render(&file))
        .with_context(|| format!("failed to write '{}'", path.display()))?;
    tracing::debug!(path = %path.display(), "file updated");
    Ok(true)
}

// ============================================================================
// Validate Command
// ============================================================================

#[derive(Serialize)]
struct ValidateOutput {
    valid: bool,
    error: Option<String>,
}

fn cmd_validate(path: &Path, options: DocumentOptions, json: bool) -> anyhow::Result<bool> {
    let mut file = load(path)?;
    let doc = Document::with_options(&mut file.buffer, options);
    let result = doc.verify_valid();

    if json {
        let output = ValidateOutput {
            valid: result.is_ok(),
            error: result.as_ref().err().map(|e| e.to_string()),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        match &result {
            Ok(()) => println!("Valid"),
            Err(e) => eprintln!("{}: {}", path.display(), e),
        }
    }

    Ok(result.is_ok())
}
