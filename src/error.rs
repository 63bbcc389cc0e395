//! Error types for the md2pdf library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Md2PdfError`] is **fatal**: the run cannot produce a PDF at all
//!   (missing input, malformed theme, browser launch or print failure, bad
//!   intermediate PDF). Returned as `Err(Md2PdfError)` from the top-level
//!   `convert*` functions; no output file is written.
//!
//! * [`TransformWarning`] is **non-fatal**: a fragment of the Markdown could not
//!   be rendered the way it asked to be (unknown code language, highlighter
//!   fault). The fragment is rendered as plain literal text and the warning is
//!   stored in [`crate::output::ConversionOutput::warnings`].

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the md2pdf library.
#[derive(Debug, Error)]
pub enum Md2PdfError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input file exists but is not valid UTF-8 text.
    #[error("Input '{path}' is not valid UTF-8 text")]
    InvalidEncoding { path: PathBuf },

    /// Any other I/O failure while reading the input.
    #[error("Failed to read '{path}': {source}")]
    InputReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Style errors ──────────────────────────────────────────────────────
    /// The theme file could not be parsed, or a field failed validation.
    #[error("Invalid theme configuration: {0}")]
    InvalidTheme(String),

    /// The theme names a syntax-highlighting theme that is not bundled.
    #[error("Unknown highlight theme '{name}'. Available: {available}")]
    UnknownHighlightTheme { name: String, available: String },

    /// Generating CSS for the highlight theme failed.
    #[error("Failed to build stylesheet: {0}")]
    StylesheetFailed(String),

    // ── Rendering engine errors ───────────────────────────────────────────
    /// Chrome/Chromium could not be launched or connected to.
    #[error(
        "Failed to launch headless browser: {0}\n\n\
A Chrome or Chromium installation is required. You can:\n\
  • Install Chrome/Chromium so it is found on PATH.\n\
  • Point at an existing binary with --chrome /path/to/chrome (or CHROME=...).\n\
  • Build with `--features fetch` to download Chromium automatically.\n"
    )]
    BrowserLaunch(String),

    /// The browser started, but opening or navigating the page failed.
    #[error("Browser session failed: {0}")]
    BrowserSession(String),

    /// The page kept fetching resources past the configured limit.
    #[error("Page did not reach network idle within {secs}s\nIncrease --idle-timeout or check font/stylesheet URLs.")]
    NetworkIdleTimeout { secs: u64 },

    /// The browser's print-to-PDF call failed.
    #[error("Print to PDF failed: {0}")]
    PrintFailed(String),

    /// The printer returned bytes that are not a PDF document.
    #[error("Renderer produced invalid PDF output (first bytes: {magic:?})")]
    InvalidPdfOutput { magic: Vec<u8> },

    // ── Merge errors ──────────────────────────────────────────────────────
    /// One of the intermediate PDFs could not be parsed or combined.
    #[error("Failed to merge PDF #{index}: {detail}")]
    MergeFailed { index: usize, detail: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not remove the pre-existing output file.
    #[error("Failed to remove existing output file '{path}': {source}")]
    OutputRemoveFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or write the output PDF file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Md2PdfError {
    /// `true` for failures of the headless browser collaborator.
    pub fn is_rendering_error(&self) -> bool {
        matches!(
            self,
            Md2PdfError::BrowserLaunch(_)
                | Md2PdfError::BrowserSession(_)
                | Md2PdfError::NetworkIdleTimeout { .. }
                | Md2PdfError::PrintFailed(_)
                | Md2PdfError::InvalidPdfOutput { .. }
        )
    }
}

/// A non-fatal problem with a single Markdown fragment.
///
/// The offending fragment is still rendered (as un-highlighted literal text),
/// so a warning never changes whether a PDF is produced.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum TransformWarning {
    /// A fenced code block declared a language the highlighter does not know.
    #[error("Unknown code block language '{language}'; rendered as plain text")]
    UnknownLanguage { language: String },

    /// The highlighter failed part-way through a code block.
    #[error("Highlighting failed for '{language}' block: {detail}")]
    HighlightFailed { language: String, detail: String },
}
