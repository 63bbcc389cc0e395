//! # md2pdf
//!
//! Convert Markdown documents to paginated, styled PDF.
//!
//! The Markdown is rendered to a self-contained HTML page (syntax-highlighted
//! code, heading anchors, a cover page and a table of contents) and printed to
//! PDF by headless Chrome. An optional standalone cover is printed separately
//! and merged in front of the content.
//!
//! ## Pipeline Overview
//!
//! ```text
//! Markdown
//!  │
//!  ├─ 1. Input      normalise line endings, read from disk
//!  ├─ 2. Style      theme → stylesheet (fonts, prose, highlight CSS)
//!  ├─ 3. Transform  pulldown-cmark → blocks, syntect highlighting, slugs
//!  ├─ 4. Compose    cover / TOC / page breaks → one HTML document
//!  ├─ 5. Print      headless Chrome, spawn_blocking, wait for network idle
//!  ├─ 6. Merge      separate cover + content via lopdf (optional)
//!  └─ 7. Output     PDF bytes + stats, or a file on disk
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use md2pdf::{convert_file, ConversionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::default();
//!     let stats = convert_file("notes.md", "notes.pdf", "Notes", "Week 12", &config).await?;
//!     eprintln!("{} pages, {} bytes", stats.page_count, stats.pdf_bytes);
//!     Ok(())
//! }
//! ```
//!
//! ## Document Markers
//!
//! A top-level HTML comment on its own places a layout block:
//!
//! | Marker | Effect |
//! |--------|--------|
//! | `<!-- cover -->` | cover page here instead of at the start |
//! | `<!-- toc -->` | table of contents here instead of after the cover |
//! | `<!-- pagebreak -->` | force a page break |
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `md2pdf` binary (clap + anyhow + indicatif + tracing-subscriber) |
//! | `fetch` | off     | Lets headless_chrome download a Chromium build when none is installed |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! md2pdf = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod templates;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, CoverMode, Margins, PaperSize};
pub use convert::{compose, convert, convert_file, convert_sync, convert_to_file};
pub use error::{Md2PdfError, TransformWarning};
pub use output::{ComposedDocument, ConversionOutput, ConversionStats};
pub use pipeline::input::DocumentRequest;
pub use pipeline::print::{ChromePrinter, PdfPrinter, PrintJob};
pub use pipeline::style::Theme;
pub use pipeline::toc::TocEntry;
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback, Stage};
