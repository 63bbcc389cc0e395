//! Result types returned by the conversion entry points.

use crate::error::TransformWarning;
use crate::pipeline::toc::TocEntry;
use serde::Serialize;

/// HTML produced by the compose stage, before any browser is involved.
#[derive(Debug, Clone, Serialize)]
pub struct ComposedDocument {
    /// The content document: stylesheet, optional cover, TOC and body.
    pub html: String,
    /// The standalone cover document (separate-cover mode only).
    pub cover_html: Option<String>,
    /// Every heading in document order, with its anchor id.
    pub headings: Vec<TocEntry>,
    /// Non-fatal problems found while transforming the Markdown.
    pub warnings: Vec<TransformWarning>,
    /// Number of fenced/indented code blocks in the document.
    pub code_blocks: usize,
}

/// Complete result of a conversion.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionOutput {
    /// The final PDF bytes (starts with `%PDF`).
    #[serde(skip)]
    pub pdf: Vec<u8>,
    /// The composed content HTML that was printed.
    pub html: String,
    /// The composed cover HTML, when printed separately.
    pub cover_html: Option<String>,
    /// Every heading in document order, with its anchor id.
    pub headings: Vec<TocEntry>,
    /// Non-fatal transform warnings.
    pub warnings: Vec<TransformWarning>,
    /// Timing and size statistics.
    pub stats: ConversionStats,
}

/// Statistics for a single conversion run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversionStats {
    /// Pages in the final PDF.
    pub page_count: usize,
    /// Size of the final PDF in bytes.
    pub pdf_bytes: usize,
    /// Headings found in the source.
    pub heading_count: usize,
    /// Code blocks found in the source.
    pub code_block_count: usize,
    /// Non-fatal transform warnings.
    pub warning_count: usize,
    /// Time spent building the stylesheet, transforming and composing.
    pub compose_duration_ms: u64,
    /// Time spent in the headless browser (all documents).
    pub print_duration_ms: u64,
    /// Time spent merging PDFs (zero unless the cover is separate).
    pub merge_duration_ms: u64,
    /// Wall-clock time for the whole run.
    pub total_duration_ms: u64,
}
