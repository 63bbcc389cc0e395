//! Conversion entry points.
//!
//! [`compose`] stops after the HTML stage and never touches a browser.
//! [`convert`] runs the whole pipeline and returns the PDF in memory.
//! [`convert_to_file`] and [`convert_file`] add the filesystem on either end.
//!
//! Stages run strictly in sequence. In separate-cover mode the cover is
//! printed before the content and the two PDFs are merged. Every error is
//! fatal; nothing is written to disk unless a complete PDF was produced.

use crate::config::{ConversionConfig, CoverMode};
use crate::error::{Md2PdfError, TransformWarning};
use crate::output::{ComposedDocument, ConversionOutput, ConversionStats};
use crate::pipeline::compose::Composer;
use crate::pipeline::input::DocumentRequest;
use crate::pipeline::markdown::{transform, TransformOptions};
use crate::pipeline::merge::{merge_pdfs, page_count};
use crate::pipeline::print::{render_pdf, ChromePrinter, PdfPrinter, PrintJob};
use crate::pipeline::style::build_stylesheet;
use crate::progress::{ConversionProgressCallback, Stage};
use crate::templates::{footer_template, header_template};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Run the style, transform and compose stages only.
///
/// Returns the HTML that would be printed, plus the heading list and any
/// transform warnings.
///
/// # Errors
/// Only theme problems ([`Md2PdfError::InvalidTheme`],
/// [`Md2PdfError::UnknownHighlightTheme`], [`Md2PdfError::StylesheetFailed`]).
pub fn compose(
    request: &DocumentRequest,
    config: &ConversionConfig,
) -> Result<ComposedDocument, Md2PdfError> {
    compose_stages(request, config, &Progress::new(config))
}

/// Convert a document to PDF bytes.
///
/// # Errors
/// Any fatal error from the style, print or merge stages. See [`Md2PdfError`].
pub async fn convert(
    request: &DocumentRequest,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Md2PdfError> {
    let progress = Progress::new(config);
    let output = convert_inner(request, config, &progress).await?;
    progress.complete(&output.stats);
    Ok(output)
}

/// Convert a document and write the PDF to `output_path`.
///
/// An existing file at `output_path` is removed and replaced. Parent
/// directories are created as needed. If any stage fails, the destination is
/// left untouched.
pub async fn convert_to_file(
    request: &DocumentRequest,
    output_path: impl AsRef<Path>,
    config: &ConversionConfig,
) -> Result<ConversionStats, Md2PdfError> {
    let total_start = Instant::now();
    let path = output_path.as_ref();
    let progress = Progress::new(config);

    let mut output = convert_inner(request, config, &progress).await?;

    progress
        .stage_async(Stage::Write, write_output(path, &output.pdf))
        .await?;
    info!("Wrote {} bytes to {}", output.pdf.len(), path.display());

    output.stats.total_duration_ms = total_start.elapsed().as_millis() as u64;
    progress.complete(&output.stats);
    Ok(output.stats)
}

/// Read a Markdown file and write the PDF to `output_path`.
///
/// An empty `description` is treated as no description.
///
/// # Errors
/// [`Md2PdfError::FileNotFound`] when `input_path` does not exist (no output
/// is written), plus everything [`convert_to_file`] can return.
pub async fn convert_file(
    input_path: impl AsRef<Path>,
    output_path: impl AsRef<Path>,
    title: &str,
    description: &str,
    config: &ConversionConfig,
) -> Result<ConversionStats, Md2PdfError> {
    let request = DocumentRequest::from_file(input_path)
        .await?
        .with_title(title)
        .with_description(description);
    convert_to_file(&request, output_path, config).await
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    request: &DocumentRequest,
    config: &ConversionConfig,
) -> Result<ConversionOutput, Md2PdfError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Md2PdfError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(request, config))
}

// ── Internals ────────────────────────────────────────────────────────────

async fn convert_inner(
    request: &DocumentRequest,
    config: &ConversionConfig,
    progress: &Progress<'_>,
) -> Result<ConversionOutput, Md2PdfError> {
    let total_start = Instant::now();
    info!(
        "Starting conversion: {} bytes of Markdown, cover={:?}, toc={}",
        request.source.len(),
        config.cover,
        config.toc
    );

    // ── Step 1: Style, transform, compose ────────────────────────────────
    let compose_start = Instant::now();
    let composed = compose_stages(request, config, progress)?;
    let compose_duration_ms = compose_start.elapsed().as_millis() as u64;

    // ── Step 2: Print ────────────────────────────────────────────────────
    let printer = resolve_printer(config);
    let print_start = Instant::now();

    let cover_pdf = match &composed.cover_html {
        Some(cover_html) => {
            let job = PrintJob::new(cover_html.clone(), config);
            let pdf = progress
                .stage_async(Stage::PrintCover, render_pdf(Arc::clone(&printer), job))
                .await?;
            Some(pdf)
        }
        None => None,
    };

    let mut job = PrintJob::new(composed.html.clone(), config);
    if config.header_footer {
        job = job.with_header_footer(
            header_template(&request.title, &config.theme),
            footer_template(&config.theme),
        );
    }
    let content_pdf = progress
        .stage_async(Stage::PrintContent, render_pdf(printer, job))
        .await?;
    let print_duration_ms = print_start.elapsed().as_millis() as u64;

    // ── Step 3: Merge (separate cover only) ──────────────────────────────
    let merge_start = Instant::now();
    let (pdf, merge_duration_ms) = match cover_pdf {
        Some(cover) => {
            let merged = progress.stage(Stage::Merge, || merge_pdfs(&[cover, content_pdf]))?;
            (merged, merge_start.elapsed().as_millis() as u64)
        }
        None => (content_pdf, 0),
    };

    // ── Step 4: Stats ────────────────────────────────────────────────────
    let pages = page_count(&pdf).unwrap_or_else(|e| {
        warn!("Could not count pages of the final PDF: {}", e);
        0
    });

    let stats = ConversionStats {
        page_count: pages,
        pdf_bytes: pdf.len(),
        heading_count: composed.headings.len(),
        code_block_count: composed.code_blocks,
        warning_count: composed.warnings.len(),
        compose_duration_ms,
        print_duration_ms,
        merge_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Conversion complete: {} pages, {} bytes, {}ms total",
        stats.page_count, stats.pdf_bytes, stats.total_duration_ms
    );

    Ok(ConversionOutput {
        pdf,
        html: composed.html,
        cover_html: composed.cover_html,
        headings: composed.headings,
        warnings: composed.warnings,
        stats,
    })
}

fn compose_stages(
    request: &DocumentRequest,
    config: &ConversionConfig,
    progress: &Progress<'_>,
) -> Result<ComposedDocument, Md2PdfError> {
    let stylesheet = progress.stage(Stage::Style, || build_stylesheet(&config.theme))?;
    debug!("Stylesheet: {} bytes", stylesheet.len());

    let doc = progress.stage(Stage::Transform, || {
        Ok(transform(&request.source, &TransformOptions::from(config)))
    })?;
    for warning in &doc.warnings {
        warn!("{}", warning);
        progress.warning(warning);
    }

    let (html, cover_html) = progress.stage(Stage::Compose, || {
        let composer = Composer::new(&stylesheet, config);
        let description = request.description_text();
        let html = composer.content(&doc, &request.title, description);
        let cover_html = (config.cover == CoverMode::Separate)
            .then(|| composer.cover(&request.title, description));
        Ok((html, cover_html))
    })?;

    Ok(ComposedDocument {
        html,
        cover_html,
        headings: doc.headings,
        warnings: doc.warnings,
        code_blocks: doc.code_blocks,
    })
}

fn resolve_printer(config: &ConversionConfig) -> Arc<dyn PdfPrinter> {
    match &config.printer {
        Some(printer) => Arc::clone(printer),
        None => Arc::new(ChromePrinter::from_config(config)),
    }
}

/// Replace `path` with `bytes`.
async fn write_output(path: &Path, bytes: &[u8]) -> Result<(), Md2PdfError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!("Removed existing {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(Md2PdfError::OutputRemoveFailed {
                path: path.to_path_buf(),
                source: e,
            })
        }
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| Md2PdfError::OutputWriteFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
    }

    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| Md2PdfError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })
}

/// Fans stage events out to the configured callback, if any.
struct Progress<'a> {
    callback: Option<&'a dyn ConversionProgressCallback>,
}

impl<'a> Progress<'a> {
    fn new(config: &'a ConversionConfig) -> Self {
        Self {
            callback: config.progress_callback.as_deref(),
        }
    }

    fn stage<T>(
        &self,
        stage: Stage,
        f: impl FnOnce() -> Result<T, Md2PdfError>,
    ) -> Result<T, Md2PdfError> {
        let start = self.begin(stage);
        let value = f()?;
        self.end(stage, start);
        Ok(value)
    }

    async fn stage_async<T>(
        &self,
        stage: Stage,
        fut: impl Future<Output = Result<T, Md2PdfError>>,
    ) -> Result<T, Md2PdfError> {
        let start = self.begin(stage);
        let value = fut.await?;
        self.end(stage, start);
        Ok(value)
    }

    fn begin(&self, stage: Stage) -> Instant {
        debug!("Stage started: {}", stage);
        if let Some(cb) = self.callback {
            cb.on_stage_start(stage);
        }
        Instant::now()
    }

    fn end(&self, stage: Stage, start: Instant) {
        let elapsed_ms = start.elapsed().as_millis() as u64;
        debug!("Stage finished: {} ({}ms)", stage, elapsed_ms);
        if let Some(cb) = self.callback {
            cb.on_stage_complete(stage, elapsed_ms);
        }
    }

    fn warning(&self, warning: &TransformWarning) {
        if let Some(cb) = self.callback {
            cb.on_warning(warning);
        }
    }

    fn complete(&self, stats: &ConversionStats) {
        if let Some(cb) = self.callback {
            cb.on_conversion_complete(stats);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::ConversionProgressCallback;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Stages(Mutex<Vec<String>>);

    impl ConversionProgressCallback for Stages {
        fn on_stage_start(&self, stage: Stage) {
            self.0.lock().unwrap().push(format!("{stage:?}"));
        }

        fn on_warning(&self, _warning: &TransformWarning) {
            self.0.lock().unwrap().push("warning".into());
        }
    }

    #[test]
    fn compose_reports_stages_and_warnings() {
        let stages = Arc::new(Stages::default());
        let config = ConversionConfig::builder()
            .progress_callback(stages.clone())
            .build()
            .unwrap();
        let request = DocumentRequest::new("# A\n\n```nolang\nx\n```\n");
        let composed = compose(&request, &config).unwrap();

        assert_eq!(composed.warnings.len(), 1);
        assert_eq!(composed.code_blocks, 1);
        assert!(composed.cover_html.is_none());
        let seen = stages.0.lock().unwrap().clone();
        assert_eq!(seen, vec!["Style", "Transform", "warning", "Compose"]);
    }

    #[test]
    fn separate_cover_composes_two_documents() {
        let config = ConversionConfig::builder()
            .cover(CoverMode::Separate)
            .build()
            .unwrap();
        let request = DocumentRequest::new("# A").with_title("Report");
        let composed = compose(&request, &config).unwrap();
        let cover = composed.cover_html.unwrap();
        assert!(cover.contains("Report"));
        assert!(!composed.html.contains("class=\"cover "));
    }

    #[test]
    fn invalid_theme_fails_compose() {
        let mut config = ConversionConfig::default();
        config.theme.highlight_theme = "missing".into();
        let err = compose(&DocumentRequest::new("x"), &config).unwrap_err();
        assert!(matches!(err, Md2PdfError::UnknownHighlightTheme { .. }));
    }

    #[tokio::test]
    async fn write_output_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out.pdf");
        write_output(&path, &[b'x'; 64]).await.unwrap();
        write_output(&path, b"%PDF-short").await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-short");
    }
}
