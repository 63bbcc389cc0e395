//! Configuration types for Markdown-to-PDF conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. Per-document inputs (source text,
//! title, description) live in [`crate::pipeline::input::DocumentRequest`];
//! everything here is reusable across documents.

use crate::error::Md2PdfError;
use crate::pipeline::print::PdfPrinter;
use crate::pipeline::style::Theme;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration for a Markdown-to-PDF conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use md2pdf::{ConversionConfig, CoverMode, PaperSize};
///
/// let config = ConversionConfig::builder()
///     .cover(CoverMode::Separate)
///     .toc_max_depth(3)
///     .paper(PaperSize::Letter)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Where the title/description cover goes. Default: [`CoverMode::Inline`].
    pub cover: CoverMode,

    /// Generate a table of contents from the document headings. Default: true.
    pub toc: bool,

    /// Deepest heading level listed in the table of contents (1–6). Default: 6.
    pub toc_max_depth: u8,

    /// Render the table of contents as `<ol>` instead of `<ul>`. Default: true.
    pub toc_ordered: bool,

    /// Pass raw HTML in the Markdown through unchanged. Default: true.
    ///
    /// When disabled, raw HTML is shown as escaped literal text. Structural
    /// markers (`<!-- cover -->`, `<!-- toc -->`, `<!-- pagebreak -->`) are
    /// recognised either way.
    pub allow_raw_html: bool,

    /// Fonts, colours and highlight theme used by the stylesheet.
    pub theme: Theme,

    /// Paper size passed to the print step. Default: A4.
    pub paper: PaperSize,

    /// Page margins in CSS pixels. Default: 80 top/bottom, 32 left/right.
    pub margins: Margins,

    /// Stamp the title banner header and `N / total` footer on content pages. Default: true.
    pub header_footer: bool,

    /// Quiet period with no new resource fetches before printing, in ms. Default: 500.
    pub network_idle_ms: u64,

    /// Upper bound on the network-idle wait, in seconds. Default: 30.
    pub network_idle_timeout_secs: u64,

    /// Explicit Chrome/Chromium binary. If None, the default installation is used.
    pub chrome_path: Option<PathBuf>,

    /// Run Chrome with its sandbox enabled. Default: true.
    pub sandbox: bool,

    /// Pre-constructed printer. Takes precedence over the built-in Chrome printer.
    pub printer: Option<Arc<dyn PdfPrinter>>,

    /// Optional per-stage progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            cover: CoverMode::default(),
            toc: true,
            toc_max_depth: 6,
            toc_ordered: true,
            allow_raw_html: true,
            theme: Theme::default(),
            paper: PaperSize::default(),
            margins: Margins::default(),
            header_footer: true,
            network_idle_ms: 500,
            network_idle_timeout_secs: 30,
            chrome_path: None,
            sandbox: true,
            printer: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("cover", &self.cover)
            .field("toc", &self.toc)
            .field("toc_max_depth", &self.toc_max_depth)
            .field("toc_ordered", &self.toc_ordered)
            .field("allow_raw_html", &self.allow_raw_html)
            .field("theme", &self.theme)
            .field("paper", &self.paper)
            .field("margins", &self.margins)
            .field("header_footer", &self.header_footer)
            .field("network_idle_ms", &self.network_idle_ms)
            .field("network_idle_timeout_secs", &self.network_idle_timeout_secs)
            .field("chrome_path", &self.chrome_path)
            .field("sandbox", &self.sandbox)
            .field("printer", &self.printer.is_some())
            .field("progress_callback", &self.progress_callback.is_some())
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn cover(mut self, mode: CoverMode) -> Self {
        self.config.cover = mode;
        self
    }

    pub fn toc(mut self, enabled: bool) -> Self {
        self.config.toc = enabled;
        self
    }

    pub fn toc_max_depth(mut self, depth: u8) -> Self {
        self.config.toc_max_depth = depth.clamp(1, 6);
        self
    }

    pub fn toc_ordered(mut self, ordered: bool) -> Self {
        self.config.toc_ordered = ordered;
        self
    }

    pub fn allow_raw_html(mut self, allow: bool) -> Self {
        self.config.allow_raw_html = allow;
        self
    }

    pub fn theme(mut self, theme: Theme) -> Self {
        self.config.theme = theme;
        self
    }

    pub fn paper(mut self, paper: PaperSize) -> Self {
        self.config.paper = paper;
        self
    }

    pub fn margins(mut self, margins: Margins) -> Self {
        self.config.margins = margins;
        self
    }

    pub fn header_footer(mut self, enabled: bool) -> Self {
        self.config.header_footer = enabled;
        self
    }

    pub fn network_idle_ms(mut self, ms: u64) -> Self {
        self.config.network_idle_ms = ms;
        self
    }

    pub fn network_idle_timeout_secs(mut self, secs: u64) -> Self {
        self.config.network_idle_timeout_secs = secs.max(1);
        self
    }

    pub fn chrome_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.chrome_path = Some(path.into());
        self
    }

    pub fn sandbox(mut self, enabled: bool) -> Self {
        self.config.sandbox = enabled;
        self
    }

    pub fn printer(mut self, printer: Arc<dyn PdfPrinter>) -> Self {
        self.config.printer = Some(printer);
        self
    }

    pub fn progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.config.progress_callback = Some(callback);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Md2PdfError> {
        let c = &self.config;
        if !(1..=6).contains(&c.toc_max_depth) {
            return Err(Md2PdfError::InvalidConfig(format!(
                "TOC depth must be 1–6, got {}",
                c.toc_max_depth
            )));
        }
        if c.network_idle_timeout_secs == 0 {
            return Err(Md2PdfError::InvalidConfig(
                "Network idle timeout must be ≥ 1s".into(),
            ));
        }
        if c.network_idle_ms >= c.network_idle_timeout_secs * 1000 {
            return Err(Md2PdfError::InvalidConfig(format!(
                "Network idle window ({}ms) must be shorter than the idle timeout ({}s)",
                c.network_idle_ms, c.network_idle_timeout_secs
            )));
        }
        c.margins.validate(c.paper)?;
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Where the cover page (title + description) is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoverMode {
    /// Cover is the first block of the content document. (default)
    #[default]
    Inline,
    /// Cover is printed as its own PDF and merged in front of the content.
    Separate,
    /// No cover page; `<!-- cover -->` markers are dropped.
    None,
}

/// Paper sizes understood by the print step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaperSize {
    /// 210 × 297 mm. (default)
    #[default]
    A4,
    /// 8.5 × 11 in.
    Letter,
    /// 8.5 × 14 in.
    Legal,
}

impl PaperSize {
    /// `(width, height)` in inches, the unit the DevTools print call expects.
    pub fn dimensions_in(self) -> (f64, f64) {
        match self {
            PaperSize::A4 => (8.27, 11.69),
            PaperSize::Letter => (8.5, 11.0),
            PaperSize::Legal => (8.5, 14.0),
        }
    }
}

/// Page margins in CSS pixels (96 px per inch).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub left: u32,
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top: 80,
            right: 32,
            bottom: 80,
            left: 32,
        }
    }
}

impl Margins {
    const PX_PER_INCH: f64 = 96.0;

    /// Uniform margins on every side.
    pub fn uniform(px: u32) -> Self {
        Self {
            top: px,
            right: px,
            bottom: px,
            left: px,
        }
    }

    /// `(top, right, bottom, left)` in inches.
    pub fn to_inches(self) -> (f64, f64, f64, f64) {
        let conv = |px: u32| px as f64 / Self::PX_PER_INCH;
        (
            conv(self.top),
            conv(self.right),
            conv(self.bottom),
            conv(self.left),
        )
    }

    fn validate(self, paper: PaperSize) -> Result<(), Md2PdfError> {
        let (width, height) = paper.dimensions_in();
        let (top, right, bottom, left) = self.to_inches();
        if left + right >= width || top + bottom >= height {
            return Err(Md2PdfError::InvalidConfig(format!(
                "Margins {:?} leave no printable area on {:?} paper",
                self, paper
            )));
        }
        Ok(())
    }
}
