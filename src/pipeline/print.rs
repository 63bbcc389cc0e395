//! PDF rendering: print a composed HTML document with headless Chrome.
//!
//! The browser is a collaborator behind the [`PdfPrinter`] trait, so tests and
//! library callers can substitute their own implementation through
//! [`crate::config::ConversionConfigBuilder::printer`].
//!
//! ## Blocking
//!
//! `headless_chrome` drives the DevTools protocol synchronously from its own
//! threads. [`render_pdf`] therefore runs the printer inside
//! `tokio::task::spawn_blocking` so a print never stalls the async workers.
//!
//! ## Network idle
//!
//! Chrome has no "network idle" event for a page loaded this way. Before
//! printing, the tab is polled until the document has finished loading, web
//! fonts are ready, no image is still in flight, and the number of fetched
//! resources has stayed the same for the configured idle window.

use crate::config::{ConversionConfig, Margins, PaperSize};
use crate::error::Md2PdfError;
use headless_chrome::types::PrintToPdfOptions;
use headless_chrome::{Browser, LaunchOptions, Tab};
use serde::Deserialize;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Magic bytes every PDF file starts with.
pub const PDF_MAGIC: &[u8] = b"%PDF";

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Evaluated in the page; yields a JSON-encoded [`PageActivity`].
const ACTIVITY_CHECK: &str = r#"JSON.stringify({
  ready: document.readyState === "complete",
  fonts: !document.fonts || document.fonts.status === "loaded",
  resources: performance.getEntriesByType("resource").length,
  pending: Array.from(document.images).filter(img => !img.complete).length
})"#;

/// Everything the printer needs for one document.
#[derive(Debug, Clone)]
pub struct PrintJob {
    /// Full HTML document.
    pub html: String,
    pub paper: PaperSize,
    pub margins: Margins,
    /// Header snippet; `None` prints without header and footer.
    pub header_template: Option<String>,
    /// Footer snippet; `None` prints without header and footer.
    pub footer_template: Option<String>,
    pub print_background: bool,
    /// Quiet period required before printing.
    pub network_idle: Duration,
    /// Upper bound on the wait for network idle.
    pub idle_timeout: Duration,
}

impl PrintJob {
    /// A job with the paper, margins and idle settings taken from `config`.
    pub fn new(html: String, config: &ConversionConfig) -> Self {
        Self {
            html,
            paper: config.paper,
            margins: config.margins,
            header_template: None,
            footer_template: None,
            print_background: true,
            network_idle: Duration::from_millis(config.network_idle_ms),
            idle_timeout: Duration::from_secs(config.network_idle_timeout_secs),
        }
    }

    /// Attach header and footer snippets.
    pub fn with_header_footer(mut self, header: String, footer: String) -> Self {
        self.header_template = Some(header);
        self.footer_template = Some(footer);
        self
    }

    pub fn has_header_footer(&self) -> bool {
        self.header_template.is_some() || self.footer_template.is_some()
    }

    fn pdf_options(&self) -> PrintToPdfOptions {
        let (paper_width, paper_height) = self.paper.dimensions_in();
        let (top, right, bottom, left) = self.margins.to_inches();
        let header_footer = self.has_header_footer();
        // Chrome substitutes its own default header when only one is given.
        let template = |t: &Option<String>| {
            let t = t.clone().unwrap_or_else(|| "<span></span>".into());
            header_footer.then_some(t)
        };
        PrintToPdfOptions {
            landscape: Some(false),
            display_header_footer: Some(header_footer),
            print_background: Some(self.print_background),
            scale: Some(1.0),
            paper_width: Some(paper_width),
            paper_height: Some(paper_height),
            margin_top: Some(top),
            margin_bottom: Some(bottom),
            margin_left: Some(left),
            margin_right: Some(right),
            header_template: template(&self.header_template),
            footer_template: template(&self.footer_template),
            prefer_css_page_size: Some(false),
            ..Default::default()
        }
    }
}

/// HTML in, PDF bytes out.
///
/// Implementations are called from a blocking thread and may block.
pub trait PdfPrinter: Send + Sync {
    fn print(&self, job: &PrintJob) -> Result<Vec<u8>, Md2PdfError>;
}

/// Run `printer` on the blocking pool and check that it produced a PDF.
pub async fn render_pdf(
    printer: Arc<dyn PdfPrinter>,
    job: PrintJob,
) -> Result<Vec<u8>, Md2PdfError> {
    let bytes = tokio::task::spawn_blocking(move || printer.print(&job))
        .await
        .map_err(|e| Md2PdfError::Internal(format!("Print task panicked: {}", e)))??;

    check_pdf(&bytes)?;
    Ok(bytes)
}

/// Fail with [`Md2PdfError::InvalidPdfOutput`] unless `bytes` starts with `%PDF`.
pub fn check_pdf(bytes: &[u8]) -> Result<(), Md2PdfError> {
    if bytes.starts_with(PDF_MAGIC) {
        Ok(())
    } else {
        Err(Md2PdfError::InvalidPdfOutput {
            magic: bytes.iter().take(8).copied().collect(),
        })
    }
}

// ── Chrome ──────────────────────────────────────────────────────────────

/// [`PdfPrinter`] backed by a freshly launched headless Chrome per job.
#[derive(Debug, Clone)]
pub struct ChromePrinter {
    chrome_path: Option<PathBuf>,
    sandbox: bool,
}

impl Default for ChromePrinter {
    fn default() -> Self {
        Self {
            chrome_path: None,
            sandbox: true,
        }
    }
}

impl ChromePrinter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Chrome path and sandbox setting from `config`.
    pub fn from_config(config: &ConversionConfig) -> Self {
        Self {
            chrome_path: config.chrome_path.clone(),
            sandbox: config.sandbox,
        }
    }

    pub fn with_chrome_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.chrome_path = Some(path.into());
        self
    }

    pub fn with_sandbox(mut self, sandbox: bool) -> Self {
        self.sandbox = sandbox;
        self
    }

    fn launch(&self, job: &PrintJob) -> Result<Browser, Md2PdfError> {
        let options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(self.sandbox)
            .path(self.chrome_path.clone())
            // Keep the DevTools connection alive for the whole idle wait.
            .idle_browser_timeout(job.idle_timeout + Duration::from_secs(30))
            .build()
            .map_err(|e| Md2PdfError::BrowserLaunch(e.to_string()))?;

        debug!(
            "Launching Chrome (path={:?}, sandbox={})",
            self.chrome_path, self.sandbox
        );
        Browser::new(options).map_err(|e| Md2PdfError::BrowserLaunch(e.to_string()))
    }
}

/// Closes the tab when dropped, on success and on every error path.
struct TabGuard(Arc<Tab>);

impl Drop for TabGuard {
    fn drop(&mut self) {
        if let Err(e) = self.0.close(false) {
            debug!("Closing tab failed: {}", e);
        }
    }
}

impl PdfPrinter for ChromePrinter {
    fn print(&self, job: &PrintJob) -> Result<Vec<u8>, Md2PdfError> {
        let mut page = tempfile::Builder::new()
            .prefix("md2pdf-")
            .suffix(".html")
            .tempfile()
            .map_err(|e| Md2PdfError::BrowserSession(format!("cannot create page file: {e}")))?;
        page.write_all(job.html.as_bytes())
            .and_then(|_| page.flush())
            .map_err(|e| Md2PdfError::BrowserSession(format!("cannot write page file: {e}")))?;
        let url = file_url(page.path());

        // Declared after `browser` so the tab is closed before the browser goes away.
        let browser = self.launch(job)?;
        let tab = TabGuard(
            browser
                .new_tab()
                .map_err(|e| Md2PdfError::BrowserSession(format!("cannot open tab: {e}")))?,
        );

        tab.0
            .navigate_to(&url)
            .and_then(|t| t.wait_until_navigated())
            .map_err(|e| Md2PdfError::BrowserSession(format!("cannot load page: {e}")))?;

        wait_for_network_idle(&tab.0, job.network_idle, job.idle_timeout)?;

        let pdf = tab
            .0
            .print_to_pdf(Some(job.pdf_options()))
            .map_err(|e| Md2PdfError::PrintFailed(e.to_string()))?;

        info!("Printed {} bytes of PDF", pdf.len());
        Ok(pdf)
    }
}

fn file_url(path: &Path) -> String {
    let mut url = String::from("file://");
    for c in path.to_string_lossy().chars() {
        match c {
            ' ' => url.push_str("%20"),
            '#' => url.push_str("%23"),
            '?' => url.push_str("%3F"),
            '%' => url.push_str("%25"),
            '\\' => url.push('/'),
            c => url.push(c),
        }
    }
    url
}

// ── Network idle ────────────────────────────────────────────────────────

/// One observation of the page's loading state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PageActivity {
    /// `document.readyState === "complete"`.
    pub ready: bool,
    /// Web fonts finished loading (or failed).
    pub fonts: bool,
    /// Resource timing entries recorded so far.
    pub resources: usize,
    /// Images still loading.
    pub pending: usize,
}

impl PageActivity {
    fn settled(&self) -> bool {
        self.ready && self.fonts && self.pending == 0
    }
}

/// Decides when a sequence of [`PageActivity`] samples counts as idle.
#[derive(Debug)]
pub struct IdleTracker {
    idle_window: Duration,
    last_change: Instant,
    last_count: Option<usize>,
}

impl IdleTracker {
    pub fn new(idle_window: Duration, now: Instant) -> Self {
        Self {
            idle_window,
            last_change: now,
            last_count: None,
        }
    }

    /// Record a sample. Returns `true` once the page has been settled with an
    /// unchanged resource count for the whole idle window.
    pub fn observe(&mut self, activity: &PageActivity, now: Instant) -> bool {
        if !activity.settled() || self.last_count != Some(activity.resources) {
            self.last_count = Some(activity.resources);
            self.last_change = now;
            return false;
        }
        now.saturating_duration_since(self.last_change) >= self.idle_window
    }
}

fn sample(tab: &Tab) -> Result<PageActivity, Md2PdfError> {
    let result = tab
        .evaluate(ACTIVITY_CHECK, false)
        .map_err(|e| Md2PdfError::BrowserSession(format!("activity check failed: {e}")))?;
    let json = result
        .value
        .as_ref()
        .and_then(|v| v.as_str())
        .ok_or_else(|| Md2PdfError::BrowserSession("activity check returned no value".into()))?;
    serde_json::from_str(json)
        .map_err(|e| Md2PdfError::BrowserSession(format!("activity check returned {json:?}: {e}")))
}

fn wait_for_network_idle(
    tab: &Tab,
    idle_window: Duration,
    timeout: Duration,
) -> Result<(), Md2PdfError> {
    let start = Instant::now();
    let mut tracker = IdleTracker::new(idle_window, start);

    loop {
        let activity = sample(tab)?;
        let now = Instant::now();
        if tracker.observe(&activity, now) {
            debug!(
                "Network idle after {}ms ({} resources)",
                now.duration_since(start).as_millis(),
                activity.resources
            );
            return Ok(());
        }
        if now.duration_since(start) >= timeout {
            warn!("Network idle wait timed out: {:?}", activity);
            return Err(Md2PdfError::NetworkIdleTimeout {
                secs: timeout.as_secs(),
            });
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}
