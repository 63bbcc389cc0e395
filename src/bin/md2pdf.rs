//! CLI binary for md2pdf.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig` and reports the result.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use md2pdf::{
    compose, convert_to_file, ConversionConfig, ConversionProgressCallback, ConversionStats,
    CoverMode, DocumentRequest, Margins, Md2PdfError, PaperSize, Stage, Theme, TransformWarning,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one spinner whose message follows the
/// current stage, with a log line per finished stage.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("md2pdf");
        bar.set_message("Starting…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: Stage) {
        self.bar.set_message(format!("{stage}…"));
    }

    fn on_stage_complete(&self, stage: Stage, elapsed_ms: u64) {
        self.bar.println(format!(
            "  {} {:<24} {}",
            green("✓"),
            stage.to_string(),
            dim(&format!("{:.1}s", elapsed_ms as f64 / 1000.0)),
        ));
    }

    fn on_warning(&self, warning: &TransformWarning) {
        self.bar.println(format!("  {} {}", yellow("⚠"), warning));
    }

    fn on_conversion_complete(&self, stats: &ConversionStats) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} pages  {}  {}ms",
            green("✔"),
            stats.page_count,
            dim(&format!("{} bytes", stats.pdf_bytes)),
            stats.total_duration_ms,
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Basic conversion (writes ./output.pdf)
  md2pdf notes.md

  # Title and subtitle on the cover page
  md2pdf report.md -o report.pdf -T "Quarterly Report" -D "Q3 2026"

  # Cover as its own page, no table of contents
  md2pdf --cover separate --no-toc report.md -o report.pdf

  # US Letter, tighter margins, custom theme
  md2pdf --paper letter --margin-top 48 --margin-bottom 48 --theme brand.toml doc.md

  # Inspect the HTML that would be printed (no browser needed)
  md2pdf --html-only doc.md > doc.html

DOCUMENT MARKERS:
  <!-- cover -->       place the cover page here
  <!-- toc -->         place the table of contents here
  <!-- pagebreak -->   start a new page
  {#id} / {.class}     heading id / class; any other {...} stays in the heading

ENVIRONMENT VARIABLES:
  MD2PDF_OUTPUT        Default output path
  MD2PDF_THEME         Path to a theme TOML file
  MD2PDF_CHROME        Path to a Chrome / Chromium executable
  RUST_LOG             Override the log filter (e.g. md2pdf=debug)

SETUP:
  md2pdf drives a locally installed Chrome or Chromium in headless mode.
  Build with `--features fetch` to download a Chromium build when none is found.
  Inside containers running as root, pass --no-sandbox.
"#;

/// Convert Markdown files to styled PDF.
#[derive(Parser, Debug)]
#[command(
    name = "md2pdf",
    version,
    about = "Convert Markdown files to PDF with a cover page and table of contents",
    long_about = "Convert a Markdown file to a paginated PDF. Code blocks are syntax \
highlighted, headings get stable anchors, and the document opens with a cover page \
and a linked table of contents. Printing is done by headless Chrome.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Markdown file to convert.
    input: PathBuf,

    /// Output PDF path.
    #[arg(short, long, env = "MD2PDF_OUTPUT", default_value = "output.pdf")]
    output: PathBuf,

    /// Document title, shown on the cover page and in the page header.
    #[arg(short = 'T', long, env = "MD2PDF_TITLE", default_value = "")]
    title: String,

    /// Document description, shown under the title on the cover page.
    #[arg(short = 'D', long, env = "MD2PDF_DESCRIPTION", default_value = "")]
    description: String,

    /// Cover page placement: inline, separate, none.
    #[arg(long, env = "MD2PDF_COVER", value_enum, default_value = "inline")]
    cover: CoverArg,

    /// Omit the table of contents.
    #[arg(long, env = "MD2PDF_NO_TOC")]
    no_toc: bool,

    /// Deepest heading level listed in the table of contents (1–6).
    #[arg(long, env = "MD2PDF_TOC_DEPTH", default_value_t = 6,
          value_parser = clap::value_parser!(u8).range(1..=6))]
    toc_depth: u8,

    /// Render the table of contents as bullet lists instead of numbered lists.
    #[arg(long, env = "MD2PDF_TOC_UNORDERED")]
    toc_unordered: bool,

    /// Escape raw HTML in the Markdown instead of passing it through.
    #[arg(long, env = "MD2PDF_NO_RAW_HTML")]
    no_raw_html: bool,

    /// Path to a theme TOML file.
    #[arg(long, env = "MD2PDF_THEME")]
    theme: Option<PathBuf>,

    /// Syntax highlighting theme (e.g. InspiredGitHub, base16-ocean.light).
    #[arg(long, env = "MD2PDF_HIGHLIGHT_THEME")]
    highlight_theme: Option<String>,

    /// Paper size: a4, letter, legal.
    #[arg(long, env = "MD2PDF_PAPER", value_enum, default_value = "a4")]
    paper: PaperArg,

    /// Top margin in CSS pixels.
    #[arg(long, env = "MD2PDF_MARGIN_TOP", default_value_t = 80)]
    margin_top: u32,

    /// Right margin in CSS pixels.
    #[arg(long, env = "MD2PDF_MARGIN_RIGHT", default_value_t = 32)]
    margin_right: u32,

    /// Bottom margin in CSS pixels.
    #[arg(long, env = "MD2PDF_MARGIN_BOTTOM", default_value_t = 80)]
    margin_bottom: u32,

    /// Left margin in CSS pixels.
    #[arg(long, env = "MD2PDF_MARGIN_LEFT", default_value_t = 32)]
    margin_left: u32,

    /// Omit the page header (title) and footer (page numbers).
    #[arg(long, env = "MD2PDF_NO_HEADER_FOOTER")]
    no_header_footer: bool,

    /// Chrome / Chromium executable to use.
    #[arg(long = "chrome", env = "MD2PDF_CHROME")]
    chrome_path: Option<PathBuf>,

    /// Launch Chrome without its sandbox (needed as root in containers).
    #[arg(long, env = "MD2PDF_NO_SANDBOX")]
    no_sandbox: bool,

    /// Seconds to wait for the page to finish loading fonts and images.
    #[arg(long, env = "MD2PDF_IDLE_TIMEOUT", default_value_t = 30)]
    idle_timeout: u64,

    /// Write the composed HTML instead of printing a PDF.
    #[arg(long)]
    html_only: bool,

    /// Print conversion stats as JSON on stdout.
    #[arg(long, env = "MD2PDF_JSON")]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "MD2PDF_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "MD2PDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "MD2PDF_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum CoverArg {
    Inline,
    Separate,
    None,
}

impl From<CoverArg> for CoverMode {
    fn from(v: CoverArg) -> Self {
        match v {
            CoverArg::Inline => CoverMode::Inline,
            CoverArg::Separate => CoverMode::Separate,
            CoverArg::None => CoverMode::None,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum PaperArg {
    A4,
    Letter,
    Legal,
}

impl From<PaperArg> for PaperSize {
    fn from(v: PaperArg) -> Self {
        match v {
            PaperArg::A4 => PaperSize::A4,
            PaperArg::Letter => PaperSize::Letter,
            PaperArg::Legal => PaperSize::Legal,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner gives all the feedback that matters, so library logs are
    // limited to errors while it is active.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.html_only;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Read input ───────────────────────────────────────────────────────
    let input = std::path::absolute(&cli.input).unwrap_or_else(|_| cli.input.clone());
    let request = match DocumentRequest::from_file(&input).await {
        Ok(request) => request,
        Err(e @ Md2PdfError::FileNotFound { .. }) => {
            eprintln!("{}", red(&e.to_string()));
            std::process::exit(1);
        }
        Err(e) => return Err(e).context("Failed to read input"),
    }
    .with_title(cli.title.as_str())
    .with_description(cli.description.as_str());

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb = show_progress.then(CliProgressCallback::new);
    let config = build_config(&cli, progress_cb)?;

    // ── HTML-only mode ───────────────────────────────────────────────────
    if cli.html_only {
        let composed = compose(&request, &config).context("Failed to compose HTML")?;
        for warning in &composed.warnings {
            if !cli.quiet {
                eprintln!("{} {}", yellow("⚠"), warning);
            }
        }
        if cli.json {
            let json =
                serde_json::to_string_pretty(&composed).context("Failed to serialise output")?;
            println!("{json}");
        } else {
            io::stdout()
                .lock()
                .write_all(composed.html.as_bytes())
                .context("Failed to write to stdout")?;
        }
        return Ok(());
    }

    // ── Run conversion ───────────────────────────────────────────────────
    let output = std::path::absolute(&cli.output).unwrap_or_else(|_| cli.output.clone());
    warn_if_exists(&output, cli.quiet);

    let stats = convert_to_file(&request, &output, &config)
        .await
        .context("Conversion failed")?;

    if cli.json {
        let json = serde_json::to_string_pretty(&stats).context("Failed to serialise stats")?;
        println!("{json}");
    } else if !cli.quiet {
        println!("PDF generated at {}", output.display());
    }

    Ok(())
}

fn warn_if_exists(path: &Path, quiet: bool) {
    if !quiet && path.exists() {
        let message = format!("File already exists: {}. Overwriting...", path.display());
        eprintln!("{}", yellow(&message));
    }
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli, cb: Option<Arc<CliProgressCallback>>) -> Result<ConversionConfig> {
    let mut theme = match &cli.theme {
        Some(path) => {
            let context = format!("Failed to load theme from {}", path.display());
            Theme::load(path).context(context)?
        }
        None => Theme::default(),
    };
    if let Some(name) = &cli.highlight_theme {
        theme.highlight_theme = name.clone();
    }

    let mut builder = ConversionConfig::builder()
        .cover(cli.cover.into())
        .toc(!cli.no_toc)
        .toc_max_depth(cli.toc_depth)
        .toc_ordered(!cli.toc_unordered)
        .allow_raw_html(!cli.no_raw_html)
        .theme(theme)
        .paper(cli.paper.into())
        .margins(Margins {
            top: cli.margin_top,
            right: cli.margin_right,
            bottom: cli.margin_bottom,
            left: cli.margin_left,
        })
        .header_footer(!cli.no_header_footer)
        .network_idle_timeout_secs(cli.idle_timeout)
        .sandbox(!cli.no_sandbox);

    if let Some(path) = &cli.chrome_path {
        builder = builder.chrome_path(path);
    }
    if let Some(cb) = cb {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}
