//! Style builder: expand a [`Theme`] into the single stylesheet shared by
//! every document printed in a run.
//!
//! The stylesheet has four layers, emitted in a fixed order so the output is
//! a pure function of the theme:
//!
//! 1. **base**: element reset and page defaults
//! 2. **components**: `.prose` typography (only when `typography = true`)
//! 3. **utilities**: the small set of layout/typography classes the
//!    composer emits (`flex`, `h-screen`, `text-3xl`, …)
//! 4. **highlight**: colours for syntect's `hl-*` token classes

use crate::error::Md2PdfError;
use crate::pipeline::highlight::{self, HIGHLIGHT_CLASS_STYLE};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;
use tracing::debug;

const GENERIC_FAMILIES: &[&str] = &[
    "serif",
    "sans-serif",
    "monospace",
    "cursive",
    "fantasy",
    "system-ui",
    "ui-serif",
    "ui-sans-serif",
    "ui-monospace",
    "ui-rounded",
    "emoji",
    "math",
];

/// Visual configuration for the generated stylesheet.
///
/// Every field has a default, so a theme file only needs the keys it changes:
///
/// ```toml
/// sans_fonts = ["Source Sans 3", "sans-serif"]
/// highlight_theme = "InspiredGitHub"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Theme {
    /// Body font stack, most preferred first.
    pub sans_fonts: Vec<String>,
    /// Code font stack, most preferred first.
    pub mono_fonts: Vec<String>,
    /// Emit the `.prose` typography layer.
    pub typography: bool,
    /// External stylesheets (web fonts) linked from the document head.
    pub font_links: Vec<String>,
    /// Name of a bundled syntect theme used for code blocks.
    pub highlight_theme: String,
    /// Body text colour.
    pub text_color: String,
    /// Secondary text colour (descriptions, header/footer).
    pub muted_color: String,
    /// Link and cover border colour.
    pub accent_color: String,
    /// Rule and table border colour.
    pub border_color: String,
}

impl Default for Theme {
    fn default() -> Self {
        let owned = |xs: &[&str]| xs.iter().map(|s| s.to_string()).collect();
        Self {
            sans_fonts: owned(&[
                "Inter",
                "IBM Plex Sans",
                "ui-sans-serif",
                "system-ui",
                "sans-serif",
                "Apple Color Emoji",
                "Segoe UI Emoji",
                "Noto Color Emoji",
            ]),
            mono_fonts: owned(&[
                "IBM Plex Mono",
                "ui-monospace",
                "SFMono-Regular",
                "Menlo",
                "Monaco",
                "Consolas",
                "Liberation Mono",
                "Courier New",
                "monospace",
            ]),
            typography: true,
            font_links: vec![
                "https://fonts.googleapis.com/css2?family=IBM+Plex+Mono:ital,wght@0,400;0,500;0,600;1,400&family=IBM+Plex+Sans:ital,wght@0,300;0,400;0,500;0,600;0,700;1,400&display=swap".to_string(),
            ],
            highlight_theme: "base16-ocean.dark".to_string(),
            text_color: "#374151".to_string(),
            muted_color: "#475569".to_string(),
            accent_color: "#f97316".to_string(),
            border_color: "#e5e7eb".to_string(),
        }
    }
}

impl Theme {
    /// Parse a theme from TOML text and validate it.
    pub fn from_toml_str(text: &str) -> Result<Self, Md2PdfError> {
        let theme: Theme =
            toml::from_str(text).map_err(|e| Md2PdfError::InvalidTheme(e.to_string()))?;
        theme.validate()?;
        Ok(theme)
    }

    /// Load a theme from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Md2PdfError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Md2PdfError::InvalidTheme(format!("cannot read '{}': {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    /// Check that the theme can be expanded into a stylesheet.
    pub fn validate(&self) -> Result<(), Md2PdfError> {
        for (name, fonts) in [
            ("sans_fonts", &self.sans_fonts),
            ("mono_fonts", &self.mono_fonts),
        ] {
            if fonts.iter().all(|f| f.trim().is_empty()) {
                let detail = format!("{name} must not be empty");
                return Err(Md2PdfError::InvalidTheme(detail));
            }
        }
        for (name, value) in [
            ("text_color", &self.text_color),
            ("muted_color", &self.muted_color),
            ("accent_color", &self.accent_color),
            ("border_color", &self.border_color),
        ] {
            if value.trim().is_empty() || value.contains([';', '{', '}', '<', '>']) {
                return Err(Md2PdfError::InvalidTheme(format!(
                    "{name} is not a valid CSS colour: {value:?}"
                )));
            }
        }
        if !highlight::has_theme(&self.highlight_theme) {
            return Err(Md2PdfError::UnknownHighlightTheme {
                name: self.highlight_theme.clone(),
                available: highlight::theme_names().join(", "),
            });
        }
        Ok(())
    }

    /// The body font list as a CSS `font-family` value.
    pub fn sans_font_stack(&self) -> String {
        font_stack(&self.sans_fonts)
    }

    /// The code font list as a CSS `font-family` value.
    pub fn mono_font_stack(&self) -> String {
        font_stack(&self.mono_fonts)
    }
}

/// Quote family names unless they are CSS generic keywords.
fn font_stack(fonts: &[String]) -> String {
    fonts
        .iter()
        .map(|f| f.trim())
        .filter(|f| !f.is_empty())
        .map(|f| {
            if GENERIC_FAMILIES.contains(&f) {
                f.to_string()
            } else {
                format!("\"{}\"", f.replace('"', ""))
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// The CSS text produced by [`build_stylesheet`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stylesheet(String);

impl Stylesheet {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Expand `theme` into a stylesheet.
///
/// # Errors
/// Returns [`Md2PdfError::InvalidTheme`] / [`Md2PdfError::UnknownHighlightTheme`]
/// for a theme that fails validation, and [`Md2PdfError::StylesheetFailed`]
/// if syntect cannot emit CSS for the highlight theme.
pub fn build_stylesheet(theme: &Theme) -> Result<Stylesheet, Md2PdfError> {
    theme.validate()?;

    let mut css = String::with_capacity(16 * 1024);
    base_layer(&mut css, theme);
    if theme.typography {
        components_layer(&mut css, theme);
    }
    utilities_layer(&mut css, theme);

    let highlight_css = highlight::theme_css(&theme.highlight_theme, HIGHLIGHT_CLASS_STYLE)?;
    css.push_str("/* highlight */\n");
    css.push_str(&highlight_css);

    debug!("Built stylesheet: {} bytes", css.len());
    Ok(Stylesheet(css))
}

fn base_layer(css: &mut String, theme: &Theme) {
    let _ = write!(
        css,
        r#"/* base */
*, ::before, ::after {{ box-sizing: border-box; border-width: 0; border-style: solid; border-color: {border}; }}
html {{ line-height: 1.5; -webkit-text-size-adjust: 100%; font-family: {sans}; }}
body {{ margin: 0; line-height: inherit; color: {text}; -webkit-print-color-adjust: exact; print-color-adjust: exact; }}
h1, h2, h3, h4, h5, h6 {{ font-size: inherit; font-weight: inherit; margin: 0; }}
p, blockquote, dl, dd, figure, pre {{ margin: 0; }}
ol, ul {{ list-style: none; margin: 0; padding: 0; }}
a {{ color: inherit; text-decoration: inherit; }}
code, kbd, samp, pre {{ font-family: {mono}; font-size: 1em; }}
table {{ text-indent: 0; border-color: inherit; border-collapse: collapse; }}
img, svg, video {{ display: block; max-width: 100%; height: auto; }}
hr {{ height: 0; color: inherit; border-top-width: 1px; }}
pre, blockquote, table, img {{ page-break-inside: avoid; }}
h1, h2, h3, h4, h5, h6 {{ page-break-after: avoid; }}
"#,
        border = theme.border_color,
        sans = theme.sans_font_stack(),
        mono = theme.mono_font_stack(),
        text = theme.text_color,
    );
}

fn components_layer(css: &mut String, theme: &Theme) {
    let _ = write!(
        css,
        r#"/* components */
.prose {{ color: {text}; max-width: 65ch; font-size: 1rem; line-height: 1.75; }}
.prose :where(p) {{ margin-top: 1.25em; margin-bottom: 1.25em; }}
.prose :where(a) {{ color: #111827; text-decoration: underline; font-weight: 500; }}
.prose :where(strong) {{ color: #111827; font-weight: 600; }}
.prose :where(del) {{ text-decoration: line-through; }}
.prose :where(ol) {{ list-style-type: decimal; margin-top: 1.25em; margin-bottom: 1.25em; padding-left: 1.625em; }}
.prose :where(ul) {{ list-style-type: disc; margin-top: 1.25em; margin-bottom: 1.25em; padding-left: 1.625em; }}
.prose :where(li) {{ margin-top: 0.5em; margin-bottom: 0.5em; }}
.prose :where(ol > li, ul > li)::marker {{ color: #6b7280; }}
.prose :where(li > input[type="checkbox"]) {{ margin-right: 0.5em; }}
.prose :where(hr) {{ border-color: {border}; margin-top: 3em; margin-bottom: 3em; }}
.prose :where(blockquote) {{ font-weight: 500; font-style: italic; color: #111827; border-left-width: 0.25rem; border-left-color: {border}; margin-top: 1.6em; margin-bottom: 1.6em; padding-left: 1em; }}
.prose :where(h1) {{ color: #111827; font-weight: 800; font-size: 2.25em; margin-top: 0; margin-bottom: 0.8888889em; line-height: 1.1111111; }}
.prose :where(h2) {{ color: #111827; font-weight: 700; font-size: 1.5em; margin-top: 2em; margin-bottom: 1em; line-height: 1.3333333; }}
.prose :where(h3) {{ color: #111827; font-weight: 600; font-size: 1.25em; margin-top: 1.6em; margin-bottom: 0.6em; line-height: 1.6; }}
.prose :where(h4) {{ color: #111827; font-weight: 600; margin-top: 1.5em; margin-bottom: 0.5em; line-height: 1.5; }}
.prose :where(h5, h6) {{ color: #111827; font-weight: 600; }}
.prose :where(h1, h2, h3, h4, h5, h6) > a.anchor {{ text-decoration: none; }}
.prose :where(code) {{ color: #111827; font-weight: 600; font-size: 0.875em; }}
.prose :where(:not(pre) > code)::before, .prose :where(:not(pre) > code)::after {{ content: "`"; }}
.prose :where(pre) {{ overflow-x: auto; white-space: pre-wrap; word-break: break-word; font-size: 0.875em; line-height: 1.7142857; margin-top: 1.7142857em; margin-bottom: 1.7142857em; border-radius: 0.375rem; padding: 0.8571429em 1.1428571em; }}
.prose :where(pre code) {{ background-color: transparent; border-width: 0; border-radius: 0; padding: 0; font-weight: inherit; color: inherit; font-size: inherit; font-family: inherit; line-height: inherit; }}
.prose :where(table) {{ width: 100%; table-layout: auto; text-align: left; margin-top: 2em; margin-bottom: 2em; font-size: 0.875em; line-height: 1.7142857; }}
.prose :where(thead) {{ border-bottom-width: 1px; border-bottom-color: #d1d5db; }}
.prose :where(thead th) {{ color: #111827; font-weight: 600; vertical-align: bottom; padding: 0 0.5714286em 0.5714286em; }}
.prose :where(tbody tr) {{ border-bottom-width: 1px; border-bottom-color: {border}; }}
.prose :where(tbody td) {{ vertical-align: baseline; padding: 0.5714286em; }}
.prose :where(img) {{ margin-top: 2em; margin-bottom: 2em; }}
.prose :where(.footnote-definition) {{ font-size: 0.875em; margin-top: 1em; }}
.prose :where(nav.toc ol, nav.toc ul) {{ margin-top: 0.25em; margin-bottom: 0.25em; }}
.prose :where(nav.toc li) {{ margin-top: 0.125em; margin-bottom: 0.125em; }}
.prose :where(nav.toc a) {{ text-decoration: none; font-weight: 400; }}
.prose > :first-child {{ margin-top: 0; }}
"#,
        text = theme.text_color,
        border = theme.border_color,
    );
}

fn utilities_layer(css: &mut String, theme: &Theme) {
    let _ = write!(
        css,
        r#"/* utilities */
.flex {{ display: flex; }}
.flex-col {{ flex-direction: column; }}
.items-center {{ align-items: center; }}
.justify-center {{ justify-content: center; }}
.text-center {{ text-align: center; }}
.gap-2 {{ gap: 0.5rem; }}
.gap-4 {{ gap: 1rem; }}
.p-4 {{ padding: 1rem; }}
.w-full {{ width: 100%; }}
.h-full {{ height: 100%; }}
.h-screen {{ height: 100vh; }}
.max-w-none {{ max-width: none; }}
.border-2 {{ border-width: 2px; }}
.border-accent {{ border-color: {accent}; }}
.text-base {{ font-size: 1rem; line-height: 1.5rem; }}
.text-lg {{ font-size: 1.125rem; line-height: 1.75rem; }}
.text-xl {{ font-size: 1.25rem; line-height: 1.75rem; }}
.text-2xl {{ font-size: 1.5rem; line-height: 2rem; }}
.text-3xl {{ font-size: 1.875rem; line-height: 2.25rem; }}
.font-medium {{ font-weight: 500; }}
.font-semibold {{ font-weight: 600; }}
.text-muted {{ color: {muted}; }}
.text-strong {{ color: #0f172a; }}
.page-break {{ page-break-after: always; break-after: page; }}
"#,
        accent = theme.accent_color,
        muted = theme.muted_color,
    );
}
