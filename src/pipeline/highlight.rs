//! Syntax highlighting for fenced code blocks via syntect.
//!
//! Code is emitted as *classed* HTML (`<span class="hl-keyword hl-rust">`)
//! rather than inline colours, and the colours themselves come from the
//! stylesheet ([`theme_css`]). Swapping the highlight theme therefore only
//! changes CSS, never the composed markup.

use crate::error::{Md2PdfError, TransformWarning};
use once_cell::sync::Lazy;
use syntect::highlighting::ThemeSet;
use syntect::html::{css_for_theme_with_class_style, ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;
use tracing::debug;

/// Class naming shared by the highlighter and the stylesheet.
pub const HIGHLIGHT_CLASS_STYLE: ClassStyle = ClassStyle::SpacedPrefixed { prefix: "hl-" };

static SYNTAXES: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);
static THEMES: Lazy<ThemeSet> = Lazy::new(ThemeSet::load_defaults);

/// A rendered code block.
#[derive(Debug, Clone)]
pub struct Highlighted {
    /// `<pre class="highlight"><code …>…</code></pre>` markup.
    pub html: String,
    /// Name of the syntax actually used (e.g. `"Rust"`, `"Plain Text"`).
    pub syntax: String,
    /// Set when the block fell back to plain text.
    pub warning: Option<TransformWarning>,
}

/// `true` if syntect bundles a theme called `name`.
pub fn has_theme(name: &str) -> bool {
    THEMES.themes.contains_key(name)
}

/// Names of all bundled highlight themes, sorted.
pub fn theme_names() -> Vec<String> {
    THEMES.themes.keys().cloned().collect()
}

/// CSS rules colouring the `hl-*` classes for the named theme.
pub fn theme_css(name: &str, style: ClassStyle) -> Result<String, Md2PdfError> {
    let theme = THEMES
        .themes
        .get(name)
        .ok_or_else(|| Md2PdfError::UnknownHighlightTheme {
            name: name.to_string(),
            available: theme_names().join(", "),
        })?;
    css_for_theme_with_class_style(theme, style)
        .map_err(|e| Md2PdfError::StylesheetFailed(format!("highlight theme '{name}': {e}")))
}

/// Extract the language token from a fence info string.
///
/// `"rust,ignore"` → `"rust"`, `"python {.numberLines}"` → `"python"`,
/// `""` → `None`.
pub fn info_language(info: &str) -> Option<&str> {
    info.trim()
        .split(|c: char| c.is_whitespace() || c == ',' || c == '{')
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Highlight `code` written in `language` (declared) or detected from its first line.
///
/// Never fails: an unknown language or a highlighter fault produces an
/// escaped plain-text block plus a [`TransformWarning`].
pub fn highlight(language: Option<&str>, code: &str) -> Highlighted {
    let (syntax, warning) = resolve_syntax(language, code);

    match classed_html(syntax, code) {
        Ok(body) => Highlighted {
            html: wrap(language, &body),
            syntax: syntax.name.clone(),
            warning,
        },
        Err(detail) => {
            debug!("Highlighter failed for {:?}: {}", language, detail);
            let body = html_escape::encode_text(code).into_owned();
            Highlighted {
                html: wrap(language, &body),
                syntax: SYNTAXES.find_syntax_plain_text().name.clone(),
                warning: Some(TransformWarning::HighlightFailed {
                    language: language.unwrap_or(syntax.name.as_str()).to_string(),
                    detail,
                }),
            }
        }
    }
}

fn resolve_syntax(
    language: Option<&str>,
    code: &str,
) -> (&'static SyntaxReference, Option<TransformWarning>) {
    let plain = SYNTAXES.find_syntax_plain_text();
    match language {
        Some(lang) => match SYNTAXES.find_syntax_by_token(lang) {
            Some(syntax) => (syntax, None),
            None => (
                plain,
                Some(TransformWarning::UnknownLanguage {
                    language: lang.to_string(),
                }),
            ),
        },
        None => {
            let first_line = code.lines().next().unwrap_or("");
            let syntax = SYNTAXES
                .find_syntax_by_first_line(first_line)
                .unwrap_or(plain);
            (syntax, None)
        }
    }
}

fn classed_html(syntax: &SyntaxReference, code: &str) -> Result<String, String> {
    let mut generator =
        ClassedHTMLGenerator::new_with_class_style(syntax, &SYNTAXES, HIGHLIGHT_CLASS_STYLE);
    for line in LinesWithEndings::from(code) {
        generator
            .parse_html_for_line_which_includes_newline(line)
            .map_err(|e| e.to_string())?;
    }
    Ok(generator.finalize())
}

fn wrap(language: Option<&str>, body: &str) -> String {
    match language {
        Some(lang) => format!(
            "<pre class=\"highlight\"><code class=\"language-{}\">{}</code></pre>\n",
            class_token(lang),
            body
        ),
        None => format!("<pre class=\"highlight\"><code>{}</code></pre>\n", body),
    }
}

/// Restrict a language name to characters that are safe inside a class attribute.
fn class_token(lang: &str) -> String {
    lang.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '#'))
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
