//! Page composer: wrap the transformed blocks in a printable HTML document.
//!
//! The whole body goes through one `push_html` pass. Non-markup blocks are
//! spliced in as pre-rendered HTML events, so footnote numbering stays
//! consistent across the document.

use crate::config::ConversionConfig;
use crate::pipeline::markdown::{anchor_html, Block, Document};
use crate::pipeline::style::Stylesheet;
use crate::pipeline::toc::{render_toc, TocOptions};
use pulldown_cmark::html::push_html;
use pulldown_cmark::{CowStr, Event};

const GOOGLE_FONTS_API: &str = "https://fonts.googleapis.com";
const GOOGLE_FONTS_STATIC: &str = "https://fonts.gstatic.com";

/// Builds the content and cover documents for one run.
#[derive(Debug, Clone)]
pub struct Composer<'c> {
    stylesheet: &'c Stylesheet,
    font_links: &'c [String],
    toc: TocOptions,
}

impl<'c> Composer<'c> {
    pub fn new(stylesheet: &'c Stylesheet, config: &'c ConversionConfig) -> Self {
        Self {
            stylesheet,
            font_links: &config.theme.font_links,
            toc: TocOptions {
                max_depth: config.toc_max_depth,
                ordered: config.toc_ordered,
            },
        }
    }

    /// The content document: cover block (inline mode), TOC and body, in block order.
    pub fn content(&self, doc: &Document<'_>, title: &str, description: &str) -> String {
        let mut events: Vec<Event<'_>> = Vec::new();
        // A TOC with no entries also swallows the page break that follows it.
        let mut skip_break = false;

        for block in &doc.blocks {
            match block {
                Block::PageBreak if skip_break => {
                    skip_break = false;
                    continue;
                }
                Block::PageBreak => events.push(html(page_break())),
                Block::Heading {
                    level,
                    id,
                    classes,
                    content,
                    ..
                } => {
                    events.push(html(open_heading(*level, id, classes)));
                    events.extend(content.iter().cloned());
                    events.push(html(format!("</h{level}>\n")));
                }
                Block::Code { html: code, .. } => events.push(html(code.clone())),
                Block::Markup(markup) => events.extend(markup.iter().cloned()),
                Block::Cover => events.push(html(inline_cover(title, description))),
                Block::TableOfContents => {
                    let toc = render_toc(&doc.headings, self.toc);
                    if toc.is_empty() {
                        skip_break = true;
                        continue;
                    }
                    events.push(html(toc));
                }
            }
            skip_break = false;
        }

        let mut body = String::with_capacity(8 * 1024);
        body.push_str("<main class=\"prose w-full max-w-none\">\n");
        push_html(&mut body, events.into_iter());
        body.push_str("</main>\n");

        let page_title = if title.trim().is_empty() {
            doc.headings.first().map(|h| h.text.as_str()).unwrap_or("")
        } else {
            title
        };
        self.shell(page_title, &body)
    }

    /// Standalone cover document, one full page with a bordered centred panel.
    pub fn cover(&self, title: &str, description: &str) -> String {
        let body = format!(
            concat!(
                "<div class=\"h-screen p-4\">\n",
                "<div class=\"flex h-full flex-col items-center justify-center gap-2 border-2 border-accent\">\n",
                "<div class=\"text-3xl font-medium text-strong\">{}</div>\n",
                "<div class=\"text-lg text-muted\">{}</div>\n",
                "</div>\n",
                "</div>\n"
            ),
            html_escape::encode_text(title),
            html_escape::encode_text(description),
        );
        self.shell(title, &body)
    }

    fn shell(&self, title: &str, body: &str) -> String {
        let mut head = String::new();
        for (origin, crossorigin) in preconnect_origins(self.font_links) {
            head.push_str(&format!(
                "<link rel=\"preconnect\" href=\"{}\"{}>\n",
                html_escape::encode_double_quoted_attribute(&origin),
                if crossorigin { " crossorigin" } else { "" }
            ));
        }
        for link in self.font_links {
            head.push_str(&format!(
                "<link rel=\"stylesheet\" href=\"{}\">\n",
                html_escape::encode_double_quoted_attribute(link)
            ));
        }

        format!(
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n{head}<style>\n{css}\n</style>\n</head>\n<body>\n{body}</body>\n</html>\n",
            title = html_escape::encode_text(title),
            css = self.stylesheet.as_str().replace("</", "<\\/"),
        )
    }
}

fn html(s: String) -> Event<'static> {
    Event::Html(CowStr::from(s))
}

fn page_break() -> String {
    "<div class=\"page-break\"></div>\n".to_string()
}

fn inline_cover(title: &str, description: &str) -> String {
    format!(
        concat!(
            "<div class=\"cover flex h-screen flex-col items-center justify-center gap-4 page-break\">\n",
            "<div class=\"text-3xl font-medium\">{}</div>\n",
            "<div class=\"text-base text-muted\">{}</div>\n",
            "</div>\n"
        ),
        html_escape::encode_text(title),
        html_escape::encode_text(description),
    )
}

/// Size/weight classes for top-level headings; h5 and h6 keep prose defaults.
fn level_classes(level: u8) -> Option<&'static str> {
    match level {
        1 => Some("text-3xl font-semibold"),
        2 => Some("text-2xl font-semibold"),
        3 => Some("text-xl font-semibold"),
        4 => Some("text-lg font-semibold"),
        _ => None,
    }
}

fn open_heading(level: u8, id: &str, extra: &[String]) -> String {
    let mut classes: Vec<&str> = Vec::new();
    if let Some(c) = level_classes(level) {
        classes.push(c);
    }
    classes.extend(extra.iter().map(String::as_str));
    let class_attr = if classes.is_empty() {
        String::new()
    } else {
        format!(
            " class=\"{}\"",
            html_escape::encode_double_quoted_attribute(&classes.join(" "))
        )
    };
    format!(
        "<h{level} id=\"{}\"{class_attr}>{}",
        html_escape::encode_double_quoted_attribute(id),
        anchor_html(id)
    )
}

/// Origins worth a `preconnect` hint, with whether they need `crossorigin`.
fn preconnect_origins(links: &[String]) -> Vec<(String, bool)> {
    let mut origins: Vec<(String, bool)> = Vec::new();
    let mut add = |origin: String, crossorigin: bool| {
        if !origins.iter().any(|(o, _)| *o == origin) {
            origins.push((origin, crossorigin));
        }
    };
    for link in links {
        let Some((scheme, rest)) = link.split_once("://") else {
            continue;
        };
        let host = rest.split(['/', '?', '#']).next().unwrap_or("");
        if host.is_empty() {
            continue;
        }
        let origin = format!("{scheme}://{host}");
        if origin == GOOGLE_FONTS_API {
            add(origin, false);
            add(GOOGLE_FONTS_STATIC.to_string(), true);
        } else {
            add(origin, false);
        }
    }
    origins
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CoverMode;
    use crate::pipeline::markdown::{transform, TransformOptions};
    use crate::pipeline::style::build_stylesheet;

    fn compose_with(src: &str, config: &ConversionConfig, title: &str, desc: &str) -> String {
        let sheet = build_stylesheet(&config.theme).unwrap();
        let doc = transform(src, &TransformOptions::from(config));
        Composer::new(&sheet, config).content(&doc, title, desc)
    }

    #[test]
    fn shell_embeds_stylesheet_and_font_links() {
        let html = compose_with("Hello", &ConversionConfig::default(), "T", "");
        assert!(html.starts_with("<!DOCTYPE html>"));
        for needle in [
            "<meta charset=\"utf-8\">",
            "<style>\n/* base */",
            "rel=\"preconnect\" href=\"https://fonts.googleapis.com\"",
            "href=\"https://fonts.gstatic.com\" crossorigin",
            "rel=\"stylesheet\" href=\"https://fonts.googleapis.com/css2?",
            "<main class=\"prose w-full max-w-none\">",
        ] {
            assert!(html.contains(needle), "missing {needle}");
        }
    }

    #[test]
    fn cover_toc_and_body_in_order() {
        let html = compose_with(
            "# One\n\ntext\n\n## Two\n",
            &ConversionConfig::default(),
            "Report",
            "Quarterly",
        );
        let cover = html.find("class=\"cover ").unwrap();
        let toc = html.find("<nav class=\"toc\">").unwrap();
        let body = html.find("<h1 id=\"one\"").unwrap();
        assert!(cover < toc && toc < body);
        for needle in [
            "<div class=\"text-3xl font-medium\">Report</div>",
            "<div class=\"text-base text-muted\">Quarterly</div>",
            "<h2 id=\"two\" class=\"text-2xl font-semibold\"><a class=\"anchor\" href=\"#two\"",
        ] {
            assert!(html.contains(needle), "missing {needle}");
        }
    }

    #[test]
    fn empty_toc_drops_its_page_break() {
        let html = compose_with("plain text only", &ConversionConfig::default(), "", "");
        assert!(!html.contains("<nav class=\"toc\">"));
        assert!(!html.contains("<div class=\"page-break\"></div>"));
        assert!(html.contains("class=\"cover "));
    }

    #[test]
    fn explicit_page_break_renders_empty_div() {
        let config = ConversionConfig::builder()
            .cover(CoverMode::None)
            .toc(false)
            .build()
            .unwrap();
        let html = compose_with("a\n\n<!-- pagebreak -->\n\nb", &config, "", "");
        assert!(html.contains("<div class=\"page-break\"></div>"));
        assert!(!html.contains("pagebreak -->"));
    }

    #[test]
    fn user_text_is_escaped() {
        let html = compose_with("x", &ConversionConfig::default(), "<T&C>", "\"quoted\" <b>");
        assert!(html.contains("&lt;T&amp;C&gt;"));
        assert!(!html.contains("<b>"));
    }

    #[test]
    fn heading_attribute_classes_are_kept() {
        let config = ConversionConfig::builder()
            .cover(CoverMode::None)
            .toc(false)
            .build()
            .unwrap();
        let html = compose_with("# Title {.lead}", &config, "", "");
        let heading = "<h1 id=\"title\" class=\"text-3xl font-semibold lead\">";
        assert!(html.contains(heading), "got: {html}");
    }

    #[test]
    fn footnotes_number_across_blocks() {
        let config = ConversionConfig::builder()
            .cover(CoverMode::None)
            .toc(false)
            .build()
            .unwrap();
        let src = "a[^x] b[^y]\n\n# Notes\n\n[^y]: why\n[^x]: ex\n";
        let html = compose_with(src, &config, "", "");
        assert_eq!(html.matches("class=\"footnote-reference\"").count(), 2);
        assert!(html.contains("href=\"#x\">1</a>"), "got: {html}");
        assert!(html.contains("href=\"#y\">2</a>"));
    }

    #[test]
    fn standalone_cover_document() {
        let config = ConversionConfig::default();
        let sheet = build_stylesheet(&config.theme).unwrap();
        let html = Composer::new(&sheet, &config).cover("Report", "Q3");
        assert!(html.contains("<title>Report</title>"));
        assert!(html.contains("border-2 border-accent"));
        let title = "<div class=\"text-3xl font-medium text-strong\">Report</div>";
        assert!(html.contains(title));
        assert!(html.contains("<div class=\"text-lg text-muted\">Q3</div>"));
        assert!(!html.contains("<main"));
    }

    #[test]
    fn separate_cover_mode_has_no_inline_cover() {
        let config = ConversionConfig::builder()
            .cover(CoverMode::Separate)
            .build()
            .unwrap();
        let html = compose_with("# A", &config, "Report", "");
        assert!(!html.contains("class=\"cover "));
    }

    #[test]
    fn preconnect_dedupes_origins() {
        let links = vec![
            "https://fonts.googleapis.com/css2?family=A".to_string(),
            "https://fonts.googleapis.com/css2?family=B".to_string(),
            "https://cdn.example.com/x.css".to_string(),
        ];
        let origins = preconnect_origins(&links);
        assert_eq!(
            origins,
            vec![
                ("https://fonts.googleapis.com".to_string(), false),
                ("https://fonts.gstatic.com".to_string(), true),
                ("https://cdn.example.com".to_string(), false),
            ]
        );
    }
}
