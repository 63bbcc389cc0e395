//! Markdown transformer: source text → typed block sequence.
//!
//! The pulldown-cmark event stream is split at the top level into [`Block`]s.
//! Headings, code blocks and structural markers become their own variants;
//! everything else (paragraphs, lists, tables, quotes, raw HTML) is kept as
//! [`Block::Markup`] events so the composer can render the whole document in a
//! single HTML pass (footnote numbering depends on it).
//!
//! ## Structural markers
//!
//! A top-level HTML block consisting of exactly one of these comments is a
//! marker, matched case-insensitively:
//!
//! | Marker                 | Block                     |
//! |------------------------|---------------------------|
//! | `<!-- cover -->`       | [`Block::Cover`]           |
//! | `<!-- toc -->`         | [`Block::TableOfContents`] |
//! | `<!-- pagebreak -->`   | [`Block::PageBreak`]       |
//! | `<!-- page-break -->`  | [`Block::PageBreak`]       |
//!
//! Markers are recognised whether or not raw HTML is allowed. The same comment
//! inside a list or block quote is ordinary HTML.
//!
//! ## Rules applied while transforming
//!
//! 1. Every heading gets a unique id ([`Slugger`]), honouring `{#id}`.
//! 2. Every heading gets a leading self-link anchor.
//! 3. Fenced and indented code blocks are highlighted ([`highlight`]).
//! 4. Bare `http(s)://` and `www.` URLs in text become links.
//! 5. Raw HTML is escaped to literal text unless allowed.
//!
//! The transformer never fails. Identical input and options always produce
//! identical output.

use crate::config::{ConversionConfig, CoverMode};
use crate::error::TransformWarning;
use crate::pipeline::highlight::{self, Highlighted};
use crate::pipeline::slug::Slugger;
use crate::pipeline::toc::{TocEntry, TOC_HEADING_ID};
use once_cell::sync::Lazy;
use pulldown_cmark::{
    CodeBlockKind, CowStr, Event, HeadingLevel, LinkType, Options, Parser, Tag, TagEnd,
    TextMergeStream,
};
use regex::Regex;
use tracing::debug;

/// One top-level element of the document.
#[derive(Debug, Clone, PartialEq)]
pub enum Block<'a> {
    /// A top-level heading. `content` holds its inline events.
    Heading {
        level: u8,
        id: String,
        text: String,
        classes: Vec<String>,
        content: Vec<Event<'a>>,
    },
    /// A highlighted code block.
    Code {
        language: Option<String>,
        source: String,
        html: String,
    },
    /// Any other flow content, as events.
    Markup(Vec<Event<'a>>),
    /// Title/description cover page.
    Cover,
    /// Generated table of contents.
    TableOfContents,
    /// Forced page break.
    PageBreak,
}

/// Result of [`transform`].
#[derive(Debug, Clone, Default)]
pub struct Document<'a> {
    pub blocks: Vec<Block<'a>>,
    /// Every heading in document order, nested ones included.
    pub headings: Vec<TocEntry>,
    pub warnings: Vec<TransformWarning>,
    pub code_blocks: usize,
}

/// Options that change the transformer's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformOptions {
    pub allow_raw_html: bool,
    pub cover: CoverMode,
    pub toc: bool,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            allow_raw_html: true,
            cover: CoverMode::Inline,
            toc: true,
        }
    }
}

impl From<&ConversionConfig> for TransformOptions {
    fn from(config: &ConversionConfig) -> Self {
        Self {
            allow_raw_html: config.allow_raw_html,
            cover: config.cover,
            toc: config.toc,
        }
    }
}

static RE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*<!--\s*(cover|toc|page-?break)\s*-->\s*$").unwrap());

/// Group 1 is the URL. It must not follow a word character or `@`.
static RE_BARE_URL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:^|[^\w@])((?:https?://|www\.)[^\s<>]+)").unwrap());

static RE_HTML_LINK_OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^<a[\s>]").unwrap());
static RE_HTML_LINK_CLOSE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^</a\s*>").unwrap());

fn parser_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_HEADING_ATTRIBUTES
}

/// Markup of the self-link placed at the start of every heading.
pub fn anchor_html(id: &str) -> String {
    format!(
        "<a class=\"anchor\" href=\"#{}\" aria-hidden=\"true\" tabindex=\"-1\"></a>",
        html_escape::encode_double_quoted_attribute(id)
    )
}

/// Transform Markdown `source` into a block sequence.
pub fn transform<'a>(source: &'a str, options: &TransformOptions) -> Document<'a> {
    let mut t = Transformer::new(*options);
    let mut events = TextMergeStream::new(Parser::new_ext(source, parser_options()));
    let mut blocks: Vec<Block<'a>> = Vec::new();
    let mut pending: Vec<Event<'a>> = Vec::new();
    let mut depth = 0usize;

    while let Some(event) = events.next() {
        match event {
            Event::Start(Tag::Heading {
                level,
                id,
                classes,
                attrs,
            }) => {
                // `# Map {key}` is text, not attributes; only `#id` and `.class` are honoured.
                let literal = attribute_literal(id.as_deref(), &classes, &attrs);
                let (id, classes, attrs) = match literal {
                    Some(_) => (None, Vec::new(), Vec::new()),
                    None => (id, classes, attrs),
                };
                let heading = t.heading(level, id, literal, &mut events);
                if depth == 0 {
                    flush(&mut pending, &mut blocks);
                    blocks.push(Block::Heading {
                        level: level as u8,
                        id: heading.id,
                        text: heading.text,
                        classes: classes.iter().map(|c| c.to_string()).collect(),
                        content: heading.content,
                    });
                } else {
                    let anchor = anchor_html(&heading.id);
                    pending.push(Event::Start(Tag::Heading {
                        level,
                        id: Some(CowStr::from(heading.id)),
                        classes,
                        attrs,
                    }));
                    pending.push(Event::InlineHtml(CowStr::from(anchor)));
                    pending.extend(heading.content);
                    pending.push(Event::End(TagEnd::Heading(level)));
                }
            }
            Event::Start(Tag::CodeBlock(kind)) => {
                let (language, source) = collect_code(kind, &mut events);
                let highlighted = t.highlight(language.as_deref(), &source);
                if depth == 0 {
                    flush(&mut pending, &mut blocks);
                    blocks.push(Block::Code {
                        language,
                        source,
                        html: highlighted.html,
                    });
                } else {
                    pending.push(Event::Html(CowStr::from(highlighted.html)));
                }
            }
            Event::Start(Tag::HtmlBlock) => {
                let raw = collect_html(&mut events);
                if depth == 0 {
                    if let Some(marker) = marker_block(&raw) {
                        flush(&mut pending, &mut blocks);
                        blocks.push(marker);
                        continue;
                    }
                }
                t.raw_block(raw, &mut pending);
            }
            Event::Start(tag) => {
                depth += 1;
                t.open(&tag);
                pending.push(Event::Start(tag));
            }
            Event::End(end) => {
                depth = depth.saturating_sub(1);
                t.close(&end);
                pending.push(Event::End(end));
            }
            other => t.inline(other, &mut pending),
        }
    }
    flush(&mut pending, &mut blocks);

    apply_layout(&mut blocks, options);

    debug!(
        "Transformed markdown: {} blocks, {} headings, {} code blocks, {} warnings",
        blocks.len(),
        t.headings.len(),
        t.code_blocks,
        t.warnings.len()
    );

    Document {
        blocks,
        headings: t.headings,
        warnings: t.warnings,
        code_blocks: t.code_blocks,
    }
}

struct Heading<'a> {
    id: String,
    text: String,
    content: Vec<Event<'a>>,
}

struct Transformer {
    options: TransformOptions,
    slugger: Slugger,
    headings: Vec<TocEntry>,
    warnings: Vec<TransformWarning>,
    code_blocks: usize,
    link_depth: usize,
}

impl Transformer {
    fn new(options: TransformOptions) -> Self {
        Self {
            options,
            slugger: Slugger::with_reserved([TOC_HEADING_ID]),
            headings: Vec::new(),
            warnings: Vec::new(),
            code_blocks: 0,
            link_depth: 0,
        }
    }

    /// Consume a heading's events up to its end tag and assign its id.
    fn heading<'a, I>(
        &mut self,
        level: HeadingLevel,
        explicit_id: Option<CowStr<'a>>,
        literal: Option<String>,
        events: &mut I,
    ) -> Heading<'a>
    where
        I: Iterator<Item = Event<'a>>,
    {
        let mut content = Vec::new();
        let mut text = String::new();

        for event in events.by_ref() {
            match event {
                Event::End(TagEnd::Heading(_)) => break,
                Event::Start(tag) => {
                    self.open(&tag);
                    content.push(Event::Start(tag));
                }
                Event::End(end) => {
                    self.close(&end);
                    content.push(Event::End(end));
                }
                other => {
                    if let Event::Text(s) | Event::Code(s) = &other {
                        text.push_str(s);
                    }
                    self.inline(other, &mut content);
                }
            }
        }

        let mut text = text.trim().to_string();
        if let Some(literal) = literal {
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(&literal);
            content.push(Event::Text(CowStr::from(format!(" {literal}"))));
        }
        let id = match explicit_id {
            Some(id) => self.slugger.explicit(&id),
            None => self.slugger.slug(&text),
        };
        self.headings.push(TocEntry {
            level: level as u8,
            id: id.clone(),
            text: text.clone(),
        });

        Heading { id, text, content }
    }

    fn highlight(&mut self, language: Option<&str>, source: &str) -> Highlighted {
        self.code_blocks += 1;
        let highlighted = highlight::highlight(language, source);
        if let Some(warning) = &highlighted.warning {
            debug!("Code block {}: {}", self.code_blocks, warning);
            self.warnings.push(warning.clone());
        }
        highlighted
    }

    /// Non-marker HTML block: passed through or shown as literal text.
    fn raw_block<'a>(&self, raw: String, out: &mut Vec<Event<'a>>) {
        if self.options.allow_raw_html {
            out.push(Event::Html(CowStr::from(raw)));
        } else {
            out.push(Event::Start(Tag::Paragraph));
            out.push(Event::Text(CowStr::from(raw.trim_end().to_string())));
            out.push(Event::End(TagEnd::Paragraph));
        }
    }

    fn open(&mut self, tag: &Tag<'_>) {
        if matches!(tag, Tag::Link { .. } | Tag::Image { .. }) {
            self.link_depth += 1;
        }
    }

    fn close(&mut self, end: &TagEnd) {
        if matches!(end, TagEnd::Link | TagEnd::Image) {
            self.link_depth = self.link_depth.saturating_sub(1);
        }
    }

    fn inline<'a>(&mut self, event: Event<'a>, out: &mut Vec<Event<'a>>) {
        match event {
            Event::Text(text) if self.link_depth == 0 => autolink(text, out),
            Event::InlineHtml(html) | Event::Html(html) if !self.options.allow_raw_html => {
                out.push(Event::Text(html))
            }
            Event::InlineHtml(html) => {
                // Raw `<a>` tags count as links so their text is left alone.
                if RE_HTML_LINK_OPEN.is_match(&html) {
                    self.link_depth += 1;
                } else if RE_HTML_LINK_CLOSE.is_match(&html) {
                    self.link_depth = self.link_depth.saturating_sub(1);
                }
                out.push(Event::InlineHtml(html));
            }
            other => out.push(other),
        }
    }
}

/// Heading attribute block to keep as literal text, if it has anything other
/// than `#id` and `.class` entries.
fn attribute_literal(
    id: Option<&str>,
    classes: &[CowStr<'_>],
    attrs: &[(CowStr<'_>, Option<CowStr<'_>>)],
) -> Option<String> {
    if attrs.is_empty() {
        return None;
    }
    let mut parts: Vec<String> = Vec::new();
    if let Some(id) = id {
        parts.push(format!("#{id}"));
    }
    parts.extend(classes.iter().map(|c| format!(".{c}")));
    parts.extend(attrs.iter().map(|(key, value)| match value {
        Some(value) => format!("{key}={value}"),
        None => key.to_string(),
    }));
    Some(format!("{{{}}}", parts.join(" ")))
}

fn collect_code<'a, I>(kind: CodeBlockKind<'a>, events: &mut I) -> (Option<String>, String)
where
    I: Iterator<Item = Event<'a>>,
{
    let mut source = String::new();
    for event in events.by_ref() {
        match event {
            Event::End(TagEnd::CodeBlock) => break,
            Event::Text(s) => source.push_str(&s),
            _ => {}
        }
    }
    let language = match &kind {
        CodeBlockKind::Fenced(info) => highlight::info_language(info).map(str::to_string),
        CodeBlockKind::Indented => None,
    };
    (language, source)
}

fn collect_html<'a, I>(events: &mut I) -> String
where
    I: Iterator<Item = Event<'a>>,
{
    let mut raw = String::new();
    for event in events.by_ref() {
        match event {
            Event::End(TagEnd::HtmlBlock) => break,
            Event::Html(s) | Event::InlineHtml(s) | Event::Text(s) => raw.push_str(&s),
            _ => {}
        }
    }
    raw
}

fn marker_block(raw: &str) -> Option<Block<'static>> {
    let caps = RE_MARKER.captures(raw)?;
    let block = match caps[1].to_ascii_lowercase().as_str() {
        "cover" => Block::Cover,
        "toc" => Block::TableOfContents,
        _ => Block::PageBreak,
    };
    Some(block)
}

fn flush<'a>(pending: &mut Vec<Event<'a>>, blocks: &mut Vec<Block<'a>>) {
    if !pending.is_empty() {
        blocks.push(Block::Markup(std::mem::take(pending)));
    }
}

/// Insert the default cover and TOC unless the source placed them itself.
fn apply_layout(blocks: &mut Vec<Block<'_>>, options: &TransformOptions) {
    let is_cover = |b: &Block<'_>| matches!(b, Block::Cover);
    let is_toc = |b: &Block<'_>| matches!(b, Block::TableOfContents);

    match options.cover {
        CoverMode::Inline => {
            if !blocks.iter().any(is_cover) {
                blocks.insert(0, Block::Cover);
            }
        }
        CoverMode::Separate | CoverMode::None => blocks.retain(|b| !is_cover(b)),
    }

    if !options.toc {
        blocks.retain(|b| !is_toc(b));
    } else if !blocks.iter().any(is_toc) {
        let at = blocks.iter().position(is_cover).map_or(0, |i| i + 1);
        blocks.insert(at, Block::PageBreak);
        blocks.insert(at, Block::TableOfContents);
    }
}

/// Split `text` around bare URLs, wrapping each in a link.
fn autolink<'a>(text: CowStr<'a>, out: &mut Vec<Event<'a>>) {
    let mut last = 0;
    let mut linked = false;

    for m in RE_BARE_URL.captures_iter(&text).filter_map(|c| c.get(1)) {
        let url = trim_url(m.as_str());
        let rest = url
            .strip_prefix("www.")
            .or_else(|| url.split_once("://").map(|(_, r)| r))
            .unwrap_or("");
        if rest.is_empty() {
            continue;
        }
        let start = m.start();
        if start > last {
            out.push(Event::Text(CowStr::from(text[last..start].to_string())));
        }
        let href = if url.len() >= 4 && url[..4].eq_ignore_ascii_case("www.") {
            format!("http://{url}")
        } else {
            url.to_string()
        };
        out.push(Event::Start(Tag::Link {
            link_type: LinkType::Autolink,
            dest_url: CowStr::from(href),
            title: CowStr::Borrowed(""),
            id: CowStr::Borrowed(""),
        }));
        out.push(Event::Text(CowStr::from(url.to_string())));
        out.push(Event::End(TagEnd::Link));
        last = start + url.len();
        linked = true;
    }

    if !linked {
        out.push(Event::Text(text));
    } else if last < text.len() {
        out.push(Event::Text(CowStr::from(text[last..].to_string())));
    }
}

/// Drop trailing punctuation that belongs to the sentence, not the URL.
fn trim_url(url: &str) -> &str {
    let mut url = url;
    loop {
        let Some(c) = url.chars().last() else {
            return url;
        };
        let strip = match c {
            '.' | ',' | ':' | ';' | '!' | '?' | '\'' | '"' | '*' | '_' | '~' => true,
            ')' => url.matches(')').count() > url.matches('(').count(),
            _ => false,
        };
        if !strip {
            return url;
        }
        url = &url[..url.len() - c.len_utf8()];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulldown_cmark::html::push_html;

    fn plain() -> TransformOptions {
        TransformOptions {
            allow_raw_html: true,
            cover: CoverMode::None,
            toc: false,
        }
    }

    fn markup_html(doc: &Document<'_>) -> String {
        let mut html = String::new();
        for block in &doc.blocks {
            if let Block::Markup(events) = block {
                push_html(&mut html, events.iter().cloned());
            }
        }
        html
    }

    fn kinds(doc: &Document<'_>) -> Vec<&'static str> {
        doc.blocks
            .iter()
            .map(|b| match b {
                Block::Heading { .. } => "heading",
                Block::Code { .. } => "code",
                Block::Markup(_) => "markup",
                Block::Cover => "cover",
                Block::TableOfContents => "toc",
                Block::PageBreak => "pagebreak",
            })
            .collect()
    }

    #[test]
    fn splits_top_level_blocks() {
        let doc = transform("# Title\n\nHello\n\n```rust\nfn x() {}\n```\n", &plain());
        assert_eq!(kinds(&doc), vec!["heading", "markup", "code"]);
        assert_eq!(doc.code_blocks, 1);
    }

    #[test]
    fn default_layout_prepends_cover_toc_and_break() {
        let doc = transform("# Title\n\nHello", &TransformOptions::default());
        assert_eq!(
            kinds(&doc),
            vec!["cover", "toc", "pagebreak", "heading", "markup"]
        );
    }

    #[test]
    fn explicit_markers_are_not_duplicated() {
        let src = "# Intro\n\n<!-- cover -->\n\n<!-- TOC -->\n\n# Body\n\n<!--  page-break  -->\n\n# End\n";
        let doc = transform(src, &TransformOptions::default());
        assert_eq!(
            kinds(&doc),
            vec!["heading", "cover", "toc", "heading", "pagebreak", "heading"]
        );
    }

    #[test]
    fn markers_work_without_raw_html() {
        let opts = TransformOptions {
            allow_raw_html: false,
            ..plain()
        };
        let doc = transform("a\n\n<!-- pagebreak -->\n\nb\n", &opts);
        assert_eq!(kinds(&doc), vec!["markup", "pagebreak", "markup"]);
    }

    #[test]
    fn separate_and_no_cover_drop_cover_markers() {
        for cover in [CoverMode::Separate, CoverMode::None] {
            let opts = TransformOptions { cover, ..plain() };
            let doc = transform("<!-- cover -->\n\n# A\n", &opts);
            assert_eq!(kinds(&doc), vec!["heading"]);
        }
    }

    #[test]
    fn disabled_toc_drops_toc_markers() {
        let doc = transform("<!-- toc -->\n\n# A\n", &plain());
        assert_eq!(kinds(&doc), vec!["heading"]);
    }

    #[test]
    fn nested_marker_is_ordinary_html() {
        let doc = transform("- item\n\n  <!-- toc -->\n", &plain());
        assert_eq!(kinds(&doc), vec!["markup"]);
    }

    #[test]
    fn level_six_table_of_contents_is_a_normal_heading() {
        let doc = transform("###### Table of Contents\n", &plain());
        match &doc.blocks[0] {
            Block::Heading { level, text, .. } => {
                assert_eq!(*level, 6);
                assert_eq!(text, "Table of Contents");
            }
            other => panic!("expected heading, got {other:?}"),
        }
        assert_eq!(doc.headings[0].id, "table-of-contents-1");
    }

    #[test]
    fn heading_ids_are_unique_and_deterministic() {
        let src = "# Setup\n## Setup\n### Setup\n# Other {#custom}\n";
        let a = transform(src, &plain());
        let b = transform(src, &plain());
        let ids: Vec<_> = a.headings.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["setup", "setup-1", "setup-2", "custom"]);
        assert_eq!(a.headings, b.headings);
    }

    #[test]
    fn heading_text_includes_inline_code() {
        let doc = transform("## Using `cargo` *well*\n", &plain());
        assert_eq!(doc.headings[0].text, "Using cargo well");
        assert_eq!(doc.headings[0].id, "using-cargo-well");
    }

    #[test]
    fn nested_headings_get_ids_and_anchors() {
        let doc = transform("> ## Quoted\n", &plain());
        assert_eq!(doc.headings.len(), 1);
        let html = markup_html(&doc);
        assert!(html.contains("<h2 id=\"quoted\">"), "got: {html}");
        assert!(html.contains("href=\"#quoted\""));
    }

    #[test]
    fn nested_code_blocks_are_highlighted() {
        let doc = transform("- item\n\n  ```rust\n  let x = 1;\n  ```\n", &plain());
        let html = markup_html(&doc);
        assert!(html.contains("language-rust"), "got: {html}");
        assert_eq!(doc.code_blocks, 1);
    }

    #[test]
    fn unknown_language_is_a_warning() {
        let doc = transform("```nosuchlang\nx\n```\n", &plain());
        assert_eq!(
            doc.warnings,
            vec![TransformWarning::UnknownLanguage {
                language: "nosuchlang".into()
            }]
        );
    }

    #[test]
    fn bare_urls_become_links() {
        let src = "See https://example.com/a_(b). And www.rust-lang.org!";
        let html = markup_html(&transform(src, &plain()));
        let first = r#"<a href="https://example.com/a_(b)">https://example.com/a_(b)</a>."#;
        let second = r#"<a href="http://www.rust-lang.org">www.rust-lang.org</a>!"#;
        assert!(html.contains(first), "got: {html}");
        assert!(html.contains(second), "got: {html}");
    }

    #[test]
    fn existing_links_and_code_are_not_autolinked() {
        let src = "[https://a.example](https://b.example) `https://c.example`";
        let html = markup_html(&transform(src, &plain()));
        assert_eq!(html.matches("<a ").count(), 1, "got: {html}");
        assert!(html.contains("<code>https://c.example</code>"));
    }

    #[test]
    fn raw_anchor_text_is_not_autolinked() {
        let src = "see <a href=\"https://x.org\">https://x.org</a> and https://y.org\n";
        let html = markup_html(&transform(src, &plain()));
        assert!(!html.contains("\"><a "), "got: {html}");
        assert!(html.contains("<a href=\"https://x.org\">https://x.org</a>"));
        assert!(html.contains("<a href=\"https://y.org\">https://y.org</a>"));
        assert_eq!(html.matches("<a ").count(), 2, "got: {html}");
    }

    #[test]
    fn raw_anchor_tags_match_case_insensitively() {
        let src = "<A HREF=\"#x\">www.x.org</A> then www.y.org\n";
        let html = markup_html(&transform(src, &plain()));
        assert_eq!(html.matches("<a ").count(), 1, "got: {html}");
        assert!(html.contains("<a href=\"http://www.y.org\">www.y.org</a>"));
    }

    #[test]
    fn url_after_at_sign_is_not_autolinked() {
        let html = markup_html(&transform("mail bob@www.example.com", &plain()));
        assert!(!html.contains("<a "), "got: {html}");
        assert!(html.contains("bob@www.example.com"));

        let html = markup_html(&transform("(www.x.org) and x:https://y.org", &plain()));
        let www = "(<a href=\"http://www.x.org\">www.x.org</a>)";
        assert!(html.contains(www), "got: {html}");
        assert!(html.contains(":<a href=\"https://y.org\">"), "got: {html}");
    }

    #[test]
    fn heading_with_plain_braces_keeps_its_text() {
        let doc = transform("# Map {key}\n\n## Pair {a=b .c}\n", &plain());
        assert_eq!(doc.headings[0].text, "Map {key}");
        assert_eq!(doc.headings[0].id, "map-key");
        assert_eq!(doc.headings[1].text, "Pair {.c a=b}");
        match &doc.blocks[0] {
            Block::Heading { classes, .. } => assert!(classes.is_empty()),
            other => panic!("expected heading, got {other:?}"),
        }
    }

    #[test]
    fn heading_id_and_class_attributes_are_honoured() {
        let doc = transform("# Intro {#start .lead}\n", &plain());
        assert_eq!(doc.headings[0].text, "Intro");
        assert_eq!(doc.headings[0].id, "start");
        match &doc.blocks[0] {
            Block::Heading { classes, .. } => assert_eq!(classes, &vec!["lead"]),
            other => panic!("expected heading, got {other:?}"),
        }
    }

    #[test]
    fn raw_html_passthrough_and_escaping() {
        let src = "<div class=\"x\">hi</div>\n\nand <b>bold</b>\n";
        let html = markup_html(&transform(src, &plain()));
        assert!(html.contains("<div class=\"x\">hi</div>"));
        assert!(html.contains("<b>bold</b>"));

        let opts = TransformOptions {
            allow_raw_html: false,
            ..plain()
        };
        let html = markup_html(&transform(src, &opts));
        assert!(!html.contains("<div"));
        assert!(html.contains("&lt;div class="), "got: {html}");
        assert!(html.contains("hi&lt;/div&gt;"));
        assert!(html.contains("&lt;b&gt;bold&lt;/b&gt;"));
    }

    #[test]
    fn gfm_extensions_are_enabled() {
        let src = "| a | b |\n|---|---|\n| 1 | 2 |\n\n~~gone~~\n\n- [x] done\n";
        let html = markup_html(&transform(src, &plain()));
        assert!(html.contains("<table>"));
        assert!(html.contains("<del>gone</del>"));
        assert!(html.contains("type=\"checkbox\""));
    }

    #[test]
    fn malformed_markdown_degrades_to_text() {
        let src = "**unclosed *emphasis [link](\n\n```\nunterminated";
        let doc = transform(src, &plain());
        let html = markup_html(&doc);
        assert!(html.contains("**unclosed"), "got: {html}");
        assert_eq!(doc.code_blocks, 1);
    }

    #[test]
    fn trims_sentence_punctuation_from_urls() {
        assert_eq!(trim_url("https://x.org/."), "https://x.org/");
        assert_eq!(trim_url("https://x.org/(a))"), "https://x.org/(a)");
        assert_eq!(trim_url("www.x.org?!"), "www.x.org");
    }
}
