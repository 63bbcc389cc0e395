//! Table-of-contents construction.
//!
//! Headings are collected in document order as flat [`TocEntry`] values, then
//! folded into a tree by level and rendered as nested lists. Skipped levels
//! (an `h1` followed directly by an `h3`) nest under the nearest shallower
//! heading rather than producing empty intermediate lists.

use serde::{Deserialize, Serialize};

/// Anchor id of the generated "Table of Contents" heading.
pub const TOC_HEADING_ID: &str = "table-of-contents";

/// Label of the generated TOC heading.
pub const TOC_HEADING_TEXT: &str = "Table of Contents";

/// One heading of the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    /// Heading level, 1–6.
    pub level: u8,
    /// Anchor id assigned to the heading element.
    pub id: String,
    /// Plain text of the heading.
    pub text: String,
}

#[derive(Debug)]
struct Node<'a> {
    entry: &'a TocEntry,
    children: Vec<Node<'a>>,
}

/// Options for [`render_toc`].
#[derive(Debug, Clone, Copy)]
pub struct TocOptions {
    /// Deepest heading level included (1–6).
    pub max_depth: u8,
    /// `<ol>` when true, `<ul>` otherwise.
    pub ordered: bool,
}

impl Default for TocOptions {
    fn default() -> Self {
        Self {
            max_depth: 6,
            ordered: true,
        }
    }
}

fn build_tree<'a>(entries: &'a [TocEntry], max_depth: u8) -> Vec<Node<'a>> {
    let mut roots: Vec<Node<'a>> = Vec::new();
    for entry in entries.iter().filter(|e| e.level <= max_depth) {
        insert(&mut roots, entry);
    }
    roots
}

fn insert<'a>(siblings: &mut Vec<Node<'a>>, entry: &'a TocEntry) {
    if let Some(last) = siblings.last_mut() {
        if last.entry.level < entry.level {
            insert(&mut last.children, entry);
            return;
        }
    }
    siblings.push(Node {
        entry,
        children: Vec::new(),
    });
}

/// Render the TOC section for `entries`.
///
/// Returns an empty string when no entry is within `max_depth`.
pub fn render_toc(entries: &[TocEntry], options: TocOptions) -> String {
    let tree = build_tree(entries, options.max_depth.clamp(1, 6));
    if tree.is_empty() {
        return String::new();
    }

    let mut html = String::new();
    html.push_str("<nav class=\"toc\">\n");
    html.push_str(&format!(
        "<h1 id=\"{TOC_HEADING_ID}\" class=\"text-3xl font-semibold\">{TOC_HEADING_TEXT}</h1>\n"
    ));
    render_list(&mut html, &tree, options.ordered);
    html.push_str("</nav>\n");
    html
}

fn render_list(html: &mut String, nodes: &[Node<'_>], ordered: bool) {
    let tag = if ordered { "ol" } else { "ul" };
    html.push_str(&format!("<{tag}>\n"));
    for node in nodes {
        html.push_str(&format!(
            "<li><a href=\"#{}\">{}</a>",
            html_escape::encode_double_quoted_attribute(&node.entry.id),
            html_escape::encode_text(&node.entry.text)
        ));
        if !node.children.is_empty() {
            html.push('\n');
            render_list(html, &node.children, ordered);
        }
        html.push_str("</li>\n");
    }
    html.push_str(&format!("</{tag}>\n"));
}
