//! HTML snippets handed to the browser's print call.
//!
//! Chrome renders header and footer templates in their own tiny documents:
//! the main stylesheet does not apply, external resources are not loaded, and
//! the default font size is unreadably small. Every style therefore has to be
//! inline. Chrome fills elements with the classes `pageNumber`, `totalPages`,
//! `title`, `date` and `url` at print time.

use crate::pipeline::style::Theme;

/// Header: the document title centred above a hairline rule.
///
/// Placeholders: `{font}`, `{color}`, `{border}`, `{title}`.
pub const HEADER_TEMPLATE: &str = r#"<style>#header { padding: 0 !important; }</style>
<div style="width: 100%; padding: 0 32px; font-family: {font}; font-size: 14px; color: {color}; -webkit-print-color-adjust: exact;">
  <div style="border-bottom: 1px solid {border}; padding: 12px 0; text-align: center;">{title}</div>
</div>"#;

/// Footer: `current / total` page counter, right aligned above a hairline rule.
///
/// Placeholders: `{font}`, `{color}`, `{border}`.
pub const FOOTER_TEMPLATE: &str = r#"<style>#footer { padding: 0 !important; }</style>
<div style="width: 100%; padding: 0 32px; font-family: {font}; font-size: 12px; color: {color}; -webkit-print-color-adjust: exact;">
  <div style="border-top: 1px solid {border}; padding: 12px 0; text-align: right;"><span class="pageNumber"></span> / <span class="totalPages"></span></div>
</div>"#;

/// Render the header template for `title` (HTML-escaped here).
pub fn header_template(title: &str, theme: &Theme) -> String {
    fill(HEADER_TEMPLATE, theme).replace("{title}", &html_escape::encode_text(title))
}

/// Render the footer template.
pub fn footer_template(theme: &Theme) -> String {
    fill(FOOTER_TEMPLATE, theme)
}

fn fill(template: &str, theme: &Theme) -> String {
    let font = theme.sans_font_stack();
    let font = html_escape::encode_double_quoted_attribute(&font);
    template
        .replace("{font}", &font)
        .replace("{color}", &theme.muted_color)
        .replace("{border}", &theme.border_color)
}
