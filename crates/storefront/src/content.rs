//! Markdown rendering for admin-edited pages.
//!
//! Page bodies live in `dukkan.site_content` and are rendered with comrak.
//! Raw HTML in the markdown is escaped since the text comes from the
//! back-office form.

use comrak::{Options, markdown_to_html};

/// Render markdown to HTML with the extensions the about page uses.
#[must_use]
pub fn render_markdown(content: &str) -> String {
    let mut options = Options::default();

    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.header_ids = Some(String::new());
    options.render.escape = true;

    markdown_to_html(content, &options)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renders_headings_and_tables() {
        let html = render_markdown("# من نحن\n\n| أ | ب |\n|---|---|\n| 1 | 2 |\n");
        assert!(html.contains("<h1"));
        assert!(html.contains("من نحن"));
        assert!(html.contains("<table>"));
    }

    #[test]
    fn test_raw_html_is_escaped() {
        let html = render_markdown("<script>alert(1)</script>");
        assert!(!html.contains("<script>"));
    }
}
