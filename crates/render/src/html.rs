//! HTML derived from the full markdown.

use pulldown_cmark::{html, Parser};

/// Converts `markdown` to an HTML page declaring UTF-8.
pub fn markdown_to_html(markdown: &str) -> String {
    let mut body = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut body, Parser::new(markdown));
    let body = body.replace("\r\n", "\n");
    format!(
        "<head><meta charset=\"UTF-8\"></head>\n<body>\n{}\n</body>\n",
        body.trim_end_matches('\n')
    )
}
