//! Full and digest markdown, built line by line.
//!
//! Each article contributes a leading empty entry; joined with `"\n"` that
//! produces the blank lines between articles. The very first entry is dropped
//! when the document is assembled so the output starts with the first title.

use pipeline::{NormalizedArticle, SummaryOutcome};

use crate::RenderOptions;

#[derive(Debug, Default)]
pub(crate) struct MarkdownLines(Vec<String>);

impl MarkdownLines {
    fn push(&mut self, line: impl Into<String>) {
        self.0.push(line.into());
    }

    pub(crate) fn assemble(&self) -> String {
        self.0.iter().skip(1).map(String::as_str).collect::<Vec<_>>().join("\n")
    }
}

fn metadata_line(article: &NormalizedArticle, options: &RenderOptions) -> String {
    let id = article.id();
    let doi = article.doi();
    format!(
        "\n{} - {} - [{id}]({}{id}) - [{doi}]({}{doi})",
        article.publication_date(),
        article.journal(),
        options.record_url_base,
        options.doi_resolver_base,
    )
}

fn header(lines: &mut MarkdownLines, article: &NormalizedArticle) {
    lines.push("\n");
    lines.push(format!("## {}", article.title()));
    lines.push(article.authors_display());
}

/// Title, authors, summary (if any), abstract, metadata.
pub(crate) fn push_full(
    lines: &mut MarkdownLines,
    article: &NormalizedArticle,
    summary: Option<&SummaryOutcome>,
    options: &RenderOptions,
) {
    header(lines, article);
    if let Some(summary) = summary {
        lines.push(format!("\n### {} Summary: ", options.model_display_name));
        lines.push(summary.text());
    }
    lines.push("\n### Abstract");
    lines.push(article.abstract_markdown());
    lines.push(metadata_line(article, options));
}

/// Title, authors, then the summary if there is one and the abstract otherwise.
pub(crate) fn push_digest(
    lines: &mut MarkdownLines,
    article: &NormalizedArticle,
    summary: Option<&SummaryOutcome>,
    options: &RenderOptions,
) {
    header(lines, article);
    match summary {
        Some(summary) => {
            lines.push(format!("\n### {} Summary", options.model_display_name));
            lines.push(summary.text());
        }
        None => {
            lines.push("\n### Abstract");
            lines.push(article.abstract_markdown());
        }
    }
    lines.push(metadata_line(article, options));
}
