//! The four outputs of one rendering pass.

/// Artifacts rendered from one run's articles.
///
/// `html` is always derived from `full_markdown`, never rendered separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedArtifacts {
    /// Word-processor document (`.docx` bytes).
    pub document: Vec<u8>,
    /// Summary and abstract for every article.
    pub full_markdown: String,
    /// Summary when present, abstract otherwise.
    pub digest_markdown: String,
    /// `full_markdown` converted to HTML with a UTF-8 charset declaration.
    pub html: String,
    /// Number of articles rendered.
    pub article_count: usize,
}

/// File-name suffixes used by every sink, in write order.
pub const DOCUMENT_EXTENSION: &str = ".docx";
pub const FULL_MARKDOWN_SUFFIX: &str = ".md";
pub const DIGEST_MARKDOWN_SUFFIX: &str = "_simple.md";
pub const HTML_EXTENSION: &str = ".html";
