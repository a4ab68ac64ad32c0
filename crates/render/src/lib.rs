//! Multi-format renderer for journal-watch runs.
//!
//! A [`RenderSession`] accumulates articles in the order they are pushed and
//! produces all four artifacts from that single pass:
//!
//! | Artifact | Contents |
//! |----------|----------|
//! | review document | `.docx` with an importance placeholder per article |
//! | full markdown | title, authors, summary, abstract, metadata links |
//! | digest markdown | title, authors, summary *or* abstract, metadata links |
//! | HTML | the full markdown converted to HTML |
//!
//! Rendering never reorders articles and never performs I/O; writing the
//! artifacts is the job of a [`pipeline::ArtifactSink`].

mod document;
mod html;
mod markdown;

pub use html::markdown_to_html;

use pipeline::{ModelSpec, NormalizedArticle, RenderedArtifacts, SummaryOutcome};
use thiserror::Error;
use tracing::debug;

use document::DocumentBuilder;
use markdown::{push_digest, push_full, MarkdownLines};

/// Base URL of a record page; the article id is appended.
pub const RECORD_URL_BASE: &str = "https://pubmed.ncbi.nlm.nih.gov/";

/// Base URL of the DOI resolver; the DOI is appended.
pub const DOI_RESOLVER_BASE: &str = "https://dx.doi.org/";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("could not build the review document: {0}")]
    Document(String),
}

impl From<RenderError> for pipeline::WatchError {
    fn from(err: RenderError) -> Self {
        pipeline::WatchError::RenderFailed {
            message: err.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Presentation settings shared by every artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Name used in summary headings, e.g. `"GPT-3.5"`.
    pub model_display_name: String,
    pub record_url_base: String,
    pub doi_resolver_base: String,
}

impl RenderOptions {
    pub fn for_model(model: &ModelSpec) -> Self {
        Self {
            model_display_name: model.display_name.clone(),
            ..Self::default()
        }
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            model_display_name: ModelSpec::default().display_name,
            record_url_base: RECORD_URL_BASE.to_string(),
            doi_resolver_base: DOI_RESOLVER_BASE.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Renderer
// ---------------------------------------------------------------------------

/// Factory for render sessions.
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    options: RenderOptions,
}

impl Renderer {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    pub fn session(&self) -> RenderSession<'_> {
        RenderSession {
            options: &self.options,
            document: DocumentBuilder::default(),
            full: MarkdownLines::default(),
            digest: MarkdownLines::default(),
            count: 0,
        }
    }

    /// Renders `articles` in iteration order in one go.
    pub fn render<'a, I>(&self, articles: I) -> Result<Option<RenderedArtifacts>, RenderError>
    where
        I: IntoIterator<Item = (&'a NormalizedArticle, Option<&'a SummaryOutcome>)>,
    {
        let mut session = self.session();
        for (article, summary) in articles {
            session.push(article, summary);
        }
        session.finish()
    }
}

/// Incremental rendering of one run.
pub struct RenderSession<'r> {
    options: &'r RenderOptions,
    document: DocumentBuilder,
    full: MarkdownLines,
    digest: MarkdownLines,
    count: usize,
}

impl RenderSession<'_> {
    /// Appends `article` to every artifact.
    ///
    /// `summary` is `None` when the article was too short to summarize.
    pub fn push(&mut self, article: &NormalizedArticle, summary: Option<&SummaryOutcome>) {
        debug!(article = %article.id(), has_summary = summary.is_some(), "Rendering article");
        self.document.push(article, summary, self.options);
        push_full(&mut self.full, article, summary, self.options);
        push_digest(&mut self.digest, article, summary, self.options);
        self.count += 1;
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Produces the artifacts, or `None` when nothing was pushed.
    pub fn finish(self) -> Result<Option<RenderedArtifacts>, RenderError> {
        if self.count == 0 {
            return Ok(None);
        }
        let full_markdown = self.full.assemble();
        let html = markdown_to_html(&full_markdown);
        Ok(Some(RenderedArtifacts {
            document: self.document.build()?,
            digest_markdown: self.digest.assemble(),
            full_markdown,
            html,
            article_count: self.count,
        }))
    }
}
