//! Article records and the normalizer that prepares them for rendering.
//!
//! [`ArticleRecord`] is what the literature source hands back. [`normalize`]
//! turns it into a [`NormalizedArticle`] carrying the pre-joined author line
//! and the two abstract renderings every output format draws from.

use serde::{Deserialize, Serialize};

use crate::ArticleId;

/// One author as listed by the literature database.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub last_name: String,
    pub first_name: String,
    pub initials: String,
}

impl Author {
    /// Display form used in every output: `"Last, First Initials"`.
    pub fn display_name(&self) -> String {
        format!("{}, {} {}", self.last_name, self.first_name, self.initials)
    }
}

/// One section of a structured abstract.
///
/// An empty `heading` marks an unstructured (single-block) abstract.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbstractSection {
    pub heading: String,
    pub body: String,
}

impl AbstractSection {
    pub fn new(heading: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
            body: body.into(),
        }
    }

    pub fn has_heading(&self) -> bool {
        !self.heading.is_empty()
    }
}

/// A raw article as returned by a [`crate::LiteratureSource`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub id: ArticleId,
    pub title: String,
    pub journal: String,
    pub doi: Option<String>,
    pub publication_date: String,
    /// Plain abstract text. `None` means the database has no abstract yet.
    pub abstract_text: Option<String>,
    /// Ordered abstract sections. `None` when the record carries no abstract
    /// structure at all.
    pub structured_abstract: Option<Vec<AbstractSection>>,
    pub authors: Vec<Author>,
}

impl ArticleRecord {
    /// Returns `true` if the database has no abstract for this article.
    pub fn lacks_abstract(&self) -> bool {
        self.abstract_text.is_none()
    }
}

/// An [`ArticleRecord`] with its display strings computed once.
///
/// Immutable after [`normalize`] builds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedArticle {
    record: ArticleRecord,
    authors_display: String,
    abstract_plain: String,
    abstract_markdown: String,
}

impl NormalizedArticle {
    pub fn id(&self) -> &ArticleId {
        &self.record.id
    }

    pub fn title(&self) -> &str {
        &self.record.title
    }

    pub fn journal(&self) -> &str {
        &self.record.journal
    }

    /// DOI, or the empty string when the database has none.
    pub fn doi(&self) -> &str {
        self.record.doi.as_deref().unwrap_or_default()
    }

    pub fn publication_date(&self) -> &str {
        &self.record.publication_date
    }

    /// Abstract sections in source order; empty when there is no structure.
    pub fn sections(&self) -> &[AbstractSection] {
        self.record.structured_abstract.as_deref().unwrap_or_default()
    }

    /// Authors joined as `"Last, First Initials; ..."`.
    pub fn authors_display(&self) -> &str {
        &self.authors_display
    }

    /// Abstract sections joined by blank lines, headings as `"Heading: "`.
    pub fn abstract_plain(&self) -> &str {
        &self.abstract_plain
    }

    /// Abstract sections joined by blank lines, headings as `"**Heading**: "`.
    pub fn abstract_markdown(&self) -> &str {
        &self.abstract_markdown
    }
}

/// Separator between abstract sections in both renderings.
const SECTION_SEPARATOR: &str = "\n\n";

/// Builds the [`NormalizedArticle`] for `record`.
///
/// Total, deterministic and side-effect free. Both abstract renderings hold
/// the same sections in the same order; both are empty when the record has
/// no structured abstract.
pub fn normalize(record: ArticleRecord) -> NormalizedArticle {
    let authors_display = record
        .authors
        .iter()
        .map(Author::display_name)
        .collect::<Vec<_>>()
        .join("; ");

    let sections = record.structured_abstract.as_deref().unwrap_or_default();

    let abstract_plain = sections
        .iter()
        .map(|s| {
            if s.has_heading() {
                format!("{}: {}", s.heading, s.body)
            } else {
                s.body.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(SECTION_SEPARATOR);

    let abstract_markdown = sections
        .iter()
        .map(|s| {
            if s.has_heading() {
                format!("**{}**: {}", s.heading, s.body)
            } else {
                s.body.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(SECTION_SEPARATOR);

    NormalizedArticle {
        record,
        authors_display,
        abstract_plain,
        abstract_markdown,
    }
}
