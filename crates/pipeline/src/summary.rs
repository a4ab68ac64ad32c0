//! Summary cache keys, instruction variants, and summarization outcomes.
//!
//! ## Cache key policy
//!
//! A [`SummaryKey`] is the triple (article id, model id, instruction variant).
//! Its persisted form is `"{id}_{model}"`, with `"_simple"` appended for the
//! lay variant. An expert summary cached under one model is therefore always a
//! miss for the lay variant or for another model.

use serde::{Deserialize, Serialize};

use crate::{ArticleId, ModelId};

/// Text shown in place of a summary when the backend call failed.
pub const SUMMARY_FAILURE_TEXT: &str = "OpenAI summarization failure";

/// Plain abstracts with at most this many characters are not summarized.
pub const DEFAULT_SUMMARY_THRESHOLD: usize = 800;

const EXPERT_INSTRUCTIONS: &str = "The following is the abstract of a medical research article. \
In a paragraph, summarize the most important points for a practicing physician. \
If possible, include details of the study design, total number of participants, major results, \
and important conclusions. For this summary paragraph, use no more than 150 words. \
Include quantitative information when possible.";

const LAY_INSTRUCTIONS: &str = "The following is the abstract of a medical research article. \
In a paragraph, summarize the most important points for an intelligent layperson who is not a \
physician. Use simple and clear words. Avoid jargon. Emphasize aspects that are new and important. \
For this summary paragraph, use no more than 150 words.";

/// Audience the summary is phrased for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstructionVariant {
    /// Written for a practicing physician.
    #[default]
    Expert,
    /// Written for an intelligent layperson.
    Lay,
}

impl InstructionVariant {
    /// Fixed instruction preamble sent to the backend as the system message.
    pub fn instructions(self) -> &'static str {
        match self {
            InstructionVariant::Expert => EXPERT_INSTRUCTIONS,
            InstructionVariant::Lay => LAY_INSTRUCTIONS,
        }
    }

    /// Suffix appended to the persisted cache key.
    pub fn key_suffix(self) -> &'static str {
        match self {
            InstructionVariant::Expert => "",
            InstructionVariant::Lay => "_simple",
        }
    }
}

/// Composite cache key for one summary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SummaryKey {
    pub article: ArticleId,
    pub model: ModelId,
    pub variant: InstructionVariant,
}

impl SummaryKey {
    pub fn new(article: ArticleId, model: ModelId, variant: InstructionVariant) -> Self {
        Self {
            article,
            model,
            variant,
        }
    }

    /// Persisted form of the key.
    pub fn cache_key(&self) -> String {
        format!("{}_{}{}", self.article, self.model, self.variant.key_suffix())
    }
}

impl std::fmt::Display for SummaryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.cache_key())
    }
}

/// Everything a [`crate::Summarizer`] needs for one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRequest {
    pub key: SummaryKey,
    /// Plain-text abstract sent as the user message.
    pub abstract_text: String,
}

impl SummaryRequest {
    pub fn instructions(&self) -> &'static str {
        self.key.variant.instructions()
    }

    pub fn model(&self) -> &ModelId {
        &self.key.model
    }
}

/// Result of resolving a summary for an article that was long enough to
/// summarize.
///
/// Articles too short to summarize get no outcome at all (`None` at the call
/// site), which is distinct from [`SummaryOutcome::Failed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SummaryOutcome {
    /// Served from the summary cache.
    Cached(String),
    /// Produced by the backend during this run and written to the cache.
    Generated(String),
    /// The backend call failed; nothing was cached.
    Failed,
}

impl SummaryOutcome {
    /// Text emitted in rendered output.
    ///
    /// A failed summary renders as [`SUMMARY_FAILURE_TEXT`] and is otherwise
    /// treated as a present summary.
    pub fn text(&self) -> &str {
        match self {
            SummaryOutcome::Cached(text) | SummaryOutcome::Generated(text) => text,
            SummaryOutcome::Failed => SUMMARY_FAILURE_TEXT,
        }
    }
}
