//! Summarization stage: threshold, cache lookup, single backend attempt.

use std::sync::Arc;
use std::time::Duration;

use pipeline::{
    InstructionVariant, ModelId, NormalizedArticle, Summarizer, SummaryCache, SummaryConfig,
    SummaryKey, SummaryOutcome, SummaryRequest,
};
use tracing::{error, info, warn};

/// Resolves the summary of one article.
///
/// Failures never leave this stage: a backend error becomes
/// [`SummaryOutcome::Failed`] and cache errors are logged and bypassed.
pub struct SummarizationStage {
    summarizer: Arc<dyn Summarizer>,
    cache: Arc<dyn SummaryCache>,
    model: ModelId,
    variant: InstructionVariant,
    threshold_chars: usize,
    dispatch_delay: Duration,
}

impl SummarizationStage {
    pub fn new(
        summarizer: Arc<dyn Summarizer>,
        cache: Arc<dyn SummaryCache>,
        config: &SummaryConfig,
    ) -> Self {
        Self {
            summarizer,
            cache,
            model: config.model.id.clone(),
            variant: config.variant,
            threshold_chars: config.threshold_chars,
            dispatch_delay: config.dispatch_delay,
        }
    }

    /// Returns `true` when the plain abstract is long enough to summarize.
    pub fn wants_summary(&self, article: &NormalizedArticle) -> bool {
        article.abstract_plain().chars().count() > self.threshold_chars
    }

    pub fn key_for(&self, article: &NormalizedArticle) -> SummaryKey {
        SummaryKey::new(article.id().clone(), self.model.clone(), self.variant)
    }

    /// `None` when the abstract is at or below the threshold.
    pub async fn summarize(&self, article: &NormalizedArticle) -> Option<SummaryOutcome> {
        if !self.wants_summary(article) {
            return None;
        }
        let key = self.key_for(article);

        match self.cache.get(&key) {
            Ok(Some(text)) => {
                info!(key = %key, "Summary cache hit");
                return Some(SummaryOutcome::Cached(text));
            }
            Ok(None) => info!(key = %key, "Summary cache miss"),
            Err(e) => warn!(key = %key, error = %e, "Summary cache read failed; treating as miss"),
        }

        if !self.dispatch_delay.is_zero() {
            tokio::time::sleep(self.dispatch_delay).await;
        }

        let request = SummaryRequest {
            key,
            abstract_text: article.abstract_plain().to_string(),
        };
        match self.summarizer.summarize(&request).await {
            Ok(text) => {
                if let Err(e) = self.cache.set(&request.key, &text) {
                    warn!(key = %request.key, error = %e, "Could not cache summary");
                }
                Some(SummaryOutcome::Generated(text))
            }
            Err(e) => {
                error!(key = %request.key, error = %e, "Summarization failed");
                Some(SummaryOutcome::Failed)
            }
        }
    }
}
