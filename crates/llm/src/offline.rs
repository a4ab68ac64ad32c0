//! Offline backend used for dry runs and tests.

use async_trait::async_trait;
use pipeline::{Summarizer, SummarizerError, SummaryRequest};

/// Number of leading characters the offline backend keeps.
pub const OFFLINE_SUMMARY_CHARS: usize = 100;

/// "Summarizes" by keeping the first [`OFFLINE_SUMMARY_CHARS`] characters of
/// the abstract. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct TruncatingSummarizer;

#[async_trait]
impl Summarizer for TruncatingSummarizer {
    async fn summarize(&self, request: &SummaryRequest) -> Result<String, SummarizerError> {
        Ok(request
            .abstract_text
            .chars()
            .take(OFFLINE_SUMMARY_CHARS)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipeline::{ArticleId, InstructionVariant, ModelId, SummaryKey};

    fn request(text: &str) -> SummaryRequest {
        SummaryRequest {
            key: SummaryKey::new(
                ArticleId::new("1").unwrap(),
                ModelId::new("gpt-3.5-turbo").unwrap(),
                InstructionVariant::Expert,
            ),
            abstract_text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn keeps_the_first_hundred_characters() {
        let text = "é".repeat(250);
        let summary = TruncatingSummarizer.summarize(&request(&text)).await.unwrap();
        assert_eq!(summary.chars().count(), OFFLINE_SUMMARY_CHARS);
    }

    #[tokio::test]
    async fn short_text_is_returned_whole() {
        let summary = TruncatingSummarizer.summarize(&request("short")).await.unwrap();
        assert_eq!(summary, "short");
    }
}
