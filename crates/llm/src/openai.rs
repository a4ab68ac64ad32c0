//! OpenAI chat completions backend.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use pipeline::{Summarizer, SummarizerError, SummaryRequest};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Upper bound on one completion request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    total_tokens: u64,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Sends the instruction preamble as the system message and the abstract as
/// the user message, and returns the first choice's content.
#[derive(Clone)]
pub struct OpenAiSummarizer {
    http_client: Client,
    api_key: String,
    base_url: String,
}

impl std::fmt::Debug for OpenAiSummarizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiSummarizer")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl OpenAiSummarizer {
    pub fn new(api_key: impl Into<String>) -> Result<Self, SummarizerError> {
        Self::with_timeout(api_key, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SummarizerError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SummarizerError::Network(e.to_string()))?;
        Ok(Self {
            http_client,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Points the client at another endpoint (proxies, test servers).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    async fn summarize(&self, request: &SummaryRequest) -> Result<String, SummarizerError> {
        let start = Instant::now();
        let body = ChatRequest {
            model: request.model().as_str(),
            messages: [
                ChatMessage {
                    role: "system",
                    content: request.instructions(),
                },
                ChatMessage {
                    role: "user",
                    content: &request.abstract_text,
                },
            ],
        };

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, key = %request.key, "OpenAI request failed");
                SummarizerError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, key = %request.key, "OpenAI API error");
            return Err(SummarizerError::Api(format!("{status}: {error_text}")));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| SummarizerError::Parse(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| SummarizerError::Parse("response has no message content".into()))?;

        info!(
            key = %request.key,
            model = %request.model(),
            total_tokens = parsed.usage.map(|u| u.total_tokens),
            duration_ms = start.elapsed().as_millis() as u64,
            "OpenAI chat completion"
        );

        Ok(content)
    }
}
