//! journal-watch summarization backends.
//!
//! Implements the [`pipeline::Summarizer`] trait for the OpenAI chat
//! completions API, plus an offline backend that needs no network.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** HTTP transport, request formatting and response
//! parsing live here. The `stages` crate sees only [`pipeline::Summarizer`].
//!
//! Backends make exactly one attempt per call. Pacing between calls and the
//! decision to cache a result belong to the summarization stage.

mod offline;
mod openai;

pub use offline::{TruncatingSummarizer, OFFLINE_SUMMARY_CHARS};
pub use openai::{OpenAiSummarizer, DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT};
