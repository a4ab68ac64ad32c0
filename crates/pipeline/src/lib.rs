//! Core surveillance domain for journal-watch.
//!
//! This crate contains every domain concept, newtype identifier, shared value
//! type, and run-level error used throughout the workspace, together with the
//! pure decisions of a run: article normalization, partitioning against the
//! ledger, the cost guard, and the summary cache key policy. Infrastructure
//! crates implement the traits defined in [`ports`]; they never add domain
//! rules.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; infrastructure crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`ArticleId`, `ModelId`, `RunId`) |
//! | [`types`] | Value types (`TokenCount`, `TokenCost`, `CostBudget`, `Timestamp`, `RunStamp`) |
//! | [`errors`] | Run-level fatal error type |
//! | [`article`] | Article records and the normalizer |
//! | [`partition`] | Seen/skippable/new split against the ledger snapshot |
//! | [`cost`] | Pre-flight cost guard |
//! | [`model`] | Model selection and price tiers |
//! | [`summary`] | Summary keys, instruction variants, outcomes |
//! | [`query`] | Journal catalog and query composition |
//! | [`artifacts`] | Rendered output bundle |
//! | [`config`] | Run configuration |
//! | [`ports`] | Traits implemented by infrastructure crates |

pub mod article;
pub mod artifacts;
pub mod config;
pub mod cost;
pub mod errors;
pub mod identifiers;
pub mod model;
pub mod partition;
pub mod ports;
pub mod query;
pub mod summary;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use article::{normalize, AbstractSection, ArticleRecord, Author, NormalizedArticle};
pub use artifacts::{
    RenderedArtifacts, DIGEST_MARKDOWN_SUFFIX, DOCUMENT_EXTENSION, FULL_MARKDOWN_SUFFIX,
    HTML_EXTENSION,
};
pub use config::{
    CostConfig, SourceConfig, SummaryConfig, WatchConfig, WatchPaths, ARTIFACT_PREFIX, BACKUP_PREFIX,
    LEDGER_FILE_NAME, OUTPUT_DIRECTORY,
};
pub use cost::{should_proceed, CostDecision, CostGuard, ASSUMED_TOKENS_PER_ARTICLE};
pub use errors::WatchError;
pub use identifiers::{ArticleId, ModelId, RunId};
pub use model::{ModelSpec, PriceTier, ECONOMY_MODEL, KNOWN_MODELS};
pub use partition::{RunBatch, SeenSet};
pub use ports::{
    ArtifactSink, CacheError, IdentifierLedger, LedgerError, LiteratureSource, SinkError,
    SourceError, SummarizerError, Summarizer, SummaryCache,
};
pub use query::{
    build_journal_query, concat_queries, Journal, LiteratureQuery, COMMON_JOURNALS,
    DEFAULT_MAX_RESULTS, DEFAULT_RECENCY_DAYS,
};
pub use summary::{
    InstructionVariant, SummaryKey, SummaryOutcome, SummaryRequest, DEFAULT_SUMMARY_THRESHOLD,
    SUMMARY_FAILURE_TEXT,
};
pub use types::{CostBudget, RunStamp, Timestamp, TokenCost, TokenCount};
