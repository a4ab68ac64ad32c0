//! Run-level error type for the surveillance pipeline.
//!
//! [`WatchError`] covers conditions that abort a run before or while it
//! mutates persistent state. Component-level errors (ledger I/O, cache I/O,
//! backend failures) are defined beside their port traits in [`crate::ports`]
//! and are mapped into [`WatchError`] by the orchestrator only when they are
//! fatal.
//!
//! ## Taxonomy
//!
//! - **Fatal**: every [`WatchError`] variant. The run stops, no further
//!   per-article state is touched, and the process exits non-zero.
//! - **Per-article recoverable**: summarization backend failures. These never
//!   become a [`WatchError`]; the article degrades to the failure summary.
//! - **Skippable**: a not-yet-seen article without an abstract. Not an error
//!   at all; it is counted and left out of the run.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{CostBudget, TokenCost};

/// Errors that abort a surveillance run.
#[derive(Debug, Error, Serialize, Deserialize)]
pub enum WatchError {
    /// Neither a journal selection nor a written query produced any search term.
    #[error("No journals or queries specified; nothing to search for")]
    EmptyQuery,

    /// The pre-flight estimate for the new articles exceeds the hard ceiling.
    ///
    /// Raised before any summarization or rendering work begins.
    #[error(
        "Estimated cost {estimate} exceeds the maximum of {ceiling}; \
         consider reducing the lookback period or narrowing the query"
    )]
    CostCeilingExceeded {
        /// Estimated cost of summarizing every new article.
        estimate: TokenCost,
        /// Configured hard ceiling.
        ceiling: CostBudget,
    },

    /// The identifier ledger could not be read or appended to.
    #[error("Identifier ledger unavailable: {message}")]
    LedgerUnavailable {
        /// Description of the underlying I/O failure.
        message: String,
    },

    /// The ledger backup could not be written, so the run would forfeit its
    /// recovery point.
    #[error("Could not back up the identifier ledger: {message}")]
    BackupFailed {
        /// Description of the underlying I/O failure.
        message: String,
    },

    /// The literature database query failed.
    #[error("Literature database query failed: {message}")]
    SourceFailed {
        /// Description of the failure reported by the source adapter.
        message: String,
    },

    /// The rendered artifacts could not be produced.
    #[error("Rendering failed: {message}")]
    RenderFailed {
        /// Description of the renderer failure.
        message: String,
    },

    /// The rendered artifacts could not be written to the output directory.
    #[error("Could not write output artifacts: {message}")]
    ArtifactWriteFailed {
        /// Description of the underlying I/O failure.
        message: String,
    },

    /// The run configuration is invalid.
    ///
    /// Produced at load time; a run never starts with an invalid config.
    #[error("Configuration error: {message}")]
    ConfigurationError {
        /// Description of the configuration problem.
        message: String,
    },
}
