//! Port traits implemented by infrastructure crates.
//!
//! The orchestrator in `stages` only ever sees these traits; `store`,
//! `pubmed`, and `llm` provide the concrete implementations and tests provide
//! in-memory doubles.

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use crate::{
    ArticleId, ArticleRecord, LiteratureQuery, RenderedArtifacts, RunStamp, SeenSet, SummaryKey,
    SummaryRequest,
};

// ---------------------------------------------------------------------------
// Literature source
// ---------------------------------------------------------------------------

/// Failure reported by a [`LiteratureSource`].
#[derive(Debug, Error)]
pub enum SourceError {
    /// The database could not be reached or the transfer was cut off.
    #[error("Network error: {0}")]
    Network(String),
    /// The database answered with a non-success status; carries status and body.
    #[error("Database error: {0}")]
    Api(String),
    /// The response body was not the expected JSON or XML.
    #[error("Malformed response: {0}")]
    Parse(String),
}

/// Searches the literature database.
#[async_trait]
pub trait LiteratureSource: Send + Sync {
    /// Returns the records matching `query`, in the database's order.
    async fn search(&self, query: &LiteratureQuery) -> Result<Vec<ArticleRecord>, SourceError>;
}

// ---------------------------------------------------------------------------
// Summarization backend
// ---------------------------------------------------------------------------

/// Failure reported by a [`Summarizer`].
#[derive(Debug, Error)]
pub enum SummarizerError {
    /// The backend could not be reached, or the request timed out.
    #[error("Network error: {0}")]
    Network(String),
    /// The backend rejected the request (rate limit, auth, quota); carries
    /// status and body.
    #[error("Backend error: {0}")]
    Api(String),
    /// The response carried no usable summary text.
    #[error("Malformed response: {0}")]
    Parse(String),
}

/// Produces a text summary of an abstract.
///
/// Implementations make exactly one attempt per call.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, request: &SummaryRequest) -> Result<String, SummarizerError>;
}

// ---------------------------------------------------------------------------
// Summary cache
// ---------------------------------------------------------------------------

/// Failure reported by a [`SummaryCache`].
#[derive(Debug, Error)]
#[error("Summary cache error: {0}")]
pub struct CacheError(pub String);

/// Persistent store of summaries keyed by [`SummaryKey`].
///
/// At most one entry per key; [`SummaryCache::set`] overwrites. Writes to
/// the same key are serialized; entries never expire.
pub trait SummaryCache: Send + Sync {
    fn get(&self, key: &SummaryKey) -> Result<Option<String>, CacheError>;
    fn set(&self, key: &SummaryKey, summary: &str) -> Result<(), CacheError>;
}

// ---------------------------------------------------------------------------
// Identifier ledger
// ---------------------------------------------------------------------------

/// Failure reported by an [`IdentifierLedger`].
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The ledger itself could not be read or written.
    #[error("{0}")]
    Io(String),
    /// The backup copy could not be written.
    #[error("{0}")]
    Backup(String),
}

/// Append-only set of identifiers processed by earlier runs.
pub trait IdentifierLedger: Send + Sync {
    /// Reads the ledger (an absent ledger is empty), writes a backup copy
    /// tagged with `stamp`, and returns the identifiers known right now.
    fn snapshot_and_backup(&self, stamp: &RunStamp) -> Result<SeenSet, LedgerError>;

    /// Durably records one identifier before returning.
    fn append(&self, id: &ArticleId) -> Result<(), LedgerError>;
}

// ---------------------------------------------------------------------------
// Artifact sink
// ---------------------------------------------------------------------------

/// Failure reported by an [`ArtifactSink`].
#[derive(Debug, Error)]
#[error("Artifact write error: {0}")]
pub struct SinkError(pub String);

/// Destination for a run's rendered artifacts.
pub trait ArtifactSink: Send + Sync {
    /// Persists all artifacts of one run; returns the locations written.
    fn write(&self, stamp: &RunStamp, artifacts: &RenderedArtifacts) -> Result<Vec<PathBuf>, SinkError>;
}
