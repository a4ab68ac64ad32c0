//! journal-watch local persistence adapters.
//!
//! Implements the persistence-facing traits defined in the [`pipeline`] crate:
//!
//! - [`FileLedger`] — [`pipeline::IdentifierLedger`] over a flat text file
//!   with a timestamped backup per run.
//! - [`SqliteSummaryCache`] — [`pipeline::SummaryCache`] over an embedded
//!   SQLite database.
//! - [`FileArtifactSink`] — [`pipeline::ArtifactSink`] writing the rendered
//!   outputs into the output directory.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** This crate must not contain domain rules. File layout,
//! SQL, and durability details live here; the [`pipeline`] crate never sees
//! them.

pub mod cache;
pub mod ledger;
pub mod sink;

pub use cache::SqliteSummaryCache;
pub use ledger::FileLedger;
pub use sink::FileArtifactSink;
