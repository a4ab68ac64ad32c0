//! journal-watch literature source.
//!
//! Implements [`pipeline::LiteratureSource`] over the NCBI E-utilities:
//! `esearch` resolves the query to identifiers, `efetch` returns the records
//! as XML, which [`parse_article_set`] turns into [`pipeline::ArticleRecord`]s.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** The orchestrator only sees the trait.

mod client;
mod parse;

pub use client::{PubMedClient, DEFAULT_BASE_URL, FETCH_BATCH_SIZE};
pub use parse::parse_article_set;
