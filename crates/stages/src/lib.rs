//! journal-watch run stages.
//!
//! [`SummarizationStage`] resolves one article's summary through the cache
//! and the backend. [`RunExecutor`] sequences a whole run: query, ledger
//! snapshot, partition, cost check, per-article summarize/render/append, and
//! the final artifact write.
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** Stages sequence calls between the business logic
//! in [`pipeline`] and the port traits it defines. They contain no domain
//! rules of their own.

mod executor;
mod summarize;

pub use executor::{RunExecutor, RunPhase, RunPorts, RunReport};
pub use summarize::SummarizationStage;
