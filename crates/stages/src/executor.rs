//! Run executor: the state machine driving one surveillance run.
//!
//! ```text
//! Init -> Snapshotted -> Partitioned -> CostChecked -> Processing -> Rendered -> Committed
//!   \          \                           \
//!    `----------`---------------------------`--> Aborted
//! ```
//!
//! Every fatal condition returns a [`WatchError`] from the phase it occurred
//! in. Per-article summarization problems never leave the article.

use std::path::PathBuf;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use pipeline::{
    normalize, ArtifactSink, CostGuard, IdentifierLedger, LedgerError, LiteratureQuery,
    LiteratureSource, NormalizedArticle, PriceTier, RunBatch, RunId, RunStamp, Summarizer,
    SummaryCache, SummaryOutcome, TokenCost, WatchConfig, WatchError,
};
use render::{RenderOptions, Renderer};
use serde::Serialize;
use tracing::{debug, error, info, info_span, Instrument};

use crate::SummarizationStage;

/// Phase of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Init,
    Snapshotted,
    Partitioned,
    CostChecked,
    Processing,
    Rendered,
    Committed,
    Aborted,
}

/// What one run did.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: RunId,
    pub phase: RunPhase,
    /// Records returned by the query.
    pub total: usize,
    pub seen: usize,
    pub skipped: usize,
    pub new: usize,
    /// New articles whose abstract was too short to summarize.
    pub below_threshold: usize,
    pub cache_hits: usize,
    /// Backend calls made, successful or not.
    pub cache_misses: usize,
    pub failures: usize,
    pub cost_estimate: TokenCost,
    /// Artifact files written; empty when there was nothing new.
    pub artifacts: Vec<PathBuf>,
}

impl RunReport {
    fn new(run_id: RunId) -> Self {
        Self {
            run_id,
            phase: RunPhase::Init,
            total: 0,
            seen: 0,
            skipped: 0,
            new: 0,
            below_threshold: 0,
            cache_hits: 0,
            cache_misses: 0,
            failures: 0,
            cost_estimate: TokenCost::zero(),
            artifacts: Vec::new(),
        }
    }

    fn advance(&mut self, next: RunPhase) {
        debug!(from = ?self.phase, to = ?next, "Run phase transition");
        self.phase = next;
    }

    fn abort(&mut self, err: WatchError) -> WatchError {
        error!(phase = ?self.phase, error = %err, "Run aborted");
        self.phase = RunPhase::Aborted;
        err
    }

    fn record(&mut self, outcome: Option<&SummaryOutcome>) {
        match outcome {
            None => self.below_threshold += 1,
            Some(SummaryOutcome::Cached(_)) => self.cache_hits += 1,
            Some(SummaryOutcome::Generated(_)) => self.cache_misses += 1,
            Some(SummaryOutcome::Failed) => {
                self.cache_misses += 1;
                self.failures += 1;
            }
        }
    }
}

/// Adapters a run talks to.
pub struct RunPorts {
    pub source: Arc<dyn LiteratureSource>,
    pub summarizer: Arc<dyn Summarizer>,
    pub cache: Arc<dyn SummaryCache>,
    pub ledger: Arc<dyn IdentifierLedger>,
    pub sink: Arc<dyn ArtifactSink>,
}

fn ledger_error(err: LedgerError) -> WatchError {
    match err {
        LedgerError::Io(message) => WatchError::LedgerUnavailable { message },
        LedgerError::Backup(message) => WatchError::BackupFailed { message },
    }
}

/// Drives runs against one set of ports and one configuration.
pub struct RunExecutor {
    source: Arc<dyn LiteratureSource>,
    ledger: Arc<dyn IdentifierLedger>,
    sink: Arc<dyn ArtifactSink>,
    stage: SummarizationStage,
    renderer: Renderer,
    guard: CostGuard,
    tier: PriceTier,
    concurrency: usize,
}

impl RunExecutor {
    pub fn new(config: &WatchConfig, ports: RunPorts) -> Self {
        Self {
            source: ports.source,
            ledger: ports.ledger,
            sink: ports.sink,
            stage: SummarizationStage::new(ports.summarizer, ports.cache, &config.summary),
            renderer: Renderer::new(RenderOptions::for_model(&config.summary.model)),
            guard: config.cost.guard(),
            tier: config.summary.model.price_tier(),
            concurrency: config.summary.concurrency.max(1),
        }
    }

    /// Executes one run for `query`, stamping backups and artifacts with `stamp`.
    pub async fn execute(
        &self,
        query: &LiteratureQuery,
        stamp: &RunStamp,
    ) -> Result<RunReport, WatchError> {
        let run_id = RunId::new_random();
        let span = info_span!("run", run_id = %run_id, stamp = %stamp);
        self.run(RunReport::new(run_id), query, stamp)
            .instrument(span)
            .await
    }

    async fn run(
        &self,
        mut report: RunReport,
        query: &LiteratureQuery,
        stamp: &RunStamp,
    ) -> Result<RunReport, WatchError> {
        info!(query = %query, max_results = query.max_results, days = query.recency_days, "Searching");
        let records = match self.source.search(query).await {
            Ok(records) => records,
            Err(e) => {
                return Err(report.abort(WatchError::SourceFailed {
                    message: e.to_string(),
                }))
            }
        };

        let snapshot = match self.ledger.snapshot_and_backup(stamp) {
            Ok(snapshot) => snapshot,
            Err(e) => return Err(report.abort(ledger_error(e))),
        };
        report.advance(RunPhase::Snapshotted);

        let batch = RunBatch::partition(records, &snapshot);
        report.total = batch.total();
        report.seen = batch.seen.len();
        report.skipped = batch.skippable.len();
        report.new = batch.new.len();
        info!(
            total = report.total,
            seen = report.seen,
            skipped = report.skipped,
            new = report.new,
            "Partitioned query results"
        );
        report.advance(RunPhase::Partitioned);

        let decision = self.guard.evaluate(batch.new.len(), self.tier);
        report.cost_estimate = decision.estimate;
        if !decision.proceed {
            return Err(report.abort(WatchError::CostCeilingExceeded {
                estimate: decision.estimate,
                ceiling: self.guard.ceiling,
            }));
        }
        info!(estimate = %decision.estimate, articles = batch.new.len(), "Cost check passed");
        report.advance(RunPhase::CostChecked);

        report.advance(RunPhase::Processing);
        let articles: Vec<NormalizedArticle> = batch.new.into_iter().map(normalize).collect();
        let stage = &self.stage;
        let mut outcomes = stream::iter(articles.iter())
            .map(|article| async move { (article, stage.summarize(article).await) })
            .buffered(self.concurrency);

        let mut session = self.renderer.session();
        while let Some((article, outcome)) = outcomes.next().await {
            report.record(outcome.as_ref());
            session.push(article, outcome.as_ref());
            if let Err(e) = self.ledger.append(article.id()) {
                return Err(report.abort(ledger_error(e)));
            }
        }

        let artifacts = match session.finish() {
            Ok(artifacts) => artifacts,
            Err(e) => return Err(report.abort(e.into())),
        };
        report.advance(RunPhase::Rendered);

        match artifacts {
            Some(artifacts) => match self.sink.write(stamp, &artifacts) {
                Ok(paths) => report.artifacts = paths,
                Err(e) => {
                    return Err(report.abort(WatchError::ArtifactWriteFailed {
                        message: e.to_string(),
                    }))
                }
            },
            None => info!("No new articles; nothing written"),
        }
        report.advance(RunPhase::Committed);

        info!(
            new = report.new,
            cache_hits = report.cache_hits,
            cache_misses = report.cache_misses,
            failures = report.failures,
            artifacts = report.artifacts.len(),
            "Run complete"
        );
        Ok(report)
    }
}
