//! End-to-end runs against the real file ledger, SQLite cache and file sink,
//! with in-memory doubles for the literature source and the backend.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pipeline::{
    AbstractSection, ArticleId, ArticleRecord, ArtifactSink, Author, CostBudget, LedgerError,
    LiteratureQuery, LiteratureSource, RenderedArtifacts, RunStamp, SeenSet, SinkError,
    SourceError, Summarizer, SummarizerError, SummaryRequest, WatchConfig, WatchError, WatchPaths,
    SUMMARY_FAILURE_TEXT,
};
use pretty_assertions::assert_eq;
use stages::{RunExecutor, RunPhase, RunPorts};
use store::{FileArtifactSink, FileLedger, SqliteSummaryCache};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Doubles
// ---------------------------------------------------------------------------

struct StaticSource {
    records: Vec<ArticleRecord>,
}

#[async_trait]
impl LiteratureSource for StaticSource {
    async fn search(&self, _query: &LiteratureQuery) -> Result<Vec<ArticleRecord>, SourceError> {
        Ok(self.records.clone())
    }
}

struct DownSource;

#[async_trait]
impl LiteratureSource for DownSource {
    async fn search(&self, _query: &LiteratureQuery) -> Result<Vec<ArticleRecord>, SourceError> {
        Err(SourceError::Network("connection refused".into()))
    }
}

/// Fails for the listed article ids, answers for everything else.
#[derive(Default)]
struct ScriptedSummarizer {
    failing: HashSet<String>,
    calls: AtomicUsize,
}

impl ScriptedSummarizer {
    fn failing(ids: &[&str]) -> Self {
        Self {
            failing: ids.iter().map(|s| s.to_string()).collect(),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Summarizer for ScriptedSummarizer {
    async fn summarize(&self, request: &SummaryRequest) -> Result<String, SummarizerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(request.key.article.as_str()) {
            return Err(SummarizerError::Network("timeout".into()));
        }
        Ok(format!("Summary of {}.", request.key.article))
    }
}

#[derive(Default)]
struct RecordingSink {
    writes: Mutex<Vec<RenderedArtifacts>>,
}

impl RecordingSink {
    fn write_count(&self) -> usize {
        self.writes.lock().unwrap().len()
    }
}

impl ArtifactSink for RecordingSink {
    fn write(
        &self,
        _stamp: &RunStamp,
        artifacts: &RenderedArtifacts,
    ) -> Result<Vec<std::path::PathBuf>, SinkError> {
        self.writes.lock().unwrap().push(artifacts.clone());
        Ok(Vec::new())
    }
}

struct BrokenBackupLedger {
    appends: AtomicUsize,
}

impl pipeline::IdentifierLedger for BrokenBackupLedger {
    fn snapshot_and_backup(&self, _stamp: &RunStamp) -> Result<SeenSet, LedgerError> {
        Err(LedgerError::Backup("disk full".into()))
    }

    fn append(&self, _id: &ArticleId) -> Result<(), LedgerError> {
        self.appends.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn record(id: &str, abstract_chars: Option<usize>) -> ArticleRecord {
    ArticleRecord {
        id: ArticleId::new(id).unwrap(),
        title: format!("Article {id}"),
        journal: "JAMA".into(),
        doi: Some(format!("10.1001/{id}")),
        publication_date: "2024-01-15".into(),
        abstract_text: abstract_chars.map(|n| "a".repeat(n)),
        structured_abstract: abstract_chars.map(|n| {
            vec![
                AbstractSection::new("Background", "b".repeat(n / 2)),
                AbstractSection::new("Results", "r".repeat(n / 2)),
            ]
        }),
        authors: vec![Author {
            last_name: "Smith".into(),
            first_name: "Jane".into(),
            initials: "J".into(),
        }],
    }
}

fn config(base: &Path) -> WatchConfig {
    let mut config = WatchConfig::new(WatchPaths::conventional(
        base,
        &base.join("data"),
        &base.join("cache"),
    ));
    config.summary.dispatch_delay = Duration::ZERO;
    config
}

fn query() -> LiteratureQuery {
    LiteratureQuery::compose(&["JAMA"], None, 1000, 7).unwrap()
}

fn ledger_lines(config: &WatchConfig) -> Vec<String> {
    fs::read_to_string(&config.paths.ledger_file)
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

struct Harness {
    config: WatchConfig,
    summarizer: Arc<ScriptedSummarizer>,
    cache: Arc<SqliteSummaryCache>,
    sink: Arc<RecordingSink>,
}

impl Harness {
    fn new(dir: &TempDir, summarizer: ScriptedSummarizer) -> Self {
        let config = config(dir.path());
        let cache = Arc::new(SqliteSummaryCache::open(&config.paths.cache_file).unwrap());
        Self {
            config,
            summarizer: Arc::new(summarizer),
            cache,
            sink: Arc::new(RecordingSink::default()),
        }
    }

    fn executor(&self, records: Vec<ArticleRecord>) -> RunExecutor {
        RunExecutor::new(
            &self.config,
            RunPorts {
                source: Arc::new(StaticSource { records }),
                summarizer: self.summarizer.clone(),
                cache: self.cache.clone(),
                ledger: Arc::new(FileLedger::new(
                    &self.config.paths.ledger_file,
                    &self.config.paths.backup_dir,
                )),
                sink: self.sink.clone(),
            },
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn second_identical_run_has_nothing_new_and_no_misses() {
    let dir = TempDir::new().unwrap();
    let h = Harness::new(&dir, ScriptedSummarizer::default());
    let records = vec![record("1", Some(1200)), record("2", Some(1000)), record("3", Some(100))];

    let first = h
        .executor(records.clone())
        .execute(&query(), &RunStamp::new("run-1"))
        .await
        .unwrap();
    assert_eq!(first.new, 3);
    assert_eq!(first.cache_misses, 2);
    assert_eq!(first.below_threshold, 1);
    assert_eq!(first.phase, RunPhase::Committed);
    assert_eq!(ledger_lines(&h.config), ["1", "2", "3"]);

    let second = h
        .executor(records)
        .execute(&query(), &RunStamp::new("run-2"))
        .await
        .unwrap();
    assert_eq!(second.new, 0);
    assert_eq!(second.seen, 3);
    assert_eq!(second.cache_misses, 0);
    assert_eq!(h.summarizer.calls(), 2);
    assert_eq!(h.sink.write_count(), 1);
}

#[tokio::test]
async fn cached_summaries_are_reused_across_runs() {
    let dir = TempDir::new().unwrap();
    let h = Harness::new(&dir, ScriptedSummarizer::default());

    h.executor(vec![record("7", Some(2000))])
        .execute(&query(), &RunStamp::new("run-1"))
        .await
        .unwrap();
    // Drop the ledger so the article is new again but its summary is cached.
    fs::remove_file(&h.config.paths.ledger_file).unwrap();

    let report = h
        .executor(vec![record("7", Some(2000))])
        .execute(&query(), &RunStamp::new("run-2"))
        .await
        .unwrap();
    assert_eq!(report.new, 1);
    assert_eq!(report.cache_hits, 1);
    assert_eq!(report.cache_misses, 0);
    assert_eq!(h.summarizer.calls(), 1);
}

#[tokio::test]
async fn cost_ceiling_aborts_before_any_work() {
    let dir = TempDir::new().unwrap();
    let mut h = Harness::new(&dir, ScriptedSummarizer::default());
    // 2 articles x 800 tokens x 0.002 / 1000 = 0.0032
    h.config.cost.ceiling = CostBudget::new(0.003).unwrap();

    let err = h
        .executor(vec![record("1", Some(1200)), record("2", Some(1200))])
        .execute(&query(), &RunStamp::new("run-1"))
        .await
        .unwrap_err();

    assert!(matches!(err, WatchError::CostCeilingExceeded { .. }));
    assert_eq!(h.summarizer.calls(), 0);
    assert_eq!(h.sink.write_count(), 0);
    assert!(ledger_lines(&h.config).is_empty());
}

#[tokio::test]
async fn nothing_new_writes_no_artifacts() {
    let dir = TempDir::new().unwrap();
    let h = Harness::new(&dir, ScriptedSummarizer::default());

    let report = h
        .executor(vec![record("9", None)])
        .execute(&query(), &RunStamp::new("run-1"))
        .await
        .unwrap();

    assert_eq!(report.skipped, 1);
    assert_eq!(report.new, 0);
    assert!(report.artifacts.is_empty());
    assert_eq!(report.phase, RunPhase::Committed);
    assert_eq!(h.sink.write_count(), 0);
}

#[tokio::test]
async fn skippable_articles_are_not_recorded() {
    let dir = TempDir::new().unwrap();
    let h = Harness::new(&dir, ScriptedSummarizer::default());

    h.executor(vec![record("1", Some(100)), record("2", None)])
        .execute(&query(), &RunStamp::new("run-1"))
        .await
        .unwrap();
    assert_eq!(ledger_lines(&h.config), ["1"]);

    // The article gains an abstract and is picked up on the next run.
    let report = h
        .executor(vec![record("1", Some(100)), record("2", Some(100))])
        .execute(&query(), &RunStamp::new("run-2"))
        .await
        .unwrap();
    assert_eq!(report.seen, 1);
    assert_eq!(report.new, 1);
    assert_eq!(ledger_lines(&h.config), ["1", "2"]);
}

#[tokio::test]
async fn backend_failure_degrades_one_article_and_is_retried_later() {
    let dir = TempDir::new().unwrap();
    let h = Harness::new(&dir, ScriptedSummarizer::failing(&["2"]));

    let report = h
        .executor(vec![record("1", Some(1200)), record("2", Some(1200))])
        .execute(&query(), &RunStamp::new("run-1"))
        .await
        .unwrap();

    assert_eq!(report.failures, 1);
    assert_eq!(report.cache_misses, 2);
    assert_eq!(ledger_lines(&h.config), ["1", "2"]);
    assert_eq!(h.cache.len().unwrap(), 1);

    let writes = h.sink.writes.lock().unwrap();
    assert!(writes[0].full_markdown.contains(SUMMARY_FAILURE_TEXT));
    assert!(writes[0].full_markdown.contains("Summary of 1."));
}

#[tokio::test]
async fn articles_render_in_query_order_with_concurrency() {
    let dir = TempDir::new().unwrap();
    let mut h = Harness::new(&dir, ScriptedSummarizer::default());
    h.config.summary.concurrency = 4;
    let ids = ["5", "3", "8", "1", "9"];

    h.executor(ids.iter().map(|id| record(id, Some(1200))).collect())
        .execute(&query(), &RunStamp::new("run-1"))
        .await
        .unwrap();

    assert_eq!(ledger_lines(&h.config), ids);
    let writes = h.sink.writes.lock().unwrap();
    let positions: Vec<usize> = ids
        .iter()
        .map(|id| writes[0].full_markdown.find(&format!("## Article {id}")).unwrap())
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
}

#[tokio::test]
async fn backup_failure_aborts_without_appending() {
    let dir = TempDir::new().unwrap();
    let config = config(dir.path());
    let ledger = Arc::new(BrokenBackupLedger {
        appends: AtomicUsize::new(0),
    });
    let summarizer = Arc::new(ScriptedSummarizer::default());

    let executor = RunExecutor::new(
        &config,
        RunPorts {
            source: Arc::new(StaticSource {
                records: vec![record("1", Some(1200))],
            }),
            summarizer: summarizer.clone(),
            cache: Arc::new(SqliteSummaryCache::open_in_memory().unwrap()),
            ledger: ledger.clone(),
            sink: Arc::new(RecordingSink::default()),
        },
    );

    let err = executor
        .execute(&query(), &RunStamp::new("run-1"))
        .await
        .unwrap_err();
    assert!(matches!(err, WatchError::BackupFailed { .. }));
    assert_eq!(ledger.appends.load(Ordering::SeqCst), 0);
    assert_eq!(summarizer.calls(), 0);
}

#[tokio::test]
async fn source_failure_is_fatal() {
    let dir = TempDir::new().unwrap();
    let config = config(dir.path());
    let executor = RunExecutor::new(
        &config,
        RunPorts {
            source: Arc::new(DownSource),
            summarizer: Arc::new(ScriptedSummarizer::default()),
            cache: Arc::new(SqliteSummaryCache::open_in_memory().unwrap()),
            ledger: Arc::new(FileLedger::new(
                &config.paths.ledger_file,
                &config.paths.backup_dir,
            )),
            sink: Arc::new(RecordingSink::default()),
        },
    );

    let err = executor
        .execute(&query(), &RunStamp::new("run-1"))
        .await
        .unwrap_err();
    assert!(matches!(err, WatchError::SourceFailed { .. }));
}

#[tokio::test]
async fn file_sink_and_backup_land_on_disk() {
    let dir = TempDir::new().unwrap();
    let config = config(dir.path());
    let ledger = FileLedger::new(&config.paths.ledger_file, &config.paths.backup_dir);
    let stamp = RunStamp::new("2024-05-01T08-00-00_000001");
    let backup = ledger.backup_path(&stamp);

    let executor = RunExecutor::new(
        &config,
        RunPorts {
            source: Arc::new(StaticSource {
                records: vec![record("1", Some(1200))],
            }),
            summarizer: Arc::new(llm::TruncatingSummarizer),
            cache: Arc::new(SqliteSummaryCache::open(&config.paths.cache_file).unwrap()),
            ledger: Arc::new(ledger),
            sink: Arc::new(FileArtifactSink::new(&config.paths.output_dir, "")),
        },
    );

    let report = executor.execute(&query(), &stamp).await.unwrap();

    assert!(backup.exists());
    assert_eq!(report.artifacts.len(), 4);
    let digest = fs::read_to_string(
        config
            .paths
            .output_dir
            .join("AbstractReview_2024-05-01T08-00-00_000001_simple.md"),
    )
    .unwrap();
    assert!(digest.starts_with("## Article 1\nSmith, Jane J"));
    assert!(digest.contains("### GPT-3.5 Summary\n"));
}
