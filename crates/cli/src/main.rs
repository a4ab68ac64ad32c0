//! journal-watch CLI entry point.
//!
//! This binary is the composition root for the entire system. Responsibilities:
//!
//! 1. **Resolve settings**: defaults, `--config` file, the last run's
//!    settings, then command-line flags, resolved once into a
//!    [`pipeline::WatchConfig`] and a [`pipeline::LiteratureQuery`].
//! 2. **Wire observability**: console and file `tracing` layers plus an
//!    optional OpenTelemetry OTLP exporter.
//! 3. **Construct infrastructure**: PubMed client, summarizer (OpenAI or
//!    offline), SQLite cache, file ledger and artifact sink, injected into
//!    [`stages::RunExecutor`].
//! 4. **Report**: print the run counts and written files; any fatal error
//!    exits non-zero with its message.

mod args;
mod settings;
mod telemetry;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use llm::{OpenAiSummarizer, TruncatingSummarizer};
use pipeline::{Summarizer, SummaryCache, Timestamp, WatchConfig, COMMON_JOURNALS};
use pubmed::PubMedClient;
use stages::{RunExecutor, RunPorts, RunReport};
use store::{FileArtifactSink, FileLedger, SqliteSummaryCache};
use tracing::{error, info, warn};

use args::Args;
use settings::{Settings, UserDirs};

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    if args.list_journals {
        for journal in COMMON_JOURNALS {
            println!("{:<10} {}", journal.abbreviation, journal.display_name);
        }
        return ExitCode::SUCCESS;
    }

    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args) -> Result<()> {
    let dirs = UserDirs::discover()?;
    let telemetry = telemetry::init(args.log_format, &dirs.log, args.otlp_endpoint.as_deref())?;
    let result = watch(args, &dirs).await;
    if let Err(e) = &result {
        error!(error = %format!("{e:#}"), "journal-watch failed");
    }
    telemetry.shutdown();
    result
}

/// Summarizer and cache for the run. Offline output is not a model summary,
/// so it goes to a throwaway cache and the persistent one is never opened.
fn summary_backend(
    args: &Args,
    config: &WatchConfig,
) -> Result<(Arc<dyn Summarizer>, Arc<dyn SummaryCache>)> {
    if args.offline {
        info!("Using the offline summarizer; summaries will not be cached");
        return Ok((
            Arc::new(TruncatingSummarizer),
            Arc::new(SqliteSummaryCache::open_in_memory()?),
        ));
    }
    let key = args
        .api_key
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .context("No API key specified; pass --api-key, set OPENAI_API_KEY, or use --offline")?;
    Ok((
        Arc::new(OpenAiSummarizer::new(key)?),
        Arc::new(SqliteSummaryCache::open(&config.paths.cache_file)?),
    ))
}

async fn watch(args: &Args, dirs: &UserDirs) -> Result<()> {
    let file_settings = match args.config.as_deref() {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    let last_run_file = dirs.last_run_file();
    let settings = file_settings
        .merge(Settings::load_or_default(&last_run_file))
        .merge(Settings::from_args(args));

    let (config, query) = settings::resolve(&settings, dirs)?;
    if let Err(e) = settings.last_run().save(&last_run_file) {
        warn!(error = %format!("{e:#}"), "Could not save last-run settings");
    }
    info!(
        model = %config.summary.model.id,
        query = %query,
        days = query.recency_days,
        base = %config.paths.ledger_file.display(),
        "Starting run"
    );

    let (summarizer, cache) = summary_backend(args, &config)?;
    let ports = RunPorts {
        source: Arc::new(PubMedClient::new(&config.source)?),
        summarizer,
        cache,
        ledger: Arc::new(FileLedger::new(
            &config.paths.ledger_file,
            &config.paths.backup_dir,
        )),
        sink: Arc::new(FileArtifactSink::new(
            &config.paths.output_dir,
            config.output_suffix.as_str(),
        )),
    };

    let stamp = Timestamp::now().run_stamp();
    let report = RunExecutor::new(&config, ports).execute(&query, &stamp).await?;
    print_report(&report);
    if args.report_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}

fn print_report(report: &RunReport) {
    println!("New: {}", report.new);
    println!("Skipped: {}", report.skipped);
    println!("Already seen: {}", report.seen);
    if report.artifacts.is_empty() {
        println!("No updates to write");
    }
    for path in &report.artifacts {
        println!("Wrote {}", path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use pipeline::{
        AbstractSection, ArticleId, ArticleRecord, Author, InstructionVariant, LiteratureQuery,
        LiteratureSource, SourceError, SummarizerError, SummaryKey, SummaryRequest, WatchPaths,
    };
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    struct StaticSource(Vec<ArticleRecord>);

    #[async_trait]
    impl LiteratureSource for StaticSource {
        async fn search(&self, _query: &LiteratureQuery) -> Result<Vec<ArticleRecord>, SourceError> {
            Ok(self.0.clone())
        }
    }

    #[derive(Default)]
    struct CountingSummarizer {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Summarizer for CountingSummarizer {
        async fn summarize(&self, request: &SummaryRequest) -> Result<String, SummarizerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("Summary of {}.", request.key.article))
        }
    }

    fn long_record(id: &str) -> ArticleRecord {
        ArticleRecord {
            id: ArticleId::new(id).unwrap(),
            title: format!("Article {id}"),
            journal: "JAMA".into(),
            doi: None,
            publication_date: "2024-01-15".into(),
            abstract_text: Some("a".repeat(900)),
            structured_abstract: Some(vec![
                AbstractSection::new("Background", "word ".repeat(100)),
                AbstractSection::new("Results", "word ".repeat(100)),
            ]),
            authors: vec![Author {
                last_name: "Smith".into(),
                first_name: "Jane".into(),
                initials: "J".into(),
            }],
        }
    }

    /// Base directories differ per run; the cache directory is shared.
    fn config(root: &Path, base: &str) -> WatchConfig {
        let base = root.join(base);
        let mut config = WatchConfig::new(WatchPaths::conventional(
            &base,
            &base.join("data"),
            &root.join("cache"),
        ));
        config.summary.dispatch_delay = Duration::ZERO;
        config
    }

    fn ports(
        config: &WatchConfig,
        summarizer: Arc<dyn Summarizer>,
        cache: Arc<dyn SummaryCache>,
    ) -> RunPorts {
        RunPorts {
            source: Arc::new(StaticSource(vec![long_record("1")])),
            summarizer,
            cache,
            ledger: Arc::new(FileLedger::new(
                &config.paths.ledger_file,
                &config.paths.backup_dir,
            )),
            sink: Arc::new(FileArtifactSink::new(&config.paths.output_dir, "")),
        }
    }

    #[test]
    fn online_mode_requires_an_api_key() {
        let dir = TempDir::new().unwrap();
        let config = config(dir.path(), "real");
        assert!(summary_backend(&Args::default(), &config).is_err());
    }

    #[tokio::test]
    async fn offline_run_leaves_the_summary_cache_alone() {
        let dir = TempDir::new().unwrap();
        let query = LiteratureQuery::compose(&["JAMA"], None, 1000, 7).unwrap();

        let dry = config(dir.path(), "dry");
        let offline = Args {
            offline: true,
            ..Args::default()
        };
        let (summarizer, cache) = summary_backend(&offline, &dry).unwrap();
        let report = RunExecutor::new(&dry, ports(&dry, summarizer, cache))
            .execute(&query, &Timestamp::now().run_stamp())
            .await
            .unwrap();
        assert_eq!(report.new, 1);
        assert_eq!(report.cache_misses, 1);
        assert!(!dry.paths.cache_file.exists());

        let real = config(dir.path(), "real");
        let online = Args {
            api_key: Some("test-key".into()),
            ..Args::default()
        };
        let (_, cache) = summary_backend(&online, &real).unwrap();
        let backend = Arc::new(CountingSummarizer::default());
        let report = RunExecutor::new(&real, ports(&real, backend.clone(), cache.clone()))
            .execute(&query, &Timestamp::now().run_stamp())
            .await
            .unwrap();

        assert_eq!(report.cache_hits, 0);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
        let key = SummaryKey::new(
            ArticleId::new("1").unwrap(),
            real.summary.model.id.clone(),
            InstructionVariant::Expert,
        );
        assert_eq!(cache.get(&key).unwrap().as_deref(), Some("Summary of 1."));
    }
}
