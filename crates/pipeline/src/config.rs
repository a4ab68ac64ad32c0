//! Run configuration.
//!
//! [`WatchConfig`] is built once at process start (defaults, then an optional
//! TOML file, then command-line overrides) and passed by reference into every
//! component. Nothing in the workspace reads configuration from globals.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{
    CostBudget, CostGuard, InstructionVariant, ModelSpec, TokenCount, WatchError,
    ASSUMED_TOKENS_PER_ARTICLE, DEFAULT_SUMMARY_THRESHOLD,
};

/// Ledger file name inside the base directory.
pub const LEDGER_FILE_NAME: &str = "processed_pmids.txt";

/// Prefix of ledger backup files.
pub const BACKUP_PREFIX: &str = "processed_pmids-";

/// Output subdirectory inside the base directory.
pub const OUTPUT_DIRECTORY: &str = "ToReview";

/// Prefix shared by every output artifact.
pub const ARTIFACT_PREFIX: &str = "AbstractReview_";

/// Paths used by one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchPaths {
    /// Flat file of processed identifiers.
    pub ledger_file: PathBuf,
    /// Directory receiving a ledger backup per run.
    pub backup_dir: PathBuf,
    /// Directory receiving the rendered artifacts.
    pub output_dir: PathBuf,
    /// SQLite database backing the summary cache.
    pub cache_file: PathBuf,
}

impl WatchPaths {
    /// Lays out the conventional paths under `base_dir`, with backups under
    /// `data_dir` and the cache under `cache_dir`.
    pub fn conventional(base_dir: &Path, data_dir: &Path, cache_dir: &Path) -> Self {
        Self {
            ledger_file: base_dir.join(LEDGER_FILE_NAME),
            backup_dir: data_dir.join("bak"),
            output_dir: base_dir.join(OUTPUT_DIRECTORY),
            cache_file: cache_dir.join("summaries.sqlite3"),
        }
    }
}

/// Summarization settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    pub model: ModelSpec,
    pub variant: InstructionVariant,
    /// Plain abstracts with at most this many characters are not summarized.
    pub threshold_chars: usize,
    /// Maximum number of articles summarized at once.
    pub concurrency: usize,
    /// Pause before every backend call.
    #[serde(with = "duration_millis")]
    pub dispatch_delay: Duration,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            model: ModelSpec::default(),
            variant: InstructionVariant::Expert,
            threshold_chars: DEFAULT_SUMMARY_THRESHOLD,
            concurrency: 1,
            dispatch_delay: Duration::from_secs(2),
        }
    }
}

/// Cost guard settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostConfig {
    pub ceiling: CostBudget,
    pub tokens_per_article: TokenCount,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            ceiling: CostBudget::DEFAULT_CEILING,
            tokens_per_article: ASSUMED_TOKENS_PER_ARTICLE,
        }
    }
}

impl CostConfig {
    pub fn guard(&self) -> CostGuard {
        CostGuard::new(self.ceiling, self.tokens_per_article)
    }
}

/// Identification sent with every literature database request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub tool: String,
    pub email: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            tool: "journal-watch".to_string(),
            email: "not-specified@example.com".to_string(),
        }
    }
}

/// Complete configuration of one surveillance run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchConfig {
    pub paths: WatchPaths,
    #[serde(default)]
    pub summary: SummaryConfig,
    #[serde(default)]
    pub cost: CostConfig,
    #[serde(default)]
    pub source: SourceConfig,
    /// Appended to the artifact file names after the run stamp.
    #[serde(default)]
    pub output_suffix: String,
}

impl WatchConfig {
    pub fn new(paths: WatchPaths) -> Self {
        Self {
            paths,
            summary: SummaryConfig::default(),
            cost: CostConfig::default(),
            source: SourceConfig::default(),
            output_suffix: String::new(),
        }
    }

    /// Rejects settings no run can work with.
    pub fn validate(&self) -> Result<(), WatchError> {
        if self.summary.concurrency == 0 {
            return Err(WatchError::ConfigurationError {
                message: "summary concurrency must be at least 1".into(),
            });
        }
        if self.cost.tokens_per_article.as_u64() == 0 {
            return Err(WatchError::ConfigurationError {
                message: "tokens per article must be positive".into(),
            });
        }
        Ok(())
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
