//! Settings layering: defaults, settings file, last run, command line.
//!
//! Every layer is a [`Settings`] value where `None` (or an empty list) means
//! "not set here". Layers are merged lowest precedence first and the result
//! is resolved once into a [`WatchConfig`] and a [`LiteratureQuery`].

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use pipeline::{
    CostBudget, InstructionVariant, Journal, LiteratureQuery, ModelId, ModelSpec, WatchConfig,
    WatchError, WatchPaths, DEFAULT_MAX_RESULTS, DEFAULT_RECENCY_DAYS,
};
use serde::{Deserialize, Serialize};

use crate::args::Args;

/// File holding the previous run's non-secret settings.
pub const LAST_RUN_FILE: &str = "last_run.toml";

const APP_DIR: &str = "journal-watch";

/// One layer of settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub lookback_days: Option<u32>,
    pub base_dir: Option<PathBuf>,
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub journals: Vec<String>,
    pub query: Option<String>,
    pub max_results: Option<u32>,
    pub output_suffix: Option<String>,
    pub lay: Option<bool>,
    pub cost_ceiling: Option<f64>,
    pub summary_threshold: Option<usize>,
    pub concurrency: Option<usize>,
    pub dispatch_delay_ms: Option<u64>,
    pub ncbi_tool: Option<String>,
    pub ncbi_email: Option<String>,
}

impl Settings {
    /// Reads a settings file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading settings file {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing settings file {}", path.display()))
    }

    /// Reads a settings file, treating a missing or unreadable file as empty.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(settings) => settings,
            Err(e) => {
                if path.exists() {
                    tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable settings");
                }
                Self::default()
            }
        }
    }

    /// The command-line layer.
    pub fn from_args(args: &Args) -> Self {
        Self {
            lookback_days: args.lookback,
            base_dir: args.output_dir.clone(),
            model: args.model.clone(),
            journals: args.journals.clone(),
            query: args.query.clone(),
            max_results: args.max_results,
            output_suffix: args.suffix.clone(),
            lay: args.lay.then_some(true),
            ..Self::default()
        }
    }

    /// Overlays `other` on `self`; values set in `other` win.
    pub fn merge(self, other: Settings) -> Settings {
        Settings {
            lookback_days: other.lookback_days.or(self.lookback_days),
            base_dir: other.base_dir.or(self.base_dir),
            model: other.model.or(self.model),
            journals: if other.journals.is_empty() {
                self.journals
            } else {
                other.journals
            },
            query: other.query.or(self.query),
            max_results: other.max_results.or(self.max_results),
            output_suffix: other.output_suffix.or(self.output_suffix),
            lay: other.lay.or(self.lay),
            cost_ceiling: other.cost_ceiling.or(self.cost_ceiling),
            summary_threshold: other.summary_threshold.or(self.summary_threshold),
            concurrency: other.concurrency.or(self.concurrency),
            dispatch_delay_ms: other.dispatch_delay_ms.or(self.dispatch_delay_ms),
            ncbi_tool: other.ncbi_tool.or(self.ncbi_tool),
            ncbi_email: other.ncbi_email.or(self.ncbi_email),
        }
    }

    /// The subset remembered for the next run.
    pub fn last_run(&self) -> Settings {
        Settings {
            lookback_days: self.lookback_days,
            base_dir: self.base_dir.clone(),
            model: self.model.clone(),
            journals: self.journals.clone(),
            query: self.query.clone(),
            ..Settings::default()
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let text = toml::to_string(self).context("serializing settings")?;
        fs::write(path, text).with_context(|| format!("writing {}", path.display()))
    }
}

/// Per-user directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDirs {
    pub data: PathBuf,
    pub cache: PathBuf,
    pub log: PathBuf,
}

impl UserDirs {
    pub fn discover() -> Result<Self> {
        let data = dirs::data_dir()
            .context("no per-user data directory on this platform")?
            .join(APP_DIR);
        let cache = dirs::cache_dir()
            .context("no per-user cache directory on this platform")?
            .join(APP_DIR);
        let log = dirs::state_dir()
            .map(|d| d.join(APP_DIR))
            .unwrap_or_else(|| data.join("logs"));
        Ok(Self { data, cache, log })
    }

    pub fn last_run_file(&self) -> PathBuf {
        self.data.join(LAST_RUN_FILE)
    }
}

/// Maps a journal argument to the name the database indexes it under.
fn journal_database_name(journal: &str) -> String {
    Journal::by_abbreviation(journal)
        .map(|j| j.database_name.to_string())
        .unwrap_or_else(|| journal.to_string())
}

fn model_spec(id: &str) -> Result<ModelSpec, WatchError> {
    if let Some(spec) = ModelSpec::known(id) {
        return Ok(spec);
    }
    ModelId::new(id)
        .map(|model| ModelSpec::new(model, id.trim()))
        .ok_or_else(|| WatchError::ConfigurationError {
            message: "model id must not be empty".into(),
        })
}

/// Builds the run configuration and query from merged settings.
pub fn resolve(settings: &Settings, dirs: &UserDirs) -> Result<(WatchConfig, LiteratureQuery), WatchError> {
    let base_dir = settings.base_dir.clone().unwrap_or_else(|| PathBuf::from("."));
    let mut config = WatchConfig::new(WatchPaths::conventional(&base_dir, &dirs.data, &dirs.cache));

    if let Some(model) = settings.model.as_deref() {
        config.summary.model = model_spec(model)?;
    }
    if settings.lay == Some(true) {
        config.summary.variant = InstructionVariant::Lay;
    }
    if let Some(threshold) = settings.summary_threshold {
        config.summary.threshold_chars = threshold;
    }
    if let Some(concurrency) = settings.concurrency {
        config.summary.concurrency = concurrency;
    }
    if let Some(ms) = settings.dispatch_delay_ms {
        config.summary.dispatch_delay = std::time::Duration::from_millis(ms);
    }
    if let Some(ceiling) = settings.cost_ceiling {
        config.cost.ceiling = CostBudget::new(ceiling).ok_or_else(|| WatchError::ConfigurationError {
            message: format!("cost ceiling must be positive, got {ceiling}"),
        })?;
    }
    if let Some(suffix) = settings.output_suffix.clone() {
        config.output_suffix = suffix;
    }
    if let Some(tool) = settings.ncbi_tool.clone() {
        config.source.tool = tool;
    }
    if let Some(email) = settings.ncbi_email.clone() {
        config.source.email = email;
    }
    config.validate()?;

    let journals: Vec<String> = settings
        .journals
        .iter()
        .map(|j| journal_database_name(j))
        .collect();
    let query = LiteratureQuery::compose(
        journals.as_slice(),
        settings.query.as_deref(),
        settings.max_results.unwrap_or(DEFAULT_MAX_RESULTS),
        settings.lookback_days.unwrap_or(DEFAULT_RECENCY_DAYS),
    )?;

    Ok((config, query))
}
