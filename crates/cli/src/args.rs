//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Console log encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Watch journals for new articles and write review documents with AI summaries.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "journal-watch", version, about)]
pub struct Args {
    /// TOML settings file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Look back this many days for new articles.
    #[arg(short, long, value_name = "DAYS")]
    pub lookback: Option<u32>,

    /// OpenAI API key. Never saved.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Base directory holding the ledger and the ToReview folder.
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Summarization model id, e.g. gpt-3.5-turbo or gpt-4.
    #[arg(short, long)]
    pub model: Option<String>,

    /// Journal to include, by abbreviation (see --list-journals) or database
    /// name. Repeatable.
    #[arg(short, long = "journal", value_name = "JOURNAL")]
    pub journals: Vec<String>,

    /// Additional query in PubMed search syntax.
    #[arg(short, long)]
    pub query: Option<String>,

    /// Maximum number of query results.
    #[arg(long)]
    pub max_results: Option<u32>,

    /// Phrase summaries for a lay audience.
    #[arg(long)]
    pub lay: bool,

    /// Use the offline summarizer instead of the OpenAI backend.
    #[arg(long)]
    pub offline: bool,

    /// Appended to every output file name.
    #[arg(long)]
    pub suffix: Option<String>,

    /// Print the run report as JSON.
    #[arg(long)]
    pub report_json: bool,

    /// List the common journals and exit.
    #[arg(long)]
    pub list_journals: bool,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// OTLP collector endpoint; tracing export is off when unset.
    #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_is_well_formed() {
        Args::command().debug_assert();
    }

    #[test]
    fn journals_repeat() {
        let args = Args::try_parse_from([
            "journal-watch",
            "-j",
            "jama",
            "--journal",
            "nejm",
            "--lookback",
            "14",
        ])
        .unwrap();
        assert_eq!(args.journals, ["jama", "nejm"]);
        assert_eq!(args.lookback, Some(14));
        assert_eq!(args.log_format, LogFormat::Text);
    }
}
