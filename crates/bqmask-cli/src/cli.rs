//! CLI argument definitions.

use std::path::PathBuf;

use bqmask_cli::config::RawSettings;
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "bqmask",
    version,
    about = "Mask BigQuery datasets into a separate project",
    long_about = "Copy every table of the given datasets into a target project, replacing \
                  each column with a deterministic masked value.\n\n\
                  Integers, numerics and floats are fingerprinted, strings and bytes are \
                  SHA-256 hashed. Columns of other types are copied unmasked and reported."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Mask the datasets into the target project.
    Run(MaskArgs),

    /// Show the masking of every table without submitting any job.
    Plan(PlanArgs),
}

#[derive(Args)]
pub struct MaskArgs {
    /// TOML file with default settings; flags take precedence.
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Project the datasets are read from. Jobs run in this project.
    #[arg(long = "source-project", value_name = "PROJECT")]
    pub source_project: Option<String>,

    /// Project the masked tables are written to. Must differ from the source.
    #[arg(long = "target-project", value_name = "PROJECT")]
    pub target_project: Option<String>,

    /// Dataset to mask (repeatable, or comma separated).
    #[arg(long = "dataset", value_name = "DATASET", value_delimiter = ',')]
    pub datasets: Vec<String>,

    /// What to do when a destination table exists: truncate, fail-if-exists or append.
    #[arg(long = "write-disposition", value_name = "POLICY")]
    pub write_disposition: Option<String>,

    /// Tables of one dataset processed at the same time [default: 16].
    #[arg(long = "table-concurrency", value_name = "N")]
    pub table_concurrency: Option<usize>,

    /// Delay between job status checks, in milliseconds [default: 1000].
    #[arg(long = "poll-interval-ms", value_name = "MS")]
    pub poll_interval_ms: Option<u64>,

    /// BigQuery REST endpoint.
    #[arg(long = "api-base", value_name = "URL")]
    pub api_base: Option<String>,

    /// OAuth2 access token, e.g. from `gcloud auth print-access-token`.
    #[arg(
        long = "access-token",
        value_name = "TOKEN",
        env = "BQMASK_ACCESS_TOKEN",
        hide_env_values = true
    )]
    pub access_token: Option<String>,
}

impl MaskArgs {
    /// The values given on the command line.
    pub fn overrides(&self) -> RawSettings {
        RawSettings {
            source_project: self.source_project.clone(),
            target_project: self.target_project.clone(),
            datasets: self.datasets.clone(),
            write_disposition: self.write_disposition.clone(),
            table_concurrency: self.table_concurrency,
            poll_interval_ms: self.poll_interval_ms,
            api_base: self.api_base.clone(),
            access_token: self.access_token.clone(),
        }
    }
}

#[derive(Args)]
pub struct PlanArgs {
    #[command(flatten)]
    pub mask: MaskArgs,

    /// Print the SQL of each masking job instead of the column table.
    #[arg(long = "sql")]
    pub sql: bool,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_datasets_are_repeatable_and_comma_separated() {
        let cli = Cli::try_parse_from([
            "bqmask",
            "run",
            "--source-project",
            "prod",
            "--dataset",
            "sales,hr",
            "--dataset",
            "ops",
        ])
        .unwrap();
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.datasets, vec!["sales", "hr", "ops"]);
        assert_eq!(args.overrides().source_project.as_deref(), Some("prod"));
    }

    #[test]
    fn test_plan_takes_sql_flag() {
        let cli = Cli::try_parse_from(["bqmask", "plan", "--sql", "--dataset", "sales"]).unwrap();
        let Command::Plan(args) = cli.command else {
            panic!("expected plan");
        };
        assert!(args.sql);
        assert_eq!(args.mask.datasets, vec!["sales"]);
    }
}
