//! bqmask command-line tool.

use std::io::{self, IsTerminal};

use bqmask_cli::logging::{LogConfig, LogFormat, init_logging};
use bqmask_core::MaskError;
use clap::{ColorChoice, Parser};
use tracing::level_filters::LevelFilter;

mod cli;
mod commands;
mod summary;

use crate::cli::{Cli, Command, LogFormatArg, LogLevelArg};
use crate::commands::{run_mask, run_plan};
use crate::summary::{print_failures, print_plan, print_plan_sql, print_run_summary};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let exit_code = match &cli.command {
        Command::Run(args) => match run_mask(args).await {
            Ok((settings, summary)) => {
                print_run_summary(&settings, &summary);
                0
            }
            Err(error) => report_error(&error),
        },
        Command::Plan(args) => match run_plan(&args.mask).await {
            Ok(plan) => {
                if args.sql {
                    print_plan_sql(&plan);
                } else {
                    print_plan(&plan);
                }
                if plan.failures.is_empty() {
                    0
                } else {
                    eprintln!("error: some tables could not be planned");
                    print_failures(&plan.failures);
                    1
                }
            }
            Err(error) => report_error(&error),
        },
    };
    std::process::exit(exit_code);
}

fn report_error(error: &anyhow::Error) -> i32 {
    eprintln!("error: {error:#}");
    if let Some(failures) = error.downcast_ref::<MaskError>().and_then(MaskError::failures) {
        print_failures(failures);
    }
    1
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        ..LogConfig::default()
    };
    config.use_env_filter = !(cli.verbosity.is_present() || cli.log_level.is_some());
    if let Some(level) = cli.log_level {
        config.level_filter = match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        };
    }
    config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    config.log_file = cli.log_file.clone();
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => cli.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
