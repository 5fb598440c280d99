//! Market rate pull CLI.

use std::io::{self, IsTerminal};

use chrono::{Local, NaiveDate};
use clap::{ColorChoice, Parser};
use mrp_cli::logging::{LogConfig, LogFormat, init_logging, run_log_path};
use tracing::level_filters::LevelFilter;

mod cli;
mod commands;
mod summary;

use crate::cli::{Cli, Command, LogFormatArg, LogLevelArg};
use crate::commands::{run_job, run_validate};
use crate::summary::{print_dataset_summary, print_run_summary};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let run_date = cli
        .command
        .date()
        .unwrap_or_else(|| Local::now().date_naive());
    let log_config = log_config_from_cli(&cli, run_date);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let exit_code = match &cli.command {
        Command::Run(args) => match run_job(args, run_date) {
            Ok((ctx, report)) => {
                print_run_summary(&ctx, &report);
                if report.is_success() { 0 } else { 1 }
            }
            Err(error) => {
                eprintln!("error: {error:#}");
                1
            }
        },
        Command::Validate(args) => match run_validate(args, run_date) {
            Ok((ctx, dataset, None)) => {
                print_dataset_summary(&ctx, &dataset);
                0
            }
            Ok((_, _, Some(diagnostic))) => {
                eprintln!("validation failed: {diagnostic}");
                1
            }
            Err(error) => {
                eprintln!("error: {error:#}");
                1
            }
        },
    };
    std::process::exit(exit_code);
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli, run_date: NaiveDate) -> LogConfig {
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
    config = config.with_format(match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    });
    let log_file = cli
        .log_file
        .clone()
        .or_else(|| cli.log_dir.as_deref().map(|dir| run_log_path(dir, run_date)));
    config = config.with_log_file(log_file);
    config.with_ansi = match cli.color.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => config.log_file.is_none() && io::stderr().is_terminal(),
    };
    config
}
