//! CLI argument definitions for the market rate pull job.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "market-rate",
    version,
    about = "Market Rate Data Pull - fetch, validate and load the daily market rate report",
    long_about = "Fetch the daily market rate report over SFTP, validate it against the\n\
                  property lookup, and append today's rows to the destination table.\n\
                  Any failure is mailed to the configured recipients."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
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
    #[arg(long = "log-file", value_name = "PATH", global = true, conflicts_with = "log_dir")]
    pub log_file: Option<PathBuf>,

    /// Write logs to a run-dated file in this directory.
    #[arg(long = "log-dir", value_name = "DIR", global = true)]
    pub log_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the full pull: stage, fetch, validate, load.
    Run(RunArgs),

    /// Validate a local report file without fetching, loading or mailing.
    Validate(ValidateArgs),
}

impl Command {
    /// Run date override, if any.
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            Self::Run(args) => args.date,
            Self::Validate(args) => args.date,
        }
    }
}

#[derive(Parser)]
pub struct RunArgs {
    /// Configuration file (default: market-rate.toml when present).
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Run as if today were DATE (YYYY-MM-DD).
    #[arg(long = "date", value_name = "DATE")]
    pub date: Option<NaiveDate>,
}

#[derive(Parser)]
pub struct ValidateArgs {
    /// Report file in the feed's CSV layout.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Property lookup CSV with `PropertyID,Property` columns.
    #[arg(long = "lookup", value_name = "CSV")]
    pub lookup: PathBuf,

    /// Date to keep rows for (YYYY-MM-DD, default: today).
    #[arg(long = "date", value_name = "DATE")]
    pub date: Option<NaiveDate>,

    /// Distinct properties the feed must contain.
    #[arg(long = "expected-count", value_name = "N")]
    pub expected_count: Option<usize>,
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
