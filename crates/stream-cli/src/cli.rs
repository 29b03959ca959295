//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "stream-cli",
    version,
    about = "Normalize and score streaming platform reports",
    long_about = "Normalize streaming platform reports into one record schema.\n\n\
                  Detects the platform of each file, decodes and parses its rows,\n\
                  scores data quality and stores the records as JSON Lines."
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
    /// Process a report file or every matching file in a directory.
    Process(ProcessArgs),

    /// Detect, parse and score one file without storing it.
    Inspect(InspectArgs),

    /// List the known platform profiles.
    Platforms(PlatformsArgs),
}

/// Options shared by commands that load profiles and configuration.
#[derive(Args)]
pub struct SourceArgs {
    /// Pipeline configuration file (TOML).
    #[arg(long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Additional platform profiles (TOML); same codes replace built-ins.
    #[arg(long = "platforms", value_name = "FILE")]
    pub platforms: Option<PathBuf>,
}

#[derive(Parser)]
pub struct ProcessArgs {
    /// Report file or directory of report files.
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// File name pattern used when PATH is a directory.
    #[arg(long = "pattern", default_value = "*")]
    pub pattern: String,

    /// Directory the JSON Lines store writes to.
    #[arg(long = "store-dir", value_name = "DIR", default_value = "stream-output")]
    pub store_dir: PathBuf,

    /// Reprocess files whose content is already stored.
    #[arg(long = "force")]
    pub force: bool,

    /// Minimum quality score for a file to pass.
    #[arg(long = "threshold", env = "STREAM_QUALITY_THRESHOLD", value_name = "SCORE")]
    pub threshold: Option<f64>,

    /// Records written per store chunk.
    #[arg(long = "batch-size", env = "STREAM_BATCH_SIZE", value_name = "N")]
    pub batch_size: Option<usize>,

    /// Print the batch summary as JSON instead of tables.
    #[arg(long = "json")]
    pub json: bool,

    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Parser)]
pub struct InspectArgs {
    /// Report file to inspect.
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Maximum number of issues to list.
    #[arg(long = "max-issues", default_value_t = 50)]
    pub max_issues: usize,

    /// Print the result as JSON instead of tables.
    #[arg(long = "json")]
    pub json: bool,

    #[command(flatten)]
    pub source: SourceArgs,
}

#[derive(Parser)]
pub struct PlatformsArgs {
    /// Additional platform profiles (TOML) to include in the listing.
    #[arg(long = "platforms", value_name = "FILE")]
    pub platforms: Option<PathBuf>,
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
