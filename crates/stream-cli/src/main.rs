//! Streaming report pipeline CLI.

use std::io::{self, IsTerminal};

use clap::{ColorChoice, Parser};
use stream_cli::logging::{LogConfig, LogFormat, init_logging};
use tracing::level_filters::LevelFilter;

mod cli;
mod commands;
mod summary;

use crate::cli::{Cli, Command, LogFormatArg, LogLevelArg};
use crate::commands::{run_inspect, run_platforms, run_process};
use crate::summary::{print_batch_summary, print_inspection, print_platforms};

fn main() {
    let cli = Cli::parse();
    cli.color.write_global();
    let log_config = log_config_from_cli(&cli);
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    let exit_code = match run(&cli.command) {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

fn run(command: &Command) -> anyhow::Result<i32> {
    match command {
        Command::Process(args) => {
            let summary = run_process(args)?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_batch_summary(&summary);
            }
            Ok(i32::from(summary.has_failures()))
        }
        Command::Inspect(args) => {
            let analysis = run_inspect(args)?;
            if args.json {
                let report = serde_json::json!({
                    "file": args.file,
                    "platform_code": analysis.platform_code(),
                    "detection_method": analysis.detection_method.label(),
                    "detection_confidence": analysis.detection_confidence,
                    "encoding": analysis.parsed.encoding,
                    "content_hash": analysis.content_hash,
                    "rows_skipped": analysis.parsed.rows_skipped,
                    "quality": analysis.quality,
                });
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_inspection(&args.file, &analysis, args.max_issues);
            }
            Ok(0)
        }
        Command::Platforms(args) => {
            let registry = run_platforms(args)?;
            print_platforms(&registry);
            Ok(0)
        }
    }
}

/// Build logging configuration from CLI flags with consistent precedence.
fn log_config_from_cli(cli: &Cli) -> LogConfig {
    let mut config = LogConfig {
        level_filter: cli.verbosity.tracing_level_filter(),
        use_env_filter: !(cli.verbosity.is_present() || cli.log_level.is_some()),
        ..LogConfig::default()
    };
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
