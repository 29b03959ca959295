use std::path::Path;

use anyhow::{Context, Result, bail};
use indicatif::{ProgressBar, ProgressStyle};
use stream_cli::settings::{ConfigOverrides, load_pipeline_config, load_registry};
use stream_core::{FileAnalysis, JsonlStore, Pipeline, inspect_file};
use stream_model::BatchSummary;
use stream_platforms::PlatformRegistry;
use tracing::info;

use crate::cli::{InspectArgs, PlatformsArgs, ProcessArgs};

pub fn run_process(args: &ProcessArgs) -> Result<BatchSummary> {
    let registry = load_registry(args.source.platforms.as_deref())?;
    let overrides = ConfigOverrides {
        quality_threshold: args.threshold,
        batch_size: args.batch_size,
        force_reprocess: args.force,
    };
    let config = load_pipeline_config(args.source.config.as_deref(), &overrides)?;
    let store = JsonlStore::open(&args.store_dir)
        .with_context(|| format!("failed to open store {}", args.store_dir.display()))?;
    info!(
        store = %args.store_dir.display(),
        platforms = registry.len(),
        threshold = config.quality_threshold,
        "Starting run"
    );

    let mut pipeline = Pipeline::new(&registry, store, config);
    if args.path.is_dir() {
        let progress = progress_bar(args.json);
        let summary = pipeline
            .process_directory(&args.path, &args.pattern, |result, index, total| {
                progress.set_length(total as u64);
                progress.set_position(index as u64);
                progress.set_message(file_label(&result.file_path));
            })
            .with_context(|| format!("failed to process {}", args.path.display()))?;
        progress.finish_and_clear();
        Ok(summary)
    } else if args.path.is_file() {
        pipeline
            .process_paths(std::slice::from_ref(&args.path), |_, _, _| {})
            .with_context(|| format!("failed to process {}", args.path.display()))
    } else {
        bail!("path not found: {}", args.path.display())
    }
}

pub fn run_inspect(args: &InspectArgs) -> Result<FileAnalysis> {
    let registry = load_registry(args.source.platforms.as_deref())?;
    let config = load_pipeline_config(args.source.config.as_deref(), &ConfigOverrides::default())?;
    inspect_file(&registry, &config, &args.file)
        .with_context(|| format!("failed to inspect {}", args.file.display()))
}

pub fn run_platforms(args: &PlatformsArgs) -> Result<PlatformRegistry> {
    load_registry(args.platforms.as_deref())
}

fn progress_bar(hidden: bool) -> ProgressBar {
    if hidden {
        return ProgressBar::hidden();
    }
    let progress = ProgressBar::new(0);
    if let Ok(style) = ProgressStyle::with_template("{msg:30} [{bar:40.cyan/blue}] {pos}/{len} ({eta})") {
        progress.set_style(style.progress_chars("=> "));
    }
    progress
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map_or_else(String::new, |name| name.to_string_lossy().into_owned())
}
