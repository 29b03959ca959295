//! Resolve pipeline configuration and platform profiles for a command.
//!
//! Precedence: command-line flags (and their environment variables) over the
//! configuration file over built-in defaults.

use std::path::Path;

use anyhow::{Context, Result};
use stream_core::PipelineConfig;
use stream_platforms::PlatformRegistry;

/// Values given on the command line that override the configuration file.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub quality_threshold: Option<f64>,
    pub batch_size: Option<usize>,
    pub force_reprocess: bool,
}

/// Load the configuration file if given and apply overrides.
pub fn load_pipeline_config(
    path: Option<&Path>,
    overrides: &ConfigOverrides,
) -> Result<PipelineConfig> {
    let mut config = match path {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("failed to load configuration {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    if let Some(threshold) = overrides.quality_threshold {
        config.quality_threshold = threshold;
    }
    if let Some(batch_size) = overrides.batch_size {
        config.batch_size = batch_size;
    }
    if overrides.force_reprocess {
        config.force_reprocess = true;
    }

    config
        .validate()
        .context("invalid command-line configuration")?;
    Ok(config)
}

/// Built-in profiles, extended by an optional profile file.
pub fn load_registry(extra: Option<&Path>) -> Result<PlatformRegistry> {
    let mut registry = PlatformRegistry::builtin().context("built-in platform profiles are invalid")?;
    if let Some(path) = extra {
        let custom = PlatformRegistry::load_file(path)
            .with_context(|| format!("failed to load platform profiles {}", path.display()))?;
        registry.extend(custom);
    }
    Ok(registry)
}
