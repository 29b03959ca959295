//! Resolving configuration and profiles the way the commands do.

use std::fs;

use stream_cli::settings::{ConfigOverrides, load_pipeline_config, load_registry};
use tempfile::TempDir;

#[test]
fn defaults_without_config_file() {
    let config = load_pipeline_config(None, &ConfigOverrides::default()).unwrap();
    assert_eq!(config.quality_threshold, 70.0);
    assert_eq!(config.batch_size, 1000);
    assert!(!config.force_reprocess);
}

#[test]
fn flags_override_config_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("stream.toml");
    fs::write(
        &path,
        "quality_threshold = 60.0\nbatch_size = 250\n\n[retry]\nmax_attempts = 4\n",
    )
    .unwrap();

    let from_file = load_pipeline_config(Some(&path), &ConfigOverrides::default()).unwrap();
    assert_eq!(from_file.quality_threshold, 60.0);
    assert_eq!(from_file.batch_size, 250);
    assert_eq!(from_file.retry.max_attempts, 4);

    let overrides = ConfigOverrides {
        quality_threshold: Some(85.0),
        batch_size: None,
        force_reprocess: true,
    };
    let config = load_pipeline_config(Some(&path), &overrides).unwrap();
    assert_eq!(config.quality_threshold, 85.0);
    assert_eq!(config.batch_size, 250);
    assert!(config.force_reprocess);
}

#[test]
fn invalid_override_is_rejected() {
    let overrides = ConfigOverrides {
        batch_size: Some(0),
        ..ConfigOverrides::default()
    };
    let err = load_pipeline_config(None, &overrides).unwrap_err();
    assert!(format!("{err:#}").contains("batch_size"));
}

#[test]
fn missing_config_file_names_the_path() {
    let err = load_pipeline_config(
        Some(std::path::Path::new("/nonexistent/stream.toml")),
        &ConfigOverrides::default(),
    )
    .unwrap_err();
    assert!(err.to_string().contains("/nonexistent/stream.toml"));
}

#[test]
fn extra_profiles_extend_builtins() {
    let builtin = load_registry(None).unwrap();
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("platforms.toml");
    fs::write(
        &path,
        r#"
[[platform]]
code = "tdl-tidal"
display_name = "Tidal"
delimiter = ","
date_patterns = ["iso"]
path_aliases = ["tidal"]

[[platform.columns]]
field = "artist"
aliases = ["artist"]
required = true

[[platform.columns]]
field = "track"
aliases = ["title"]
required = true

[[platform.columns]]
field = "date"
aliases = ["date"]
required = true

[[platform.columns]]
field = "metric_value"
aliases = ["streams"]
required = true
"#,
    )
    .unwrap();

    let registry = load_registry(Some(&path)).unwrap();
    assert_eq!(registry.len(), builtin.len() + 1);
    assert!(registry.get("tdl-tidal").is_some());
}
