//! Pipeline configuration.
//!
//! Loaded from a TOML file where every section is optional:
//!
//! ```toml
//! quality_threshold = 80.0
//! batch_size = 500
//!
//! [retry]
//! max_attempts = 5
//!
//! [quality.weights]
//! completeness = 0.5
//! validity = 0.3
//! consistency = 0.2
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use stream_platforms::DEFAULT_MIN_CONFIDENCE;
use stream_validate::QualityConfig;

use crate::error::ConfigError;
use crate::retry::RetryPolicy;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Files scoring below this are flagged as not passing quality.
    pub quality_threshold: f64,
    /// Records written per store chunk.
    pub batch_size: usize,
    pub min_detection_confidence: f64,
    /// Leading lines read for header-based detection.
    pub peek_lines: usize,
    /// Reprocess content the store already holds.
    pub force_reprocess: bool,
    pub retry: RetryPolicy,
    pub quality: QualityConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            quality_threshold: 70.0,
            batch_size: 1000,
            min_detection_confidence: DEFAULT_MIN_CONFIDENCE,
            peek_lines: 10,
            force_reprocess: false,
            retry: RetryPolicy::default(),
            quality: QualityConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source).map_err(|source| ConfigError::Parse { source })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=100.0).contains(&self.quality_threshold) {
            return Err(invalid("quality_threshold", "must be between 0 and 100"));
        }
        if self.batch_size == 0 {
            return Err(invalid("batch_size", "must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.min_detection_confidence) {
            return Err(invalid("min_detection_confidence", "must be between 0 and 1"));
        }
        if self.peek_lines == 0 {
            return Err(invalid("peek_lines", "must be at least 1"));
        }
        if self.retry.max_attempts == 0 {
            return Err(invalid("retry.max_attempts", "must be at least 1"));
        }
        if self.retry.backoff_multiplier < 1.0 {
            return Err(invalid("retry.backoff_multiplier", "must be at least 1.0"));
        }
        if let Err(err) = self.quality.weights.total() {
            return Err(invalid("quality.weights", err.to_string()));
        }
        if self.quality.earliest_date > self.quality.latest_date {
            return Err(invalid("quality.earliest_date", "must not be after latest_date"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = PipelineConfig::from_toml_str("").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.quality_threshold, 70.0);
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn test_partial_sections_merge_with_defaults() {
        let config = PipelineConfig::from_toml_str(
            r#"
            quality_threshold = 85.0

            [retry]
            max_attempts = 5

            [quality]
            outlier_threshold = 4.0
            "#,
        )
        .unwrap();
        assert_eq!(config.quality_threshold, 85.0);
        assert_eq!(config.batch_size, 1000);
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.initial_backoff_ms, 100);
        assert_eq!(config.quality.outlier_threshold, 4.0);
    }

    #[test]
    fn test_rejects_out_of_range_values() {
        let err = PipelineConfig::from_toml_str("quality_threshold = 150.0").unwrap_err();
        assert!(err.to_string().contains("quality_threshold"));

        let err = PipelineConfig::from_toml_str("batch_size = 0").unwrap_err();
        assert!(err.to_string().contains("batch_size"));

        let err = PipelineConfig::from_toml_str(
            "[quality.weights]\ncompleteness = 0.0\nvalidity = 0.0\nconsistency = 0.0",
        )
        .unwrap_err();
        assert!(err.to_string().contains("quality.weights"));
    }

    #[test]
    fn test_malformed_toml_is_a_parse_error() {
        let err = PipelineConfig::from_toml_str("batch_size = \"many\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_load_missing_file() {
        let err = PipelineConfig::load(Path::new("/nonexistent/stream.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileRead { .. }));
    }
}
