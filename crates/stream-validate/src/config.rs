//! Quality check configuration.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::InvalidInputError;

/// Relative weight of each quality dimension in the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub completeness: f64,
    pub validity: f64,
    pub consistency: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            completeness: 0.4,
            validity: 0.4,
            consistency: 0.2,
        }
    }
}

impl ScoreWeights {
    /// Sum of the weights, rejecting unusable values.
    pub fn total(&self) -> Result<f64, InvalidInputError> {
        let weights = [self.completeness, self.validity, self.consistency];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(InvalidInputError::InvalidWeights {
                reason: format!("weights must be finite and non-negative, got {weights:?}"),
            });
        }
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            return Err(InvalidInputError::InvalidWeights {
                reason: "weights sum to zero".to_string(),
            });
        }
        Ok(total)
    }
}

/// Thresholds and limits for the quality checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    pub weights: ScoreWeights,
    /// Occurrences of the same record key allowed before the rest are flagged.
    pub duplicate_multiplicity: usize,
    /// Modified z-score above which a metric value is an outlier.
    pub outlier_threshold: f64,
    /// Outlier detection is skipped below this many metric values.
    pub outlier_min_records: usize,
    pub max_metric_value: f64,
    pub earliest_date: NaiveDate,
    pub latest_date: NaiveDate,
    pub max_artist_len: usize,
    pub max_track_len: usize,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            duplicate_multiplicity: 1,
            outlier_threshold: 3.5,
            outlier_min_records: 10,
            max_metric_value: 1_000_000_000.0,
            earliest_date: NaiveDate::from_ymd_opt(1990, 1, 1).unwrap_or_default(),
            latest_date: NaiveDate::from_ymd_opt(2099, 12, 31).unwrap_or_default(),
            max_artist_len: 500,
            max_track_len: 1000,
        }
    }
}
