use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::platform::TextEncoding;
use crate::quality::QualityScoreResult;

/// Terminal outcome of processing one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Completed,
    /// Completed without work because the content was already processed.
    Duplicate,
    Failed,
}

impl ProcessingStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Duplicate => "duplicate",
            Self::Failed => "failed",
        }
    }
}

/// Result of processing one file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub file_path: PathBuf,
    pub status: ProcessingStatus,
    pub success: bool,
    pub platform_code: Option<String>,
    pub content_hash: Option<String>,
    /// Encoding the file was decoded with.
    pub encoding: Option<TextEncoding>,
    /// Records handed to persistence.
    pub records_processed: usize,
    /// Rows skipped by the parser plus parsed records that failed validation.
    pub records_failed: usize,
    pub quality_score: Option<f64>,
    pub quality_passed: Option<bool>,
    pub quality: Option<QualityScoreResult>,
    pub error_message: Option<String>,
    pub duration: Duration,
}

impl ProcessingResult {
    /// A failed result with no records.
    pub fn failed(path: &Path, message: impl Into<String>) -> Self {
        Self {
            file_path: path.to_path_buf(),
            status: ProcessingStatus::Failed,
            success: false,
            platform_code: None,
            content_hash: None,
            encoding: None,
            records_processed: 0,
            records_failed: 0,
            quality_score: None,
            quality_passed: None,
            quality: None,
            error_message: Some(message.into()),
            duration: Duration::ZERO,
        }
    }

    /// A completed result that skipped already-processed content.
    pub fn duplicate(path: &Path, content_hash: &str) -> Self {
        Self {
            file_path: path.to_path_buf(),
            status: ProcessingStatus::Duplicate,
            success: true,
            platform_code: None,
            content_hash: Some(content_hash.to_string()),
            encoding: None,
            records_processed: 0,
            records_failed: 0,
            quality_score: None,
            quality_passed: None,
            quality: None,
            error_message: Some("skipped: file content already processed".to_string()),
            duration: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn is_duplicate(&self) -> bool {
        self.status == ProcessingStatus::Duplicate
    }
}

/// Aggregate outcome of a directory run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    pub files_total: usize,
    /// Completed files, duplicates included.
    pub succeeded: usize,
    pub failed: usize,
    pub skipped_duplicates: usize,
    pub records_total: usize,
    /// Mean score over successful files that produced one.
    pub average_quality_score: Option<f64>,
    pub results: Vec<ProcessingResult>,
}

impl BatchSummary {
    pub fn from_results(results: Vec<ProcessingResult>) -> Self {
        let succeeded = results.iter().filter(|result| result.success).count();
        let skipped_duplicates = results.iter().filter(|result| result.is_duplicate()).count();
        let records_total = results
            .iter()
            .filter(|result| result.success)
            .map(|result| result.records_processed)
            .sum();
        let scores: Vec<f64> = results
            .iter()
            .filter(|result| result.success)
            .filter_map(|result| result.quality_score)
            .collect();
        let average_quality_score = if scores.is_empty() {
            None
        } else {
            Some(scores.iter().sum::<f64>() / scores.len() as f64)
        };
        Self {
            files_total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
            skipped_duplicates,
            records_total,
            average_quality_score,
            results,
        }
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}
