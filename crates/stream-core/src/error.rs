//! Error types for the processing pipeline.

use std::path::PathBuf;

use stream_ingest::{IngestError, SchemaError};
use stream_platforms::DetectionError;
use stream_validate::InvalidInputError;
use thiserror::Error;

/// Errors loading or validating pipeline configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {source}")]
    Parse {
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Errors raised by a record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Temporary condition; the operation may succeed if retried.
    #[error("transient store error: {message}")]
    Transient { message: String },

    /// File I/O error.
    #[error("failed to {operation} {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize stored data: {source}")]
    Serialization {
        #[source]
        source: serde_json::Error,
    },

    /// The store refused the batch.
    #[error("store rejected batch: {reason}")]
    Rejected { reason: String },
}

impl StoreError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}

/// Why one file stopped before completing.
///
/// Everything except [`FileFailure::InvalidInput`] stays inside the file's
/// [`ProcessingResult`](stream_model::ProcessingResult).
#[derive(Debug, Error)]
pub enum FileFailure {
    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error("file is empty")]
    Empty,

    #[error(transparent)]
    Detection(#[from] DetectionError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("no data rows")]
    NoDataRows,

    #[error(transparent)]
    InvalidInput(#[from] InvalidInputError),

    #[error("persistence failed: {0}")]
    Store(#[from] StoreError),
}

/// Errors that abort a pipeline call rather than a single file.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("failed to read directory {path}: {source}")]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid file pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    /// Validator misuse; always propagated.
    #[error(transparent)]
    InvalidInput(#[from] InvalidInputError),
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transient_errors_are_retryable() {
        let transient = StoreError::Transient {
            message: "connection reset".to_string(),
        };
        let rejected = StoreError::Rejected {
            reason: "constraint violation".to_string(),
        };
        assert!(transient.is_transient());
        assert!(!rejected.is_transient());
    }

    #[test]
    fn test_file_failure_display() {
        assert_eq!(FileFailure::NoDataRows.to_string(), "no data rows");
        let store = FileFailure::from(StoreError::Transient {
            message: "timeout".to_string(),
        });
        assert_eq!(
            store.to_string(),
            "persistence failed: transient store error: timeout"
        );
    }
}
