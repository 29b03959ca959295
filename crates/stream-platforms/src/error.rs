//! Error types for the platform registry and format detection.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or validating platform profiles.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Failed to read a profile file.
    #[error("failed to read platform profiles {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Profile table is not valid TOML or does not match the schema.
    #[error("invalid platform profile table: {source}")]
    Parse {
        #[source]
        source: toml::de::Error,
    },

    /// Two profiles share a code within one table.
    #[error("duplicate platform code '{code}'")]
    DuplicateCode { code: String },

    /// Profile breaks a structural rule.
    #[error("invalid profile '{code}': {reason}")]
    InvalidProfile { code: String, reason: String },
}

/// Errors raised when no profile can be chosen for a file.
#[derive(Debug, Error)]
pub enum DetectionError {
    /// Neither path tokens nor header shape matched a profile well enough.
    #[error("no platform matched {path} (best confidence {best_confidence:.2}, minimum {min_confidence:.2})")]
    NoMatch {
        path: PathBuf,
        best_confidence: f64,
        min_confidence: f64,
    },
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
