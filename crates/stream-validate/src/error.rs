//! Validator misuse errors.

use thiserror::Error;

/// Caller errors. Data problems never surface here; they become issues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidInputError {
    /// Nothing to score: no parsed records and no skipped rows.
    #[error("cannot score an empty input: no rows were read")]
    Empty,

    /// Score weights are negative, non-finite, or sum to zero.
    #[error("invalid score weights: {reason}")]
    InvalidWeights { reason: String },
}
