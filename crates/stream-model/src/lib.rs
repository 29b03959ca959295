//! Shared types for the streaming report pipeline.
//!
//! Platform profiles, normalized records, quality issues and scores, and
//! per-file processing results. Every type here is plain data with serde
//! derives; behavior lives in the crates that consume them.

pub mod platform;
pub mod processing;
pub mod quality;
pub mod record;

pub use platform::{
    ColumnBinding, DatePattern, PlatformProfile, PlatformRules, QuotingStyle, SlashOrder,
    TextEncoding, UnifiedField, normalize_column_name,
};
pub use processing::{BatchSummary, ProcessingResult, ProcessingStatus};
pub use quality::{
    DimensionScores, IssueKind, QualityDimension, QualityIssue, QualityScoreResult, Severity,
};
pub use record::NormalizedRecord;
