//! Quality issue and score types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::platform::UnifiedField;

/// Issue severity level, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Row could not be used at all
    Critical,
    /// Significant data quality problem
    Error,
    /// Should review
    Warning,
    /// Informational observation
    Info,
}

impl Severity {
    /// Parse severity from string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "critical" => Some(Self::Critical),
            "error" => Some(Self::Error),
            "warning" | "warn" => Some(Self::Warning),
            "info" => Some(Self::Info),
            _ => None,
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Critical => "Critical",
            Self::Error => "Error",
            Self::Warning => "Warning",
            Self::Info => "Info",
        }
    }

    /// Ordering rank, higher is more severe.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Critical => 3,
            Self::Error => 2,
            Self::Warning => 1,
            Self::Info => 0,
        }
    }

    /// Whether this severity makes a record invalid.
    pub fn is_error_or_worse(&self) -> bool {
        self.rank() >= Self::Error.rank()
    }

    pub const fn all() -> &'static [Self] {
        &[Self::Critical, Self::Error, Self::Warning, Self::Info]
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Score dimension a check contributes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityDimension {
    Completeness,
    Validity,
    Consistency,
}

impl QualityDimension {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Completeness => "Completeness",
            Self::Validity => "Validity",
            Self::Consistency => "Consistency",
        }
    }
}

/// Machine-readable issue tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Row could not be split per the platform's delimiter/quote rule
    ParseError,
    /// Date value matched none of the declared patterns
    DateParseError,
    /// Date matched more than one day/month ordering
    AmbiguousDate,
    MissingRequiredField,
    /// Mapped optional cell is empty
    MissingOptionalField,
    /// Optional column absent from the header
    MissingOptionalColumn,
    NegativeMetric,
    MetricOutOfRange,
    DateOutOfRange,
    InvalidIsrc,
    TextTooLong,
    DuplicateRecord,
    MetricOutlier,
    /// Geography outside the platform's reported markets
    UnexpectedGeography,
    /// Device matches none of the platform's device patterns
    UnexpectedDevice,
    /// Same artist or track spelled with different letter case
    CaseInconsistency,
}

impl IssueKind {
    /// Stable snake_case code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ParseError => "parse_error",
            Self::DateParseError => "date_parse_error",
            Self::AmbiguousDate => "ambiguous_date",
            Self::MissingRequiredField => "missing_required_field",
            Self::MissingOptionalField => "missing_optional_field",
            Self::MissingOptionalColumn => "missing_optional_column",
            Self::NegativeMetric => "negative_metric",
            Self::MetricOutOfRange => "metric_out_of_range",
            Self::DateOutOfRange => "date_out_of_range",
            Self::InvalidIsrc => "invalid_isrc",
            Self::TextTooLong => "text_too_long",
            Self::DuplicateRecord => "duplicate_record",
            Self::MetricOutlier => "metric_outlier",
            Self::UnexpectedGeography => "unexpected_geography",
            Self::UnexpectedDevice => "unexpected_device",
            Self::CaseInconsistency => "case_inconsistency",
        }
    }

    /// Dimension this kind of issue is scored against, if any.
    pub fn dimension(&self) -> Option<QualityDimension> {
        match self {
            Self::MissingRequiredField | Self::DateParseError => {
                Some(QualityDimension::Completeness)
            }
            Self::NegativeMetric
            | Self::MetricOutOfRange
            | Self::DateOutOfRange
            | Self::InvalidIsrc
            | Self::TextTooLong
            | Self::UnexpectedGeography => Some(QualityDimension::Validity),
            Self::DuplicateRecord | Self::MetricOutlier => Some(QualityDimension::Consistency),
            Self::ParseError
            | Self::AmbiguousDate
            | Self::MissingOptionalField
            | Self::MissingOptionalColumn
            | Self::UnexpectedDevice
            | Self::CaseInconsistency => None,
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A quality issue found while parsing or validating one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityIssue {
    pub severity: Severity,
    pub kind: IssueKind,
    pub field: Option<UnifiedField>,
    pub message: String,
    /// 1-based source line; `None` for file-level issues.
    pub row_index: Option<usize>,
}

impl QualityIssue {
    pub fn new(kind: IssueKind, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            kind,
            field: None,
            message: message.into(),
            row_index: None,
        }
    }

    #[must_use]
    pub fn with_field(mut self, field: UnifiedField) -> Self {
        self.field = Some(field);
        self
    }

    #[must_use]
    pub fn at_row(mut self, row_index: usize) -> Self {
        self.row_index = Some(row_index);
        self
    }

    #[must_use]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

/// Per-dimension scores, each a percentage.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DimensionScores {
    pub completeness: f64,
    pub validity: f64,
    pub consistency: f64,
}

impl DimensionScores {
    pub fn get(&self, dimension: QualityDimension) -> f64 {
        match dimension {
            QualityDimension::Completeness => self.completeness,
            QualityDimension::Validity => self.validity,
            QualityDimension::Consistency => self.consistency,
        }
    }
}

/// Quality score for one processed file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityScoreResult {
    /// Weighted score in `[0, 100]`, one decimal.
    pub overall_score: f64,
    pub dimension_scores: DimensionScores,
    pub issues: Vec<QualityIssue>,
    /// Rows seen, including rows the parser had to skip.
    pub records_total: usize,
    /// Parsed records with no error-or-worse issue.
    pub records_valid: usize,
}

impl QualityScoreResult {
    pub fn count_by_severity(&self, severity: Severity) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.severity == severity)
            .count()
    }

    pub fn has_critical(&self) -> bool {
        self.count_by_severity(Severity::Critical) > 0
    }

    /// Whether the overall score meets a pass/fail threshold.
    pub fn passes(&self, threshold: f64) -> bool {
        self.overall_score >= threshold
    }
}
