//! Quality scoring for one file's records.

use std::collections::HashSet;

use stream_model::{
    DimensionScores, IssueKind, NormalizedRecord, PlatformRules, QualityIssue, QualityScoreResult,
    Severity,
};
use tracing::{debug, info};

use crate::checks::{DimensionOutcome, completeness, consistency, validity};
use crate::config::QualityConfig;
use crate::error::InvalidInputError;

/// Everything the normalizer produced for one file.
#[derive(Debug, Clone, Copy)]
pub struct ValidationInput<'a> {
    pub records: &'a [NormalizedRecord],
    /// Issues raised while normalizing, file-level and row-level.
    pub issues: &'a [QualityIssue],
    /// Rows the normalizer dropped.
    pub rows_skipped: usize,
    /// Value rules of the file's platform, when known.
    pub rules: Option<&'a PlatformRules>,
}

/// Run every check and compute the file's quality score.
///
/// Each dimension score is the share of rows (parsed or skipped) that pass
/// it; a skipped row fails every dimension. The overall score is the
/// weighted mean of the dimensions, rounded to one decimal.
pub fn validate(
    input: ValidationInput<'_>,
    config: &QualityConfig,
) -> Result<QualityScoreResult, InvalidInputError> {
    let records_total = input.records.len() + input.rows_skipped;
    if records_total == 0 {
        return Err(InvalidInputError::Empty);
    }
    let weight_total = config.weights.total()?;

    let completeness = completeness::check(input.records);
    let validity = validity::check(input.records, config, input.rules);
    let consistency = consistency::check(input.records, config);

    let dimension_scores = DimensionScores {
        completeness: percentage(completeness.passed(), records_total),
        validity: percentage(validity.passed(), records_total),
        consistency: percentage(consistency.passed(), records_total),
    };
    let weighted = config.weights.completeness * dimension_scores.completeness
        + config.weights.validity * dimension_scores.validity
        + config.weights.consistency * dimension_scores.consistency;
    let overall_score = round_one_decimal(weighted / weight_total).clamp(0.0, 100.0);

    debug!(
        completeness = dimension_scores.completeness,
        validity = dimension_scores.validity,
        consistency = dimension_scores.consistency,
        "Dimension scores"
    );

    let mut issues: Vec<QualityIssue> = input.issues.iter().cloned().map(retier).collect();
    for outcome in [completeness, validity, consistency] {
        let DimensionOutcome { issues: found, .. } = outcome;
        issues.extend(found);
    }
    issues.sort_by_key(|issue| issue.row_index);

    let invalid_rows: HashSet<usize> = issues
        .iter()
        .filter(|issue| issue.severity.is_error_or_worse())
        .filter_map(|issue| issue.row_index)
        .collect();
    let records_valid = input
        .records
        .iter()
        .filter(|record| !invalid_rows.contains(&record.raw_row_index))
        .count();

    info!(
        overall_score,
        records_total,
        records_valid,
        issues = issues.len(),
        "Scored file quality"
    );

    Ok(QualityScoreResult {
        overall_score,
        dimension_scores,
        issues,
        records_total,
        records_valid,
    })
}

/// Dropped rows are the most severe problem a file can have.
fn retier(issue: QualityIssue) -> QualityIssue {
    if issue.kind == IssueKind::ParseError {
        issue.with_severity(Severity::Critical)
    } else {
        issue
    }
}

fn percentage(passed: usize, total: usize) -> f64 {
    passed as f64 / total as f64 * 100.0
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
