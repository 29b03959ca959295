//! Required field presence.

use stream_model::{IssueKind, NormalizedRecord, QualityIssue, Severity, UnifiedField};

use super::DimensionOutcome;

/// Flag records missing artist, track, date or metric value.
///
/// A date that failed to parse already carries a `date_parse_error`, so it
/// fails the record without a second issue.
pub fn check(records: &[NormalizedRecord]) -> DimensionOutcome {
    let mut outcome = DimensionOutcome::new(records.len());
    for (index, record) in records.iter().enumerate() {
        for field in record.missing_required_fields() {
            if field == UnifiedField::Date && record.degraded {
                outcome.failed[index] = true;
                continue;
            }
            outcome.fail(
                index,
                QualityIssue::new(
                    IssueKind::MissingRequiredField,
                    Severity::Error,
                    format!("required field '{field}' is missing"),
                )
                .with_field(field)
                .at_row(record.raw_row_index),
            );
        }
    }
    outcome
}
