//! Duplicate and outlier detection across the records of one file.

use std::collections::HashMap;

use chrono::NaiveDate;
use stream_model::{IssueKind, NormalizedRecord, QualityIssue, Severity, UnifiedField};
use tracing::debug;

use super::DimensionOutcome;
use crate::config::QualityConfig;

/// Scale factor that makes the MAD comparable to a standard deviation.
const MAD_SCALE: f64 = 0.6745;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RecordKey {
    platform: String,
    artist: Option<String>,
    track: Option<String>,
    /// Stands in for artist and track when a platform reports neither.
    isrc: Option<String>,
    date: Option<NaiveDate>,
    geography: Option<String>,
    device: Option<String>,
}

impl RecordKey {
    fn of(record: &NormalizedRecord) -> Self {
        let identified = record.artist.is_some() || record.track.is_some();
        Self {
            platform: record.platform_code.to_lowercase(),
            artist: fold(record.artist.as_deref()),
            track: fold(record.track.as_deref()),
            isrc: if identified {
                None
            } else {
                fold(record.isrc.as_deref())
            },
            date: record.date,
            geography: fold(record.geography.as_deref()),
            device: fold(record.device.as_deref()),
        }
    }
}

/// Lowercase and collapse internal whitespace.
fn fold(value: Option<&str>) -> Option<String> {
    value.map(|text| {
        text.split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    })
}

pub fn check(records: &[NormalizedRecord], config: &QualityConfig) -> DimensionOutcome {
    let mut outcome = DimensionOutcome::new(records.len());
    check_duplicates(records, config, &mut outcome);
    check_outliers(records, config, &mut outcome);
    check_case_variants(records, &mut outcome);
    outcome
}

fn check_duplicates(records: &[NormalizedRecord], config: &QualityConfig, outcome: &mut DimensionOutcome) {
    let allowed = config.duplicate_multiplicity.max(1);
    let mut seen: HashMap<RecordKey, (usize, usize)> = HashMap::new();
    for (index, record) in records.iter().enumerate() {
        let entry = seen
            .entry(RecordKey::of(record))
            .or_insert((record.raw_row_index, 0));
        entry.1 += 1;
        if entry.1 > allowed {
            outcome.fail(
                index,
                QualityIssue::new(
                    IssueKind::DuplicateRecord,
                    Severity::Warning,
                    format!("duplicates the record on line {}", entry.0),
                )
                .at_row(record.raw_row_index),
            );
        }
    }
}

fn check_outliers(records: &[NormalizedRecord], config: &QualityConfig, outcome: &mut DimensionOutcome) {
    let values: Vec<(usize, f64)> = records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| record.metric_value.map(|value| (index, value)))
        .collect();
    if values.len() < config.outlier_min_records {
        return;
    }

    let mut sorted: Vec<f64> = values.iter().map(|(_, value)| *value).collect();
    let center = median(&mut sorted);
    let mut deviations: Vec<f64> = sorted.iter().map(|value| (value - center).abs()).collect();
    let mad = median(&mut deviations);
    if mad <= 0.0 {
        debug!(values = values.len(), "Skipping outlier check: zero spread");
        return;
    }

    for (index, value) in values {
        let score = MAD_SCALE * (value - center) / mad;
        if score.abs() > config.outlier_threshold {
            let record = &records[index];
            outcome.fail(
                index,
                QualityIssue::new(
                    IssueKind::MetricOutlier,
                    Severity::Warning,
                    format!(
                        "{} {value} is an outlier (modified z-score {score:.1}, median {center})",
                        record.metric_type
                    ),
                )
                .with_field(UnifiedField::MetricValue)
                .at_row(record.raw_row_index),
            );
        }
    }
}

/// Flag artist and track spellings that differ only in letter case from an
/// earlier row. Duplicate keys already fold case, so these do not fail the
/// row.
fn check_case_variants(records: &[NormalizedRecord], outcome: &mut DimensionOutcome) {
    for field in [UnifiedField::Artist, UnifiedField::Track] {
        let mut first_spelling: HashMap<String, (&str, usize)> = HashMap::new();
        for record in records {
            let value = match field {
                UnifiedField::Artist => record.artist.as_deref(),
                _ => record.track.as_deref(),
            };
            let Some(value) = value.map(str::trim) else {
                continue;
            };
            let (first, line) = *first_spelling
                .entry(value.to_lowercase())
                .or_insert((value, record.raw_row_index));
            if first != value {
                outcome.issues.push(
                    QualityIssue::new(
                        IssueKind::CaseInconsistency,
                        Severity::Warning,
                        format!("{field} '{value}' differs only in case from '{first}' on line {line}"),
                    )
                    .with_field(field)
                    .at_row(record.raw_row_index),
                );
            }
        }
    }
}

/// Median of a non-empty slice; sorts it in place.
fn median(values: &mut [f64]) -> f64 {
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::record;

    #[test]
    fn median_of_even_and_odd() {
        assert_eq!(median(&mut [3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&mut [4.0, 1.0, 3.0, 2.0]), 2.5);
    }

    #[test]
    fn duplicates_ignore_case_and_spacing() {
        let records = [
            record(2, "The  Band", "Song", 1.0),
            record(3, "the band", " song ", 2.0),
            record(4, "The Band", "Other", 3.0),
        ];
        let outcome = check(&records, &QualityConfig::default());
        assert_eq!(outcome.failed, vec![false, true, false]);
        assert_eq!(outcome.issues[0].kind, IssueKind::DuplicateRecord);
        assert_eq!(outcome.issues.len(), 3);
        assert!(outcome.issues[0].message.contains("line 2"));
    }

    #[test]
    fn multiplicity_allows_repeats() {
        let records = [
            record(2, "A", "T", 1.0),
            record(3, "A", "T", 1.0),
            record(4, "A", "T", 1.0),
        ];
        let config = QualityConfig {
            duplicate_multiplicity: 2,
            ..QualityConfig::default()
        };
        assert_eq!(check(&records, &config).failed, vec![false, false, true]);
    }

    #[test]
    fn geography_distinguishes_records() {
        let mut us = record(2, "A", "T", 1.0);
        us.geography = Some("US".to_string());
        let mut gb = record(3, "A", "T", 1.0);
        gb.geography = Some("GB".to_string());
        assert_eq!(check(&[us, gb], &QualityConfig::default()).passed(), 2);
    }

    #[test]
    fn isrc_identifies_records_without_names() {
        let mut first = record(2, "A", "T", 1.0);
        first.artist = None;
        first.track = None;
        first.isrc = Some("USRC17607839".to_string());
        let mut second = first.clone();
        second.raw_row_index = 3;
        second.isrc = Some("GBAYE0601498".to_string());
        assert_eq!(check(&[first, second], &QualityConfig::default()).passed(), 2);
    }

    #[test]
    fn outlier_flagged_with_enough_records() {
        let mut records: Vec<_> = (0..10)
            .map(|i| record(i + 2, &format!("A{i}"), "T", 100.0 + i as f64))
            .collect();
        records.push(record(12, "Z", "T", 1_000_000.0));
        let outcome = check(&records, &QualityConfig::default());
        assert_eq!(outcome.issues.len(), 1);
        assert_eq!(outcome.issues[0].kind, IssueKind::MetricOutlier);
        assert_eq!(outcome.issues[0].row_index, Some(12));
    }

    #[test]
    fn outliers_need_minimum_records_and_spread() {
        let mut few: Vec<_> = (0..5)
            .map(|i| record(i + 2, &format!("A{i}"), "T", 100.0))
            .collect();
        few.push(record(7, "Z", "T", 1_000_000.0));
        assert!(check(&few, &QualityConfig::default()).issues.is_empty());

        let mut flat: Vec<_> = (0..12)
            .map(|i| record(i + 2, &format!("A{i}"), "T", 100.0))
            .collect();
        flat.push(record(14, "Z", "T", 1_000_000.0));
        assert!(check(&flat, &QualityConfig::default()).issues.is_empty());
    }

    #[test]
    fn case_variants_are_flagged_without_failing_rows() {
        let records = [
            record(2, "Burna Boy", "Last Last", 1.0),
            record(3, "BURNA BOY", "Ye", 2.0),
            record(4, "Burna Boy", "last last", 3.0),
        ];
        let outcome = check(&records, &QualityConfig::default());
        assert_eq!(outcome.passed(), 3);
        let flagged: Vec<_> = outcome
            .issues
            .iter()
            .map(|issue| (issue.kind, issue.field, issue.row_index))
            .collect();
        assert_eq!(
            flagged,
            vec![
                (IssueKind::CaseInconsistency, Some(UnifiedField::Artist), Some(3)),
                (IssueKind::CaseInconsistency, Some(UnifiedField::Track), Some(4)),
            ]
        );
        assert!(outcome.issues[0].message.contains("line 2"));
        assert!(outcome.issues.iter().all(|i| i.severity == Severity::Warning));
    }
}
