//! Type and range checks.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use stream_model::{
    IssueKind, NormalizedRecord, PlatformRules, QualityIssue, Severity, UnifiedField,
};
use tracing::warn;

use super::DimensionOutcome;
use crate::config::QualityConfig;

/// ISO 3901: country, registrant, year, designation.
static ISRC_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z]{2}[A-Z0-9]{3}[0-9]{2}[0-9]{5}$").expect("Invalid ISRC regex")
});

/// Whether an ISRC is well formed. Hyphens and case are ignored.
pub fn is_valid_isrc(value: &str) -> bool {
    let compact: String = value
        .trim()
        .chars()
        .filter(|c| *c != '-')
        .map(|c| c.to_ascii_uppercase())
        .collect();
    ISRC_REGEX.is_match(&compact)
}

/// Compile a platform's device patterns, case-insensitively.
///
/// Patterns that do not compile are logged and left out; the registry
/// rejects them when profiles are loaded.
fn device_regexes(rules: &PlatformRules) -> Vec<Regex> {
    rules
        .device_patterns
        .iter()
        .filter_map(|pattern| {
            RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .inspect_err(|err| warn!(pattern, error = %err, "Ignoring device pattern"))
                .ok()
        })
        .collect()
}

pub fn check(
    records: &[NormalizedRecord],
    config: &QualityConfig,
    rules: Option<&PlatformRules>,
) -> DimensionOutcome {
    let mut outcome = DimensionOutcome::new(records.len());
    let devices = rules.map(device_regexes).unwrap_or_default();
    for (index, record) in records.iter().enumerate() {
        let row = record.raw_row_index;

        if let Some(value) = record.metric_value {
            if value < 0.0 {
                outcome.fail(
                    index,
                    QualityIssue::new(
                        IssueKind::NegativeMetric,
                        Severity::Error,
                        format!("{} is negative: {value}", record.metric_type),
                    )
                    .with_field(UnifiedField::MetricValue)
                    .at_row(row),
                );
            } else if value > config.max_metric_value {
                outcome.fail(
                    index,
                    QualityIssue::new(
                        IssueKind::MetricOutOfRange,
                        Severity::Error,
                        format!(
                            "{} {value} exceeds the maximum {}",
                            record.metric_type, config.max_metric_value
                        ),
                    )
                    .with_field(UnifiedField::MetricValue)
                    .at_row(row),
                );
            }
        }

        if let Some(date) = record.date
            && (date < config.earliest_date || date > config.latest_date)
        {
            outcome.fail(
                index,
                QualityIssue::new(
                    IssueKind::DateOutOfRange,
                    Severity::Error,
                    format!(
                        "date {date} is outside {}..={}",
                        config.earliest_date, config.latest_date
                    ),
                )
                .with_field(UnifiedField::Date)
                .at_row(row),
            );
        }

        if let Some(isrc) = record.isrc.as_deref()
            && !is_valid_isrc(isrc)
        {
            outcome.fail(
                index,
                QualityIssue::new(
                    IssueKind::InvalidIsrc,
                    Severity::Warning,
                    format!("'{isrc}' is not a valid ISRC"),
                )
                .with_field(UnifiedField::Isrc)
                .at_row(row),
            );
        }

        for (field, value, limit) in [
            (UnifiedField::Artist, record.artist.as_deref(), config.max_artist_len),
            (UnifiedField::Track, record.track.as_deref(), config.max_track_len),
        ] {
            let length = value.map_or(0, |text| text.chars().count());
            if length > limit {
                outcome.fail(
                    index,
                    QualityIssue::new(
                        IssueKind::TextTooLong,
                        Severity::Warning,
                        format!("{field} is {length} characters, limit is {limit}"),
                    )
                    .with_field(field)
                    .at_row(row),
                );
            }
        }

        if let (Some(rules), Some(geography)) = (rules, record.geography.as_deref())
            && !rules.allows_geography(geography)
        {
            outcome.fail(
                index,
                QualityIssue::new(
                    IssueKind::UnexpectedGeography,
                    Severity::Warning,
                    format!(
                        "'{geography}' is not one of {}",
                        rules.allowed_geographies.join(", ")
                    ),
                )
                .with_field(UnifiedField::Geography)
                .at_row(row),
            );
        }

        if let Some(device) = record.device.as_deref()
            && !devices.is_empty()
            && !devices.iter().any(|regex| regex.is_match(device))
        {
            outcome.issues.push(
                QualityIssue::new(
                    IssueKind::UnexpectedDevice,
                    Severity::Info,
                    format!("device '{device}' matches no known device pattern"),
                )
                .with_field(UnifiedField::Device)
                .at_row(row),
            );
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::record;
    use chrono::NaiveDate;

    #[test]
    fn isrc_format() {
        assert!(is_valid_isrc("USRC17607839"));
        assert!(is_valid_isrc("us-rc1-76-07839"));
        assert!(!is_valid_isrc("USRC1760783"));
        assert!(!is_valid_isrc("1SRC17607839"));
    }

    #[test]
    fn metric_bounds() {
        let config = QualityConfig::default();
        let outcome = check(
            &[
                record(2, "A", "T", -1.0),
                record(3, "A", "T", 2_000_000_000.0),
                record(4, "A", "T", 0.0),
            ],
            &config,
            None,
        );
        assert_eq!(outcome.failed, vec![true, true, false]);
        assert_eq!(outcome.issues[0].kind, IssueKind::NegativeMetric);
        assert_eq!(outcome.issues[1].kind, IssueKind::MetricOutOfRange);
        assert!(outcome.issues.iter().all(|i| i.severity == Severity::Error));
    }

    #[test]
    fn date_window() {
        let config = QualityConfig::default();
        let mut old = record(2, "A", "T", 1.0);
        old.date = NaiveDate::from_ymd_opt(1985, 6, 1);
        let outcome = check(&[old, record(3, "A", "T", 1.0)], &config, None);
        assert_eq!(outcome.failed, vec![true, false]);
        assert_eq!(outcome.issues[0].kind, IssueKind::DateOutOfRange);
    }

    #[test]
    fn invalid_isrc_and_long_text_are_warnings() {
        let config = QualityConfig {
            max_artist_len: 3,
            ..QualityConfig::default()
        };
        let mut rec = record(2, "Artist", "T", 1.0);
        rec.isrc = Some("nope".to_string());
        let outcome = check(&[rec], &config, None);
        assert_eq!(outcome.passed(), 0);
        let kinds: Vec<_> = outcome.issues.iter().map(|i| i.kind).collect();
        assert_eq!(kinds, vec![IssueKind::InvalidIsrc, IssueKind::TextTooLong]);
        assert!(outcome.issues.iter().all(|i| i.severity == Severity::Warning));
    }

    #[test]
    fn missing_values_are_not_validity_failures() {
        let mut rec = record(2, "A", "T", 1.0);
        rec.metric_value = None;
        rec.date = None;
        let outcome = check(&[rec], &QualityConfig::default(), None);
        assert_eq!(outcome.passed(), 1);
    }

    fn boomplay_rules() -> PlatformRules {
        PlatformRules {
            allowed_geographies: ["ZA", "KE", "UG", "NG", "GH", "TZ"]
                .map(String::from)
                .to_vec(),
            device_patterns: ["samsung.*", "iPhone.*", "TECNO.*", "Infinix.*"]
                .map(String::from)
                .to_vec(),
        }
    }

    #[test]
    fn geography_outside_platform_markets_is_a_warning() {
        let rules = boomplay_rules();
        let mut lagos = record(2, "A", "T", 1.0);
        lagos.geography = Some("ng".to_string());
        let mut london = record(3, "A", "T", 1.0);
        london.geography = Some("GB".to_string());
        let outcome = check(&[lagos, london], &QualityConfig::default(), Some(&rules));
        assert_eq!(outcome.failed, vec![false, true]);
        assert_eq!(outcome.issues.len(), 1);
        assert_eq!(outcome.issues[0].kind, IssueKind::UnexpectedGeography);
        assert_eq!(outcome.issues[0].severity, Severity::Warning);
        assert_eq!(outcome.issues[0].row_index, Some(3));
    }

    #[test]
    fn unknown_device_is_informational() {
        let rules = boomplay_rules();
        let mut tecno = record(2, "A", "T", 1.0);
        tecno.device = Some("tecno Spark 10".to_string());
        let mut nokia = record(3, "A", "T", 1.0);
        nokia.device = Some("Nokia 3310".to_string());
        let outcome = check(&[tecno, nokia], &QualityConfig::default(), Some(&rules));
        assert_eq!(outcome.passed(), 2);
        assert_eq!(outcome.issues.len(), 1);
        assert_eq!(outcome.issues[0].kind, IssueKind::UnexpectedDevice);
        assert_eq!(outcome.issues[0].severity, Severity::Info);
        assert_eq!(outcome.issues[0].row_index, Some(3));
    }

    #[test]
    fn platform_rules_are_skipped_without_a_profile() {
        let mut rec = record(2, "A", "T", 1.0);
        rec.geography = Some("GB".to_string());
        rec.device = Some("Nokia".to_string());
        let outcome = check(&[rec], &QualityConfig::default(), None);
        assert!(outcome.issues.is_empty());
    }
}
