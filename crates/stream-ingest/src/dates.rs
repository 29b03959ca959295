//! Date parsing against a profile's declared patterns.
//!
//! Patterns are tried in declared order and the first match wins. Slash
//! patterns are parsed by hand so that two-digit and four-digit years never
//! overlap: `01/12/24` only matches the short-year patterns.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use stream_model::DatePattern;

/// A successfully parsed date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedDate {
    pub date: NaiveDate,
    pub pattern: DatePattern,
    /// A different date produced by a later pattern with the opposite
    /// day/month order.
    pub ambiguous_with: Option<(NaiveDate, DatePattern)>,
}

/// Parse a raw date cell with the given patterns.
///
/// Returns `None` when the value is blank or no pattern matches.
pub fn parse_date(value: &str, patterns: &[DatePattern]) -> Option<ParsedDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    let (index, pattern, date) = patterns
        .iter()
        .enumerate()
        .find_map(|(index, pattern)| parse_with(value, *pattern).map(|date| (index, *pattern, date)))?;

    let ambiguous_with = pattern.slash_order().and_then(|order| {
        patterns[index + 1..]
            .iter()
            .filter(|other| other.slash_order().is_some_and(|o| o != order))
            .find_map(|other| {
                parse_with(value, *other)
                    .filter(|alternative| *alternative != date)
                    .map(|alternative| (alternative, *other))
            })
    });

    Some(ParsedDate {
        date,
        pattern,
        ambiguous_with,
    })
}

/// Parse a trimmed value with exactly one pattern.
pub fn parse_with(value: &str, pattern: DatePattern) -> Option<NaiveDate> {
    match pattern {
        DatePattern::Iso => NaiveDate::parse_from_str(value, "%Y-%m-%d").ok(),
        DatePattern::IsoDateTime => ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
            .map(|datetime| datetime.date()),
        DatePattern::MonthDayShortYear => parse_slash(value, SlashLayout::MONTH_DAY_SHORT),
        DatePattern::DayMonthShortYear => parse_slash(value, SlashLayout::DAY_MONTH_SHORT),
        DatePattern::MonthDayYear => parse_slash(value, SlashLayout::MONTH_DAY_LONG),
        DatePattern::DayMonthYear => parse_slash(value, SlashLayout::DAY_MONTH_LONG),
        DatePattern::Compact => parse_compact(value),
        DatePattern::TimestampTz => parse_timestamp_tz(value),
    }
}

#[derive(Debug, Clone, Copy)]
struct SlashLayout {
    month_first: bool,
    year_digits: usize,
}

impl SlashLayout {
    const MONTH_DAY_SHORT: Self = Self {
        month_first: true,
        year_digits: 2,
    };
    const DAY_MONTH_SHORT: Self = Self {
        month_first: false,
        year_digits: 2,
    };
    const MONTH_DAY_LONG: Self = Self {
        month_first: true,
        year_digits: 4,
    };
    const DAY_MONTH_LONG: Self = Self {
        month_first: false,
        year_digits: 4,
    };
}

fn parse_slash(value: &str, layout: SlashLayout) -> Option<NaiveDate> {
    let mut parts = value.split('/');
    let (first, second, year) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    if !is_digits(first, 1..=2) || !is_digits(second, 1..=2) {
        return None;
    }
    if !is_digits(year, layout.year_digits..=layout.year_digits) {
        return None;
    }

    let first: u32 = first.parse().ok()?;
    let second: u32 = second.parse().ok()?;
    let mut year: i32 = year.parse().ok()?;
    if layout.year_digits == 2 {
        year += if year < 69 { 2000 } else { 1900 };
    }
    let (month, day) = if layout.month_first {
        (first, second)
    } else {
        (second, first)
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_compact(value: &str) -> Option<NaiveDate> {
    if !is_digits(value, 8..=8) {
        return None;
    }
    let year: i32 = value[0..4].parse().ok()?;
    let month: u32 = value[4..6].parse().ok()?;
    let day: u32 = value[6..8].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_timestamp_tz(value: &str) -> Option<NaiveDate> {
    let normalized = normalize_offset(value);
    DateTime::parse_from_rfc3339(&normalized)
        .ok()
        .or_else(|| {
            ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M:%S%.f%:z"]
                .iter()
                .find_map(|format| DateTime::parse_from_str(&normalized, format).ok())
        })
        .map(|datetime| datetime.with_timezone(&Utc).date_naive())
}

/// Expand a trailing hour-only offset (`+00`, `-05`) to `+00:00`.
fn normalize_offset(value: &str) -> String {
    let bytes = value.as_bytes();
    let len = bytes.len();
    if len >= 4
        && matches!(bytes[len - 3], b'+' | b'-')
        && bytes[len - 2].is_ascii_digit()
        && bytes[len - 1].is_ascii_digit()
        && bytes[len - 4].is_ascii_digit()
    {
        format!("{value}:00")
    } else {
        value.to_string()
    }
}

fn is_digits(value: &str, len: std::ops::RangeInclusive<usize>) -> bool {
    len.contains(&value.len()) && value.bytes().all(|b| b.is_ascii_digit())
}
