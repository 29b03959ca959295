//! Row normalization.
//!
//! [`RowNormalizer`] walks decoded report text one row at a time, splitting
//! each row per the profile's delimiter and quoting style and mapping the
//! cells onto a [`NormalizedRecord`]. It is an ordinary iterator; building a
//! new one over the same text replays the same sequence.

use std::iter::Enumerate;
use std::str::Lines;

use csv::{ReaderBuilder, StringRecord};
use stream_model::{
    IssueKind, NormalizedRecord, PlatformProfile, QualityIssue, QuotingStyle, Severity,
    TextEncoding, UnifiedField, normalize_column_name,
};
use tracing::{debug, info};

use crate::dates::parse_date;
use crate::decode::DecodedText;
use crate::error::{RowError, SchemaError};

/// Outcome of normalizing one non-blank data row.
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    /// The row produced a record, possibly with row-level issues.
    Parsed {
        record: NormalizedRecord,
        issues: Vec<QualityIssue>,
    },
    /// The row could not be split and was dropped.
    Skipped(QualityIssue),
}

struct RawRow {
    line: usize,
    fields: Vec<String>,
}

/// Physical lines of a report, split into fields.
///
/// Every row is one line. A quoted field left open at the end of its line
/// fails that row alone instead of absorbing the lines after it.
struct RowSource<'a> {
    lines: Enumerate<Lines<'a>>,
    delimiter: u8,
    quoting: QuotingStyle,
}

impl<'a> RowSource<'a> {
    fn new(text: &'a str, quoting: QuotingStyle, delimiter: u8) -> Self {
        Self {
            lines: text.lines().enumerate(),
            delimiter,
            quoting,
        }
    }

    fn next_row(&mut self) -> Option<Result<RawRow, (usize, RowError)>> {
        let (index, text) = self.lines.next()?;
        let line = index + 1;
        let delimiter = char::from(self.delimiter);
        let fields = match self.quoting {
            QuotingStyle::Standard => match split_quoted(text, self.delimiter) {
                Ok(fields) => fields,
                Err(err) => return Some(Err((line, err))),
            },
            QuotingStyle::WrappedLine => strip_wrapping(text)
                .split(delimiter)
                .map(str::to_string)
                .collect(),
            QuotingStyle::None => text.split(delimiter).map(str::to_string).collect(),
        };
        Some(Ok(RawRow { line, fields }))
    }
}

/// Split one line with CSV quoting rules.
fn split_quoted(text: &str, delimiter: u8) -> Result<Vec<String>, RowError> {
    if has_unclosed_quote(text, delimiter) {
        return Err(RowError::UnclosedQuote);
    }
    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());
    let mut record = StringRecord::new();
    match reader.read_record(&mut record) {
        Ok(true) => Ok(record.iter().map(str::to_string).collect()),
        Ok(false) => Ok(Vec::new()),
        Err(err) => Err(RowError::Split {
            message: err.to_string(),
        }),
    }
}

/// True when a quote opened at the start of a field is never closed.
///
/// A doubled quote inside a quoted field is an escaped quote. Quotes in the
/// middle of an unquoted field are literal.
fn has_unclosed_quote(text: &str, delimiter: u8) -> bool {
    let mut in_quotes = false;
    let mut field_start = true;
    let mut bytes = text.bytes().peekable();
    while let Some(byte) = bytes.next() {
        if in_quotes {
            if byte == b'"' {
                if bytes.peek() == Some(&b'"') {
                    bytes.next();
                } else {
                    in_quotes = false;
                }
            }
        } else if byte == b'"' && field_start {
            in_quotes = true;
            field_start = false;
        } else {
            field_start = byte == delimiter;
        }
    }
    in_quotes
}

/// Remove one pair of quotes surrounding a whole line, ignoring the
/// whitespace around it.
fn strip_wrapping(line: &str) -> &str {
    let trimmed = line.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    }
}

fn is_blank(fields: &[String]) -> bool {
    fields.iter().all(|field| field.trim().is_empty())
}

/// Field count once trailing empty fields are dropped.
fn significant_len(fields: &[String]) -> usize {
    fields
        .iter()
        .rposition(|field| !field.trim().is_empty())
        .map_or(0, |index| index + 1)
}

/// Lazily normalizes the data rows of one decoded report.
pub struct RowNormalizer<'a> {
    profile: &'a PlatformProfile,
    source: RowSource<'a>,
    header: Vec<String>,
    expected_fields: usize,
    columns: Vec<(UnifiedField, Option<usize>)>,
    file_issues: Vec<QualityIssue>,
}

impl<'a> RowNormalizer<'a> {
    /// Read the header and resolve the profile's column bindings.
    ///
    /// Fails when a required binding matches no header column.
    pub fn new(decoded: &'a DecodedText, profile: &'a PlatformProfile) -> Result<Self, SchemaError> {
        let delimiter = profile
            .delimiter_byte()
            .ok_or_else(|| SchemaError::UnsupportedDelimiter {
                platform: profile.code.clone(),
                delimiter: profile.delimiter,
            })?;
        let mut source = RowSource::new(&decoded.text, profile.quoting, delimiter);

        let header = loop {
            match source.next_row() {
                Some(Ok(row)) if !is_blank(&row.fields) => {
                    break row
                        .fields
                        .iter()
                        .map(|cell| cell.trim().to_string())
                        .collect::<Vec<_>>();
                }
                Some(_) => {}
                None => {
                    return Err(SchemaError::NoHeader {
                        platform: profile.code.clone(),
                    });
                }
            }
        };

        let normalized: Vec<String> = header.iter().map(|h| normalize_column_name(h)).collect();
        let mut columns = Vec::with_capacity(profile.columns.len());
        let mut missing = Vec::new();
        let mut file_issues = Vec::new();
        for binding in &profile.columns {
            let index = normalized.iter().position(|name| binding.matches(name));
            if index.is_none() {
                if binding.required {
                    missing.push(binding.field);
                } else {
                    file_issues.push(
                        QualityIssue::new(
                            IssueKind::MissingOptionalColumn,
                            Severity::Info,
                            format!("no column for optional field '{}'", binding.field),
                        )
                        .with_field(binding.field),
                    );
                }
            }
            columns.push((binding.field, index));
        }
        if !missing.is_empty() {
            return Err(SchemaError::MissingRequiredColumns {
                platform: profile.code.clone(),
                missing,
            });
        }

        debug!(
            platform = %profile.code,
            columns = header.len(),
            "Resolved report header"
        );

        Ok(Self {
            profile,
            source,
            expected_fields: significant_len(&header),
            header,
            columns,
            file_issues,
        })
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// File-level issues found while resolving the header.
    pub fn file_issues(&self) -> &[QualityIssue] {
        &self.file_issues
    }

    pub fn profile(&self) -> &'a PlatformProfile {
        self.profile
    }

    fn cell<'r>(&self, fields: &'r [String], field: UnifiedField) -> Option<&'r str> {
        self.columns
            .iter()
            .find(|(bound, _)| *bound == field)
            .and_then(|(_, index)| *index)
            .and_then(|index| fields.get(index))
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    fn normalize_row(&self, row: RawRow) -> RowOutcome {
        let line = row.line;
        let found = if row.fields.len() < self.expected_fields {
            row.fields.len()
        } else {
            significant_len(&row.fields)
        };
        if row.fields.len() < self.expected_fields || found > self.expected_fields {
            debug!(line, expected = self.expected_fields, found, "Skipping malformed row");
            return RowOutcome::Skipped(row_issue(
                line,
                &RowError::FieldCount {
                    expected: self.expected_fields,
                    found,
                },
            ));
        }

        let fields = &row.fields;
        let mut issues = Vec::new();
        let text = |field| self.cell(fields, field).map(str::to_string);

        let mut degraded = false;
        let date = match self.cell(fields, UnifiedField::Date) {
            None => None,
            Some(raw) => match parse_date(raw, &self.profile.date_patterns) {
                Some(parsed) => {
                    if let Some((alternative, pattern)) = parsed.ambiguous_with {
                        issues.push(
                            QualityIssue::new(
                                IssueKind::AmbiguousDate,
                                Severity::Info,
                                format!(
                                    "'{raw}' read as {} ({}); {pattern} would give {alternative}",
                                    parsed.date, parsed.pattern
                                ),
                            )
                            .with_field(UnifiedField::Date)
                            .at_row(line),
                        );
                    }
                    Some(parsed.date)
                }
                None => {
                    degraded = true;
                    issues.push(
                        QualityIssue::new(
                            IssueKind::DateParseError,
                            Severity::Error,
                            format!("date '{raw}' matches none of the declared patterns"),
                        )
                        .with_field(UnifiedField::Date)
                        .at_row(line),
                    );
                    None
                }
            },
        };

        for (field, index) in &self.columns {
            if index.is_some() && !field.is_required() && self.cell(fields, *field).is_none() {
                issues.push(
                    QualityIssue::new(
                        IssueKind::MissingOptionalField,
                        Severity::Warning,
                        format!("optional field '{field}' is empty"),
                    )
                    .with_field(*field)
                    .at_row(line),
                );
            }
        }

        let record = NormalizedRecord {
            platform_code: self.profile.code.clone(),
            artist: text(UnifiedField::Artist),
            track: text(UnifiedField::Track),
            isrc: text(UnifiedField::Isrc),
            date,
            metric_type: self.profile.metric_type.clone(),
            metric_value: self
                .cell(fields, UnifiedField::MetricValue)
                .and_then(|raw| parse_metric(raw, self.profile.delimiter)),
            geography: text(UnifiedField::Geography),
            device: text(UnifiedField::Device),
            raw_row_index: line,
            degraded,
        };
        RowOutcome::Parsed { record, issues }
    }
}

impl Iterator for RowNormalizer<'_> {
    type Item = RowOutcome;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let row = match self.source.next_row()? {
                Ok(row) => row,
                Err((line, err)) => {
                    debug!(line, error = %err, "Skipping unreadable row");
                    return Some(RowOutcome::Skipped(row_issue(line, &err)));
                }
            };
            if is_blank(&row.fields) {
                continue;
            }
            return Some(self.normalize_row(row));
        }
    }
}

fn row_issue(line: usize, err: &RowError) -> QualityIssue {
    QualityIssue::new(
        IssueKind::ParseError,
        Severity::Error,
        format!("line {line}: {err}"),
    )
    .at_row(line)
}

/// Parse a metric cell, ignoring thousands separators.
///
/// A comma counts as a separator only when it is not the file's delimiter.
pub fn parse_metric(raw: &str, delimiter: char) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|&c| !is_metric_separator(c, delimiter))
        .collect();
    cleaned.parse::<f64>().ok().filter(|value| value.is_finite())
}

fn is_metric_separator(c: char, delimiter: char) -> bool {
    matches!(c, '_' | ' ' | '\u{a0}') || (c == ',' && delimiter != ',')
}

/// All outcomes of one file, materialized.
#[derive(Debug, Clone)]
pub struct ParsedFile {
    pub platform_code: String,
    pub encoding: TextEncoding,
    pub header: Vec<String>,
    pub records: Vec<NormalizedRecord>,
    /// File-level issues first, then row issues in source order.
    pub issues: Vec<QualityIssue>,
    pub rows_skipped: usize,
}

impl ParsedFile {
    /// Drain a normalizer into a materialized file.
    pub fn collect(normalizer: RowNormalizer<'_>, encoding: TextEncoding) -> Self {
        let mut parsed = Self {
            platform_code: normalizer.profile().code.clone(),
            encoding,
            header: normalizer.header().to_vec(),
            records: Vec::new(),
            issues: normalizer.file_issues().to_vec(),
            rows_skipped: 0,
        };
        for outcome in normalizer {
            match outcome {
                RowOutcome::Parsed { record, issues } => {
                    parsed.records.push(record);
                    parsed.issues.extend(issues);
                }
                RowOutcome::Skipped(issue) => {
                    parsed.rows_skipped += 1;
                    parsed.issues.push(issue);
                }
            }
        }
        info!(
            platform = %parsed.platform_code,
            encoding = %parsed.encoding,
            records = parsed.records.len(),
            skipped = parsed.rows_skipped,
            "Normalized report rows"
        );
        parsed
    }

    /// Data rows seen, parsed or skipped.
    pub fn rows_seen(&self) -> usize {
        self.records.len() + self.rows_skipped
    }

    pub fn has_data_rows(&self) -> bool {
        self.rows_seen() > 0
    }

    pub fn degraded_records(&self) -> usize {
        self.records.iter().filter(|record| record.degraded).count()
    }
}

/// Normalize every row of decoded text with a profile.
pub fn normalize(decoded: &DecodedText, profile: &PlatformProfile) -> Result<ParsedFile, SchemaError> {
    let normalizer = RowNormalizer::new(decoded, profile)?;
    Ok(ParsedFile::collect(normalizer, decoded.encoding))
}
