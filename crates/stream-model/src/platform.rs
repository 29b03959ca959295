//! Platform profile definitions.
//!
//! A [`PlatformProfile`] is immutable reference data describing how one
//! streaming platform lays out its report exports: delimiter, quoting style,
//! accepted date patterns, likely encodings and the mapping from source
//! columns to the unified record fields.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A field of the unified record schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnifiedField {
    Artist,
    Track,
    Isrc,
    Date,
    MetricValue,
    Geography,
    Device,
}

impl UnifiedField {
    /// Fields every record must populate to count as complete.
    pub const REQUIRED: &'static [Self] = &[Self::Artist, Self::Track, Self::Date, Self::MetricValue];

    /// Stable snake_case name used in issues and reports.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Artist => "artist",
            Self::Track => "track",
            Self::Isrc => "isrc",
            Self::Date => "date",
            Self::MetricValue => "metric_value",
            Self::Geography => "geography",
            Self::Device => "device",
        }
    }

    /// Whether completeness scoring requires this field.
    pub fn is_required(&self) -> bool {
        Self::REQUIRED.contains(self)
    }
}

impl fmt::Display for UnifiedField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How quotes are used in a platform's export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotingStyle {
    /// RFC 4180 quoting; quoted fields may contain the delimiter.
    #[default]
    Standard,
    /// Each whole line is wrapped in one pair of quotes that must be
    /// stripped before splitting on the delimiter.
    WrappedLine,
    /// Quotes carry no meaning and are kept literally.
    None,
}

impl QuotingStyle {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::WrappedLine => "wrapped_line",
            Self::None => "none",
        }
    }
}

/// Day/month ordering of a slash-separated date pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlashOrder {
    MonthFirst,
    DayFirst,
}

/// A date representation a platform may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatePattern {
    /// `2024-12-01`
    #[serde(rename = "iso")]
    Iso,
    /// `2024-12-01 17:18:10` or `2024-12-01T17:18:10`
    #[serde(rename = "iso_datetime")]
    IsoDateTime,
    /// `12/01/24`
    #[serde(rename = "mm/dd/yy")]
    MonthDayShortYear,
    /// `01/12/24`
    #[serde(rename = "dd/mm/yy")]
    DayMonthShortYear,
    /// `12/01/2024`
    #[serde(rename = "mm/dd/yyyy")]
    MonthDayYear,
    /// `01/12/2024`
    #[serde(rename = "dd/mm/yyyy")]
    DayMonthYear,
    /// `20241201`
    #[serde(rename = "yyyymmdd")]
    Compact,
    /// `2024-12-01 17:18:10.040+00` or RFC 3339
    #[serde(rename = "timestamp_tz")]
    TimestampTz,
}

impl DatePattern {
    /// Label matching the serialized name.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Iso => "iso",
            Self::IsoDateTime => "iso_datetime",
            Self::MonthDayShortYear => "mm/dd/yy",
            Self::DayMonthShortYear => "dd/mm/yy",
            Self::MonthDayYear => "mm/dd/yyyy",
            Self::DayMonthYear => "dd/mm/yyyy",
            Self::Compact => "yyyymmdd",
            Self::TimestampTz => "timestamp_tz",
        }
    }

    /// Day/month order for slash patterns, `None` for unambiguous ones.
    pub fn slash_order(&self) -> Option<SlashOrder> {
        match self {
            Self::MonthDayShortYear | Self::MonthDayYear => Some(SlashOrder::MonthFirst),
            Self::DayMonthShortYear | Self::DayMonthYear => Some(SlashOrder::DayFirst),
            _ => None,
        }
    }
}

impl fmt::Display for DatePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Text encodings the decoder knows how to try.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextEncoding {
    #[serde(rename = "utf-8", alias = "utf8")]
    Utf8,
    #[serde(rename = "windows-1252", alias = "cp1252")]
    Windows1252,
    #[serde(rename = "latin1", alias = "iso-8859-1")]
    Latin1,
    #[serde(rename = "shift_jis", alias = "shift-jis", alias = "sjis")]
    ShiftJis,
}

impl TextEncoding {
    /// Encodings tried after a profile's own hints, in order.
    pub const FALLBACK_CHAIN: [Self; 3] = [Self::Utf8, Self::Windows1252, Self::Latin1];

    /// Canonical label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Windows1252 => "windows-1252",
            Self::Latin1 => "latin1",
            Self::ShiftJis => "shift_jis",
        }
    }

    /// Parse an encoding label, accepting common aliases.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Some(Self::Utf8),
            "windows-1252" | "cp1252" => Some(Self::Windows1252),
            "latin1" | "latin-1" | "iso-8859-1" => Some(Self::Latin1),
            "shift_jis" | "shift-jis" | "sjis" => Some(Self::ShiftJis),
            _ => None,
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Maps one unified field to the source header names that may carry it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnBinding {
    pub field: UnifiedField,
    /// Accepted source header names, compared after [`normalize_column_name`].
    pub aliases: Vec<String>,
    /// A required binding missing from the header fails the whole file.
    #[serde(default)]
    pub required: bool,
}

impl ColumnBinding {
    /// Whether a normalized header name matches one of the aliases.
    pub fn matches(&self, normalized_header: &str) -> bool {
        self.aliases
            .iter()
            .any(|alias| normalize_column_name(alias) == normalized_header)
    }
}

/// Format conventions for one platform's report exports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformProfile {
    /// Platform code, e.g. `spo-spotify`.
    pub code: String,
    pub display_name: String,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    #[serde(default)]
    pub quoting: QuotingStyle,
    /// Accepted date patterns in priority order.
    pub date_patterns: Vec<DatePattern>,
    /// Encodings to try before the generic fallback chain.
    #[serde(default)]
    pub encoding_hints: Vec<TextEncoding>,
    pub columns: Vec<ColumnBinding>,
    /// Metric name recorded on every normalized record (`streams`, `plays`, ...).
    #[serde(default = "default_metric_type")]
    pub metric_type: String,
    /// Extra path tokens that identify this platform (`itunes`, `meta`, ...).
    #[serde(default)]
    pub path_aliases: Vec<String>,
    #[serde(default)]
    pub rules: PlatformRules,
}

/// Value rules a platform's data is expected to follow.
///
/// Empty lists disable the matching check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformRules {
    /// Geography codes the platform reports, compared case-insensitively.
    pub allowed_geographies: Vec<String>,
    /// Regular expressions a device value should match, case-insensitively.
    pub device_patterns: Vec<String>,
}

impl PlatformRules {
    pub fn is_empty(&self) -> bool {
        self.allowed_geographies.is_empty() && self.device_patterns.is_empty()
    }

    /// Whether a geography is in the allowed list. Always true when the list
    /// is empty.
    pub fn allows_geography(&self, geography: &str) -> bool {
        let geography = geography.trim();
        self.allowed_geographies.is_empty()
            || self
                .allowed_geographies
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(geography))
    }
}

fn default_delimiter() -> char {
    '\t'
}

fn default_metric_type() -> String {
    "streams".to_string()
}

impl PlatformProfile {
    /// Binding for a unified field, if the profile maps it.
    pub fn binding(&self, field: UnifiedField) -> Option<&ColumnBinding> {
        self.columns.iter().find(|binding| binding.field == field)
    }

    /// Bindings whose absence from the header is fatal.
    pub fn required_bindings(&self) -> impl Iterator<Item = &ColumnBinding> {
        self.columns.iter().filter(|binding| binding.required)
    }

    /// Delimiter as a single byte, as the CSV reader expects.
    ///
    /// Returns `None` for non-ASCII delimiters, which the registry rejects.
    pub fn delimiter_byte(&self) -> Option<u8> {
        u8::try_from(self.delimiter).ok().filter(u8::is_ascii)
    }

    /// Encodings to try in order: the UTF-8 attempt first, then the profile's
    /// hints, then the generic fallbacks, without repeats.
    pub fn encoding_chain(&self) -> Vec<TextEncoding> {
        let mut chain = vec![TextEncoding::Utf8];
        for encoding in self
            .encoding_hints
            .iter()
            .chain(TextEncoding::FALLBACK_CHAIN.iter())
        {
            if !chain.contains(encoding) {
                chain.push(*encoding);
            }
        }
        chain
    }

    /// All tokens that identify this platform in a file path.
    pub fn path_tokens(&self) -> Vec<String> {
        let mut tokens: Vec<String> = Vec::new();
        for token in self
            .code
            .split('-')
            .chain(self.path_aliases.iter().map(String::as_str))
            .map(str::to_ascii_lowercase)
        {
            if !token.is_empty() && !tokens.contains(&token) {
                tokens.push(token);
            }
        }
        tokens
    }
}

/// Normalize a header or alias for comparison.
///
/// Strips a byte order mark, trims, lowercases and folds runs of spaces,
/// dashes and dots into a single underscore.
pub fn normalize_column_name(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('\u{feff}').trim();
    let mut normalized = String::with_capacity(trimmed.len());
    let mut pending_separator = false;
    for ch in trimmed.chars() {
        if ch.is_whitespace() || matches!(ch, '-' | '.' | '_') {
            pending_separator = !normalized.is_empty();
            continue;
        }
        if pending_separator {
            normalized.push('_');
            pending_separator = false;
        }
        normalized.extend(ch.to_lowercase());
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(hints: Vec<TextEncoding>) -> PlatformProfile {
        PlatformProfile {
            code: "awa-awa".to_string(),
            display_name: "AWA".to_string(),
            delimiter: '\t',
            quoting: QuotingStyle::Standard,
            date_patterns: vec![DatePattern::Compact],
            encoding_hints: hints,
            columns: vec![],
            metric_type: "plays".to_string(),
            path_aliases: vec!["awa".to_string()],
            rules: PlatformRules::default(),
        }
    }

    #[test]
    fn normalize_column_name_folds_separators() {
        assert_eq!(normalize_column_name("  Artist Name "), "artist_name");
        assert_eq!(normalize_column_name("\u{feff}Report-Date"), "report_date");
        assert_eq!(normalize_column_name("track__name"), "track_name");
        assert_eq!(normalize_column_name("ISRC"), "isrc");
    }

    #[test]
    fn binding_matches_normalized_aliases() {
        let binding = ColumnBinding {
            field: UnifiedField::Artist,
            aliases: vec!["Artist Name".to_string(), "artist".to_string()],
            required: true,
        };
        assert!(binding.matches("artist_name"));
        assert!(binding.matches("artist"));
        assert!(!binding.matches("artist_id"));
    }

    #[test]
    fn encoding_chain_starts_with_utf8_and_has_no_repeats() {
        let chain = profile(vec![TextEncoding::ShiftJis, TextEncoding::Utf8]).encoding_chain();
        assert_eq!(
            chain,
            vec![
                TextEncoding::Utf8,
                TextEncoding::ShiftJis,
                TextEncoding::Windows1252,
                TextEncoding::Latin1,
            ]
        );
    }

    #[test]
    fn path_tokens_include_code_parts_and_aliases() {
        let tokens = profile(vec![]).path_tokens();
        assert_eq!(tokens, vec!["awa".to_string()]);
    }

    #[test]
    fn text_encoding_parse_accepts_aliases() {
        assert_eq!(TextEncoding::parse("CP1252"), Some(TextEncoding::Windows1252));
        assert_eq!(TextEncoding::parse("iso-8859-1"), Some(TextEncoding::Latin1));
        assert_eq!(TextEncoding::parse("ebcdic"), None);
    }

    #[test]
    fn profile_deserializes_with_defaults() {
        let profile: PlatformProfile = toml::from_str(
            r#"
            code = "dzr-deezer"
            display_name = "Deezer"
            date_patterns = ["iso", "dd/mm/yyyy"]
            encoding_hints = ["cp1252"]

            [[columns]]
            field = "artist"
            aliases = ["Artist"]
            required = true

            [[columns]]
            field = "isrc"
            aliases = ["ISRC"]
            "#,
        )
        .expect("parse profile");
        assert_eq!(profile.delimiter, '\t');
        assert_eq!(profile.quoting, QuotingStyle::Standard);
        assert_eq!(profile.metric_type, "streams");
        assert_eq!(
            profile.date_patterns,
            vec![DatePattern::Iso, DatePattern::DayMonthYear]
        );
        assert_eq!(profile.encoding_hints, vec![TextEncoding::Windows1252]);
        assert_eq!(profile.required_bindings().count(), 1);
        assert!(!profile.binding(UnifiedField::Isrc).expect("isrc").required);
        assert_eq!(profile.delimiter_byte(), Some(b'\t'));
    }

    #[test]
    fn slash_order_only_for_slash_patterns() {
        assert_eq!(DatePattern::DayMonthYear.slash_order(), Some(SlashOrder::DayFirst));
        assert_eq!(
            DatePattern::MonthDayShortYear.slash_order(),
            Some(SlashOrder::MonthFirst)
        );
        assert_eq!(DatePattern::Compact.slash_order(), None);
    }

    #[test]
    fn geography_rules_ignore_case_and_default_to_allow() {
        assert!(PlatformRules::default().allows_geography("anything"));
        let rules = PlatformRules {
            allowed_geographies: vec!["NG".to_string(), "ZA".to_string()],
            device_patterns: vec![],
        };
        assert!(rules.allows_geography("ng"));
        assert!(rules.allows_geography(" ZA "));
        assert!(!rules.allows_geography("US"));
        assert!(!rules.is_empty());
    }
}
