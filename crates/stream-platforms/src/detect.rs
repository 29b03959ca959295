//! Format detection: choose a platform profile for a report file.
//!
//! Path tokens are tried first because report exports are conventionally
//! filed under a platform folder or carry the platform code in their name.
//! When the path says nothing, the header line is compared against each
//! profile's column bindings.

use std::fmt;
use std::path::Path;

use stream_model::{PlatformProfile, QuotingStyle, normalize_column_name};
use tracing::debug;

use crate::error::DetectionError;
use crate::registry::PlatformRegistry;

/// Confidence for a full platform code found in the path.
pub const PATH_CODE_CONFIDENCE: f64 = 1.0;
/// Confidence for a platform alias found as a whole path token.
pub const PATH_ALIAS_CONFIDENCE: f64 = 0.9;
/// Upper bound for header-based detection.
pub const HEADER_CONFIDENCE_CAP: f64 = 0.8;
/// Default minimum confidence for accepting a detection.
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.5;

const HEADER_MATCH_WEIGHT: f64 = 0.6;
const DELIMITER_BONUS: f64 = 0.1;
const QUOTING_BONUS: f64 = 0.1;
const REQUIRED_SHARE: f64 = 0.7;

/// How a profile was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionMethod {
    PathCode,
    PathAlias,
    Header,
}

impl DetectionMethod {
    pub fn label(&self) -> &'static str {
        match self {
            Self::PathCode => "path code",
            Self::PathAlias => "path alias",
            Self::Header => "header",
        }
    }
}

impl fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A chosen profile with the confidence of the choice.
#[derive(Debug, Clone, Copy)]
pub struct Detection<'a> {
    pub profile: &'a PlatformProfile,
    pub confidence: f64,
    pub method: DetectionMethod,
}

/// Picks profiles out of a registry.
#[derive(Debug, Clone, Copy)]
pub struct FormatDetector<'a> {
    registry: &'a PlatformRegistry,
    min_confidence: f64,
}

impl<'a> FormatDetector<'a> {
    pub fn new(registry: &'a PlatformRegistry) -> Self {
        Self {
            registry,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
        }
    }

    #[must_use]
    pub fn with_min_confidence(mut self, min_confidence: f64) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    /// Detect the platform of a file from its path and first lines.
    pub fn detect(&self, path: &Path, peek: &[String]) -> Result<Detection<'a>, DetectionError> {
        if let Some(detection) = self.detect_from_path(path) {
            debug!(
                path = %path.display(),
                platform = %detection.profile.code,
                method = %detection.method,
                "Detected platform from path"
            );
            return Ok(detection);
        }

        let best = self.detect_from_header(peek);
        match best {
            Some(detection) if detection.confidence >= self.min_confidence => {
                debug!(
                    path = %path.display(),
                    platform = %detection.profile.code,
                    confidence = detection.confidence,
                    "Detected platform from header"
                );
                Ok(detection)
            }
            _ => Err(DetectionError::NoMatch {
                path: path.to_path_buf(),
                best_confidence: best.map_or(0.0, |d| d.confidence),
                min_confidence: self.min_confidence,
            }),
        }
    }

    /// Match path components, nearest to the file name first.
    pub fn detect_from_path(&self, path: &Path) -> Option<Detection<'a>> {
        for component in path.iter().rev() {
            let component = component.to_string_lossy().to_lowercase();

            if let Some(profile) = self
                .registry
                .iter()
                .find(|profile| component.contains(&profile.code.to_lowercase()))
            {
                return Some(Detection {
                    profile,
                    confidence: PATH_CODE_CONFIDENCE,
                    method: DetectionMethod::PathCode,
                });
            }

            let tokens: Vec<&str> = component
                .split(|c: char| !c.is_ascii_alphanumeric())
                .filter(|token| !token.is_empty())
                .collect();
            if let Some(profile) = self.registry.iter().find(|profile| {
                profile
                    .path_tokens()
                    .iter()
                    .any(|alias| tokens.contains(&alias.as_str()))
            }) {
                return Some(Detection {
                    profile,
                    confidence: PATH_ALIAS_CONFIDENCE,
                    method: DetectionMethod::PathAlias,
                });
            }
        }
        None
    }

    /// Best header match regardless of the minimum confidence.
    pub fn detect_from_header(&self, peek: &[String]) -> Option<Detection<'a>> {
        let header = peek.iter().find(|line| !line.trim().is_empty())?;
        let shape = HeaderShape::sniff(header);

        let mut best: Option<Detection<'a>> = None;
        for profile in self.registry.iter() {
            let confidence = score_header(profile, header, &shape);
            if confidence <= 0.0 {
                continue;
            }
            if best.is_none_or(|current| confidence > current.confidence) {
                best = Some(Detection {
                    profile,
                    confidence,
                    method: DetectionMethod::Header,
                });
            }
        }
        best
    }
}

/// Delimiter and quoting observed on a header line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HeaderShape {
    delimiter: Option<char>,
    wrapped: bool,
}

impl HeaderShape {
    fn sniff(line: &str) -> Self {
        let trimmed = line.trim();
        let wrapped = is_wrapped_line(trimmed);
        let delimiter = sniff_delimiter(trimmed);
        Self { delimiter, wrapped }
    }
}

/// Most frequent of tab, comma and semicolon; ties favor that order.
pub fn sniff_delimiter(line: &str) -> Option<char> {
    let mut best: Option<(char, usize)> = None;
    for candidate in ['\t', ',', ';'] {
        let count = line.matches(candidate).count();
        if count > 0 && best.is_none_or(|(_, best_count)| count > best_count) {
            best = Some((candidate, count));
        }
    }
    best.map(|(delimiter, _)| delimiter)
}

/// A line wrapped in one pair of quotes with no quotes inside.
pub fn is_wrapped_line(line: &str) -> bool {
    line.len() >= 2
        && line.starts_with('"')
        && line.ends_with('"')
        && !line[1..line.len() - 1].contains('"')
}

fn score_header(profile: &PlatformProfile, header: &str, shape: &HeaderShape) -> f64 {
    let line = header.trim();
    let line = if shape.wrapped {
        &line[1..line.len() - 1]
    } else {
        line
    };
    let names: Vec<String> = line
        .split(profile.delimiter)
        .map(|cell| normalize_column_name(cell.trim().trim_matches('"')))
        .filter(|name| !name.is_empty())
        .collect();
    if names.is_empty() {
        return 0.0;
    }

    let (mut required_total, mut required_found) = (0usize, 0usize);
    let (mut optional_total, mut optional_found) = (0usize, 0usize);
    for binding in &profile.columns {
        let found = names.iter().any(|name| binding.matches(name));
        if binding.required {
            required_total += 1;
            required_found += usize::from(found);
        } else {
            optional_total += 1;
            optional_found += usize::from(found);
        }
    }
    if required_found + optional_found == 0 {
        return 0.0;
    }

    let required_ratio = ratio(required_found, required_total);
    let optional_ratio = ratio(optional_found, optional_total);
    let mut matched = match (required_total, optional_total) {
        (0, _) => optional_ratio,
        (_, 0) => required_ratio,
        _ => REQUIRED_SHARE * required_ratio + (1.0 - REQUIRED_SHARE) * optional_ratio,
    };
    if required_found < required_total {
        matched *= 0.5;
    }

    let mut confidence = HEADER_MATCH_WEIGHT * matched;
    if shape.delimiter == Some(profile.delimiter) {
        confidence += DELIMITER_BONUS;
    }
    if shape.wrapped == (profile.quoting == QuotingStyle::WrappedLine) {
        confidence += QUOTING_BONUS;
    }
    confidence.min(HEADER_CONFIDENCE_CAP)
}

fn ratio(found: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        found as f64 / total as f64
    }
}

/// First lines of a file, decoded lossily, for detection.
pub fn peek_lines(bytes: &[u8], max_lines: usize) -> Vec<String> {
    let text = String::from_utf8_lossy(bytes);
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);
    text.lines()
        .take(max_lines)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn registry() -> PlatformRegistry {
        PlatformRegistry::builtin().unwrap()
    }

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(str::to_string).collect()
    }

    #[test]
    fn full_code_in_file_name_wins() {
        let registry = registry();
        let detector = FormatDetector::new(&registry);
        let detection = detector
            .detect(Path::new("/reports/2024/spo-spotify_2024-12.tsv"), &[])
            .unwrap();
        assert_eq!(detection.profile.code, "spo-spotify");
        assert_eq!(detection.method, DetectionMethod::PathCode);
        assert!((detection.confidence - PATH_CODE_CONFIDENCE).abs() < f64::EPSILON);
    }

    #[test]
    fn alias_token_matches_directory() {
        let registry = registry();
        let detector = FormatDetector::new(&registry);
        let detection = detector
            .detect(Path::new("/data/itunes/daily_report.txt"), &[])
            .unwrap();
        assert_eq!(detection.profile.code, "apl-apple");
        assert_eq!(detection.method, DetectionMethod::PathAlias);
    }

    #[test]
    fn alias_must_be_a_whole_token() {
        let registry = registry();
        let detector = FormatDetector::new(&registry);
        assert!(
            detector
                .detect_from_path(Path::new("/data/hawaii_sales.tsv"))
                .is_none()
        );
    }

    #[test]
    fn file_name_beats_parent_directory() {
        let registry = registry();
        let detector = FormatDetector::new(&registry);
        let detection = detector
            .detect_from_path(Path::new("/spotify/deezer_export.tsv"))
            .unwrap();
        assert_eq!(detection.profile.code, "dzr-deezer");
    }

    #[test]
    fn header_detects_spotify_shape() {
        let registry = registry();
        let detector = FormatDetector::new(&registry);
        let peek = lines("track_name\tartist_name\tstreams\tdate\nSong\tSinger\t10\t2024-12-01");
        let detection = detector.detect(Path::new("/tmp/report.txt"), &peek).unwrap();
        assert_eq!(detection.profile.code, "spo-spotify");
        assert_eq!(detection.method, DetectionMethod::Header);
        assert!(detection.confidence <= HEADER_CONFIDENCE_CAP);
        assert!(detection.confidence < PATH_ALIAS_CONFIDENCE);
    }

    #[test]
    fn header_detects_wrapped_apple_lines() {
        let registry = registry();
        let detector = FormatDetector::new(&registry);
        let peek = lines("\"Artist Name\tSong Name\tReport Date\tQuantity\"");
        let detection = detector.detect(Path::new("/tmp/export.txt"), &peek).unwrap();
        assert_eq!(detection.profile.code, "apl-apple");
    }

    #[test]
    fn header_detects_quoted_facebook_csv() {
        let registry = registry();
        let detector = FormatDetector::new(&registry);
        let peek = lines("\"isrc\",\"date\",\"plays\",\"product_type\"");
        let detection = detector.detect(Path::new("/tmp/export.csv"), &peek).unwrap();
        assert_eq!(detection.profile.code, "fbk-facebook");
    }

    #[test]
    fn unknown_header_fails_with_no_match() {
        let registry = registry();
        let detector = FormatDetector::new(&registry);
        let peek = lines("foo,bar,baz\n1,2,3");
        let err = detector
            .detect(Path::new("/tmp/unknown.csv"), &peek)
            .unwrap_err();
        let DetectionError::NoMatch { path, .. } = err;
        assert_eq!(path, PathBuf::from("/tmp/unknown.csv"));
    }

    #[test]
    fn min_confidence_is_respected() {
        let registry = registry();
        let detector = FormatDetector::new(&registry).with_min_confidence(0.95);
        let peek = lines("track_name\tartist_name\tstreams\tdate");
        assert!(detector.detect(Path::new("/tmp/report.txt"), &peek).is_err());
    }

    #[test]
    fn sniff_delimiter_prefers_most_frequent() {
        assert_eq!(sniff_delimiter("a\tb\tc"), Some('\t'));
        assert_eq!(sniff_delimiter("a,b;c;d"), Some(';'));
        assert_eq!(sniff_delimiter("a\tb,c"), Some('\t'));
        assert_eq!(sniff_delimiter("single"), None);
    }

    #[test]
    fn wrapped_line_excludes_per_field_quoting() {
        assert!(is_wrapped_line("\"a\tb\tc\""));
        assert!(!is_wrapped_line("\"a\",\"b\""));
        assert!(!is_wrapped_line("a\tb"));
    }

    #[test]
    fn peek_lines_strips_bom_and_limits() {
        let peeked = peek_lines(b"\xEF\xBB\xBFa\tb\n1\t2\n3\t4\n", 2);
        assert_eq!(peeked, vec!["a\tb".to_string(), "1\t2".to_string()]);
    }
}
