use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::platform::UnifiedField;

/// One streaming-metric observation in the unified schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub platform_code: String,
    pub artist: Option<String>,
    pub track: Option<String>,
    pub isrc: Option<String>,
    /// `None` when the source value was empty or matched no date pattern.
    pub date: Option<NaiveDate>,
    pub metric_type: String,
    pub metric_value: Option<f64>,
    pub geography: Option<String>,
    pub device: Option<String>,
    /// 1-based line of the source row.
    pub raw_row_index: usize,
    /// Set when the date could not be parsed and was replaced by `None`.
    #[serde(default)]
    pub degraded: bool,
}

impl NormalizedRecord {
    /// Whether the given unified field carries a value.
    pub fn is_populated(&self, field: UnifiedField) -> bool {
        match field {
            UnifiedField::Artist => has_text(self.artist.as_deref()),
            UnifiedField::Track => has_text(self.track.as_deref()),
            UnifiedField::Isrc => has_text(self.isrc.as_deref()),
            UnifiedField::Date => self.date.is_some(),
            UnifiedField::MetricValue => self.metric_value.is_some(),
            UnifiedField::Geography => has_text(self.geography.as_deref()),
            UnifiedField::Device => has_text(self.device.as_deref()),
        }
    }

    /// Whether every required field is populated.
    pub fn has_required_fields(&self) -> bool {
        UnifiedField::REQUIRED
            .iter()
            .all(|field| self.is_populated(*field))
    }

    /// Required fields that are missing, in schema order.
    pub fn missing_required_fields(&self) -> Vec<UnifiedField> {
        UnifiedField::REQUIRED
            .iter()
            .copied()
            .filter(|field| !self.is_populated(*field))
            .collect()
    }
}

fn has_text(value: Option<&str>) -> bool {
    value.is_some_and(|text| !text.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> NormalizedRecord {
        NormalizedRecord {
            platform_code: "spo-spotify".to_string(),
            artist: Some("Artist".to_string()),
            track: Some("Track".to_string()),
            isrc: None,
            date: NaiveDate::from_ymd_opt(2024, 12, 1),
            metric_type: "streams".to_string(),
            metric_value: Some(100.0),
            geography: None,
            device: None,
            raw_row_index: 2,
            degraded: false,
        }
    }

    #[test]
    fn complete_record_has_required_fields() {
        assert!(record().has_required_fields());
        assert!(record().missing_required_fields().is_empty());
    }

    #[test]
    fn blank_text_is_not_populated() {
        let mut rec = record();
        rec.artist = Some("   ".to_string());
        rec.date = None;
        assert_eq!(
            rec.missing_required_fields(),
            vec![UnifiedField::Artist, UnifiedField::Date]
        );
    }
}
