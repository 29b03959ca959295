use std::collections::BTreeMap;

use stream_model::{NormalizedRecord, QualityScoreResult};
use tracing::debug;

use super::{FileBatch, RecordStore};
use crate::error::StoreError;

/// A file held by [`MemoryStore`].
#[derive(Debug, Clone, PartialEq)]
pub struct StoredFile {
    pub platform_code: String,
    pub source_path: String,
    pub records: Vec<NormalizedRecord>,
    pub quality: QualityScoreResult,
    /// Chunk sizes the records arrived in.
    pub chunks: Vec<usize>,
}

/// In-memory store.
///
/// Chunks are staged and only committed once the whole batch is written.
/// Failures can be injected to exercise retry handling.
#[derive(Debug, Default)]
pub struct MemoryStore {
    files: BTreeMap<String, StoredFile>,
    transient_failures: u32,
    rejection: Option<String>,
    persist_calls: u32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `count` persist calls with a transient error.
    #[must_use]
    pub fn with_transient_failures(mut self, count: u32) -> Self {
        self.transient_failures = count;
        self
    }

    /// Reject every persist call with a non-retryable error.
    #[must_use]
    pub fn rejecting(mut self, reason: impl Into<String>) -> Self {
        self.rejection = Some(reason.into());
        self
    }

    pub fn get(&self, content_hash: &str) -> Option<&StoredFile> {
        self.files.get(content_hash)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn record_count(&self) -> usize {
        self.files.values().map(|file| file.records.len()).sum()
    }

    /// Number of persist calls, failed ones included.
    pub fn persist_calls(&self) -> u32 {
        self.persist_calls
    }
}

impl RecordStore for MemoryStore {
    fn is_processed(&self, content_hash: &str) -> Result<bool, StoreError> {
        Ok(self.files.contains_key(content_hash))
    }

    fn persist(&mut self, batch: &FileBatch<'_>, batch_size: usize) -> Result<usize, StoreError> {
        self.persist_calls += 1;
        if let Some(reason) = &self.rejection {
            return Err(StoreError::Rejected {
                reason: reason.clone(),
            });
        }
        if self.transient_failures > 0 {
            self.transient_failures -= 1;
            return Err(StoreError::Transient {
                message: "injected failure".to_string(),
            });
        }

        let mut staged = Vec::with_capacity(batch.records.len());
        let mut chunks = Vec::new();
        for chunk in batch.records.chunks(batch_size.max(1)) {
            staged.extend_from_slice(chunk);
            chunks.push(chunk.len());
        }
        let written = staged.len();
        debug!(
            content_hash = batch.content_hash,
            records = written,
            chunks = chunks.len(),
            "Committed batch"
        );
        self.files.insert(
            batch.content_hash.to_string(),
            StoredFile {
                platform_code: batch.platform_code.to_string(),
                source_path: batch.source_path.display().to_string(),
                records: staged,
                quality: batch.quality.clone(),
                chunks,
            },
        );
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use stream_model::{DimensionScores, TextEncoding};

    use super::*;

    fn quality() -> QualityScoreResult {
        QualityScoreResult {
            overall_score: 100.0,
            dimension_scores: DimensionScores::default(),
            issues: Vec::new(),
            records_total: 0,
            records_valid: 0,
        }
    }

    fn record(row: usize) -> NormalizedRecord {
        NormalizedRecord {
            platform_code: "spo-spotify".to_string(),
            artist: Some("Artist".to_string()),
            track: Some(format!("Track {row}")),
            isrc: None,
            date: None,
            metric_type: "streams".to_string(),
            metric_value: Some(1.0),
            geography: None,
            device: None,
            raw_row_index: row,
            degraded: false,
        }
    }

    #[test]
    fn test_persist_splits_into_chunks() {
        let records: Vec<_> = (2..9).map(record).collect();
        let quality = quality();
        let batch = FileBatch {
            content_hash: "abc",
            platform_code: "spo-spotify",
            source_path: Path::new("spotify.tsv"),
            encoding: TextEncoding::Utf8,
            records: &records,
            quality: &quality,
        };
        let mut store = MemoryStore::new();
        assert!(!store.is_processed("abc").unwrap());
        assert_eq!(store.persist(&batch, 3).unwrap(), 7);
        assert!(store.is_processed("abc").unwrap());
        assert_eq!(store.get("abc").unwrap().chunks, vec![3, 3, 1]);
        assert_eq!(store.record_count(), 7);
    }

    #[test]
    fn test_failed_persist_commits_nothing() {
        let records = vec![record(2)];
        let quality = quality();
        let batch = FileBatch {
            content_hash: "abc",
            platform_code: "spo-spotify",
            source_path: Path::new("spotify.tsv"),
            encoding: TextEncoding::Utf8,
            records: &records,
            quality: &quality,
        };
        let mut store = MemoryStore::new().with_transient_failures(1);
        assert!(store.persist(&batch, 10).unwrap_err().is_transient());
        assert!(store.is_empty());
        assert_eq!(store.persist(&batch, 10).unwrap(), 1);
        assert_eq!(store.persist_calls(), 2);

        let mut rejecting = MemoryStore::new().rejecting("read only");
        assert!(!rejecting.persist(&batch, 10).unwrap_err().is_transient());
    }
}
