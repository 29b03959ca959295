//! One JSON Lines file per processed content hash.
//!
//! `<hash>.jsonl` holds the [`BatchManifest`] on its first line and one
//! record per following line. Files are written to a temporary path, synced
//! and renamed into place.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use stream_model::NormalizedRecord;
use tracing::{debug, info};

use super::{BatchManifest, FileBatch, RecordStore};
use crate::error::StoreError;

#[derive(Debug, Clone)]
pub struct JsonlStore {
    dir: PathBuf,
}

impl JsonlStore {
    /// Open a store rooted at `dir`, creating it if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            operation: "create directory",
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_path(&self, content_hash: &str) -> PathBuf {
        self.dir.join(format!("{content_hash}.jsonl"))
    }

    /// Read back a stored file.
    pub fn load(
        &self,
        content_hash: &str,
    ) -> Result<(BatchManifest, Vec<NormalizedRecord>), StoreError> {
        let path = self.file_path(content_hash);
        let file = File::open(&path).map_err(|source| StoreError::Io {
            operation: "open",
            path: path.clone(),
            source,
        })?;
        let mut lines = BufReader::new(file).lines();
        let read_err = |source| StoreError::Io {
            operation: "read",
            path: path.clone(),
            source,
        };

        let Some(first) = lines.next() else {
            return Err(StoreError::Rejected {
                reason: format!("{} has no manifest line", path.display()),
            });
        };
        let manifest: BatchManifest = serde_json::from_str(&first.map_err(read_err)?)
            .map_err(|source| StoreError::Serialization { source })?;

        let mut records = Vec::with_capacity(manifest.record_count);
        for line in lines {
            let line = line.map_err(read_err)?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(
                serde_json::from_str(&line)
                    .map_err(|source| StoreError::Serialization { source })?,
            );
        }
        Ok((manifest, records))
    }

    fn write_batch(
        &self,
        path: &Path,
        batch: &FileBatch<'_>,
        batch_size: usize,
    ) -> Result<usize, StoreError> {
        let file = File::create(path).map_err(|source| StoreError::Io {
            operation: "create",
            path: path.to_path_buf(),
            source,
        })?;
        let write_err = |source| StoreError::Io {
            operation: "write",
            path: path.to_path_buf(),
            source,
        };
        let mut writer = BufWriter::new(file);

        serde_json::to_writer(&mut writer, &batch.manifest())
            .map_err(|source| StoreError::Serialization { source })?;
        writer.write_all(b"\n").map_err(write_err)?;

        let mut written = 0;
        for (index, chunk) in batch.records.chunks(batch_size.max(1)).enumerate() {
            for record in chunk {
                serde_json::to_writer(&mut writer, record)
                    .map_err(|source| StoreError::Serialization { source })?;
                writer.write_all(b"\n").map_err(write_err)?;
            }
            writer.flush().map_err(write_err)?;
            written += chunk.len();
            debug!(chunk = index + 1, records = chunk.len(), "Wrote chunk");
        }

        let file = writer
            .into_inner()
            .map_err(|err| write_err(err.into_error()))?;
        file.sync_all().map_err(|source| StoreError::Io {
            operation: "sync",
            path: path.to_path_buf(),
            source,
        })?;
        Ok(written)
    }
}

impl RecordStore for JsonlStore {
    fn is_processed(&self, content_hash: &str) -> Result<bool, StoreError> {
        Ok(self.file_path(content_hash).is_file())
    }

    fn persist(&mut self, batch: &FileBatch<'_>, batch_size: usize) -> Result<usize, StoreError> {
        let target = self.file_path(batch.content_hash);
        let temp = target.with_extension("jsonl.tmp");

        let written = match self.write_batch(&temp, batch, batch_size) {
            Ok(written) => written,
            Err(err) => {
                let _ = fs::remove_file(&temp);
                return Err(err);
            }
        };

        if let Err(source) = fs::rename(&temp, &target) {
            let _ = fs::remove_file(&temp);
            return Err(StoreError::Io {
                operation: "rename",
                path: target,
                source,
            });
        }

        info!(
            path = %target.display(),
            platform = batch.platform_code,
            records = written,
            "Persisted records"
        );
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use stream_model::{DimensionScores, QualityScoreResult, TextEncoding};
    use tempfile::TempDir;

    use super::*;

    fn record(row: usize, streams: f64) -> NormalizedRecord {
        NormalizedRecord {
            platform_code: "dzr-deezer".to_string(),
            artist: Some("Artist".to_string()),
            track: Some("Track".to_string()),
            isrc: Some("USRC17607839".to_string()),
            date: NaiveDate::from_ymd_opt(2024, 3, 1),
            metric_type: "streams".to_string(),
            metric_value: Some(streams),
            geography: Some("FR".to_string()),
            device: None,
            raw_row_index: row,
            degraded: false,
        }
    }

    #[test]
    fn test_persist_and_load() {
        let temp = TempDir::new().unwrap();
        let mut store = JsonlStore::open(temp.path().join("out")).unwrap();
        let records = vec![record(2, 10.0), record(3, 20.0), record(4, 30.0)];
        let quality = QualityScoreResult {
            overall_score: 96.5,
            dimension_scores: DimensionScores::default(),
            issues: Vec::new(),
            records_total: 3,
            records_valid: 3,
        };
        let batch = FileBatch {
            content_hash: "feedface",
            platform_code: "dzr-deezer",
            source_path: Path::new("reports/deezer.csv"),
            encoding: TextEncoding::Windows1252,
            records: &records,
            quality: &quality,
        };

        assert!(!store.is_processed("feedface").unwrap());
        assert_eq!(store.persist(&batch, 2).unwrap(), 3);
        assert!(store.is_processed("feedface").unwrap());
        assert!(!store.file_path("feedface").with_extension("jsonl.tmp").exists());

        let (manifest, loaded) = store.load("feedface").unwrap();
        assert_eq!(manifest.platform_code, "dzr-deezer");
        assert_eq!(manifest.encoding, TextEncoding::Windows1252);
        assert_eq!(manifest.record_count, 3);
        assert_eq!(manifest.quality.overall_score, 96.5);
        assert_eq!(loaded, records);
    }

    #[test]
    fn test_load_missing_hash() {
        let temp = TempDir::new().unwrap();
        let store = JsonlStore::open(temp.path()).unwrap();
        assert!(matches!(
            store.load("missing"),
            Err(StoreError::Io { operation: "open", .. })
        ));
    }
}
