//! Record persistence.
//!
//! A [`RecordStore`] receives one [`FileBatch`] per processed file and
//! answers whether a content hash has been stored before. Persisting a batch
//! is all-or-nothing: a failed call leaves no partial file behind.

mod jsonl;
mod memory;

use std::path::Path;

use serde::{Deserialize, Serialize};
use stream_model::{NormalizedRecord, QualityScoreResult, TextEncoding};

use crate::error::StoreError;

pub use jsonl::JsonlStore;
pub use memory::{MemoryStore, StoredFile};

/// Everything persisted for one processed file.
#[derive(Debug, Clone, Copy)]
pub struct FileBatch<'a> {
    pub content_hash: &'a str,
    pub platform_code: &'a str,
    pub source_path: &'a Path,
    pub encoding: TextEncoding,
    pub records: &'a [NormalizedRecord],
    pub quality: &'a QualityScoreResult,
}

impl FileBatch<'_> {
    /// Header describing the batch without its records.
    pub fn manifest(&self) -> BatchManifest {
        BatchManifest {
            content_hash: self.content_hash.to_string(),
            platform_code: self.platform_code.to_string(),
            source_path: self.source_path.display().to_string(),
            encoding: self.encoding,
            record_count: self.records.len(),
            quality: self.quality.clone(),
        }
    }
}

/// Stored header of one persisted file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchManifest {
    pub content_hash: String,
    pub platform_code: String,
    pub source_path: String,
    pub encoding: TextEncoding,
    pub record_count: usize,
    pub quality: QualityScoreResult,
}

/// Destination for normalized records.
pub trait RecordStore {
    /// Whether content with this hash has already been persisted.
    fn is_processed(&self, content_hash: &str) -> Result<bool, StoreError>;

    /// Persist a file's records in chunks of `batch_size`.
    ///
    /// Returns the number of records written.
    fn persist(&mut self, batch: &FileBatch<'_>, batch_size: usize) -> Result<usize, StoreError>;
}

impl<S: RecordStore + ?Sized> RecordStore for &mut S {
    fn is_processed(&self, content_hash: &str) -> Result<bool, StoreError> {
        (**self).is_processed(content_hash)
    }

    fn persist(&mut self, batch: &FileBatch<'_>, batch_size: usize) -> Result<usize, StoreError> {
        (**self).persist(batch, batch_size)
    }
}

impl<S: RecordStore + ?Sized> RecordStore for Box<S> {
    fn is_processed(&self, content_hash: &str) -> Result<bool, StoreError> {
        (**self).is_processed(content_hash)
    }

    fn persist(&mut self, batch: &FileBatch<'_>, batch_size: usize) -> Result<usize, StoreError> {
        (**self).persist(batch, batch_size)
    }
}
