//! Processing pipeline for streaming platform reports.
//!
//! Ties the crates together: [`Pipeline`] hashes each file, skips content it
//! has already processed, detects the platform, normalizes rows, scores
//! quality and hands the records to a [`RecordStore`]. Store calls that
//! fail transiently are retried per [`RetryPolicy`].

mod config;
mod error;
mod pipeline;
mod retry;
pub mod store;

pub use config::PipelineConfig;
pub use error::{ConfigError, FileFailure, PipelineError, Result, StoreError};
pub use pipeline::{FileAnalysis, FileStage, Pipeline, inspect_file, list_files};
pub use retry::RetryPolicy;
pub use store::{BatchManifest, FileBatch, JsonlStore, MemoryStore, RecordStore, StoredFile};
