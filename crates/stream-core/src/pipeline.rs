//! File and directory processing.
//!
//! Each file moves through [`FileStage`]s in order: hash and dedup, detect
//! the platform, decode and normalize rows, score quality, persist. Any
//! per-file failure ends in a failed [`ProcessingResult`] and the batch
//! continues with the next file.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use glob::Pattern;
use stream_ingest::{DecodedText, ParsedFile, RawFile, normalize};
use stream_model::{BatchSummary, ProcessingResult, ProcessingStatus, QualityScoreResult};
use stream_platforms::{DetectionMethod, FormatDetector, PlatformRegistry, peek_lines};
use stream_validate::{ValidationInput, validate};
use tracing::{debug, info, info_span, warn};

use crate::config::PipelineConfig;
use crate::error::{FileFailure, PipelineError, Result};
use crate::store::{FileBatch, RecordStore};

/// Processing stage of a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStage {
    Pending,
    Detecting,
    Parsing,
    Validating,
    Persisting,
    Completed,
    Duplicate,
    Failed,
}

impl FileStage {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Detecting => "detecting",
            Self::Parsing => "parsing",
            Self::Validating => "validating",
            Self::Persisting => "persisting",
            Self::Completed => "completed",
            Self::Duplicate => "duplicate",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Duplicate | Self::Failed)
    }
}

impl fmt::Display for FileStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Tracks the current stage of one file and logs transitions.
#[derive(Debug)]
struct StageTracker {
    stage: FileStage,
}

impl StageTracker {
    fn new() -> Self {
        Self {
            stage: FileStage::Pending,
        }
    }

    fn advance(&mut self, next: FileStage) {
        debug!(from = %self.stage, to = %next, "Stage transition");
        self.stage = next;
    }
}

/// Detection, parse and score of one file, before persistence.
#[derive(Debug, Clone)]
pub struct FileAnalysis {
    pub content_hash: String,
    pub detection_method: DetectionMethod,
    pub detection_confidence: f64,
    pub parsed: ParsedFile,
    pub quality: QualityScoreResult,
}

impl FileAnalysis {
    pub fn platform_code(&self) -> &str {
        &self.parsed.platform_code
    }

    /// Rows skipped by the parser plus parsed records that failed validation.
    pub fn records_failed(&self) -> usize {
        self.parsed.rows_skipped + self.parsed.records.len() - self.quality.records_valid
    }
}

/// Processes report files against a registry and persists them to a store.
pub struct Pipeline<'r, S> {
    registry: &'r PlatformRegistry,
    store: S,
    config: PipelineConfig,
    /// Hashes completed during this run.
    seen_hashes: HashSet<String>,
}

impl<'r, S: RecordStore> Pipeline<'r, S> {
    pub fn new(registry: &'r PlatformRegistry, store: S, config: PipelineConfig) -> Self {
        Self {
            registry,
            store,
            config,
            seen_hashes: HashSet::new(),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Process one file.
    ///
    /// Per-file problems are reported in the returned result; only validator
    /// misuse is returned as an error.
    pub fn process_file(&mut self, path: &Path) -> Result<ProcessingResult> {
        let span = info_span!("file", path = %path.display());
        let _guard = span.enter();
        let started = Instant::now();
        let mut tracker = StageTracker::new();

        let result = match self.run_file(path, &mut tracker) {
            Ok(result) => result,
            Err(FileFailure::InvalidInput(err)) => return Err(err.into()),
            Err(failure) => {
                warn!(stage = %tracker.stage, error = %failure, "File failed");
                tracker.advance(FileStage::Failed);
                ProcessingResult::failed(path, failure.to_string())
            }
        };
        Ok(result.with_duration(started.elapsed()))
    }

    fn run_file(
        &mut self,
        path: &Path,
        tracker: &mut StageTracker,
    ) -> std::result::Result<ProcessingResult, FileFailure> {
        let raw = RawFile::read(path)?;
        if raw.is_empty() {
            return Err(FileFailure::Empty);
        }

        if self.is_duplicate(&raw.content_hash)? {
            info!(content_hash = %raw.content_hash, "Skipping already processed content");
            tracker.advance(FileStage::Duplicate);
            return Ok(ProcessingResult::duplicate(path, &raw.content_hash));
        }

        let analysis = analyze(self.registry, &self.config, &raw, tracker)?;
        let quality_passed = analysis.quality.passes(self.config.quality_threshold);
        if !quality_passed {
            warn!(
                score = analysis.quality.overall_score,
                threshold = self.config.quality_threshold,
                "Quality score below threshold"
            );
        }

        tracker.advance(FileStage::Persisting);
        let batch = FileBatch {
            content_hash: &analysis.content_hash,
            platform_code: analysis.platform_code(),
            source_path: path,
            encoding: analysis.parsed.encoding,
            records: &analysis.parsed.records,
            quality: &analysis.quality,
        };
        let batch_size = self.config.batch_size;
        let retry = &self.config.retry;
        let store = &mut self.store;
        let written = retry.run("persist", || store.persist(&batch, batch_size))?;

        self.seen_hashes.insert(analysis.content_hash.clone());
        tracker.advance(FileStage::Completed);
        info!(
            platform = analysis.platform_code(),
            records = written,
            score = analysis.quality.overall_score,
            "File completed"
        );

        Ok(ProcessingResult {
            file_path: path.to_path_buf(),
            status: ProcessingStatus::Completed,
            success: true,
            platform_code: Some(analysis.platform_code().to_string()),
            content_hash: Some(analysis.content_hash.clone()),
            encoding: Some(analysis.parsed.encoding),
            records_processed: written,
            records_failed: analysis.records_failed(),
            quality_score: Some(analysis.quality.overall_score),
            quality_passed: Some(quality_passed),
            quality: Some(analysis.quality),
            error_message: None,
            duration: std::time::Duration::ZERO,
        })
    }

    fn is_duplicate(&self, content_hash: &str) -> std::result::Result<bool, FileFailure> {
        if self.seen_hashes.contains(content_hash) {
            return Ok(true);
        }
        if self.config.force_reprocess {
            return Ok(false);
        }
        let store = &self.store;
        self.config
            .retry
            .run("is_processed", || store.is_processed(content_hash))
            .map_err(FileFailure::from)
    }

    /// Process explicit paths in the order given.
    ///
    /// `progress` is called after each file with the result, its 1-based
    /// position and the total.
    pub fn process_paths<F>(&mut self, paths: &[PathBuf], mut progress: F) -> Result<BatchSummary>
    where
        F: FnMut(&ProcessingResult, usize, usize),
    {
        let total = paths.len();
        let mut results = Vec::with_capacity(total);
        for (index, path) in paths.iter().enumerate() {
            let result = self.process_file(path)?;
            progress(&result, index + 1, total);
            results.push(result);
        }

        let summary = BatchSummary::from_results(results);
        info!(
            files = summary.files_total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            duplicates = summary.skipped_duplicates,
            records = summary.records_total,
            "Batch completed"
        );
        Ok(summary)
    }

    /// Process the files directly inside `dir` that match `pattern`.
    pub fn process_directory<F>(
        &mut self,
        dir: &Path,
        pattern: &str,
        progress: F,
    ) -> Result<BatchSummary>
    where
        F: FnMut(&ProcessingResult, usize, usize),
    {
        let files = list_files(dir, pattern)?;
        info!(dir = %dir.display(), pattern, files = files.len(), "Processing directory");
        self.process_paths(&files, progress)
    }
}

/// Detect, decode, normalize and score a file without persisting it.
pub fn inspect_file(
    registry: &PlatformRegistry,
    config: &PipelineConfig,
    path: &Path,
) -> std::result::Result<FileAnalysis, FileFailure> {
    let raw = RawFile::read(path)?;
    if raw.is_empty() {
        return Err(FileFailure::Empty);
    }
    analyze(registry, config, &raw, &mut StageTracker::new())
}

fn analyze(
    registry: &PlatformRegistry,
    config: &PipelineConfig,
    raw: &RawFile,
    tracker: &mut StageTracker,
) -> std::result::Result<FileAnalysis, FileFailure> {
    tracker.advance(FileStage::Detecting);
    let peek = peek_lines(&raw.bytes, config.peek_lines);
    let detection = FormatDetector::new(registry)
        .with_min_confidence(config.min_detection_confidence)
        .detect(&raw.path, &peek)?;
    let profile = detection.profile;
    info!(
        platform = %profile.code,
        method = %detection.method,
        confidence = detection.confidence,
        "Detected platform"
    );

    tracker.advance(FileStage::Parsing);
    let decoded = DecodedText::decode(&raw.bytes, &profile.encoding_chain())?;
    let parsed = normalize(&decoded, profile)?;
    if !parsed.has_data_rows() {
        return Err(FileFailure::NoDataRows);
    }

    tracker.advance(FileStage::Validating);
    let quality = validate(
        ValidationInput {
            records: &parsed.records,
            issues: &parsed.issues,
            rows_skipped: parsed.rows_skipped,
            rules: Some(&profile.rules),
        },
        &config.quality,
    )?;

    Ok(FileAnalysis {
        content_hash: raw.content_hash.clone(),
        detection_method: detection.method,
        detection_confidence: detection.confidence,
        parsed,
        quality,
    })
}

/// Files directly inside `dir` whose names match `pattern`, sorted by name.
pub fn list_files(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(PipelineError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }
    let matcher = Pattern::new(pattern).map_err(|source| PipelineError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })?;
    let read_err = |source| PipelineError::DirectoryRead {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = Vec::new();
    for entry in fs::read_dir(dir).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = entry.file_name();
        if matcher.matches(&name.to_string_lossy()) {
            entries.push((name, path));
        }
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(entries.into_iter().map(|(_, path)| path).collect())
}
