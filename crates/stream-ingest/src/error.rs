//! Error types for report ingestion.

use std::path::PathBuf;

use stream_model::{TextEncoding, UnifiedField};
use thiserror::Error;

/// Errors reading or decoding a report file.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// None of the candidate encodings decoded the bytes cleanly.
    #[error("could not decode bytes with any of: {}", join_encodings(.tried))]
    Undecodable { tried: Vec<TextEncoding> },
}

/// File-level problems with a report's header. These are fatal for the file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// The file has no non-blank line to use as a header.
    #[error("{platform}: file has no header row")]
    NoHeader { platform: String },

    /// The profile's delimiter cannot drive the CSV reader.
    #[error("{platform}: delimiter {delimiter:?} is not a single ASCII character")]
    UnsupportedDelimiter { platform: String, delimiter: char },

    /// A required column binding matched no header.
    #[error("{platform}: missing required columns: {}", join_fields(.missing))]
    MissingRequiredColumns {
        platform: String,
        missing: Vec<UnifiedField>,
    },
}

/// Why a single row was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RowError {
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },

    #[error("quoted field is not closed before the end of the line")]
    UnclosedQuote,

    #[error("row could not be split: {message}")]
    Split { message: String },
}

fn join_encodings(encodings: &[TextEncoding]) -> String {
    encodings
        .iter()
        .map(TextEncoding::label)
        .collect::<Vec<_>>()
        .join(", ")
}

fn join_fields(fields: &[UnifiedField]) -> String {
    fields
        .iter()
        .map(UnifiedField::name)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
