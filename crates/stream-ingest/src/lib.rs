//! Streaming report ingestion.
//!
//! Turns raw report bytes into normalized records:
//!
//! - **Raw files**: read bytes and compute the SHA-256 content hash
//! - **Decoding**: UTF-8 first, then the profile's encoding hints, then
//!   Windows-1252 and Latin-1
//! - **Row normalization**: delimiter and quoting per profile, header-based
//!   column mapping, date parsing against declared patterns
//!
//! # Example
//!
//! ```ignore
//! use stream_ingest::{DecodedText, RawFile, normalize};
//!
//! let raw = RawFile::read(path)?;
//! let decoded = DecodedText::decode(&raw.bytes, &profile.encoding_chain())?;
//! let parsed = normalize(&decoded, profile)?;
//! ```

mod dates;
mod decode;
mod error;
mod normalizer;
mod raw;

pub use dates::{ParsedDate, parse_date, parse_with};
pub use decode::DecodedText;
pub use error::{IngestError, Result, RowError, SchemaError};
pub use normalizer::{ParsedFile, RowNormalizer, RowOutcome, normalize, parse_metric};
pub use raw::{RawFile, content_hash};
