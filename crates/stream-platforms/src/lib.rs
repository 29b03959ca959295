//! Platform profiles and report format detection.
//!
//! The [`PlatformRegistry`] holds the built-in streaming platform profiles
//! (embedded from `data/platforms.toml`) and any user-supplied additions.
//! The [`FormatDetector`] picks a profile for a file from its path or its
//! header line.

mod detect;
mod error;
mod registry;

pub use detect::{
    DEFAULT_MIN_CONFIDENCE, Detection, DetectionMethod, FormatDetector, HEADER_CONFIDENCE_CAP,
    PATH_ALIAS_CONFIDENCE, PATH_CODE_CONFIDENCE, is_wrapped_line, peek_lines, sniff_delimiter,
};
pub use error::{DetectionError, RegistryError, Result};
pub use registry::PlatformRegistry;
