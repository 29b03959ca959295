//! Quality validation and scoring for normalized streaming records.
//!
//! Three dimensions are scored as the share of rows passing their checks:
//!
//! - **Completeness**: artist, track, date and metric value are present
//! - **Validity**: metric and date ranges, ISRC format, text lengths and the
//!   platform's allowed geographies
//! - **Consistency**: duplicate records and metric outliers
//!
//! Configuration is passed explicitly through [`QualityConfig`].

pub mod checks;
mod config;
mod error;
mod validator;

pub use checks::validity::is_valid_isrc;
pub use config::{QualityConfig, ScoreWeights};
pub use error::InvalidInputError;
pub use validator::{ValidationInput, validate};
