//! The platform registry: profiles keyed by platform code.

use std::path::Path;

use regex::RegexBuilder;
use serde::Deserialize;
use stream_model::{PlatformProfile, UnifiedField};
use tracing::{debug, info};

use crate::error::{RegistryError, Result};

const BUILTIN_PROFILES: &str = include_str!("../data/platforms.toml");

#[derive(Debug, Deserialize)]
struct ProfileTable {
    #[serde(rename = "platform", default)]
    platforms: Vec<PlatformProfile>,
}

/// Ordered set of platform profiles.
///
/// Order matters: it breaks ties during header-based detection.
#[derive(Debug, Clone, Default)]
pub struct PlatformRegistry {
    profiles: Vec<PlatformProfile>,
}

impl PlatformRegistry {
    /// Registry of the built-in platforms.
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_PROFILES)
    }

    /// Parse and validate a `[[platform]]` table.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let table: ProfileTable =
            toml::from_str(source).map_err(|source| RegistryError::Parse { source })?;
        let mut registry = Self::default();
        for profile in table.platforms {
            validate_profile(&profile)?;
            if registry.get(&profile.code).is_some() {
                return Err(RegistryError::DuplicateCode { code: profile.code });
            }
            registry.profiles.push(profile);
        }
        Ok(registry)
    }

    /// Load a profile table from a TOML file.
    pub fn load_file(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|source| RegistryError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Merge another registry into this one.
    ///
    /// A profile whose code already exists replaces the existing one in place;
    /// new codes are appended.
    pub fn extend(&mut self, other: Self) {
        for profile in other.profiles {
            match self.profiles.iter_mut().find(|p| p.code == profile.code) {
                Some(existing) => {
                    info!(code = %profile.code, "Replacing platform profile");
                    *existing = profile;
                }
                None => {
                    debug!(code = %profile.code, "Adding platform profile");
                    self.profiles.push(profile);
                }
            }
        }
    }

    pub fn get(&self, code: &str) -> Option<&PlatformProfile> {
        self.profiles.iter().find(|profile| profile.code == code)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlatformProfile> {
        self.profiles.iter()
    }

    pub fn codes(&self) -> Vec<&str> {
        self.profiles.iter().map(|p| p.code.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

fn validate_profile(profile: &PlatformProfile) -> Result<()> {
    let invalid = |reason: String| RegistryError::InvalidProfile {
        code: profile.code.clone(),
        reason,
    };

    if profile.code.trim().is_empty() {
        return Err(invalid("code is empty".to_string()));
    }
    if profile.delimiter_byte().is_none() {
        return Err(invalid(format!(
            "delimiter {:?} is not a single ASCII character",
            profile.delimiter
        )));
    }
    if profile.date_patterns.is_empty() {
        return Err(invalid("no date patterns declared".to_string()));
    }
    if profile.columns.is_empty() {
        return Err(invalid("no column bindings declared".to_string()));
    }

    let mut seen: Vec<UnifiedField> = Vec::with_capacity(profile.columns.len());
    for binding in &profile.columns {
        if seen.contains(&binding.field) {
            return Err(invalid(format!("field '{}' is bound twice", binding.field)));
        }
        if binding.aliases.iter().all(|alias| alias.trim().is_empty()) {
            return Err(invalid(format!("field '{}' has no aliases", binding.field)));
        }
        seen.push(binding.field);
    }

    for pattern in &profile.rules.device_patterns {
        RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|err| invalid(format!("device pattern '{pattern}' does not compile: {err}")))?;
    }
    if profile
        .rules
        .allowed_geographies
        .iter()
        .any(|code| code.trim().is_empty())
    {
        return Err(invalid("allowed geographies contain an empty code".to_string()));
    }
    Ok(())
}
