//! Storage engine manifest declaration and validation.
//!
//! A manifest binds a registry name to one compiled-in backend:
//!
//! ```toml
//! name = "archive"
//! description = "Read-mostly archive journal"
//! backend = "sqlite3"
//! version = "1.0.0"
//! ```

use crate::plugin::builtin::backend_names;
use crate::plugin::is_valid_engine_name;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Declarative storage engine manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineManifest {
    /// Registry name matched against journal configuration.
    pub name: String,
    pub description: String,
    /// Compiled-in backend implementing the engine, e.g. `sqlite3`.
    pub backend: String,
    /// Manifest semantic version string (`major.minor.patch`).
    pub version: String,
}

impl EngineManifest {
    pub fn from_toml_str(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    /// Validates declaration-level manifest invariants.
    pub fn validate(&self) -> Result<(), ManifestValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ManifestValidationError::EmptyName);
        }
        if !is_valid_engine_name(name) {
            return Err(ManifestValidationError::InvalidName(self.name.clone()));
        }

        if self.description.trim().is_empty() {
            return Err(ManifestValidationError::EmptyDescription);
        }

        let backend = self.backend.trim();
        if !backend_names().contains(&backend) {
            return Err(ManifestValidationError::UnsupportedBackend(
                backend.to_string(),
            ));
        }

        if self.version.trim().is_empty() {
            return Err(ManifestValidationError::EmptyVersion);
        }
        if !is_semver_triplet(self.version.trim()) {
            return Err(ManifestValidationError::InvalidVersion(
                self.version.clone(),
            ));
        }

        Ok(())
    }
}

fn is_semver_triplet(value: &str) -> bool {
    let parts: Vec<&str> = value.split('.').collect();
    if parts.len() != 3 {
        return false;
    }
    parts
        .iter()
        .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
}

/// Manifest validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestValidationError {
    EmptyName,
    InvalidName(String),
    EmptyDescription,
    UnsupportedBackend(String),
    EmptyVersion,
    InvalidVersion(String),
}

impl Display for ManifestValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "manifest name must not be empty"),
            Self::InvalidName(value) => write!(f, "manifest name is invalid: {value}"),
            Self::EmptyDescription => write!(f, "manifest description must not be empty"),
            Self::UnsupportedBackend(value) => {
                write!(f, "manifest backend is unsupported: {value}")
            }
            Self::EmptyVersion => write!(f, "manifest version must not be empty"),
            Self::InvalidVersion(value) => write!(
                f,
                "manifest version is invalid: {value} (expected major.minor.patch)"
            ),
        }
    }
}

impl Error for ManifestValidationError {}
