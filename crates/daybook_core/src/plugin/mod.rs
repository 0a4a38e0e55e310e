//! Storage engine plugin registry.
//!
//! # Responsibility
//! - Keep a name-keyed catalog of storage engine descriptors.
//! - Instantiate the engine selected by journal configuration.
//! - Register manifest-declared engines found by directory discovery.
//!
//! # Invariants
//! - Engine names are unique; duplicate registration is rejected.
//! - Registration is explicit; nothing registers itself as a load side effect.
//! - Engine code is compiled in; manifests only bind names to backends.

use crate::config::JournalConfig;
use crate::storage::StorageEngine;
use log::{error, info};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::path::PathBuf;

pub mod builtin;
mod discovery;
pub mod manifest;

pub use discovery::{EXCLUDED_MANIFEST_STEMS, MANIFEST_EXTENSION};
pub use manifest::{EngineManifest, ManifestValidationError};

/// Inputs handed to an engine factory.
#[derive(Debug, Clone, Copy)]
pub struct EngineContext<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub config: &'a JournalConfig,
}

/// Constructor for one storage engine implementation.
pub type EngineFactory = fn(&EngineContext<'_>) -> Box<dyn StorageEngine>;

/// Where a descriptor came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineOrigin {
    Builtin,
    /// Canonical path of the manifest file that declared the engine.
    Manifest(PathBuf),
}

/// Registry entry for one storage engine.
#[derive(Clone)]
pub struct EngineDescriptor {
    name: String,
    description: String,
    origin: EngineOrigin,
    factory: EngineFactory,
}

impl EngineDescriptor {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        factory: EngineFactory,
    ) -> Self {
        Self {
            name: name.into().trim().to_string(),
            description: description.into(),
            origin: EngineOrigin::Builtin,
            factory,
        }
    }

    pub fn with_origin(mut self, origin: EngineOrigin) -> Self {
        self.origin = origin;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn origin(&self) -> &EngineOrigin {
        &self.origin
    }

    /// Builds a fresh engine instance for one journal.
    pub fn instantiate(&self, config: &JournalConfig) -> Box<dyn StorageEngine> {
        (self.factory)(&EngineContext {
            name: &self.name,
            description: &self.description,
            config,
        })
    }
}

impl Debug for EngineDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineDescriptor")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

/// Name-keyed storage engine catalog.
#[derive(Debug, Default)]
pub struct PluginRegistry {
    engines: BTreeMap<String, EngineDescriptor>,
}

impl PluginRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every compiled-in engine.
    pub fn with_builtin_engines() -> Self {
        let mut registry = Self::new();
        for descriptor in builtin::builtin_descriptors() {
            if let Err(err) = registry.register(descriptor) {
                error!("event=engine_register module=plugin status=error origin=builtin error={err}");
            }
        }
        registry
    }

    /// Registers one engine descriptor.
    pub fn register(&mut self, descriptor: EngineDescriptor) -> Result<(), RegistryError> {
        if !is_valid_engine_name(&descriptor.name) {
            return Err(RegistryError::InvalidEngineName(descriptor.name));
        }
        if self.engines.contains_key(descriptor.name.as_str()) {
            return Err(RegistryError::DuplicateEngine(descriptor.name));
        }

        info!(
            "event=engine_register module=plugin status=ok engine={} origin={}",
            descriptor.name,
            origin_label(&descriptor.origin)
        );
        self.engines.insert(descriptor.name.clone(), descriptor);
        Ok(())
    }

    /// Returns the descriptor registered under `name`.
    pub fn resolve(&self, name: &str) -> Result<&EngineDescriptor, RegistryError> {
        let normalized = name.trim();
        self.engines
            .get(normalized)
            .ok_or_else(|| RegistryError::EngineNotRegistered(normalized.to_string()))
    }

    /// Instantiates the engine registered under `name`.
    pub fn instantiate(
        &self,
        name: &str,
        config: &JournalConfig,
    ) -> Result<Box<dyn StorageEngine>, RegistryError> {
        Ok(self.resolve(name)?.instantiate(config))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.engines.contains_key(name.trim())
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }

    /// Returns sorted engine names.
    pub fn names(&self) -> Vec<String> {
        self.engines.keys().cloned().collect()
    }

    /// Iterates descriptors in name order.
    pub fn descriptors(&self) -> impl Iterator<Item = &EngineDescriptor> {
        self.engines.values()
    }
}

/// Valid names are non-empty lowercase ASCII letters, digits, `_` or `-`.
pub fn is_valid_engine_name(value: &str) -> bool {
    if value.is_empty() {
        return false;
    }
    value
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
}

fn origin_label(origin: &EngineOrigin) -> String {
    match origin {
        EngineOrigin::Builtin => "builtin".to_string(),
        EngineOrigin::Manifest(path) => path.display().to_string(),
    }
}

/// Registry, manifest and discovery errors.
#[derive(Debug)]
pub enum RegistryError {
    InvalidEngineName(String),
    DuplicateEngine(String),
    EngineNotRegistered(String),
    InvalidManifest {
        path: PathBuf,
        error: ManifestValidationError,
    },
    ManifestParse {
        path: PathBuf,
        error: toml::de::Error,
    },
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Walk(walkdir::Error),
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidEngineName(value) => write!(f, "engine name is invalid: {value}"),
            Self::DuplicateEngine(value) => write!(f, "engine already registered: {value}"),
            Self::EngineNotRegistered(value) => write!(f, "engine not registered: {value}"),
            Self::InvalidManifest { path, error } => {
                write!(f, "invalid engine manifest `{}`: {error}", path.display())
            }
            Self::ManifestParse { path, error } => {
                write!(f, "cannot parse engine manifest `{}`: {error}", path.display())
            }
            Self::Io { path, source } => {
                write!(f, "cannot read `{}`: {source}", path.display())
            }
            Self::Walk(err) => write!(f, "engine discovery failed: {err}"),
        }
    }
}

impl Error for RegistryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidManifest { error, .. } => Some(error),
            Self::ManifestParse { error, .. } => Some(error),
            Self::Io { source, .. } => Some(source),
            Self::Walk(err) => Some(err),
            Self::InvalidEngineName(_)
            | Self::DuplicateEngine(_)
            | Self::EngineNotRegistered(_) => None,
        }
    }
}
