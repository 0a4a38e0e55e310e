//! Journal configuration.
//!
//! The configuration is a flat string map stored under a `[storage]` table:
//!
//! ```toml
//! [storage]
//! engine = "sqlite3"
//! path = "/home/me/journal.db"
//! ```
//!
//! `engine` selects a registered storage engine; every other key is an
//! engine-specific parameter.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::{Path, PathBuf};

/// Key naming the storage engine.
pub const ENGINE_KEY: &str = "engine";
/// Key naming the store location for file-backed engines.
pub const PATH_KEY: &str = "path";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalConfig {
    #[serde(default)]
    storage: BTreeMap<String, String>,
}

impl JournalConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a configuration selecting `engine` with its store at `path`.
    pub fn for_engine(engine: impl Into<String>, path: impl AsRef<Path>) -> Self {
        let mut config = Self::new();
        config.set(ENGINE_KEY, engine);
        config.set(PATH_KEY, path.as_ref().to_string_lossy());
        config
    }

    /// Parses a configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(ConfigError::Parse)
    }

    /// Loads a configuration file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Writes the configuration as TOML, replacing any existing file.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = toml::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        fs::write(path, contents).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.storage.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.storage.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.storage.remove(key)
    }

    /// Configured engine name, trimmed; `None` when absent or blank.
    pub fn engine(&self) -> Option<&str> {
        self.get(ENGINE_KEY)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    /// Configured store location; `None` when absent or blank.
    pub fn path(&self) -> Option<PathBuf> {
        self.get(PATH_KEY)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
    }

    /// Iterates all key/value pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.storage
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(toml::de::Error),
    Serialize(toml::ser::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "cannot access config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "failed to parse config: {err}"),
            Self::Serialize(err) => write!(f, "failed to serialize config: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Serialize(err) => Some(err),
        }
    }
}
