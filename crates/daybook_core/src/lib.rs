//! Storage and plugin core for the Daybook journal.
//!
//! Entries live in a `Journal` working set and are persisted by a pluggable
//! `StorageEngine`, selected by name from a `PluginRegistry`.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod plugin;
pub mod service;
pub mod storage;

pub use config::{ConfigError, JournalConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::entry::{Entry, EntryError, EntryId, MAX_TITLE_LEN, UNTITLED_LABEL};
pub use plugin::{
    EngineContext, EngineDescriptor, EngineFactory, EngineManifest, EngineOrigin,
    ManifestValidationError, PluginRegistry, RegistryError,
};
pub use service::journal::{Journal, JournalError, JournalState};
pub use storage::{
    SaveReport, SqliteStorageEngine, StorageEngine, StorageError, StorageResult,
    SQLITE_ENGINE_NAME,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
