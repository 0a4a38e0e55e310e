//! Compiled-in storage backends.

use crate::plugin::{EngineContext, EngineDescriptor, EngineFactory};
use crate::storage::sqlite::{SqliteStorageEngine, SQLITE_ENGINE_DESCRIPTION, SQLITE_ENGINE_NAME};
use crate::storage::StorageEngine;

const BACKEND_NAMES: &[&str] = &[SQLITE_ENGINE_NAME];

/// Returns backend names a manifest may bind to.
pub fn backend_names() -> &'static [&'static str] {
    BACKEND_NAMES
}

/// Returns the factory for one compiled-in backend.
pub fn backend_factory(backend: &str) -> Option<EngineFactory> {
    match backend.trim() {
        SQLITE_ENGINE_NAME => Some(sqlite_engine as EngineFactory),
        _ => None,
    }
}

/// Descriptors registered by `PluginRegistry::with_builtin_engines`.
pub fn builtin_descriptors() -> Vec<EngineDescriptor> {
    vec![EngineDescriptor::new(
        SQLITE_ENGINE_NAME,
        SQLITE_ENGINE_DESCRIPTION,
        sqlite_engine,
    )]
}

fn sqlite_engine(ctx: &EngineContext<'_>) -> Box<dyn StorageEngine> {
    Box::new(SqliteStorageEngine::named(ctx.name, ctx.description))
}
