//! Manifest discovery over plugin directories.

use crate::plugin::builtin::backend_factory;
use crate::plugin::manifest::{EngineManifest, ManifestValidationError};
use crate::plugin::{EngineDescriptor, EngineOrigin, PluginRegistry, RegistryError};
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// File extension of engine manifests.
pub const MANIFEST_EXTENSION: &str = "toml";

/// Manifest file stems reserved for shared defaults; never registered.
pub const EXCLUDED_MANIFEST_STEMS: &[&str] = &["base", "__init__"];

impl PluginRegistry {
    /// Registers every engine manifest found under `dirs`, recursively.
    ///
    /// Returns the full registry contents afterwards, in name order.
    ///
    /// # Contract
    /// - Missing directories are skipped.
    /// - A manifest already registered from the same file is skipped, so
    ///   repeated or overlapping discovery is idempotent.
    /// - The first invalid manifest or name clash aborts discovery; engines
    ///   registered before it stay registered.
    pub fn discover<P: AsRef<Path>>(
        &mut self,
        dirs: &[P],
    ) -> Result<Vec<EngineDescriptor>, RegistryError> {
        let mut registered = 0usize;
        for dir in dirs {
            let dir = dir.as_ref();
            if !dir.is_dir() {
                warn!(
                    "event=engine_discover module=plugin status=skip reason=not_a_directory dir={}",
                    dir.display()
                );
                continue;
            }

            for manifest_path in manifest_files(dir)? {
                if self.register_manifest(&manifest_path)? {
                    registered += 1;
                }
            }
        }

        info!(
            "event=engine_discover module=plugin status=ok dirs={} registered={} total={}",
            dirs.len(),
            registered,
            self.len()
        );
        Ok(self.descriptors().cloned().collect())
    }

    /// Registers one manifest file; returns `false` when it was already known.
    fn register_manifest(&mut self, path: &Path) -> Result<bool, RegistryError> {
        let canonical = fs::canonicalize(path).map_err(|source| RegistryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let contents = fs::read_to_string(&canonical).map_err(|source| RegistryError::Io {
            path: canonical.clone(),
            source,
        })?;
        let manifest =
            EngineManifest::from_toml_str(&contents).map_err(|error| RegistryError::ManifestParse {
                path: canonical.clone(),
                error,
            })?;
        manifest
            .validate()
            .map_err(|error| RegistryError::InvalidManifest {
                path: canonical.clone(),
                error,
            })?;

        let name = manifest.name.trim();
        let origin = EngineOrigin::Manifest(canonical.clone());
        if let Ok(existing) = self.resolve(name) {
            if existing.origin() == &origin {
                debug!(
                    "event=engine_discover module=plugin status=skip reason=already_registered engine={name}"
                );
                return Ok(false);
            }
        }

        let factory = backend_factory(&manifest.backend).ok_or_else(|| {
            RegistryError::InvalidManifest {
                path: canonical.clone(),
                error: ManifestValidationError::UnsupportedBackend(manifest.backend.clone()),
            }
        })?;
        self.register(
            EngineDescriptor::new(name, manifest.description.trim(), factory).with_origin(origin),
        )?;
        Ok(true)
    }
}

fn manifest_files(dir: &Path) -> Result<Vec<PathBuf>, RegistryError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(RegistryError::Walk)?;
        if !entry.file_type().is_file() || !is_manifest_file(entry.path()) {
            continue;
        }
        files.push(entry.into_path());
    }
    Ok(files)
}

fn is_manifest_file(path: &Path) -> bool {
    let has_extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext == MANIFEST_EXTENSION);
    let excluded = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .is_some_and(|stem| EXCLUDED_MANIFEST_STEMS.contains(&stem));
    has_extension && !excluded
}

#[cfg(test)]
mod tests {
    use super::is_manifest_file;
    use std::path::Path;

    #[test]
    fn manifest_filter_skips_base_files_and_other_extensions() {
        assert!(is_manifest_file(Path::new("plugins/storage/archive.toml")));
        assert!(!is_manifest_file(Path::new("plugins/storage/base.toml")));
        assert!(!is_manifest_file(Path::new("plugins/storage/__init__.toml")));
        assert!(!is_manifest_file(Path::new("plugins/storage/archive.json")));
        assert!(!is_manifest_file(Path::new("plugins/storage/README")));
    }
}
