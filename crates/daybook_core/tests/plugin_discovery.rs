use daybook_core::{
    EngineOrigin, Journal, JournalConfig, JournalState, ManifestValidationError, PluginRegistry,
    RegistryError, SQLITE_ENGINE_NAME,
};
use std::fs;
use std::path::Path;

fn write_manifest(dir: &Path, file: &str, name: &str) {
    fs::write(
        dir.join(file),
        format!(
            "name = \"{name}\"\ndescription = \"{name} journal\"\nbackend = \"sqlite3\"\nversion = \"1.0.0\"\n"
        ),
    )
    .unwrap();
}

#[test]
fn builtin_registry_resolves_sqlite_engine() {
    let registry = PluginRegistry::with_builtin_engines();

    assert_eq!(registry.names(), vec![SQLITE_ENGINE_NAME.to_string()]);
    let descriptor = registry.resolve(" sqlite3 ").unwrap();
    assert_eq!(descriptor.origin(), &EngineOrigin::Builtin);

    let engine = registry
        .instantiate(SQLITE_ENGINE_NAME, &JournalConfig::new())
        .unwrap();
    assert_eq!(engine.name(), SQLITE_ENGINE_NAME);
    assert_eq!(engine.description(), "Sqlite3 Storage Engine");
}

#[test]
fn discovery_registers_manifests_recursively_and_skips_base_files() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("vendor");
    fs::create_dir(&nested).unwrap();
    write_manifest(dir.path(), "archive.toml", "archive");
    write_manifest(&nested, "travel.toml", "travel");
    write_manifest(dir.path(), "base.toml", "base-defaults");
    fs::write(dir.path().join("README.md"), "not a manifest").unwrap();

    let mut registry = PluginRegistry::with_builtin_engines();
    let descriptors = registry.discover(&[dir.path()]).unwrap();

    let names: Vec<&str> = descriptors.iter().map(|d| d.name()).collect();
    assert_eq!(names, vec!["archive", SQLITE_ENGINE_NAME, "travel"]);
    assert!(!registry.contains("base-defaults"));
    assert!(matches!(
        registry.resolve("archive").unwrap().origin(),
        EngineOrigin::Manifest(_)
    ));
}

#[test]
fn rediscovery_and_overlapping_dirs_are_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("nested");
    fs::create_dir(&nested).unwrap();
    write_manifest(&nested, "archive.toml", "archive");

    let mut registry = PluginRegistry::new();
    registry.discover(&[dir.path(), nested.as_path()]).unwrap();
    registry.discover(&[dir.path()]).unwrap();

    assert_eq!(registry.len(), 1);
}

#[test]
fn missing_directories_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = PluginRegistry::with_builtin_engines();

    let descriptors = registry
        .discover(&[dir.path().join("does-not-exist")])
        .unwrap();
    assert_eq!(descriptors.len(), 1);
}

#[test]
fn name_clash_with_another_source_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    write_manifest(dir.path(), "shadow.toml", SQLITE_ENGINE_NAME);

    let mut registry = PluginRegistry::with_builtin_engines();
    let err = registry.discover(&[dir.path()]).unwrap_err();
    assert!(matches!(err, RegistryError::DuplicateEngine(name) if name == SQLITE_ENGINE_NAME));
    assert_eq!(
        registry.resolve(SQLITE_ENGINE_NAME).unwrap().origin(),
        &EngineOrigin::Builtin
    );
}

#[test]
fn invalid_manifests_abort_discovery() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("remote.toml"),
        "name = \"remote\"\ndescription = \"Remote\"\nbackend = \"postgres\"\nversion = \"1.0.0\"\n",
    )
    .unwrap();

    let mut registry = PluginRegistry::new();
    let err = registry.discover(&[dir.path()]).unwrap_err();
    assert!(matches!(
        err,
        RegistryError::InvalidManifest {
            error: ManifestValidationError::UnsupportedBackend(_),
            ..
        }
    ));
    assert!(registry.is_empty());
}

#[test]
fn unparsable_manifests_report_parse_errors() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("broken.toml"), "name = ").unwrap();

    let mut registry = PluginRegistry::new();
    assert!(matches!(
        registry.discover(&[dir.path()]),
        Err(RegistryError::ManifestParse { .. })
    ));
}

#[test]
fn discovered_engine_backs_a_configured_journal() {
    let plugins = tempfile::tempdir().unwrap();
    write_manifest(plugins.path(), "archive.toml", "archive");
    let mut registry = PluginRegistry::with_builtin_engines();
    registry.discover(&[plugins.path()]).unwrap();

    let data = tempfile::tempdir().unwrap();
    let config = JournalConfig::for_engine("archive", data.path().join("archive.db"));
    let mut journal = Journal::from_config(&registry, config);
    assert_eq!(journal.engine_name(), Some("archive"));

    journal.create_configured_store().unwrap();
    assert_eq!(journal.state(), JournalState::BoundEmpty);
}
