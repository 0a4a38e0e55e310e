//! Single-file SQLite storage engine.
//!
//! # Responsibility
//! - Create, load and save journal stores backed by one SQLite file.
//! - Apply each save batch inside one transaction.
//!
//! # Invariants
//! - A failed save leaves the file untouched and assigns no ids.
//! - Ids come from `AUTOINCREMENT` and are never reused within a store.

use crate::db::{create_db, open_db, DbError};
use crate::model::entry::{Entry, EntryId};
use crate::storage::{SaveReport, StorageEngine, StorageError, StorageResult};
use chrono::{NaiveDate, NaiveDateTime};
use log::{debug, error, info};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::time::Instant;

/// Registry name of the built-in engine.
pub const SQLITE_ENGINE_NAME: &str = "sqlite3";
pub const SQLITE_ENGINE_DESCRIPTION: &str = "Sqlite3 Storage Engine";

const ENTRY_SELECT_SQL: &str = "SELECT
    entry_id,
    date_created,
    date_modified,
    date_published,
    title,
    body
FROM entries
ORDER BY entry_id ASC";

const ENTRY_INSERT_SQL: &str = "INSERT INTO entries (
    date_created,
    date_modified,
    date_published,
    title,
    body
) VALUES (?1, ?2, ?3, ?4, ?5);";

const ENTRY_UPDATE_SQL: &str = "UPDATE entries
SET
    date_modified = ?1,
    date_published = ?2,
    body = ?3,
    title = ?4
WHERE entry_id = ?5;";

const ENTRY_DELETE_SQL: &str = "DELETE FROM entries WHERE entry_id = ?1;";

/// SQLite-backed storage engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqliteStorageEngine {
    name: String,
    description: String,
}

impl SqliteStorageEngine {
    pub fn new() -> Self {
        Self::named(SQLITE_ENGINE_NAME, SQLITE_ENGINE_DESCRIPTION)
    }

    /// Creates the engine under a manifest-declared name.
    pub fn named(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }

    fn create_store_inner(&self, target: &Path) -> StorageResult<()> {
        if target.is_dir() {
            return Err(init_error(target, "target is a directory"));
        }
        if target.exists() {
            let len = std::fs::metadata(target)
                .map_err(|err| init_error(target, err.to_string()))?
                .len();
            if len > 0 {
                return Err(init_error(target, "target already exists and is not empty"));
            }
        }

        let conn = create_db(target).map_err(|err| init_error(target, err.to_string()))?;
        drop(conn);
        Ok(())
    }

    fn load_inner(&self, target: &Path) -> StorageResult<Vec<Entry>> {
        let conn = open_existing(target)?;
        let mut stmt = conn.prepare(ENTRY_SELECT_SQL)?;
        let mut rows = stmt.query([])?;
        let mut entries = Vec::new();

        while let Some(row) = rows.next()? {
            let entry = parse_entry_row(row).map_err(|err| match err {
                rusqlite::Error::FromSqlConversionFailure(..)
                | rusqlite::Error::InvalidColumnType(..)
                | rusqlite::Error::IntegralValueOutOfRange(..) => StorageError::Format {
                    target: target.to_path_buf(),
                    reason: format!("undecodable entry row: {err}"),
                },
                other => other.into(),
            })?;
            entries.push(entry);
        }

        Ok(entries)
    }

    fn save_inner(
        &self,
        target: &Path,
        modified: &mut [&mut Entry],
        pending_deletions: &[Entry],
    ) -> StorageResult<SaveReport> {
        let mut conn = open_existing(target)?;
        let mut report = SaveReport::default();
        let mut assigned: Vec<(usize, EntryId)> = Vec::new();

        let tx = conn.transaction()?;
        {
            let mut update = tx.prepare(ENTRY_UPDATE_SQL)?;
            let mut insert = tx.prepare(ENTRY_INSERT_SQL)?;
            let mut delete = tx.prepare(ENTRY_DELETE_SQL)?;

            for (index, entry) in modified.iter().enumerate() {
                match entry.id() {
                    Some(id) => {
                        let changed = update.execute(params![
                            entry.modified_at(),
                            entry.published_date(),
                            entry.body(),
                            entry.title(),
                            id,
                        ])?;
                        if changed == 0 {
                            return Err(StorageError::EntryNotFound(id));
                        }
                        report.updated += 1;
                    }
                    None => {
                        let id = insert.insert(params![
                            entry.created_at(),
                            entry.modified_at(),
                            entry.published_date(),
                            entry.title(),
                            entry.body(),
                        ])?;
                        assigned.push((index, id));
                        report.inserted += 1;
                    }
                }
            }

            for entry in pending_deletions {
                let Some(id) = entry.id() else {
                    debug!("event=store_save module=storage status=skip reason=delete_without_id");
                    continue;
                };
                report.deleted += delete.execute([id])?;
            }
        }
        tx.commit()?;

        for (index, id) in assigned {
            modified[index].assign_id(id)?;
        }

        Ok(report)
    }
}

impl Default for SqliteStorageEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageEngine for SqliteStorageEngine {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn create_store(&self, target: &Path) -> StorageResult<()> {
        let started_at = Instant::now();
        let result = self.create_store_inner(target);
        log_outcome("store_create", &self.name, started_at, &result, |_| String::new());
        result
    }

    fn load(&self, target: &Path) -> StorageResult<Vec<Entry>> {
        let started_at = Instant::now();
        let result = self.load_inner(target);
        log_outcome("store_load", &self.name, started_at, &result, |entries| {
            format!(" entries={}", entries.len())
        });
        result
    }

    fn save(
        &self,
        target: &Path,
        modified: &mut [&mut Entry],
        pending_deletions: &[Entry],
    ) -> StorageResult<SaveReport> {
        let started_at = Instant::now();
        let result = self.save_inner(target, modified, pending_deletions);
        log_outcome("store_save", &self.name, started_at, &result, |report| {
            format!(
                " inserted={} updated={} deleted={}",
                report.inserted, report.updated, report.deleted
            )
        });
        result
    }
}

fn open_existing(target: &Path) -> StorageResult<Connection> {
    if !target.exists() {
        return Err(StorageError::NotFound(target.to_path_buf()));
    }
    if target.is_dir() {
        return Err(StorageError::Format {
            target: target.to_path_buf(),
            reason: "target is a directory".to_string(),
        });
    }

    open_db(target).map_err(|err| classify_open_error(target, err))
}

fn classify_open_error(target: &Path, err: DbError) -> StorageError {
    if err.is_format_error() {
        StorageError::Format {
            target: target.to_path_buf(),
            reason: err.to_string(),
        }
    } else {
        StorageError::Db(err)
    }
}

fn init_error(target: &Path, reason: impl Into<String>) -> StorageError {
    StorageError::Init {
        target: target.to_path_buf(),
        reason: reason.into(),
    }
}

fn parse_entry_row(row: &Row<'_>) -> rusqlite::Result<Entry> {
    Ok(Entry::hydrate(
        row.get::<_, EntryId>("entry_id")?,
        row.get::<_, NaiveDateTime>("date_created")?,
        row.get::<_, NaiveDateTime>("date_modified")?,
        row.get::<_, NaiveDate>("date_published")?,
        row.get::<_, String>("title")?,
        row.get::<_, String>("body")?,
    ))
}

fn log_outcome<T>(
    event: &str,
    engine: &str,
    started_at: Instant,
    result: &StorageResult<T>,
    details: impl FnOnce(&T) -> String,
) {
    match result {
        Ok(value) => info!(
            "event={} module=storage status=ok engine={} duration_ms={}{}",
            event,
            engine,
            started_at.elapsed().as_millis(),
            details(value)
        ),
        Err(err) => error!(
            "event={} module=storage status=error engine={} duration_ms={} error={}",
            event,
            engine,
            started_at.elapsed().as_millis(),
            err
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::{SqliteStorageEngine, SQLITE_ENGINE_NAME};
    use crate::model::entry::Entry;
    use crate::storage::{StorageEngine, StorageError};

    #[test]
    fn builtin_engine_reports_name_and_description() {
        let engine = SqliteStorageEngine::new();
        assert_eq!(engine.name(), SQLITE_ENGINE_NAME);
        assert_eq!(engine.description(), "Sqlite3 Storage Engine");
    }

    #[test]
    fn named_engine_keeps_manifest_identity() {
        let engine = SqliteStorageEngine::named("archive", "Archive journal");
        assert_eq!(engine.name(), "archive");
        assert_eq!(engine.description(), "Archive journal");
    }

    #[test]
    fn save_then_load_assigns_and_returns_ids() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("journal.db");
        let engine = SqliteStorageEngine::new();
        engine.create_store(&path).expect("store should be created");

        let mut entry = Entry::with_content("T", "B");
        let report = engine
            .save(&path, &mut [&mut entry], &[])
            .expect("save should succeed");
        assert_eq!(report.inserted, 1);
        let id = entry.id().expect("insert assigns id");

        let loaded = engine.load(&path).expect("load should succeed");
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id(), Some(id));
        assert!(!loaded[0].is_dirty());
    }

    #[test]
    fn save_on_missing_store_is_not_found() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("missing.db");
        let mut entry = Entry::new();
        let err = SqliteStorageEngine::new()
            .save(&path, &mut [&mut entry], &[])
            .expect_err("missing store must fail");
        assert!(matches!(err, StorageError::NotFound(_)));
        assert!(entry.id().is_none());
    }
}
