//! Journal store schema definition and recognition checks.

use crate::db::{DbError, DbResult};
use rusqlite::Connection;

/// Name of the single table holding journal entries.
pub const ENTRIES_TABLE: &str = "entries";

/// Columns every recognizable store must expose.
pub const ENTRY_COLUMNS: &[&str] = &[
    "entry_id",
    "date_created",
    "date_modified",
    "date_published",
    "title",
    "body",
];

/// Schema version written by this crate.
pub const SCHEMA_VERSION: u32 = 1;

const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Creates the `entries` table and stamps the schema version atomically.
pub fn create_schema(conn: &mut Connection) -> DbResult<()> {
    let tx = conn.transaction()?;
    tx.execute_batch(SCHEMA_SQL)?;
    tx.execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION};"))?;
    tx.commit()?;
    Ok(())
}

/// Confirms the connection points at a journal store this crate can read.
///
/// Stores written before versioning (`user_version = 0`) are accepted when
/// the `entries` table carries every expected column.
pub fn verify_schema(conn: &Connection) -> DbResult<()> {
    let version = current_user_version(conn)?;
    if version > SCHEMA_VERSION {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: version,
            latest_supported: SCHEMA_VERSION,
        });
    }

    let columns = table_columns(conn, ENTRIES_TABLE)?;
    if columns.is_empty() {
        return Err(DbError::MissingTable(ENTRIES_TABLE));
    }
    for &column in ENTRY_COLUMNS {
        if !columns.iter().any(|name| name.as_str() == column) {
            return Err(DbError::MissingColumn {
                table: ENTRIES_TABLE,
                column,
            });
        }
    }

    Ok(())
}

/// Returns the schema version stamped on the store.
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

fn table_columns(conn: &Connection, table: &str) -> DbResult<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>("name"))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::{create_schema, current_user_version, verify_schema, SCHEMA_VERSION};
    use crate::db::{create_db_in_memory, DbError};
    use rusqlite::Connection;

    #[test]
    fn created_schema_passes_verification() {
        let conn = create_db_in_memory().expect("in-memory store");
        assert_eq!(
            current_user_version(&conn).expect("version"),
            SCHEMA_VERSION
        );
        verify_schema(&conn).expect("fresh schema should verify");
    }

    #[test]
    fn create_schema_on_empty_connection_stamps_version() {
        let mut conn = Connection::open_in_memory().expect("in-memory db");
        create_schema(&mut conn).expect("schema should apply");
        assert_eq!(
            current_user_version(&conn).expect("version"),
            SCHEMA_VERSION
        );
    }

    #[test]
    fn empty_database_is_missing_entries_table() {
        let conn = Connection::open_in_memory().expect("in-memory db");
        let err = verify_schema(&conn).expect_err("empty db must fail");
        assert!(matches!(err, DbError::MissingTable("entries")));
        assert!(err.is_format_error());
    }

    #[test]
    fn table_without_body_column_is_rejected() {
        let conn = Connection::open_in_memory().expect("in-memory db");
        conn.execute_batch(
            "CREATE TABLE entries (
                entry_id INTEGER PRIMARY KEY,
                date_created TIMESTAMP,
                date_modified TIMESTAMP,
                date_published DATE,
                title TEXT
            );",
        )
        .expect("legacy table");
        let err = verify_schema(&conn).expect_err("missing column must fail");
        assert!(matches!(
            err,
            DbError::MissingColumn {
                table: "entries",
                column: "body"
            }
        ));
    }

    #[test]
    fn unversioned_store_with_full_table_is_accepted() {
        let conn = Connection::open_in_memory().expect("in-memory db");
        conn.execute_batch(
            "CREATE TABLE entries (
                entry_id INTEGER NOT NULL,
                date_created TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                date_modified TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                date_published DATE NOT NULL DEFAULT (date('now')),
                body TEXT NOT NULL,
                title VARCHAR(255) NOT NULL,
                PRIMARY KEY (entry_id)
            );",
        )
        .expect("unversioned table");
        verify_schema(&conn).expect("unversioned store should verify");
    }

    #[test]
    fn newer_schema_version_is_rejected() {
        let conn = Connection::open_in_memory().expect("in-memory db");
        conn.execute_batch("PRAGMA user_version = 999;")
            .expect("set version");
        let err = verify_schema(&conn).expect_err("newer version must fail");
        assert!(matches!(
            err,
            DbError::UnsupportedSchemaVersion {
                db_version: 999,
                latest_supported: SCHEMA_VERSION
            }
        ));
    }
}
