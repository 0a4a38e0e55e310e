//! Connection bootstrap utilities for journal stores.
//!
//! # Responsibility
//! - Create new store files and apply the schema.
//! - Open existing store files without creating them.
//!
//! # Invariants
//! - `open_db` never creates a file; a missing path is an SQLite open error.
//! - Returned connections point at a verified journal schema.

use super::schema::{create_schema, verify_schema};
use super::DbResult;
use log::{error, info};
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Creates (or reuses an empty) SQLite file and applies the journal schema.
///
/// # Side effects
/// - Writes the `entries` table and schema version into the file.
/// - Emits `db_open` logging events with duration and status.
pub fn create_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    bootstrap("create", || Connection::open_with_flags(path, flags), |conn| {
        create_schema(conn)
    })
}

/// Opens an existing SQLite file and verifies it is a journal store.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    bootstrap("file", || Connection::open_with_flags(path, flags), |conn| {
        verify_schema(conn)
    })
}

/// Creates an in-memory journal store.
pub fn create_db_in_memory() -> DbResult<Connection> {
    bootstrap("memory", Connection::open_in_memory, |conn| {
        create_schema(conn)
    })
}

fn bootstrap(
    mode: &'static str,
    open: impl FnOnce() -> rusqlite::Result<Connection>,
    prepare: impl FnOnce(&mut Connection) -> DbResult<()>,
) -> DbResult<Connection> {
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={mode}");

    let mut conn = match open() {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_open_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    match configure_connection(&mut conn, prepare) {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode={} duration_ms={}",
                mode,
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_bootstrap_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn configure_connection(
    conn: &mut Connection,
    prepare: impl FnOnce(&mut Connection) -> DbResult<()>,
) -> DbResult<()> {
    conn.busy_timeout(BUSY_TIMEOUT)?;
    prepare(conn)
}
