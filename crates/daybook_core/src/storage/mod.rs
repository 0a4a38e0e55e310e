//! Storage engine contracts and built-in implementations.
//!
//! # Responsibility
//! - Define the `StorageEngine` seam used by `Journal` for persistence.
//! - Translate backend failures into semantic storage errors.
//!
//! # Invariants
//! - `save` receives only dirty entries and assigns ids to inserted entries
//!   in place; it never clears dirty flags or the deletion list.
//! - Engines hold no connection between calls.

use crate::db::DbError;
use crate::model::entry::{Entry, EntryError, EntryId};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub mod sqlite;

pub use sqlite::{SqliteStorageEngine, SQLITE_ENGINE_NAME};

pub type StorageResult<T> = Result<T, StorageError>;

/// Storage failures surfaced to journal callers.
#[derive(Debug)]
pub enum StorageError {
    /// The target for a new store cannot be created or already holds data.
    Init { target: PathBuf, reason: String },
    /// The store to load or save does not exist.
    NotFound(PathBuf),
    /// The target exists but is not a recognizable journal store.
    Format { target: PathBuf, reason: String },
    /// An update addressed a row that is no longer stored.
    EntryNotFound(EntryId),
    Identity(EntryError),
    Db(DbError),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Init { target, reason } => write!(
                f,
                "cannot create journal store at `{}`: {reason}",
                target.display()
            ),
            Self::NotFound(target) => {
                write!(f, "journal store not found: `{}`", target.display())
            }
            Self::Format { target, reason } => write!(
                f,
                "`{}` is not a journal store: {reason}",
                target.display()
            ),
            Self::EntryNotFound(id) => write!(f, "entry not found in store: {id}"),
            Self::Identity(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StorageError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Identity(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Init { .. }
            | Self::NotFound(_)
            | Self::Format { .. }
            | Self::EntryNotFound(_) => None,
        }
    }
}

impl From<DbError> for StorageError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<EntryError> for StorageError {
    fn from(value: EntryError) -> Self {
        Self::Identity(value)
    }
}

/// Row counts applied by one `save` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveReport {
    pub inserted: usize,
    pub updated: usize,
    pub deleted: usize,
}

impl SaveReport {
    pub fn is_empty(&self) -> bool {
        self.inserted == 0 && self.updated == 0 && self.deleted == 0
    }
}

/// Persistence backend for one journal store.
///
/// `target` identifies the store (a file path for file-backed engines).
pub trait StorageEngine: Send + Sync {
    /// Registry name, matched against journal configuration.
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Creates and initializes an empty store at `target`.
    fn create_store(&self, target: &Path) -> StorageResult<()>;

    /// Returns every stored entry, hydrated with its id and clean.
    ///
    /// Row order is unspecified.
    fn load(&self, target: &Path) -> StorageResult<Vec<Entry>>;

    /// Writes modified entries and applies pending deletions.
    ///
    /// # Contract
    /// - Entries with an id are updated; entries without one are inserted and
    ///   receive their new id.
    /// - Pending deletions without an id are ignored.
    fn save(
        &self,
        target: &Path,
        modified: &mut [&mut Entry],
        pending_deletions: &[Entry],
    ) -> StorageResult<SaveReport>;
}
