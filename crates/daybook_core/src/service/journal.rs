//! Journal aggregate.
//!
//! # Responsibility
//! - Hold the working set of entries and the pending-deletion queue.
//! - Delegate create/load/save to the active storage engine.
//! - Answer calendar navigation queries over the working set.
//!
//! # Invariants
//! - Every entry in `pending_deletions` has an id.
//! - A failed storage call leaves entries, deletions and state untouched.
//! - `save` passes only dirty entries to the engine.

use crate::config::JournalConfig;
use crate::model::entry::{Entry, EntryId};
use crate::plugin::PluginRegistry;
use crate::service::calendar;
use crate::storage::{SaveReport, StorageEngine, StorageError};
use chrono::NaiveDate;
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::path::{Path, PathBuf};

/// Binding state of a journal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalState {
    /// No store target yet.
    Unbound,
    /// A fresh store was created; nothing loaded.
    BoundEmpty,
    /// Entries mirror the bound store (plus local edits).
    BoundLoaded,
}

/// In-memory journal bound to at most one store.
pub struct Journal {
    config: JournalConfig,
    engine: Option<Box<dyn StorageEngine>>,
    entries: Vec<Entry>,
    pending_deletions: Vec<Entry>,
    active_target: Option<PathBuf>,
    state: JournalState,
}

impl Journal {
    /// Creates a journal with no engine and no configuration.
    pub fn unbound() -> Self {
        Self {
            config: JournalConfig::new(),
            engine: None,
            entries: Vec::new(),
            pending_deletions: Vec::new(),
            active_target: None,
            state: JournalState::Unbound,
        }
    }

    /// Creates a journal using a directly constructed engine.
    pub fn with_engine(engine: Box<dyn StorageEngine>) -> Self {
        let mut journal = Self::unbound();
        journal
            .config
            .set(crate::config::ENGINE_KEY, engine.name().to_string());
        journal.engine = Some(engine);
        journal
    }

    /// Creates a journal whose engine is selected by `config`.
    ///
    /// An unknown or missing engine name does not fail here: the engine stays
    /// unset and every storage call returns `NoActiveEngine`.
    pub fn from_config(registry: &PluginRegistry, config: JournalConfig) -> Self {
        let engine = match config.engine() {
            Some(name) => match registry.instantiate(name, &config) {
                Ok(engine) => Some(engine),
                Err(err) => {
                    warn!("event=journal_init module=journal status=degraded error={err}");
                    None
                }
            },
            None => {
                warn!("event=journal_init module=journal status=degraded reason=engine_not_configured");
                None
            }
        };

        Self {
            config,
            engine,
            ..Self::unbound()
        }
    }

    pub fn config(&self) -> &JournalConfig {
        &self.config
    }

    pub fn state(&self) -> JournalState {
        self.state
    }

    /// Name of the active engine, if one was resolved.
    pub fn engine_name(&self) -> Option<&str> {
        self.engine.as_deref().map(|engine| engine.name())
    }

    /// Store the journal is bound to.
    pub fn active_target(&self) -> Option<&Path> {
        self.active_target.as_deref()
    }

    /// Creates a fresh store at `target` and binds to it.
    ///
    /// The working set and deletion queue are cleared; the store is not
    /// reloaded, so the journal ends up `BoundEmpty`.
    pub fn create_store(&mut self, target: impl AsRef<Path>) -> Result<(), JournalError> {
        let target = target.as_ref();
        self.require_engine()?.create_store(target)?;

        self.entries.clear();
        self.pending_deletions.clear();
        self.active_target = Some(target.to_path_buf());
        self.state = JournalState::BoundEmpty;
        debug!("event=journal_create module=journal status=ok state=bound_empty");
        Ok(())
    }

    /// Replaces the working set with the store at `target`.
    pub fn load(&mut self, target: impl AsRef<Path>) -> Result<(), JournalError> {
        let target = target.as_ref();
        let entries = self.require_engine()?.load(target)?;

        self.entries = entries;
        self.pending_deletions.clear();
        self.active_target = Some(target.to_path_buf());
        self.state = JournalState::BoundLoaded;
        debug!(
            "event=journal_load module=journal status=ok entries={}",
            self.entries.len()
        );
        Ok(())
    }

    /// `create_store` at the configured `path`.
    pub fn create_configured_store(&mut self) -> Result<(), JournalError> {
        let target = self.configured_target()?;
        self.create_store(target)
    }

    /// `load` from the configured `path`.
    pub fn load_configured(&mut self) -> Result<(), JournalError> {
        let target = self.configured_target()?;
        self.load(target)
    }

    /// Persists dirty entries and pending deletions to the bound store.
    ///
    /// On success the saved entries are clean and the deletion queue is
    /// empty. On failure nothing in memory changes.
    pub fn save(&mut self) -> Result<SaveReport, JournalError> {
        let engine = match self.engine.as_deref() {
            Some(engine) => engine,
            None => return Err(self.no_engine_error()),
        };
        let target = self
            .active_target
            .as_deref()
            .ok_or(JournalError::NoActiveJournal)?;

        let mut modified: Vec<&mut Entry> = self
            .entries
            .iter_mut()
            .filter(|entry| entry.is_dirty())
            .collect();
        let report = engine.save(target, &mut modified, &self.pending_deletions)?;

        for entry in modified {
            entry.mark_clean();
        }
        self.pending_deletions.clear();
        self.state = JournalState::BoundLoaded;
        info!(
            "event=journal_save module=journal status=ok inserted={} updated={} deleted={}",
            report.inserted, report.updated, report.deleted
        );
        Ok(report)
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn entry(&self, index: usize) -> Option<&Entry> {
        self.entries.get(index)
    }

    /// Entry at `index` for editing through its setters.
    pub fn entry_mut(&mut self, index: usize) -> Option<&mut Entry> {
        self.entries.get_mut(index)
    }

    /// Position of the entry carrying `id` in the working set.
    pub fn position_of(&self, id: EntryId) -> Option<usize> {
        self.entries.iter().position(|entry| entry.id() == Some(id))
    }

    /// Appends an entry and returns its index.
    pub fn add_entry(&mut self, entry: Entry) -> usize {
        self.entries.push(entry);
        self.entries.len() - 1
    }

    /// Appends a blank entry dated today and returns it for editing.
    pub fn new_entry(&mut self) -> &mut Entry {
        let index = self.add_entry(Entry::new());
        &mut self.entries[index]
    }

    /// Removes the entry at `index` from the working set.
    ///
    /// Persisted entries are queued for deletion on the next save; unsaved
    /// entries are simply dropped.
    pub fn remove_entry(&mut self, index: usize) -> Option<Entry> {
        if index >= self.entries.len() {
            return None;
        }
        let entry = self.entries.remove(index);
        if entry.id().is_some() {
            self.pending_deletions.push(entry.clone());
        }
        Some(entry)
    }

    pub fn pending_deletions(&self) -> &[Entry] {
        &self.pending_deletions
    }

    /// Queues a persisted entry for deletion on the next save.
    ///
    /// Any working-set entry carrying the same id is removed. Returns `false`
    /// for unsaved entries and entries already queued.
    pub fn queue_deletion(&mut self, entry: Entry) -> bool {
        let Some(id) = entry.id() else {
            return false;
        };
        if self
            .pending_deletions
            .iter()
            .any(|pending| pending.id() == Some(id))
        {
            return false;
        }
        self.entries.retain(|current| current.id() != Some(id));
        self.pending_deletions.push(entry);
        true
    }

    /// Moves a queued deletion back into the working set.
    pub fn cancel_deletion(&mut self, id: EntryId) -> bool {
        let Some(position) = self
            .pending_deletions
            .iter()
            .position(|pending| pending.id() == Some(id))
        else {
            return false;
        };
        let entry = self.pending_deletions.remove(position);
        self.entries.push(entry);
        true
    }

    /// Returns whether a save would write anything.
    pub fn is_dirty(&self) -> bool {
        !self.pending_deletions.is_empty() || self.entries.iter().any(Entry::is_dirty)
    }

    /// Distinct published dates within one month, ascending.
    pub fn published_dates_in_month(&self, month: u32, year: i32) -> Vec<NaiveDate> {
        calendar::published_dates_in_month(&self.entries, month, year)
    }

    /// Distinct published dates across the working set, ascending.
    pub fn published_dates(&self) -> Vec<NaiveDate> {
        calendar::distinct_published_dates(&self.entries)
    }

    /// Next published date after `date`; `None` past the last one.
    pub fn next_date(&self, date: NaiveDate) -> Option<NaiveDate> {
        calendar::next_date(&self.entries, date)
    }

    /// Previous published date before `date`; `None` before the first one.
    pub fn previous_date(&self, date: NaiveDate) -> Option<NaiveDate> {
        calendar::previous_date(&self.entries, date)
    }

    /// Entries filed under `date`, in working-set order.
    pub fn entries_on(&self, date: NaiveDate) -> impl Iterator<Item = &Entry> {
        self.entries
            .iter()
            .filter(move |entry| entry.published_date() == date)
    }

    fn require_engine(&self) -> Result<&dyn StorageEngine, JournalError> {
        self.engine
            .as_deref()
            .ok_or_else(|| self.no_engine_error())
    }

    fn no_engine_error(&self) -> JournalError {
        JournalError::NoActiveEngine {
            configured: self.config.engine().map(str::to_string),
        }
    }

    fn configured_target(&self) -> Result<PathBuf, JournalError> {
        self.config.path().ok_or(JournalError::MissingStorageTarget)
    }
}

impl Default for Journal {
    fn default() -> Self {
        Self::unbound()
    }
}

impl Debug for Journal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Journal")
            .field("engine", &self.engine_name())
            .field("state", &self.state)
            .field("active_target", &self.active_target)
            .field("entries", &self.entries.len())
            .field("pending_deletions", &self.pending_deletions.len())
            .finish()
    }
}

/// Journal-level failures.
#[derive(Debug)]
pub enum JournalError {
    /// No storage engine could be resolved for this journal.
    NoActiveEngine { configured: Option<String> },
    /// `save` was called before any store was created or loaded.
    NoActiveJournal,
    /// The configuration has no `path` entry.
    MissingStorageTarget,
    Storage(StorageError),
}

impl Display for JournalError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoActiveEngine {
                configured: Some(name),
            } => write!(f, "no active storage engine (`{name}` is not registered)"),
            Self::NoActiveEngine { configured: None } => {
                write!(f, "no active storage engine (none configured)")
            }
            Self::NoActiveJournal => write!(f, "no journal store has been created or loaded"),
            Self::MissingStorageTarget => write!(f, "configuration has no storage path"),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for JournalError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::NoActiveEngine { .. } | Self::NoActiveJournal | Self::MissingStorageTarget => {
                None
            }
        }
    }
}

impl From<StorageError> for JournalError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}
