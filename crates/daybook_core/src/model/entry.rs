//! Journal entry domain model.
//!
//! # Responsibility
//! - Define the record persisted by every storage engine.
//! - Track local mutation through a single dirty/modified bookkeeping path.
//!
//! # Invariants
//! - `id` is `None` until a storage engine inserts the entry; once set it
//!   never changes.
//! - Every field setter updates the value, `modified_at` and `dirty` together.
//! - Default timestamps are read from the clock when an entry is built,
//!   never cached.

use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage-assigned identifier of a persisted entry.
pub type EntryId = i64;

/// Label used when an entry has no title.
pub const UNTITLED_LABEL: &str = "(Untitled Entry)";

/// Width of the persisted title column.
///
/// Not enforced by the model; editors should cap input at this length.
pub const MAX_TITLE_LEN: usize = 255;

/// One journal entry.
///
/// Deserialized entries without an id come back dirty so the next save
/// inserts them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "EntryRecord")]
pub struct Entry {
    id: Option<EntryId>,
    created_at: NaiveDateTime,
    modified_at: NaiveDateTime,
    /// Date the entry is filed under in the calendar.
    published_date: NaiveDate,
    title: String,
    /// May contain rich-text markup produced by the editor.
    body: String,
    #[serde(skip)]
    dirty: bool,
}

impl Entry {
    /// Creates an unsaved entry stamped with the current local time.
    ///
    /// New entries start dirty so the first save inserts them.
    pub fn new() -> Self {
        let now = now();
        Self {
            id: None,
            created_at: now,
            modified_at: now,
            published_date: now.date(),
            title: String::new(),
            body: String::new(),
            dirty: true,
        }
    }

    /// Creates an unsaved entry with title and body.
    pub fn with_content(title: impl Into<String>, body: impl Into<String>) -> Self {
        let mut entry = Self::new();
        entry.title = title.into();
        entry.body = body.into();
        entry
    }

    /// Rebuilds a persisted entry from stored values.
    ///
    /// The result is clean: it matches storage until one of its setters runs.
    pub fn hydrate(
        id: EntryId,
        created_at: NaiveDateTime,
        modified_at: NaiveDateTime,
        published_date: NaiveDate,
        title: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            id: Some(id),
            created_at,
            modified_at,
            published_date,
            title: title.into(),
            body: body.into(),
            dirty: false,
        }
    }

    pub fn id(&self) -> Option<EntryId> {
        self.id
    }

    /// Returns whether this entry has never been inserted.
    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    pub fn created_at(&self) -> NaiveDateTime {
        self.created_at
    }

    pub fn modified_at(&self) -> NaiveDateTime {
        self.modified_at
    }

    pub fn published_date(&self) -> NaiveDate {
        self.published_date
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Returns whether the entry changed since it was loaded or saved.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        let title = title.into();
        self.mutate(|entry| entry.title = title);
    }

    pub fn set_body(&mut self, body: impl Into<String>) {
        let body = body.into();
        self.mutate(|entry| entry.body = body);
    }

    pub fn set_published_date(&mut self, date: NaiveDate) {
        self.mutate(|entry| entry.published_date = date);
    }

    /// Overrides the creation timestamp, e.g. when importing old entries.
    pub fn set_created_at(&mut self, created_at: NaiveDateTime) {
        self.mutate(|entry| entry.created_at = created_at);
    }

    /// Records the identifier assigned by a storage engine on insert.
    ///
    /// # Errors
    /// - Returns `IdAlreadyAssigned` when the entry already carries a
    ///   different id. Re-assigning the same id is a no-op.
    pub fn assign_id(&mut self, id: EntryId) -> Result<(), EntryError> {
        match self.id {
            None => {
                self.id = Some(id);
                Ok(())
            }
            Some(existing) if existing == id => Ok(()),
            Some(existing) => Err(EntryError::IdAlreadyAssigned {
                existing,
                attempted: id,
            }),
        }
    }

    /// Clears the dirty flag once the entry matches storage.
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Human label shown in entry lists.
    pub fn label(&self) -> &str {
        if self.title.is_empty() {
            UNTITLED_LABEL
        } else {
            &self.title
        }
    }

    // Single mutation path: value, modified_at and dirty change together.
    fn mutate(&mut self, apply: impl FnOnce(&mut Self)) {
        apply(self);
        self.modified_at = self.modified_at.max(now());
        self.dirty = true;
    }
}

// Serialized form of `Entry`; dirty state is derived, never stored.
#[derive(Deserialize)]
struct EntryRecord {
    id: Option<EntryId>,
    created_at: NaiveDateTime,
    modified_at: NaiveDateTime,
    published_date: NaiveDate,
    title: String,
    body: String,
}

impl From<EntryRecord> for Entry {
    fn from(record: EntryRecord) -> Self {
        Self {
            id: record.id,
            created_at: record.created_at,
            modified_at: record.modified_at,
            published_date: record.published_date,
            title: record.title,
            body: record.body,
            dirty: record.id.is_none(),
        }
    }
}

impl Default for Entry {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for Entry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Entry identity errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryError {
    IdAlreadyAssigned { existing: EntryId, attempted: EntryId },
}

impl Display for EntryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IdAlreadyAssigned {
                existing,
                attempted,
            } => write!(
                f,
                "entry already has id {existing}; refusing to assign {attempted}"
            ),
        }
    }
}

impl Error for EntryError {}

#[cfg(test)]
mod tests {
    use super::{Entry, EntryError, UNTITLED_LABEL};
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn new_entry_is_unsaved_and_dirty() {
        let entry = Entry::new();
        assert!(entry.is_new());
        assert!(entry.is_dirty());
        assert_eq!(entry.created_at(), entry.modified_at());
        assert_eq!(entry.published_date(), entry.created_at().date());
    }

    #[test]
    fn defaults_are_computed_per_instance() {
        let first = Entry::new();
        std::thread::sleep(std::time::Duration::from_millis(5));
        let second = Entry::new();
        assert!(second.created_at() > first.created_at());
    }

    #[test]
    fn hydrated_entry_is_clean_until_mutated() {
        let stamp = date(2024, 1, 1).and_hms_opt(9, 0, 0).expect("valid time");
        let mut entry = Entry::hydrate(7, stamp, stamp, date(2024, 1, 1), "T", "B");
        assert!(!entry.is_dirty());
        assert_eq!(entry.id(), Some(7));

        entry.set_published_date(date(2024, 1, 2));
        assert!(entry.is_dirty());
        assert!(entry.modified_at() > stamp);
    }

    #[test]
    fn every_setter_marks_dirty() {
        let stamp = date(2020, 5, 5).and_hms_opt(0, 0, 0).expect("valid time");
        let setters: Vec<Box<dyn Fn(&mut Entry)>> = vec![
            Box::new(|e: &mut Entry| e.set_title("t")),
            Box::new(|e: &mut Entry| e.set_body("b")),
            Box::new(|e: &mut Entry| e.set_published_date(date(2021, 1, 1))),
            Box::new(move |e: &mut Entry| e.set_created_at(stamp)),
        ];
        for setter in setters {
            let mut entry = Entry::hydrate(1, stamp, stamp, date(2020, 5, 5), "", "");
            setter(&mut entry);
            assert!(entry.is_dirty());
            assert!(entry.modified_at() >= stamp);
        }
    }

    #[test]
    fn assign_id_is_write_once() {
        let mut entry = Entry::new();
        entry.assign_id(3).expect("first assignment");
        entry.assign_id(3).expect("same id is accepted");
        let err = entry.assign_id(4).expect_err("different id must fail");
        assert_eq!(
            err,
            EntryError::IdAlreadyAssigned {
                existing: 3,
                attempted: 4
            }
        );
        assert_eq!(entry.id(), Some(3));
    }

    #[test]
    fn label_falls_back_for_untitled_entries() {
        let mut entry = Entry::new();
        assert_eq!(entry.to_string(), UNTITLED_LABEL);
        entry.set_title("Monday");
        assert_eq!(entry.to_string(), "Monday");
    }
}
