//! Journal domain model.
//!
//! # Responsibility
//! - Define the entry record shared by the journal and storage engines.
//!
//! # Invariants
//! - An entry without an id has never been persisted and must be inserted.
//! - Deletion is a journal concern; entries carry no tombstone state.

pub mod entry;
