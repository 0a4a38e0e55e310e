//! Journal use-case services.
//!
//! # Responsibility
//! - Own the journal aggregate and its delegation to storage engines.
//! - Keep calendar navigation independent of storage details.

pub mod calendar;
pub mod journal;
