//! Calendar queries over in-memory entries.
//!
//! # Invariants
//! - Queries never touch storage; they read the journal's working set.
//! - Navigation does not wrap: the first and last dates have no
//!   predecessor/successor.

use crate::model::entry::Entry;
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeSet;

/// Distinct published dates, ascending.
pub fn distinct_published_dates<'a>(entries: impl IntoIterator<Item = &'a Entry>) -> Vec<NaiveDate> {
    entries
        .into_iter()
        .map(Entry::published_date)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Distinct published dates within one month, ascending.
///
/// Used to highlight calendar days holding at least one entry. An
/// out-of-range `month` matches nothing.
pub fn published_dates_in_month(entries: &[Entry], month: u32, year: i32) -> Vec<NaiveDate> {
    distinct_published_dates(
        entries
            .iter()
            .filter(|entry| {
                let date = entry.published_date();
                date.month() == month && date.year() == year
            }),
    )
}

/// Published date following `date`.
///
/// When `date` is itself a published date its successor is returned;
/// otherwise the nearest published date strictly after it.
pub fn next_date(entries: &[Entry], date: NaiveDate) -> Option<NaiveDate> {
    let dates = distinct_published_dates(entries);
    match dates.binary_search(&date) {
        Ok(found) => dates.get(found + 1).copied(),
        Err(insert_at) => dates.get(insert_at).copied(),
    }
}

/// Published date preceding `date`.
///
/// When `date` is itself a published date its predecessor is returned;
/// otherwise the nearest published date strictly before it.
pub fn previous_date(entries: &[Entry], date: NaiveDate) -> Option<NaiveDate> {
    let dates = distinct_published_dates(entries);
    let upper = match dates.binary_search(&date) {
        Ok(found) => found,
        Err(insert_at) => insert_at,
    };
    upper.checked_sub(1).and_then(|index| dates.get(index).copied())
}
