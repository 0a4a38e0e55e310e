use chrono::NaiveDate;
use daybook_core::{Entry, Journal, SqliteStorageEngine};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn journal_with_dates(dates: &[NaiveDate]) -> Journal {
    let mut journal = Journal::with_engine(Box::new(SqliteStorageEngine::new()));
    for published in dates {
        let mut entry = Entry::new();
        entry.set_published_date(*published);
        journal.add_entry(entry);
    }
    journal
}

#[test]
fn next_and_previous_step_between_published_dates() {
    let journal = journal_with_dates(&[date(2024, 1, 1), date(2024, 1, 15), date(2024, 2, 1)]);

    assert_eq!(journal.next_date(date(2024, 1, 1)), Some(date(2024, 1, 15)));
    assert_eq!(journal.next_date(date(2024, 1, 15)), Some(date(2024, 2, 1)));
    assert_eq!(journal.next_date(date(2024, 2, 1)), None);

    assert_eq!(journal.previous_date(date(2024, 2, 1)), Some(date(2024, 1, 15)));
    assert_eq!(journal.previous_date(date(2024, 1, 15)), Some(date(2024, 1, 1)));
    assert_eq!(journal.previous_date(date(2024, 1, 1)), None);
}

#[test]
fn unpublished_dates_snap_to_nearest_neighbour() {
    let journal = journal_with_dates(&[date(2024, 1, 1), date(2024, 1, 15), date(2024, 2, 1)]);

    assert_eq!(journal.next_date(date(2024, 1, 10)), Some(date(2024, 1, 15)));
    assert_eq!(journal.previous_date(date(2024, 1, 20)), Some(date(2024, 1, 15)));
    assert_eq!(journal.next_date(date(2023, 12, 25)), Some(date(2024, 1, 1)));
    assert_eq!(journal.previous_date(date(2024, 3, 1)), Some(date(2024, 2, 1)));
    assert_eq!(journal.next_date(date(2024, 3, 1)), None);
    assert_eq!(journal.previous_date(date(2023, 12, 25)), None);
}

#[test]
fn several_entries_on_one_day_count_once() {
    let journal = journal_with_dates(&[date(2024, 1, 5), date(2024, 1, 1), date(2024, 1, 5)]);

    assert_eq!(journal.published_dates(), vec![date(2024, 1, 1), date(2024, 1, 5)]);
    assert_eq!(journal.next_date(date(2024, 1, 1)), Some(date(2024, 1, 5)));
    assert_eq!(journal.entries_on(date(2024, 1, 5)).count(), 2);
}

#[test]
fn month_query_returns_distinct_days_in_that_month_only() {
    let journal = journal_with_dates(&[
        date(2024, 3, 1),
        date(2024, 3, 1),
        date(2024, 3, 5),
        date(2024, 4, 1),
        date(2023, 3, 9),
    ]);

    assert_eq!(
        journal.published_dates_in_month(3, 2024),
        vec![date(2024, 3, 1), date(2024, 3, 5)]
    );
    assert!(journal.published_dates_in_month(5, 2024).is_empty());
}

#[test]
fn empty_journal_has_no_navigation_targets() {
    let journal = journal_with_dates(&[]);

    assert_eq!(journal.next_date(date(2024, 1, 1)), None);
    assert_eq!(journal.previous_date(date(2024, 1, 1)), None);
    assert!(journal.published_dates_in_month(1, 2024).is_empty());
}

#[test]
fn navigation_follows_in_memory_edits() {
    let mut journal = journal_with_dates(&[date(2024, 1, 1), date(2024, 1, 5)]);
    journal
        .entry_mut(1)
        .unwrap()
        .set_published_date(date(2024, 1, 9));

    assert_eq!(journal.next_date(date(2024, 1, 1)), Some(date(2024, 1, 9)));
}
