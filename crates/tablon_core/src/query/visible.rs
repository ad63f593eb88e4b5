//! Visible-subset selection and display ordering.

use crate::model::filter::FilterMode;
use crate::model::note::Note;
use chrono::{Days, Local, NaiveDate};
use std::cmp::Ordering;

/// Length of the `WEEK` window after today, inclusive.
pub const WEEK_WINDOW_DAYS: u64 = 7;

/// Current calendar day in device-local time.
pub fn today_local() -> NaiveDate {
    Local::now().date_naive()
}

/// Returns the notes selected by `mode`, preserving input order.
///
/// Notes with an unparseable `date` only survive [`FilterMode::All`].
pub fn filter_notes(notes: &[Note], mode: FilterMode, today: NaiveDate) -> Vec<Note> {
    match mode {
        FilterMode::All => notes.to_vec(),
        FilterMode::Today => notes
            .iter()
            .filter(|note| note.parsed_date() == Some(today))
            .cloned()
            .collect(),
        FilterMode::Week => {
            let end = today
                .checked_add_days(Days::new(WEEK_WINDOW_DAYS))
                .unwrap_or(NaiveDate::MAX);
            notes
                .iter()
                .filter(|note| {
                    note.parsed_date()
                        .is_some_and(|date| date >= today && date <= end)
                })
                .cloned()
                .collect()
        }
    }
}

/// Returns a copy of `notes` in board display order:
/// priority DESC, date ASC, text ASC (collated).
pub fn sort_notes(notes: &[Note]) -> Vec<Note> {
    let mut sorted = notes.to_vec();
    sorted.sort_by(compare_notes);
    sorted
}

/// `sort_notes(filter_notes(..))`.
pub fn visible_notes(notes: &[Note], mode: FilterMode, today: NaiveDate) -> Vec<Note> {
    sort_notes(&filter_notes(notes, mode, today))
}

fn compare_notes(left: &Note, right: &Note) -> Ordering {
    right
        .priority
        .cmp(&left.priority)
        .then_with(|| compare_dates(left, right))
        .then_with(|| collate_text(&left.text, &right.text))
}

// Dated notes first; malformed dates keep a total order by sorting last.
fn compare_dates(left: &Note, right: &Note) -> Ordering {
    match (left.parsed_date(), right.parsed_date()) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn collate_text(left: &str, right: &str) -> Ordering {
    left.to_lowercase()
        .cmp(&right.to_lowercase())
        .then_with(|| left.cmp(right))
}
