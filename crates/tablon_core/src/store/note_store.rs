//! Ordered note collection plus active filter.

use crate::model::filter::FilterMode;
use crate::model::note::{Note, NoteValidationError, PriorityInput};
use crate::query::visible::{filter_notes, visible_notes};
use crate::store::snapshot::{decode_snapshot, DecodedSnapshot, StoreSnapshot};
use chrono::NaiveDate;
use log::warn;

/// Authoritative in-memory collection for one window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteStore {
    notes: Vec<Note>,
    filter: FilterMode,
}

impl NoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty store with an initial filter (usually the URL fragment).
    pub fn with_filter(filter: FilterMode) -> Self {
        Self {
            notes: Vec::new(),
            filter,
        }
    }

    /// Rebuilds a store from persisted text.
    ///
    /// Structurally invalid input is discarded and an empty store with
    /// [`FilterMode::All`] is returned instead.
    pub fn from_snapshot(raw: &str) -> Self {
        match decode_snapshot(raw) {
            Ok(decoded) => Self::from_decoded(decoded, FilterMode::All),
            Err(err) => {
                warn!(
                    "event=store_restore module=store status=reset reason=corrupt error={}",
                    err
                );
                Self::default()
            }
        }
    }

    /// Builds a store from a decoded snapshot; `fallback_filter` applies when
    /// the snapshot carried no filter.
    pub fn from_decoded(decoded: DecodedSnapshot, fallback_filter: FilterMode) -> Self {
        Self {
            notes: decoded.notes,
            filter: decoded.filter.unwrap_or(fallback_filter),
        }
    }

    pub fn to_snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            notes: self.notes.clone(),
            filter: self.filter,
        }
    }

    /// Notes in insertion order.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn filter(&self) -> FilterMode {
        self.filter
    }

    pub fn set_filter(&mut self, filter: FilterMode) {
        self.filter = filter;
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Note> {
        self.notes.iter().find(|note| note.id == id)
    }

    /// Runs the note factory and appends the result.
    pub fn create(
        &mut self,
        text: &str,
        date: &str,
        priority: impl Into<PriorityInput>,
    ) -> Result<Note, NoteValidationError> {
        let note = Note::create(text, date, priority)?;
        self.notes.push(note.clone());
        Ok(note)
    }

    /// Removes every note carrying `id`. Returns `false` when nothing matched.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.notes.len();
        self.notes.retain(|note| note.id != id);
        self.notes.len() != before
    }

    /// Marks the first note carrying `id` as completed. Returns `false` when
    /// nothing matched.
    pub fn complete(&mut self, id: &str) -> bool {
        match self.notes.iter_mut().find(|note| note.id == id) {
            Some(note) => {
                note.mark_completed();
                true
            }
            None => false,
        }
    }

    /// Wholesale replacement; keeps the current filter when `filter` is `None`.
    pub fn replace_all(&mut self, notes: Vec<Note>, filter: Option<FilterMode>) {
        self.notes = notes;
        if let Some(filter) = filter {
            self.filter = filter;
        }
    }

    /// Notes selected by the active filter, in insertion order.
    pub fn filtered(&self, today: NaiveDate) -> Vec<Note> {
        filter_notes(&self.notes, self.filter, today)
    }

    /// Notes selected by the active filter, in display order.
    pub fn visible(&self, today: NaiveDate) -> Vec<Note> {
        visible_notes(&self.notes, self.filter, today)
    }
}
