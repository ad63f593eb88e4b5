//! Snapshot shape shared by local storage, file import and companion payloads.

use crate::model::filter::FilterMode;
use crate::model::note::{Note, PRIORITY_DEFAULT};
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Serializable copy of a store: `{ notes, filter }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub notes: Vec<Note>,
    #[serde(default)]
    pub filter: FilterMode,
}

/// Result of decoding snapshot-shaped JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedSnapshot {
    /// Notes in source order.
    pub notes: Vec<Note>,
    /// `Some` only when the source carried a string `filter`.
    pub filter: Option<FilterMode>,
    /// Sequence elements that could not be read as a note record.
    pub skipped: usize,
}

/// Structural problems with snapshot-shaped JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotFormatError {
    /// Text is not JSON.
    InvalidJson(String),
    /// Top-level value is not an object.
    NotAnObject,
    /// `notes` is missing or not a sequence.
    NotesNotSequence,
}

impl Display for SnapshotFormatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidJson(message) => write!(f, "snapshot is not valid JSON: {message}"),
            Self::NotAnObject => write!(f, "snapshot must be a JSON object"),
            Self::NotesNotSequence => write!(f, "snapshot field `notes` must be an array"),
        }
    }
}

impl Error for SnapshotFormatError {}

/// Decodes `{ notes, filter? }` text.
///
/// Only the top-level shape is enforced: `notes` must be a sequence. Individual
/// elements are read leniently (see [`note_from_value`]).
pub fn decode_snapshot(raw: &str) -> Result<DecodedSnapshot, SnapshotFormatError> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|err| SnapshotFormatError::InvalidJson(err.to_string()))?;
    decode_snapshot_value(&value)
}

/// Same as [`decode_snapshot`] for an already parsed value.
pub fn decode_snapshot_value(value: &Value) -> Result<DecodedSnapshot, SnapshotFormatError> {
    let object = value.as_object().ok_or(SnapshotFormatError::NotAnObject)?;
    let items = object
        .get("notes")
        .and_then(Value::as_array)
        .ok_or(SnapshotFormatError::NotesNotSequence)?;

    let (notes, skipped) = notes_from_values(items);
    let filter = object
        .get("filter")
        .and_then(Value::as_str)
        .map(FilterMode::parse_lenient);

    Ok(DecodedSnapshot {
        notes,
        filter,
        skipped,
    })
}

/// Reads a sequence of note records, skipping elements that are not records.
pub fn notes_from_values(items: &[Value]) -> (Vec<Note>, usize) {
    let mut notes = Vec::with_capacity(items.len());
    let mut skipped = 0;
    for item in items {
        match note_from_value(item) {
            Some(note) => notes.push(note),
            None => skipped += 1,
        }
    }
    if skipped > 0 {
        warn!(
            "event=snapshot_decode module=store status=partial accepted={} skipped={}",
            notes.len(),
            skipped
        );
    }
    (notes, skipped)
}

/// Reads one note record without validating its content.
///
/// Requires an object with a string or numeric `id`. Missing `text`/`date`
/// become empty strings, a missing or non-numeric `priority` becomes
/// [`PRIORITY_DEFAULT`], and `completed` is kept only when boolean.
pub fn note_from_value(value: &Value) -> Option<Note> {
    let object = value.as_object()?;
    let id = match object.get("id")? {
        Value::String(id) => id.clone(),
        Value::Number(id) => id.to_string(),
        _ => return None,
    };
    let text = object
        .get("text")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let date = object
        .get("date")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let priority = object
        .get("priority")
        .and_then(|raw| raw.as_i64().or_else(|| raw.as_f64().map(|v| v.trunc() as i64)))
        .unwrap_or(PRIORITY_DEFAULT);
    let completed = object.get("completed").and_then(Value::as_bool);

    Some(Note {
        id,
        text,
        date,
        priority,
        completed,
    })
}
