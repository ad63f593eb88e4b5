//! Note record and factory.
//!
//! # Responsibility
//! - Define the canonical note shape persisted, exported and exchanged with
//!   the companion window.
//! - Validate text/date input and repair priority input at creation time.
//!
//! # Invariants
//! - `id` is generated once and never reassigned.
//! - `date` produced by the factory is always `YYYY-MM-DD`.
//! - `priority` produced by the factory is always within `[1, 3]`.
//! - `completed = None` means "not completed" and is omitted on the wire.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Opaque note identifier. Kept as a string because imported and mirrored
/// notes may carry ids generated by other clients.
pub type NoteId = String;

/// Canonical storage/wire date format.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Lowest accepted priority.
pub const PRIORITY_MIN: i64 = 1;
/// Highest accepted priority.
pub const PRIORITY_MAX: i64 = 3;
/// Priority used when the raw input is not a usable number.
pub const PRIORITY_DEFAULT: i64 = 1;
/// Documented text cap. Not enforced by [`Note::create`].
pub const TEXT_MAX_CHARS: usize = 200;

/// Validation failure for note creation input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteValidationError {
    /// Text is blank after trimming.
    EmptyText,
    /// Date input does not parse to a calendar date.
    InvalidDate(String),
}

impl Display for NoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyText => write!(f, "invalid note data: text must not be blank"),
            Self::InvalidDate(raw) => {
                write!(f, "invalid note data: `{raw}` is not a valid calendar date")
            }
        }
    }
}

impl Error for NoteValidationError {}

/// Raw priority as it arrives from a form field or a caller.
///
/// Conversion never fails; [`PriorityInput::resolve`] repairs anything
/// unusable to [`PRIORITY_DEFAULT`] and clamps the rest.
#[derive(Debug, Clone, PartialEq)]
pub enum PriorityInput {
    Number(f64),
    Text(String),
    Missing,
}

impl PriorityInput {
    /// Resolves the input to a priority in `[PRIORITY_MIN, PRIORITY_MAX]`.
    ///
    /// Rules:
    /// - text is trimmed and parsed as a number; blank text counts as zero.
    /// - zero, NaN and infinities fall back to [`PRIORITY_DEFAULT`].
    /// - the value is clamped, then truncated to an integer.
    pub fn resolve(&self) -> i64 {
        let raw = match self {
            Self::Number(value) => *value,
            Self::Text(value) => {
                let trimmed = value.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse::<f64>().unwrap_or(f64::NAN)
                }
            }
            Self::Missing => f64::NAN,
        };

        let coerced = if raw.is_finite() && raw != 0.0 {
            raw
        } else {
            PRIORITY_DEFAULT as f64
        };
        coerced.clamp(PRIORITY_MIN as f64, PRIORITY_MAX as f64).trunc() as i64
    }
}

impl From<i64> for PriorityInput {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<i32> for PriorityInput {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<u8> for PriorityInput {
    fn from(value: u8) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<f64> for PriorityInput {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for PriorityInput {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for PriorityInput {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl<T: Into<PriorityInput>> From<Option<T>> for PriorityInput {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Missing, Into::into)
    }
}

/// One user-authored reminder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub text: String,
    /// `YYYY-MM-DD` for factory-created notes.
    pub date: String,
    pub priority: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl Note {
    /// Note factory.
    ///
    /// # Errors
    /// - [`NoteValidationError::EmptyText`] when `text` is blank after trim.
    /// - [`NoteValidationError::InvalidDate`] when `date` is not a calendar date.
    ///
    /// Priority input is repaired, never rejected.
    pub fn create(
        text: &str,
        date: &str,
        priority: impl Into<PriorityInput>,
    ) -> Result<Self, NoteValidationError> {
        let trimmed = text.trim();
        let parsed_date = parse_note_date(date);
        if trimmed.is_empty() {
            return Err(NoteValidationError::EmptyText);
        }
        let Some(parsed_date) = parsed_date else {
            return Err(NoteValidationError::InvalidDate(date.to_string()));
        };

        Ok(Self {
            id: generate_note_id(),
            text: trimmed.to_string(),
            date: parsed_date.format(DATE_FORMAT).to_string(),
            priority: priority.into().resolve(),
            completed: None,
        })
    }

    /// Whether the note has been marked completed.
    pub fn is_completed(&self) -> bool {
        self.completed.unwrap_or(false)
    }

    pub fn mark_completed(&mut self) {
        self.completed = Some(true);
    }

    /// Parsed calendar date, `None` for malformed imported values.
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        parse_note_date(&self.date)
    }

    /// Whether `text` is longer than [`TEXT_MAX_CHARS`].
    pub fn exceeds_text_limit(&self) -> bool {
        self.text.chars().count() > TEXT_MAX_CHARS
    }
}

/// Generates a fresh note id (`n` + simple-form v4 UUID).
pub fn generate_note_id() -> NoteId {
    format!("n{}", Uuid::new_v4().simple())
}

/// Parses a raw date input into a calendar date.
///
/// Accepts `YYYY-MM-DD` and RFC 3339 date-times; for the latter the UTC
/// calendar day is used.
pub fn parse_note_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, DATE_FORMAT) {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|value| value.with_timezone(&Utc).date_naive())
}

/// Formats a stored date for list display (medium style, e.g. `1 Jan 2024`).
///
/// Unparseable values are returned unchanged.
pub fn format_display_date(ymd: &str) -> String {
    match parse_note_date(ymd) {
        Some(date) => date.format("%-d %b %Y").to_string(),
        None => ymd.to_string(),
    }
}
