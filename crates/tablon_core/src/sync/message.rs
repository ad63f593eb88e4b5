//! Companion message types and boundary decoding.

use crate::model::note::{Note, NoteId};
use crate::store::snapshot::notes_from_values;
use log::debug;
use serde::Serialize;
use serde_json::Value;

/// Wire tag for snapshot messages.
pub const TIPO_SNAPSHOT: &str = "SNAPSHOT";
/// Wire tag for delete messages.
pub const TIPO_BORRADO: &str = "BORRADO";

/// Validated companion message.
///
/// Wire shapes: `{ "tipo": "SNAPSHOT", "notas": [...] }` and
/// `{ "tipo": "BORRADO", "id": "..." }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "tipo")]
pub enum CompanionMessage {
    #[serde(rename = "SNAPSHOT")]
    Snapshot {
        #[serde(rename = "notas")]
        notes: Vec<Note>,
    },
    #[serde(rename = "BORRADO")]
    Deleted { id: NoteId },
}

impl CompanionMessage {
    /// Wire tag of this message.
    pub fn tipo(&self) -> &'static str {
        match self {
            Self::Snapshot { .. } => TIPO_SNAPSHOT,
            Self::Deleted { .. } => TIPO_BORRADO,
        }
    }
}

/// Raw inbound message as delivered by the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// Origin of the sending window.
    pub origin: String,
    pub payload: Value,
}

/// Why an inbound envelope was discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    ForeignOrigin,
    NotAnObject,
    MissingTipo,
    UnknownTipo,
    MalformedBody,
}

impl DiscardReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ForeignOrigin => "foreign_origin",
            Self::NotAnObject => "not_an_object",
            Self::MissingTipo => "missing_tipo",
            Self::UnknownTipo => "unknown_tipo",
            Self::MalformedBody => "malformed_body",
        }
    }
}

/// Validates an envelope against the expected origin and decodes it.
///
/// Discarded envelopes are logged at debug level and never surfaced.
pub fn decode_envelope(envelope: &Envelope, expected_origin: &str) -> Option<CompanionMessage> {
    match try_decode(envelope, expected_origin) {
        Ok(message) => Some(message),
        Err(reason) => {
            debug!(
                "event=companion_recv module=sync status=skip reason={}",
                reason.as_str()
            );
            None
        }
    }
}

/// Same as [`decode_envelope`] but reports the discard reason.
pub fn try_decode(
    envelope: &Envelope,
    expected_origin: &str,
) -> Result<CompanionMessage, DiscardReason> {
    if envelope.origin != expected_origin {
        return Err(DiscardReason::ForeignOrigin);
    }
    let object = envelope
        .payload
        .as_object()
        .ok_or(DiscardReason::NotAnObject)?;
    let tipo = match object.get("tipo") {
        Some(Value::String(tipo)) if !tipo.is_empty() => tipo.as_str(),
        _ => return Err(DiscardReason::MissingTipo),
    };

    match tipo {
        TIPO_SNAPSHOT => {
            let items = object
                .get("notas")
                .and_then(Value::as_array)
                .ok_or(DiscardReason::MalformedBody)?;
            let (notes, _) = notes_from_values(items);
            Ok(CompanionMessage::Snapshot { notes })
        }
        TIPO_BORRADO => match object.get("id") {
            Some(Value::String(id)) => Ok(CompanionMessage::Deleted { id: id.clone() }),
            _ => Err(DiscardReason::MalformedBody),
        },
        _ => Err(DiscardReason::UnknownTipo),
    }
}
