//! JSON export/import of the board.

use crate::model::filter::FilterMode;
use crate::model::note::Note;
use crate::store::snapshot::{decode_snapshot, DecodedSnapshot, SnapshotFormatError, StoreSnapshot};
use chrono::{DateTime, SecondsFormat, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Fixed export file name.
pub const EXPORT_FILE_NAME: &str = "tablon_notas.json";

/// Export document: the store snapshot plus the export instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportDocument {
    /// RFC 3339 UTC with millisecond precision.
    pub timestamp: String,
    pub notes: Vec<Note>,
    pub filter: FilterMode,
}

impl ExportDocument {
    pub fn from_snapshot(snapshot: StoreSnapshot, at: DateTime<Utc>) -> Self {
        Self {
            timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
            notes: snapshot.notes,
            filter: snapshot.filter,
        }
    }
}

#[derive(Debug)]
pub enum ExportError {
    Encode(serde_json::Error),
    Io { path: PathBuf, source: std::io::Error },
}

impl Display for ExportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Encode(err) => write!(f, "failed to encode export: {err}"),
            Self::Io { path, source } => {
                write!(f, "failed to write export `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for ExportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Encode(err) => Some(err),
            Self::Io { source, .. } => Some(source),
        }
    }
}

/// Import rejected; the store must stay unchanged.
#[derive(Debug)]
pub enum ImportFormatError {
    Io { path: PathBuf, source: std::io::Error },
    Malformed(SnapshotFormatError),
}

impl Display for ImportFormatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read import `{}`: {source}", path.display())
            }
            Self::Malformed(err) => write!(f, "import file is not valid: {err}"),
        }
    }
}

impl Error for ImportFormatError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Malformed(err) => Some(err),
        }
    }
}

impl From<SnapshotFormatError> for ImportFormatError {
    fn from(value: SnapshotFormatError) -> Self {
        Self::Malformed(value)
    }
}

/// Serializes an export document to JSON text.
pub fn encode_export(document: &ExportDocument) -> Result<String, ExportError> {
    serde_json::to_string(document).map_err(ExportError::Encode)
}

/// Writes `document` as `<dir>/<file_name>` and returns the written path.
pub fn write_export(
    dir: &Path,
    file_name: &str,
    document: &ExportDocument,
) -> Result<PathBuf, ExportError> {
    let path = dir.join(file_name);
    let encoded = encode_export(document)?;
    std::fs::write(&path, encoded).map_err(|source| ExportError::Io {
        path: path.clone(),
        source,
    })?;
    info!(
        "event=export module=persistence status=ok notes={}",
        document.notes.len()
    );
    Ok(path)
}

/// Parses import text. `notes` must be a sequence; `filter` is optional.
pub fn parse_import(text: &str) -> Result<DecodedSnapshot, ImportFormatError> {
    decode_snapshot(text).map_err(|err| {
        warn!(
            "event=import module=persistence status=rejected error={}",
            err
        );
        ImportFormatError::Malformed(err)
    })
}

/// Reads and parses an import file.
pub fn read_import(path: &Path) -> Result<DecodedSnapshot, ImportFormatError> {
    let text = std::fs::read_to_string(path).map_err(|source| ImportFormatError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_import(&text)
}

#[cfg(test)]
mod tests {
    use super::{parse_import, ExportDocument, ImportFormatError};
    use crate::model::filter::FilterMode;
    use crate::store::snapshot::{SnapshotFormatError, StoreSnapshot};
    use chrono::{TimeZone, Utc};

    #[test]
    fn export_timestamp_is_rfc3339_utc_millis() {
        let at = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();
        let document = ExportDocument::from_snapshot(StoreSnapshot::default(), at);
        assert_eq!(document.timestamp, "2024-05-06T07:08:09.000Z");
        assert_eq!(document.filter, FilterMode::All);
    }

    #[test]
    fn import_without_notes_sequence_is_rejected() {
        let err = parse_import(r#"{"filter":"TODAY"}"#).unwrap_err();
        assert!(matches!(
            err,
            ImportFormatError::Malformed(SnapshotFormatError::NotesNotSequence)
        ));
    }
}
