//! Store snapshot persistence over [`KeyValueStorage`].

use crate::repo::kv_repo::{KeyValueStorage, StorageError};
use crate::store::snapshot::{decode_snapshot, DecodedSnapshot, StoreSnapshot};
use log::{debug, error, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Fixed storage key for the board state.
pub const STORAGE_KEY: &str = "tablon_estado";

/// Failure while writing the board state.
#[derive(Debug)]
pub enum SaveError {
    Encode(serde_json::Error),
    Storage(StorageError),
}

impl Display for SaveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Encode(err) => write!(f, "failed to encode board state: {err}"),
            Self::Storage(err) => write!(f, "failed to store board state: {err}"),
        }
    }
}

impl Error for SaveError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Encode(err) => Some(err),
            Self::Storage(err) => Some(err),
        }
    }
}

impl From<serde_json::Error> for SaveError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encode(value)
    }
}

impl From<StorageError> for SaveError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

/// Serializes `snapshot` and writes it under `key`.
pub fn save_state<S: KeyValueStorage + ?Sized>(
    storage: &mut S,
    key: &str,
    snapshot: &StoreSnapshot,
) -> Result<(), SaveError> {
    let encoded = serde_json::to_string(snapshot)?;
    storage.set_item(key, &encoded)?;
    debug!(
        "event=state_save module=persistence status=ok notes={} bytes={}",
        snapshot.notes.len(),
        encoded.len()
    );
    Ok(())
}

/// Reads the state stored under `key`.
///
/// Returns `Ok(None)` when nothing is stored, and also when the stored text is
/// corrupt; corrupt entries are removed so the next save starts clean.
///
/// # Errors
/// - Returns the storage error when the backend itself fails to read.
pub fn load_state<S: KeyValueStorage + ?Sized>(
    storage: &mut S,
    key: &str,
) -> Result<Option<DecodedSnapshot>, StorageError> {
    let Some(raw) = storage.get_item(key)? else {
        return Ok(None);
    };

    match decode_snapshot(&raw) {
        Ok(decoded) => {
            debug!(
                "event=state_load module=persistence status=ok notes={} skipped={}",
                decoded.notes.len(),
                decoded.skipped
            );
            Ok(Some(decoded))
        }
        Err(err) => {
            warn!(
                "event=state_load module=persistence status=reset error_code=storage_corruption error={}",
                err
            );
            if let Err(remove_err) = storage.remove_item(key) {
                error!(
                    "event=state_discard module=persistence status=error error={}",
                    remove_err
                );
            }
            Ok(None)
        }
    }
}
