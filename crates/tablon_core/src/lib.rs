//! Core domain logic for the Tablon note board.
//! This crate is the single source of truth for board invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod persistence;
pub mod query;
pub mod repo;
pub mod service;
pub mod store;
pub mod sync;

pub use config::BoardConfig;
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::filter::FilterMode;
pub use model::note::{
    format_display_date, Note, NoteId, NoteValidationError, PriorityInput, PRIORITY_MAX,
    PRIORITY_MIN, TEXT_MAX_CHARS,
};
pub use persistence::gateway::{load_state, save_state, SaveError, STORAGE_KEY};
pub use persistence::transfer::{
    parse_import, ExportDocument, ExportError, ImportFormatError, EXPORT_FILE_NAME,
};
pub use query::visible::{filter_notes, sort_notes, today_local, visible_notes};
pub use repo::kv_repo::{
    KeyValueStorage, MemoryStorage, SqliteKeyValueStorage, StorageError, StorageResult,
};
pub use service::board_service::{BoardError, BoardService, RenderHook};
pub use store::note_store::NoteStore;
pub use store::snapshot::{DecodedSnapshot, SnapshotFormatError, StoreSnapshot};
pub use sync::channel::{companion_link, DeliveryError, LinkEnd, LinkedPort, MessagePort};
pub use sync::companion::{CompanionOpener, CompanionRole, CompanionSession, LinkedOpener};
pub use sync::message::{decode_envelope, CompanionMessage, Envelope};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
