//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose board use-cases to Dart via FRB as sync calls.
//! - Map core errors to flat response envelopes.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Every call opens the board from storage; mutating calls persist before
//!   returning and no board state is cached between calls.
//! - Return values are UTF-8 strings with stable meaning.

use log::warn;
use serde_json::Value;
use std::path::Path;
use std::sync::OnceLock;
use tablon_core::db::open_db;
use tablon_core::{
    core_version as core_version_inner, decode_envelope, format_display_date,
    init_logging as init_logging_inner, ping as ping_inner, BoardConfig, BoardService,
    CompanionMessage, CompanionRole, Envelope, FilterMode, Note, SqliteKeyValueStorage,
};

static BOARD_CONFIG: OnceLock<BoardConfig> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Reconfiguration attempts with different level or directory return error.
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Generic action response envelope for board commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardActionResponse {
    /// Whether operation succeeded.
    pub ok: bool,
    /// Affected note ID, when the action targets one note.
    pub note_id: Option<String>,
    /// Human-readable response message for diagnostics/UI.
    pub message: String,
}

impl BoardActionResponse {
    fn success(message: impl Into<String>, note_id: Option<String>) -> Self {
        Self {
            ok: true,
            note_id,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            note_id: None,
            message: message.into(),
        }
    }
}

/// One rendered board row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardNoteItem {
    pub note_id: String,
    pub text: String,
    /// Stored `YYYY-MM-DD` value.
    pub date: String,
    /// Medium-style date for display (e.g. `1 Jan 2024`).
    pub display_date: String,
    pub priority: i64,
    pub completed: bool,
}

/// Visible notes plus the active filter token (`TODAY|WEEK|ALL`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardListResponse {
    pub items: Vec<BoardNoteItem>,
    pub filter: String,
    pub message: String,
}

/// Creates a note through the note factory.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Priority is repaired into `1..=3`, never rejected.
/// - Never panics; blank text or an invalid date return `ok=false`.
#[flutter_rust_bridge::frb(sync)]
pub fn board_create_note(text: String, date: String, priority: i64) -> BoardActionResponse {
    match with_board(|board| {
        board
            .create_note(&text, &date, priority)
            .map_err(|err| err.to_string())
    }) {
        Ok(note) => BoardActionResponse::success("Note created.", Some(note.id)),
        Err(err) => BoardActionResponse::failure(format!("board_create_note failed: {err}")),
    }
}

/// Marks a note completed.
///
/// # FFI contract
/// - Unknown ids return `ok=false` and change nothing.
#[flutter_rust_bridge::frb(sync)]
pub fn board_complete_note(note_id: String) -> BoardActionResponse {
    match with_board(|board| Ok(board.complete_note(&note_id))) {
        Ok(true) => BoardActionResponse::success("Note completed.", Some(note_id)),
        Ok(false) => BoardActionResponse::failure(format!("note not found: {note_id}")),
        Err(err) => BoardActionResponse::failure(format!("board_complete_note failed: {err}")),
    }
}

/// Deletes a note. Confirmation is the caller's responsibility.
///
/// # FFI contract
/// - Unknown ids return `ok=false` and change nothing.
#[flutter_rust_bridge::frb(sync)]
pub fn board_delete_note(note_id: String) -> BoardActionResponse {
    match with_board(|board| Ok(board.delete_note(&note_id))) {
        Ok(true) => BoardActionResponse::success("Note deleted.", Some(note_id)),
        Ok(false) => BoardActionResponse::failure(format!("note not found: {note_id}")),
        Err(err) => BoardActionResponse::failure(format!("board_delete_note failed: {err}")),
    }
}

/// Lists visible notes: active filter applied, display order.
///
/// # FFI contract
/// - Never panics; storage failures return an empty list with a message.
#[flutter_rust_bridge::frb(sync)]
pub fn board_list() -> BoardListResponse {
    match with_board(|board| Ok((board.visible_notes(), board.store().filter()))) {
        Ok((notes, filter)) => {
            let items = notes.iter().map(to_board_note_item).collect::<Vec<_>>();
            let message = if items.is_empty() {
                "No notes.".to_string()
            } else {
                format!("{} note(s).", items.len())
            };
            BoardListResponse {
                items,
                filter: filter.as_str().to_string(),
                message,
            }
        }
        Err(err) => BoardListResponse {
            items: Vec::new(),
            filter: FilterMode::All.as_str().to_string(),
            message: format!("board_list failed: {err}"),
        },
    }
}

/// Sets the active filter from a wire or fragment token.
///
/// Unrecognized tokens select `ALL`; the applied token is the response message.
#[flutter_rust_bridge::frb(sync)]
pub fn board_set_filter(token: String) -> BoardActionResponse {
    let filter = FilterMode::parse_lenient(&token);
    match with_board(|board| {
        board.set_filter(filter);
        Ok(())
    }) {
        Ok(()) => BoardActionResponse::success(filter.as_str(), None),
        Err(err) => BoardActionResponse::failure(format!("board_set_filter failed: {err}")),
    }
}

/// Writes the export file into `dir`; the written path is the response message.
#[flutter_rust_bridge::frb(sync)]
pub fn board_export(dir: String) -> BoardActionResponse {
    let dir = dir.trim().to_string();
    if dir.is_empty() {
        return BoardActionResponse::failure("board_export failed: dir cannot be empty");
    }
    match with_board(|board| {
        board
            .export_to_dir(Path::new(&dir))
            .map_err(|err| err.to_string())
    }) {
        Ok(path) => BoardActionResponse::success(path.display().to_string(), None),
        Err(err) => BoardActionResponse::failure(format!("board_export failed: {err}")),
    }
}

/// Replaces the board with imported JSON text (`{ notes: [...], filter? }`).
///
/// # FFI contract
/// - Invalid files return `ok=false` and leave the board unchanged.
#[flutter_rust_bridge::frb(sync)]
pub fn board_import(json: String) -> BoardActionResponse {
    match with_board(|board| board.import_text(&json).map_err(|err| err.to_string())) {
        Ok(count) => BoardActionResponse::success(format!("Imported {count} note(s)."), None),
        Err(err) => BoardActionResponse::failure(format!("board_import failed: {err}")),
    }
}

/// Applies one companion message posted by the peer window.
///
/// Input semantics:
/// - `origin`: origin of the sending window.
/// - `payload_json`: message body as JSON text.
/// - `secondary`: whether this process hosts the companion (mirror) window.
///   The host must only forward messages once that window is initialized.
///   The mirror reads and writes its own copy, never the primary's board.
///
/// # FFI contract
/// - Foreign-origin, unknown or malformed messages return `ok=false` and
///   change nothing.
#[flutter_rust_bridge::frb(sync)]
pub fn companion_receive(
    origin: String,
    payload_json: String,
    secondary: bool,
) -> BoardActionResponse {
    let payload: Value = match serde_json::from_str(&payload_json) {
        Ok(payload) => payload,
        Err(err) => {
            warn!("event=companion_recv module=ffi status=skip reason=invalid_json error={err}");
            return BoardActionResponse::failure("Message ignored.");
        }
    };
    let envelope = Envelope { origin, payload };
    let role = if secondary {
        CompanionRole::Secondary
    } else {
        CompanionRole::Primary
    };

    match with_board_as(role, |board| {
        let message = decode_envelope(&envelope, board.origin());
        if let Some(message) = message.as_ref() {
            board.apply_companion_message(role, message);
        }
        Ok(message)
    }) {
        Ok(Some(message)) => {
            let note_id = match &message {
                CompanionMessage::Deleted { id } => Some(id.clone()),
                CompanionMessage::Snapshot { .. } => None,
            };
            BoardActionResponse::success(format!("Applied {}.", message.tipo()), note_id)
        }
        Ok(None) => BoardActionResponse::failure("Message ignored."),
        Err(err) => BoardActionResponse::failure(format!("companion_receive failed: {err}")),
    }
}

fn board_config() -> &'static BoardConfig {
    BOARD_CONFIG.get_or_init(BoardConfig::from_env)
}

fn with_board<T>(
    f: impl FnOnce(&mut BoardService<SqliteKeyValueStorage<'_>>) -> Result<T, String>,
) -> Result<T, String> {
    with_board_as(CompanionRole::Primary, f)
}

fn with_board_as<T>(
    role: CompanionRole,
    f: impl FnOnce(&mut BoardService<SqliteKeyValueStorage<'_>>) -> Result<T, String>,
) -> Result<T, String> {
    let config = board_config().for_role(role);
    let conn = open_db(&config.db_path).map_err(|err| format!("board DB open failed: {err}"))?;
    let storage = SqliteKeyValueStorage::try_new(&conn)
        .map_err(|err| format!("board storage init failed: {err}"))?;
    let mut board = BoardService::open(storage, &config);
    f(&mut board)
}

fn to_board_note_item(note: &Note) -> BoardNoteItem {
    BoardNoteItem {
        note_id: note.id.clone(),
        text: note.text.clone(),
        date: note.date.clone(),
        display_date: format_display_date(&note.date),
        priority: note.priority,
        completed: note.is_completed(),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        board_complete_note, board_config, board_create_note, board_delete_note, board_export,
        board_import, board_list, board_set_filter, companion_receive, core_version,
        init_logging, ping,
    };
    use std::sync::{Mutex, MutexGuard};
    use std::time::{SystemTime, UNIX_EPOCH};

    // Board calls share one storage file; serialize the tests that mutate it.
    static BOARD_LOCK: Mutex<()> = Mutex::new(());

    fn board_lock() -> MutexGuard<'static, ()> {
        BOARD_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        let error = init_logging("info".to_string(), String::new());
        assert!(!error.is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        let error = init_logging("verbose".to_string(), "tmp/logs".to_string());
        assert!(!error.is_empty());
    }

    #[test]
    fn create_list_complete_delete_flow() {
        let _guard = board_lock();
        assert!(board_set_filter("todas".to_string()).ok);

        let text = unique_token("flow");
        let created = board_create_note(text.clone(), "2024-01-05".to_string(), 9);
        assert!(created.ok, "{}", created.message);
        let note_id = created.note_id.expect("create should return note_id");

        let listed = board_list();
        assert_eq!(listed.filter, "ALL");
        let item = listed
            .items
            .iter()
            .find(|item| item.note_id == note_id)
            .expect("created note should be listed");
        assert_eq!(item.text, text);
        assert_eq!(item.priority, 3);
        assert_eq!(item.display_date, "5 Jan 2024");
        assert!(!item.completed);

        assert!(board_complete_note(note_id.clone()).ok);
        let completed = board_list()
            .items
            .into_iter()
            .find(|item| item.note_id == note_id)
            .expect("completed note should stay listed");
        assert!(completed.completed);

        assert!(board_delete_note(note_id.clone()).ok);
        let again = board_delete_note(note_id.clone());
        assert!(!again.ok);
        assert!(!board_list().items.iter().any(|item| item.note_id == note_id));
    }

    #[test]
    fn create_rejects_blank_text_and_bad_date() {
        let blank = board_create_note("   ".to_string(), "2024-01-01".to_string(), 1);
        assert!(!blank.ok);
        assert!(blank.note_id.is_none());

        let bad_date = board_create_note("text".to_string(), "someday".to_string(), 1);
        assert!(!bad_date.ok);
        assert!(bad_date.message.contains("board_create_note failed"));
    }

    #[test]
    fn set_filter_accepts_fragment_tokens() {
        let _guard = board_lock();
        assert_eq!(board_set_filter("#semana".to_string()).message, "WEEK");
        assert_eq!(board_list().filter, "WEEK");
        assert_eq!(board_set_filter("whatever".to_string()).message, "ALL");
    }

    #[test]
    fn export_then_reimport_keeps_board() {
        let _guard = board_lock();
        let dir = tempfile::tempdir().unwrap();
        let created = board_create_note(unique_token("export"), "2024-01-01".to_string(), 2);
        let note_id = created.note_id.expect("create should return note_id");

        let exported = board_export(dir.path().display().to_string());
        assert!(exported.ok, "{}", exported.message);
        assert!(exported.message.ends_with("tablon_notas.json"));
        let text = std::fs::read_to_string(&exported.message).unwrap();

        assert!(!board_import(r#"{"notes":"not-an-array"}"#.to_string()).ok);
        assert!(!board_import("not json".to_string()).ok);
        assert!(board_list().items.iter().any(|item| item.note_id == note_id));

        let imported = board_import(text);
        assert!(imported.ok, "{}", imported.message);
        assert!(board_list().items.iter().any(|item| item.note_id == note_id));
        assert!(board_delete_note(note_id).ok);
    }

    #[test]
    fn export_rejects_blank_dir() {
        assert!(!board_export("  ".to_string()).ok);
    }

    #[test]
    fn companion_receive_applies_same_origin_delete_only() {
        let _guard = board_lock();
        assert!(board_set_filter("todas".to_string()).ok);
        let created = board_create_note(unique_token("companion"), "2024-01-01".to_string(), 1);
        let note_id = created.note_id.expect("create should return note_id");
        let payload = format!(r#"{{"tipo":"BORRADO","id":"{note_id}"}}"#);

        let foreign = companion_receive("https://evil.example".to_string(), payload.clone(), false);
        assert!(!foreign.ok);
        let unknown = companion_receive(
            board_config().origin.clone(),
            format!(r#"{{"tipo":"EDITAR","id":"{note_id}"}}"#),
            false,
        );
        assert!(!unknown.ok);
        assert!(!companion_receive(board_config().origin.clone(), "{".to_string(), false).ok);
        assert!(board_list().items.iter().any(|item| item.note_id == note_id));

        let applied = companion_receive(board_config().origin.clone(), payload, false);
        assert!(applied.ok, "{}", applied.message);
        assert_eq!(applied.note_id.as_deref(), Some(note_id.as_str()));
        assert!(!board_list().items.iter().any(|item| item.note_id == note_id));
    }

    #[test]
    fn secondary_snapshot_leaves_primary_board_intact() {
        let _guard = board_lock();
        assert!(board_set_filter("todas".to_string()).ok);
        let first = board_create_note(unique_token("mirror-a"), "2024-01-01".to_string(), 1)
            .note_id
            .expect("create should return note_id");
        let second = board_create_note(unique_token("mirror-b"), "2024-01-02".to_string(), 2)
            .note_id
            .expect("create should return note_id");

        let applied = companion_receive(
            board_config().origin.clone(),
            r#"{"tipo":"SNAPSHOT","notas":[]}"#.to_string(),
            true,
        );
        assert!(applied.ok, "{}", applied.message);

        let items = board_list().items;
        assert!(items.iter().any(|item| item.note_id == first));
        assert!(items.iter().any(|item| item.note_id == second));
        assert!(board_delete_note(first).ok);
        assert!(board_delete_note(second).ok);
    }

    fn unique_token(prefix: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos();
        format!("{prefix}-{nanos}")
    }
}
