use chrono::NaiveDate;
use serde_json::json;
use std::time::{Duration, Instant};
use tablon_core::{
    companion_link, BoardConfig, BoardError, BoardService, CompanionMessage, CompanionRole,
    CompanionSession, Envelope, FilterMode, KeyValueStorage, LinkedOpener, MemoryStorage,
    STORAGE_KEY,
};

const ORIGIN: &str = "app://tablon";

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn open_board() -> BoardService<MemoryStorage> {
    BoardService::open(MemoryStorage::new(), &BoardConfig::default()).with_fixed_today(today())
}

#[test]
fn primary_sends_filtered_snapshot_after_grace_delay() {
    let mut primary = open_board();
    let due_today = primary.create_note("today", "2024-01-01", 1).unwrap();
    primary.create_note("later", "2024-01-20", 3).unwrap();
    primary.set_filter(FilterMode::Today);

    let (primary_end, secondary_end) = companion_link(ORIGIN, ORIGIN);
    let mut opener = LinkedOpener::new(primary_end.port);
    let opened_at = Instant::now();
    let mut session = primary.open_companion(&mut opener, opened_at).unwrap();
    assert!(session.has_pending());

    let mut secondary = open_board();
    let mut secondary_session = CompanionSession::secondary(secondary_end.port, ORIGIN, ORIGIN);
    secondary_session.mark_ready();

    assert!(!primary.poll_companion(&mut session, opened_at + Duration::from_millis(399)));
    assert!(secondary_end.inbox.drain().is_empty());
    assert!(primary.poll_companion(&mut session, opened_at + Duration::from_millis(400)));

    let inbound = secondary_end.inbox.drain();
    assert_eq!(inbound.len(), 1);
    assert_eq!(inbound[0].payload["tipo"], "SNAPSHOT");
    let applied = secondary
        .handle_companion_envelope(&secondary_session, &inbound[0])
        .unwrap();
    assert_eq!(
        applied,
        CompanionMessage::Snapshot {
            notes: vec![due_today.clone()]
        }
    );
    assert_eq!(secondary.store().notes(), &[due_today]);
    assert!(secondary.storage().get_item(STORAGE_KEY).unwrap().is_some());
}

#[test]
fn secondary_delete_propagates_to_primary() {
    let mut primary = open_board();
    let shared = primary.create_note("shared", "2024-01-01", 2).unwrap();
    let kept = primary.create_note("kept", "2024-01-01", 1).unwrap();

    let (primary_end, secondary_end) = companion_link(ORIGIN, ORIGIN);
    let mut opener = LinkedOpener::new(primary_end.port);
    let opened_at = Instant::now();
    let mut session = primary.open_companion(&mut opener, opened_at).unwrap();
    primary.poll_companion(&mut session, opened_at + Duration::from_secs(1));

    let mut secondary = open_board();
    let mut secondary_session = CompanionSession::secondary(secondary_end.port, ORIGIN, ORIGIN);
    secondary_session.mark_ready();
    for envelope in secondary_end.inbox.drain() {
        secondary.handle_companion_envelope(&secondary_session, &envelope);
    }
    assert_eq!(secondary.store().len(), 2);

    assert!(secondary.delete_and_notify(&secondary_session, &shared.id));
    assert_eq!(secondary.store().notes(), &[kept.clone()]);

    let inbound = primary_end.inbox.drain();
    assert_eq!(inbound.len(), 1);
    assert_eq!(inbound[0].payload, json!({ "tipo": "BORRADO", "id": shared.id }));
    primary.handle_companion_envelope(&session, &inbound[0]);
    assert_eq!(primary.store().notes(), &[kept]);
}

#[test]
fn blocked_popup_is_reported() {
    let primary = open_board();
    let result = primary.open_companion(&mut LinkedOpener::blocked(), Instant::now());
    assert!(matches!(result, Err(BoardError::PopupBlocked)));
}

#[test]
fn snapshot_before_secondary_ready_is_lost() {
    let mut primary = open_board();
    primary.create_note("early", "2024-01-01", 1).unwrap();

    let (primary_end, secondary_end) = companion_link(ORIGIN, ORIGIN);
    let mut opener = LinkedOpener::new(primary_end.port);
    let opened_at = Instant::now();
    let mut session = primary.open_companion(&mut opener, opened_at).unwrap();
    assert!(primary.poll_companion(&mut session, opened_at + Duration::from_millis(400)));

    let mut secondary = open_board();
    let mut secondary_session = CompanionSession::secondary(secondary_end.port, ORIGIN, ORIGIN);
    for envelope in secondary_end.inbox.drain() {
        assert!(secondary
            .handle_companion_envelope(&secondary_session, &envelope)
            .is_none());
    }
    secondary_session.mark_ready();

    assert!(secondary.store().is_empty());
    assert!(!primary.poll_companion(&mut session, opened_at + Duration::from_secs(10)));
    assert!(secondary_end.inbox.drain().is_empty());
}

#[test]
fn unknown_delete_leaves_store_and_storage_unchanged() {
    let mut primary = open_board();
    primary.create_note("stays", "2024-01-01", 1).unwrap();
    let store_before = primary.store().clone();
    let stored_before = primary.storage().get_item(STORAGE_KEY).unwrap();

    primary.apply_companion_message(
        CompanionRole::Primary,
        &CompanionMessage::Deleted {
            id: "unknown".to_string(),
        },
    );

    assert_eq!(primary.store(), &store_before);
    assert_eq!(primary.storage().get_item(STORAGE_KEY).unwrap(), stored_before);
}

#[test]
fn primary_ignores_snapshot_content() {
    let mut primary = open_board();
    let note = primary.create_note("mine", "2024-01-01", 1).unwrap();

    primary.apply_companion_message(
        CompanionRole::Primary,
        &CompanionMessage::Snapshot { notes: Vec::new() },
    );
    assert_eq!(primary.store().notes(), &[note]);
}

#[test]
fn foreign_and_unknown_messages_are_discarded() {
    let mut primary = open_board();
    let note = primary.create_note("guarded", "2024-01-01", 1).unwrap();
    let (primary_end, _secondary_end) = companion_link(ORIGIN, ORIGIN);
    let session = CompanionSession::primary(primary_end.port, ORIGIN, ORIGIN);

    let candidates = [
        Envelope {
            origin: "https://evil.example".to_string(),
            payload: json!({ "tipo": "BORRADO", "id": note.id }),
        },
        Envelope {
            origin: ORIGIN.to_string(),
            payload: json!({ "tipo": "EDITAR", "id": note.id }),
        },
        Envelope {
            origin: ORIGIN.to_string(),
            payload: json!({ "id": note.id }),
        },
        Envelope {
            origin: ORIGIN.to_string(),
            payload: json!("BORRADO"),
        },
    ];
    for envelope in &candidates {
        assert!(primary.handle_companion_envelope(&session, envelope).is_none());
    }
    assert_eq!(primary.store().notes(), &[note]);
}
