use chrono::NaiveDate;
use tablon_core::{FilterMode, Note, NoteStore, NoteValidationError};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

#[test]
fn snapshot_round_trip_restores_notes_and_filter() {
    let mut store = NoteStore::with_filter(FilterMode::Week);
    let first = store.create("Buy milk", "2024-01-01", 5).unwrap();
    let second = store.create("Call bank", "2024-01-03", 1).unwrap();
    store.complete(&second.id);

    let raw = serde_json::to_string(&store.to_snapshot()).unwrap();
    let restored = NoteStore::from_snapshot(&raw);

    assert_eq!(restored, store);
    assert_eq!(restored.notes()[0].id, first.id);
    assert!(restored.notes()[1].is_completed());
    assert_eq!(restored.filter(), FilterMode::Week);
}

#[test]
fn malformed_snapshot_yields_empty_store_with_all_filter() {
    for raw in [
        r#"{"notes":"not-an-array"}"#,
        r#"{"filter":"TODAY"}"#,
        "[1, 2, 3]",
        "not json at all",
    ] {
        let store = NoteStore::from_snapshot(raw);
        assert!(store.is_empty(), "{raw} should restore empty");
        assert_eq!(store.filter(), FilterMode::All);
    }
}

#[test]
fn snapshot_without_filter_defaults_to_all() {
    let store = NoteStore::from_snapshot(
        r#"{"notes":[{"id":"n1","text":"a","date":"2024-01-01","priority":2}]}"#,
    );
    assert_eq!(store.len(), 1);
    assert_eq!(store.filter(), FilterMode::All);
}

#[test]
fn invalid_create_leaves_store_unchanged() {
    let mut store = NoteStore::new();
    store.create("keep", "2024-01-01", 1).unwrap();
    let before = store.clone();

    assert_eq!(
        store.create(" ", "2024-01-01", 1).unwrap_err(),
        NoteValidationError::EmptyText
    );
    assert!(store.create("text", "not a date", 1).is_err());
    assert_eq!(store, before);
}

#[test]
fn remove_and_complete_unknown_ids_are_no_ops() {
    let mut store = NoteStore::new();
    store.create("a", "2024-01-01", 1).unwrap();
    let before = store.clone();

    assert!(!store.remove("missing"));
    assert!(!store.complete("missing"));
    assert_eq!(store, before);
}

#[test]
fn remove_drops_every_note_with_the_id() {
    let duplicate = |text: &str| Note {
        id: "dup".to_string(),
        text: text.to_string(),
        date: "2024-01-01".to_string(),
        priority: 1,
        completed: None,
    };
    let mut store = NoteStore::new();
    store.replace_all(vec![duplicate("a"), duplicate("b")], None);
    store.create("other", "2024-01-01", 1).unwrap();

    assert!(store.remove("dup"));
    assert_eq!(store.len(), 1);
    assert_eq!(store.notes()[0].text, "other");
}

#[test]
fn replace_all_adopts_imported_notes_as_is() {
    let mut store = NoteStore::with_filter(FilterMode::Today);
    let imported = Note {
        id: "legacy".to_string(),
        text: String::new(),
        date: "someday".to_string(),
        priority: 9,
        completed: Some(false),
    };
    store.replace_all(vec![imported.clone()], None);

    assert_eq!(store.notes(), &[imported]);
    assert_eq!(store.filter(), FilterMode::Today);
    assert!(store.visible(today()).is_empty());

    store.replace_all(Vec::new(), Some(FilterMode::All));
    assert!(store.is_empty());
    assert_eq!(store.filter(), FilterMode::All);
}

#[test]
fn lenient_snapshot_skips_elements_without_id() {
    let store = NoteStore::from_snapshot(
        r##"{"notes":[{"text":"no id"},{"id":7,"text":"numeric","priority":"high"},"junk"],"filter":"#hoy"}"##,
    );
    assert_eq!(store.len(), 1);
    let note = &store.notes()[0];
    assert_eq!(note.id, "7");
    assert_eq!(note.priority, 1);
    assert_eq!(note.date, "");
    assert_eq!(store.filter(), FilterMode::Today);
}
