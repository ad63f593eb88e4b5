use tablon_core::{Note, NoteValidationError, PriorityInput, PRIORITY_MAX, PRIORITY_MIN};

#[test]
fn create_clamps_priority_and_keeps_date() {
    let note = Note::create("Buy milk", "2024-01-01", 5).unwrap();
    assert_eq!(note.priority, 3);
    assert_eq!(note.date, "2024-01-01");
    assert_eq!(note.text, "Buy milk");
    assert_eq!(note.completed, None);
    assert!(!note.is_completed());
}

#[test]
fn create_trims_text_and_normalizes_datetime_input() {
    let note = Note::create("  call mum \n", "2024-06-30T10:15:00Z", "2").unwrap();
    assert_eq!(note.text, "call mum");
    assert_eq!(note.date, "2024-06-30");
    assert_eq!(note.priority, 2);
}

#[test]
fn create_rejects_blank_text() {
    let err = Note::create("   ", "2024-01-01", 1).unwrap_err();
    assert_eq!(err, NoteValidationError::EmptyText);
}

#[test]
fn create_rejects_invalid_calendar_date() {
    for raw in ["", "tomorrow", "2024-13-01", "2023-02-29"] {
        let err = Note::create("text", raw, 1).unwrap_err();
        assert_eq!(err, NoteValidationError::InvalidDate(raw.to_string()));
    }
}

#[test]
fn priority_is_always_within_bounds() {
    let inputs: Vec<PriorityInput> = vec![
        PriorityInput::from(-100),
        PriorityInput::from(0),
        PriorityInput::from(1),
        PriorityInput::from(2),
        PriorityInput::from(3),
        PriorityInput::from(4),
        PriorityInput::from(i64::MAX),
        PriorityInput::from(f64::NAN),
        PriorityInput::from(f64::NEG_INFINITY),
        PriorityInput::from(1.9),
        PriorityInput::from("3"),
        PriorityInput::from("-2"),
        PriorityInput::from("abc"),
        PriorityInput::Missing,
    ];
    for input in inputs {
        let note = Note::create("bounded", "2024-01-01", input.clone()).unwrap();
        assert!(
            (PRIORITY_MIN..=PRIORITY_MAX).contains(&note.priority),
            "{input:?} produced {}",
            note.priority
        );
    }
}

#[test]
fn ids_are_unique_and_prefixed() {
    let first = Note::create("a", "2024-01-01", 1).unwrap();
    let second = Note::create("a", "2024-01-01", 1).unwrap();
    assert_ne!(first.id, second.id);
    assert!(first.id.starts_with('n'));
}

#[test]
fn long_text_is_accepted_but_flagged() {
    let text = "x".repeat(250);
    let note = Note::create(&text, "2024-01-01", 1).unwrap();
    assert_eq!(note.text.len(), 250);
    assert!(note.exceeds_text_limit());
}

#[test]
fn serialization_uses_expected_wire_fields() {
    let mut note = Note::create("wire", "2024-02-03", 2).unwrap();
    let json = serde_json::to_value(&note).unwrap();
    assert_eq!(json["text"], "wire");
    assert_eq!(json["date"], "2024-02-03");
    assert_eq!(json["priority"], 2);
    assert!(json.get("completed").is_none());

    note.mark_completed();
    let json = serde_json::to_value(&note).unwrap();
    assert_eq!(json["completed"], true);
    let decoded: Note = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, note);
}
