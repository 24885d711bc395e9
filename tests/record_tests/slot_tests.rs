//! Tests for the record model
//!
//! These tests verify:
//! - Slot encoding is fixed-length and reproduces every field
//! - Name truncation in the binary form only
//! - Field name lookup and text parsing
//! - Field change resolution

use std::str::FromStr;

use chrono::NaiveDate;
use rosterdb::record::{decode_slot, encode_slot, Assignment, SlotStatus, NAME_WIDTH, SLOT_SIZE};
use rosterdb::{Field, FieldChanges, Record, RecordData, RosterError};
use rust_decimal::Decimal;

// =============================================================================
// Helper Functions
// =============================================================================

fn make_record(id: u32, first: &str, last: &str) -> Record {
    Record::new(
        id,
        RecordData::new(
            first,
            last,
            NaiveDate::from_ymd_opt(1970, 1, 1).unwrap(),
            Decimal::from_str("1234.5600").unwrap(),
            -42,
            'Ω',
        )
        .unwrap(),
    )
}

// =============================================================================
// Slot Tests
// =============================================================================

#[test]
fn test_every_slot_has_the_same_size() {
    let short = encode_slot(&make_record(1, "A", "B"), SlotStatus::Live);
    let long = encode_slot(
        &make_record(u32::MAX, &"f".repeat(300), &"l".repeat(300)),
        SlotStatus::Deleted,
    );

    assert_eq!(short.len(), SLOT_SIZE);
    assert_eq!(long.len(), SLOT_SIZE);
}

#[test]
fn test_slot_decode_reproduces_record() {
    let record = make_record(77, "Grace", "Hopper");
    let (status, decoded) = decode_slot(&encode_slot(&record, SlotStatus::Live)).unwrap();

    assert_eq!(status, SlotStatus::Live);
    assert_eq!(decoded, record);
    // Scale survives the 16-byte encoding
    assert_eq!(decoded.text(Field::Balance), "1234.5600");
}

#[test]
fn test_slot_truncates_names_to_buffer_width() {
    let record = make_record(1, &"n".repeat(NAME_WIDTH + 5), "Short");
    let (_, decoded) = decode_slot(&encode_slot(&record, SlotStatus::Live)).unwrap();

    assert_eq!(decoded.data.first_name.len(), NAME_WIDTH);
    assert_eq!(decoded.data.last_name, "Short");
}

#[test]
fn test_slot_status_is_first_two_bytes() {
    let bytes = encode_slot(&make_record(1, "A", "B"), SlotStatus::Deleted);
    assert_eq!(&bytes[0..2], &[1, 0]);
    assert_eq!(&bytes[2..6], &1u32.to_le_bytes());
}

#[test]
fn test_decode_rejects_wrong_length() {
    let result = decode_slot(&[0u8; 10]);
    assert!(matches!(result, Err(RosterError::Storage(_))));
}

// =============================================================================
// Text Tests
// =============================================================================

#[test]
fn test_record_text_forms() {
    let record = make_record(5, "Ann", "Lee");

    assert_eq!(record.text(Field::Id), "5");
    assert_eq!(record.text(Field::BirthDate), "01/01/1970");
    assert_eq!(record.text(Field::Code), "-42");
    assert_eq!(record.text(Field::Flag), "Ω");
}

#[test]
fn test_from_texts_round_trips_text_forms() {
    let record = make_record(5, "Ann", "Lee");
    let texts: Vec<String> = Field::ALL.iter().map(|f| record.text(*f)).collect();
    let refs: Vec<&str> = texts.iter().map(String::as_str).collect();

    assert_eq!(Record::from_texts(&refs).unwrap(), record);
}

#[test]
fn test_record_data_rejects_empty_names() {
    let date = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
    let result = RecordData::new("", "Lee", date, Decimal::ZERO, 0, 'a');
    assert!(matches!(result, Err(RosterError::InvalidArgument(_))));
}

#[test]
fn test_unknown_field_name() {
    let result = "nickname".parse::<Field>();
    assert!(matches!(result, Err(RosterError::UnknownField(name)) if name == "nickname"));
}

// =============================================================================
// Field Change Tests
// =============================================================================

#[test]
fn test_field_changes_resolve_typed_values() {
    let changes =
        FieldChanges::parse("balance = 99.90, birth_date = 1999-12-31, LastName = \"O'Neil\"")
            .unwrap();
    let resolved = changes.resolve().unwrap();

    assert!(resolved.unknown.is_empty());
    assert_eq!(
        resolved.assignments,
        vec![
            Assignment::Balance(Decimal::from_str("99.90").unwrap()),
            Assignment::BirthDate(NaiveDate::from_ymd_opt(1999, 12, 31).unwrap()),
            Assignment::LastName("O'Neil".to_string()),
        ]
    );
}

#[test]
fn test_field_changes_reject_empty_name() {
    let changes = FieldChanges::new().set("first_name", "  ");
    assert!(matches!(
        changes.resolve(),
        Err(RosterError::InvalidArgument(_))
    ));
}
