//! Tests for the flat-file store
//!
//! These tests verify:
//! - Slot layout on disk and tombstone delete
//! - Purge compaction and idempotence
//! - Insert overwrite in place versus append
//! - Id counter recovery on reopen
//! - Restore through an atomic rewrite

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::NaiveDate;
use rosterdb::record::SLOT_SIZE;
use rosterdb::{
    Criteria, FieldChanges, FileStore, Record, RecordData, RecordIterator, RecordStore,
    RosterError, Snapshot, StoreStat,
};
use rust_decimal::Decimal;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn data_path(dir: &TempDir) -> PathBuf {
    dir.path().join("roster.db")
}

fn person(first: &str, last: &str, code: i16) -> RecordData {
    RecordData::new(
        first,
        last,
        NaiveDate::from_ymd_opt(1990, 2, 28).unwrap(),
        Decimal::from_str("250.00").unwrap(),
        code,
        'x',
    )
    .unwrap()
}

/// Store holding ids 1..=3: John Smith 123, Jane Smith 456, Bob Jones 123
fn seeded_store(path: &Path) -> FileStore {
    let mut store = FileStore::open(path).unwrap();
    store.create(person("John", "Smith", 123)).unwrap();
    store.create(person("Jane", "Smith", 456)).unwrap();
    store.create(person("Bob", "Jones", 123)).unwrap();
    store
}

fn file_len(path: &Path) -> u64 {
    fs::metadata(path).unwrap().len()
}

fn live_ids(store: &FileStore) -> Vec<u32> {
    store.get_records().unwrap().iter().map(|r| r.id).collect()
}

// =============================================================================
// Open Tests
// =============================================================================

#[test]
fn test_open_creates_empty_file_and_parent() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("roster.db");

    let store = FileStore::open(&path).unwrap();

    assert!(path.exists());
    assert_eq!(file_len(&path), 0);
    assert_eq!(store.stat().unwrap(), StoreStat::default());
    assert_eq!(store.last_id(), 0);
}

#[test]
fn test_open_rejects_partial_slot() {
    let dir = TempDir::new().unwrap();
    let path = data_path(&dir);
    fs::write(&path, vec![0u8; SLOT_SIZE + 3]).unwrap();

    let result = FileStore::open(&path);
    assert!(matches!(result, Err(RosterError::Storage(_))));
}

#[test]
fn test_reopen_recovers_records_and_counter() {
    let dir = TempDir::new().unwrap();
    let path = data_path(&dir);

    {
        let mut store = seeded_store(&path);
        store.delete("id = 3").unwrap();
    }

    let mut store = FileStore::open(&path).unwrap();
    // Tombstoned id 3 still counts towards the counter
    assert_eq!(store.last_id(), 3);
    assert_eq!(live_ids(&store), vec![1, 2]);
    assert_eq!(store.create(person("Eve", "Adams", 1)).unwrap(), 4);
}

// =============================================================================
// Create / Insert Tests
// =============================================================================

#[test]
fn test_create_appends_one_slot_each() {
    let dir = TempDir::new().unwrap();
    let path = data_path(&dir);
    let store = seeded_store(&path);

    assert_eq!(file_len(&path), 3 * SLOT_SIZE as u64);
    assert_eq!(live_ids(&store), vec![1, 2, 3]);
}

#[test]
fn test_insert_overwrites_in_place() {
    let dir = TempDir::new().unwrap();
    let path = data_path(&dir);
    let mut store = seeded_store(&path);

    store
        .insert(Record::new(2, person("Janet", "Smith", 789)))
        .unwrap();

    assert_eq!(file_len(&path), 3 * SLOT_SIZE as u64);
    let records = store.get_records().unwrap();
    assert_eq!(records[1].id, 2);
    assert_eq!(records[1].data.first_name, "Janet");
    assert_eq!(records[1].data.code, 789);
}

#[test]
fn test_insert_appends_unknown_id() {
    let dir = TempDir::new().unwrap();
    let path = data_path(&dir);
    let mut store = seeded_store(&path);

    store.insert(Record::new(20, person("Zed", "Zulu", 0))).unwrap();

    assert_eq!(file_len(&path), 4 * SLOT_SIZE as u64);
    assert_eq!(live_ids(&store), vec![1, 2, 3, 20]);
    assert_eq!(store.create(person("Next", "One", 0)).unwrap(), 21);
}

#[test]
fn test_insert_after_delete_appends() {
    let dir = TempDir::new().unwrap();
    let path = data_path(&dir);
    let mut store = seeded_store(&path);

    store.delete("id = 1").unwrap();
    store.insert(Record::new(1, person("John", "Again", 0))).unwrap();

    let stat = store.stat().unwrap();
    assert_eq!(stat.total, 4);
    assert_eq!(stat.live, 3);
    assert_eq!(live_ids(&store), vec![2, 3, 1]);
}

// =============================================================================
// Query / Update Tests
// =============================================================================

#[test]
fn test_find_and_or() {
    let dir = TempDir::new().unwrap();
    let store = seeded_store(&data_path(&dir));

    let and = Criteria::parse("last_name = Smith and code = 123").unwrap();
    let or = Criteria::parse("last_name = Smith or code = 123").unwrap();

    let and_ids: Vec<u32> = store
        .find(&and)
        .unwrap()
        .records()
        .map(|r| r.unwrap().id)
        .collect();
    let or_ids: Vec<u32> = store
        .find(&or)
        .unwrap()
        .records()
        .map(|r| r.unwrap().id)
        .collect();

    assert_eq!(and_ids, vec![1]);
    assert_eq!(or_ids, vec![1, 2, 3]);
}

#[test]
fn test_update_rewrites_matching_slots() {
    let dir = TempDir::new().unwrap();
    let path = data_path(&dir);
    let mut store = seeded_store(&path);

    let changes = FieldChanges::parse("balance = 1.5, shoe_size = 44").unwrap();
    let criteria = Criteria::parse("code = 123").unwrap();
    let outcome = store.update(&changes, &criteria).unwrap();

    assert_eq!(outcome.updated, vec![1, 3]);
    assert_eq!(outcome.skipped_fields, vec!["shoe_size".to_string()]);
    assert_eq!(file_len(&path), 3 * SLOT_SIZE as u64);

    let reopened = FileStore::open(&path).unwrap();
    let balances: Vec<String> = reopened
        .get_records()
        .unwrap()
        .iter()
        .map(|r| r.data.balance.to_string())
        .collect();
    assert_eq!(balances, vec!["1.5", "250.00", "1.5"]);
}

// =============================================================================
// Delete / Purge Tests
// =============================================================================

#[test]
fn test_delete_tombstones_without_shrinking() {
    let dir = TempDir::new().unwrap();
    let path = data_path(&dir);
    let mut store = seeded_store(&path);

    let removed = store.delete("first_name = jane").unwrap();

    assert_eq!(removed, vec![2]);
    assert_eq!(file_len(&path), 3 * SLOT_SIZE as u64);
    let stat = store.stat().unwrap();
    assert_eq!(stat.total, 3);
    assert_eq!(stat.live, 2);
    assert_eq!(stat.removed(), 1);
    assert_eq!(live_ids(&store), vec![1, 3]);
}

#[test]
fn test_delete_with_no_match() {
    let dir = TempDir::new().unwrap();
    let mut store = seeded_store(&data_path(&dir));

    assert!(store.delete("last_name = Nobody").unwrap().is_empty());
    assert_eq!(store.stat().unwrap().removed(), 0);
}

#[test]
fn test_delete_malformed_predicate() {
    let dir = TempDir::new().unwrap();
    let mut store = seeded_store(&data_path(&dir));

    let result = store.delete("last_name Smith");
    assert!(matches!(result, Err(RosterError::InvalidArgument(_))));
}

#[test]
fn test_delete_rejects_combined_predicates() {
    let dir = TempDir::new().unwrap();
    let mut store = seeded_store(&data_path(&dir));

    let result = store.delete("first_name = John or code = 456");

    assert!(matches!(result, Err(RosterError::InvalidArgument(_))));
    assert_eq!(store.stat().unwrap().removed(), 0);
}

#[test]
fn test_purge_compacts_file() {
    let dir = TempDir::new().unwrap();
    let path = data_path(&dir);
    let mut store = seeded_store(&path);
    store.delete("id = 2").unwrap();

    let outcome = store.purge().unwrap();

    assert_eq!(outcome.purged, 1);
    assert_eq!(outcome.total_before, 3);
    assert_eq!(file_len(&path), 2 * SLOT_SIZE as u64);
    assert_eq!(store.stat().unwrap().removed(), 0);
    assert_eq!(live_ids(&store), vec![1, 3]);
    assert!(!dir.path().join("roster.db.tmp").exists());
}

#[test]
fn test_purge_twice_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let path = data_path(&dir);
    let mut store = seeded_store(&path);
    store.delete("code = 123").unwrap();

    store.purge().unwrap();
    let second = store.purge().unwrap();

    assert_eq!(second.purged, 0);
    assert_eq!(second.total_before, 1);
    assert_eq!(file_len(&path), SLOT_SIZE as u64);
}

#[test]
fn test_ids_survive_purge() {
    let dir = TempDir::new().unwrap();
    let path = data_path(&dir);
    let mut store = seeded_store(&path);
    store.delete("id = 1").unwrap();
    store.purge().unwrap();

    assert_eq!(live_ids(&store), vec![2, 3]);
    assert_eq!(store.create(person("New", "Record", 0)).unwrap(), 4);
}

// =============================================================================
// Snapshot / Restore Tests
// =============================================================================

#[test]
fn test_restore_rewrites_file() {
    let dir = TempDir::new().unwrap();
    let path = data_path(&dir);
    let mut store = seeded_store(&path);
    let snapshot = store.snapshot().unwrap();

    store.delete("last_name = Smith").unwrap();
    store.create(person("Temp", "Record", 0)).unwrap();
    store.restore(&snapshot).unwrap();

    assert_eq!(file_len(&path), 3 * SLOT_SIZE as u64);
    assert_eq!(store.get_records().unwrap(), snapshot.records().to_vec());
    assert_eq!(store.stat().unwrap().removed(), 0);
    assert_eq!(store.create(person("After", "Restore", 0)).unwrap(), 5);
}

#[test]
fn test_restore_empty_snapshot_clears_file() {
    let dir = TempDir::new().unwrap();
    let path = data_path(&dir);
    let mut store = seeded_store(&path);

    store.restore(&Snapshot::new(Vec::new())).unwrap();

    assert_eq!(file_len(&path), 0);
    assert!(store.get_records().unwrap().is_empty());
}

#[test]
fn test_restore_duplicate_ids_leaves_file_untouched() {
    let dir = TempDir::new().unwrap();
    let path = data_path(&dir);
    let mut store = seeded_store(&path);
    let snapshot = Snapshot::new(vec![
        Record::new(7, person("A", "B", 0)),
        Record::new(7, person("C", "D", 0)),
    ]);

    assert!(store.restore(&snapshot).is_err());
    assert_eq!(live_ids(&store), vec![1, 2, 3]);
}
