//! Tests for store construction and decorators
//!
//! These tests verify:
//! - Backend selection through Config
//! - Decorated stores behave exactly like the bare backend
//! - Call timing tallies
//! - End-to-end workflow: create, query, delete, purge, export, restore

use std::str::FromStr;

use chrono::NaiveDate;
use rosterdb::storage::{LoggedStore, TimedStore};
use rosterdb::{
    open_store, Backend, Config, Criteria, FieldChanges, Format, MemoryStore, RecordData,
    RecordIterator, RecordStore, Snapshot,
};
use rust_decimal::Decimal;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn person(first: &str, last: &str, code: i16) -> RecordData {
    RecordData::new(
        first,
        last,
        NaiveDate::from_ymd_opt(1975, 12, 24).unwrap(),
        Decimal::from_str("99.99").unwrap(),
        code,
        'k',
    )
    .unwrap()
}

fn config(dir: &TempDir, backend: Backend, decorated: bool) -> Config {
    Config::builder()
        .backend(backend)
        .data_file(dir.path().join("engine.db"))
        .timing(decorated)
        .call_log(decorated)
        .build()
}

/// Every backend, bare and decorated
const VARIANTS: [(Backend, bool); 4] = [
    (Backend::Memory, false),
    (Backend::Memory, true),
    (Backend::File, false),
    (Backend::File, true),
];

// =============================================================================
// Config Tests
// =============================================================================

#[test]
fn test_default_config() {
    let config = Config::default();
    assert_eq!(config.backend, Backend::File);
    assert_eq!(config.data_file.to_str(), Some("./roster.db"));
    assert!(!config.timing);
    assert!(!config.call_log);
}

#[test]
fn test_file_backend_creates_data_file() {
    let dir = TempDir::new().unwrap();
    let _store = open_store(&config(&dir, Backend::File, false)).unwrap();
    assert!(dir.path().join("engine.db").exists());
}

#[test]
fn test_memory_backend_touches_no_file() {
    let dir = TempDir::new().unwrap();
    let _store = open_store(&config(&dir, Backend::Memory, true)).unwrap();
    assert!(!dir.path().join("engine.db").exists());
}

// =============================================================================
// Decorator Tests
// =============================================================================

#[test]
fn test_timed_store_counts_calls() {
    let mut store = TimedStore::new(MemoryStore::new());
    store.create(person("A", "One", 1)).unwrap();
    store.create(person("B", "Two", 2)).unwrap();
    store.stat().unwrap();

    let timings = store.timings();
    assert_eq!(timings["create"].calls, 2);
    assert_eq!(timings["stat"].calls, 1);
    assert!(!timings.contains_key("purge"));

    let inner = store.into_inner();
    assert_eq!(inner.len(), 2);
}

#[test]
fn test_logged_store_passes_errors_through() {
    let mut store = LoggedStore::new(MemoryStore::new());
    assert!(store.delete("no_such_field = 1").is_err());
    assert_eq!(store.create(person("A", "One", 1)).unwrap(), 1);
    assert_eq!(store.into_inner().len(), 1);
}

// =============================================================================
// Workflow Tests
// =============================================================================

#[test]
fn test_workflow_on_every_store() {
    for (backend, decorated) in VARIANTS {
        let dir = TempDir::new().unwrap();
        let store_config = config(&dir, backend, decorated);
        let mut store = open_store(&store_config).unwrap();

        assert_eq!(store.create(person("John", "Smith", 123)).unwrap(), 1);
        assert_eq!(store.create(person("Jane", "Smith", 456)).unwrap(), 2);
        assert_eq!(store.create(person("Bob", "Jones", 123)).unwrap(), 3);

        let and = Criteria::parse("last_name = Smith and code = 123").unwrap();
        let found: Vec<u32> = store
            .find(&and)
            .unwrap()
            .records()
            .map(|r| r.unwrap().id)
            .collect();
        assert_eq!(found, vec![1], "{:?}", store_config);

        let outcome = store
            .update(
                &FieldChanges::parse("flag = Z").unwrap(),
                &Criteria::parse("last_name = Jones").unwrap(),
            )
            .unwrap();
        assert_eq!(outcome.updated, vec![3]);

        let snapshot = store.snapshot().unwrap();
        assert_eq!(store.delete("code = 123").unwrap(), vec![1, 3]);
        assert_eq!(store.stat().unwrap().live, 1);

        store.purge().unwrap();
        assert_eq!(store.stat().unwrap().removed(), 0);

        let path = dir.path().join("backup.csv");
        snapshot.export(&path, Format::Csv).unwrap();
        let import = Snapshot::import_file(&path, Format::Csv).unwrap();
        store.restore(&import.snapshot).unwrap();

        let records = store.get_records().unwrap();
        assert_eq!(records, snapshot.records().to_vec(), "{:?}", store_config);
        assert_eq!(records[2].data.flag, 'Z');
        assert_eq!(store.create(person("Next", "Id", 0)).unwrap(), 4);
    }
}
