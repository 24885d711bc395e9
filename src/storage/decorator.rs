//! Store decorators
//!
//! Cross-cutting wrappers that implement [`RecordStore`] by delegating to an
//! inner store. Callers compose them; the backends know nothing about them.

use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::error::Result;
use crate::query::Criteria;
use crate::record::{FieldChanges, Record, RecordData};
use crate::snapshot::Snapshot;

use super::{PurgeOutcome, RecordIterator, RecordStore, StoreStat, UpdateOutcome};

// =============================================================================
// Timing
// =============================================================================

/// Call count and cumulative duration of one store operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallTiming {
    pub calls: u64,
    pub total: Duration,
}

/// Measures the duration of every store call
///
/// Read-only calls take `&self`, so the tallies sit behind a mutex.
pub struct TimedStore<S> {
    inner: S,
    timings: Mutex<BTreeMap<&'static str, CallTiming>>,
}

impl<S: RecordStore> TimedStore<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            timings: Mutex::new(BTreeMap::new()),
        }
    }

    /// Tallies per operation name
    pub fn timings(&self) -> BTreeMap<&'static str, CallTiming> {
        self.timings.lock().clone()
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    fn record(&self, op: &'static str, started: Instant) {
        let elapsed = started.elapsed();
        tracing::debug!(op, elapsed_us = elapsed.as_micros() as u64, "Store call timed");

        let mut timings = self.timings.lock();
        let entry = timings.entry(op).or_default();
        entry.calls += 1;
        entry.total += elapsed;
    }

    fn timed<T>(&self, op: &'static str, call: impl FnOnce() -> T) -> T {
        let started = Instant::now();
        let out = call();
        self.record(op, started);
        out
    }
}

impl<S: RecordStore> RecordStore for TimedStore<S> {
    fn create(&mut self, data: RecordData) -> Result<u32> {
        let started = Instant::now();
        let out = self.inner.create(data);
        self.record("create", started);
        out
    }

    fn insert(&mut self, record: Record) -> Result<()> {
        let started = Instant::now();
        let out = self.inner.insert(record);
        self.record("insert", started);
        out
    }

    fn update(&mut self, changes: &FieldChanges, criteria: &Criteria) -> Result<UpdateOutcome> {
        let started = Instant::now();
        let out = self.inner.update(changes, criteria);
        self.record("update", started);
        out
    }

    fn delete(&mut self, predicate: &str) -> Result<Vec<u32>> {
        let started = Instant::now();
        let out = self.inner.delete(predicate);
        self.record("delete", started);
        out
    }

    fn purge(&mut self) -> Result<PurgeOutcome> {
        let started = Instant::now();
        let out = self.inner.purge();
        self.record("purge", started);
        out
    }

    fn find(&self, criteria: &Criteria) -> Result<Box<dyn RecordIterator + '_>> {
        self.timed("find", || self.inner.find(criteria))
    }

    fn iter(&self) -> Result<Box<dyn RecordIterator + '_>> {
        self.timed("iter", || self.inner.iter())
    }

    fn get_records(&self) -> Result<Vec<Record>> {
        self.timed("get_records", || self.inner.get_records())
    }

    fn stat(&self) -> Result<StoreStat> {
        self.timed("stat", || self.inner.stat())
    }

    fn snapshot(&self) -> Result<Snapshot> {
        self.timed("snapshot", || self.inner.snapshot())
    }

    fn restore(&mut self, snapshot: &Snapshot) -> Result<()> {
        let started = Instant::now();
        let out = self.inner.restore(snapshot);
        self.record("restore", started);
        out
    }
}

// =============================================================================
// Call Logging
// =============================================================================

/// Emits one `tracing` event per store call, with its arguments and outcome
pub struct LoggedStore<S> {
    inner: S,
}

impl<S: RecordStore> LoggedStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

/// Log a call outcome at info, or at warn when it failed
fn log_outcome<T, E>(op: &str, args: &str, out: &std::result::Result<T, E>)
where
    T: fmt::Debug,
    E: fmt::Display,
{
    match out {
        Ok(value) => tracing::info!(target: "rosterdb::calls", op, args, result = ?value, "store call"),
        Err(e) => tracing::warn!(target: "rosterdb::calls", op, args, error = %e, "store call failed"),
    }
}

impl<S: RecordStore> RecordStore for LoggedStore<S> {
    fn create(&mut self, data: RecordData) -> Result<u32> {
        let args = format!("{} {}", data.first_name, data.last_name);
        let out = self.inner.create(data);
        log_outcome("create", &args, &out);
        out
    }

    fn insert(&mut self, record: Record) -> Result<()> {
        let args = format!("id={}", record.id);
        let out = self.inner.insert(record);
        log_outcome("insert", &args, &out);
        out
    }

    fn update(&mut self, changes: &FieldChanges, criteria: &Criteria) -> Result<UpdateOutcome> {
        let out = self.inner.update(changes, criteria);
        log_outcome("update", &format!("{:?} where {}", changes, criteria), &out);
        out
    }

    fn delete(&mut self, predicate: &str) -> Result<Vec<u32>> {
        let out = self.inner.delete(predicate);
        log_outcome("delete", predicate, &out);
        out
    }

    fn purge(&mut self) -> Result<PurgeOutcome> {
        let out = self.inner.purge();
        log_outcome("purge", "", &out);
        out
    }

    fn find(&self, criteria: &Criteria) -> Result<Box<dyn RecordIterator + '_>> {
        let out = self.inner.find(criteria);
        log_outcome("find", &criteria.to_string(), &out.as_ref().map(|_| ()));
        out
    }

    fn iter(&self) -> Result<Box<dyn RecordIterator + '_>> {
        let out = self.inner.iter();
        log_outcome("iter", "", &out.as_ref().map(|_| ()));
        out
    }

    fn get_records(&self) -> Result<Vec<Record>> {
        let out = self.inner.get_records();
        log_outcome("get_records", "", &out.as_ref().map(Vec::len));
        out
    }

    fn stat(&self) -> Result<StoreStat> {
        let out = self.inner.stat();
        log_outcome("stat", "", &out);
        out
    }

    fn snapshot(&self) -> Result<Snapshot> {
        let out = self.inner.snapshot();
        log_outcome("snapshot", "", &out.as_ref().map(Snapshot::len));
        out
    }

    fn restore(&mut self, snapshot: &Snapshot) -> Result<()> {
        let args = format!("{} records", snapshot.len());
        let out = self.inner.restore(snapshot);
        log_outcome("restore", &args, &out);
        out
    }
}
