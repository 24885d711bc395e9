//! Storage Module
//!
//! The store contract and its two backends.
//!
//! ## Responsibilities
//! - Assign ids and hold records ([`MemoryStore`], [`FileStore`])
//! - Run queries lazily through the iteration protocol ([`RecordIterator`])
//! - Bulk update and delete through the shared query evaluator
//! - Snapshot and restore the visible record set
//! - Optional timing and call-logging wrappers ([`TimedStore`], [`LoggedStore`])
//!
//! ## Backends
//! ```text
//! ┌──────────────┐      ┌──────────────────────────────────────┐
//! │ MemoryStore  │      │ FileStore                            │
//! │  Vec<Record> │      │  [slot 0][slot 1][slot 2] ...        │
//! │  delete =    │      │  delete = status flag in place       │
//! │   remove     │      │  purge  = rewrite without tombstones │
//! └──────────────┘      └──────────────────────────────────────┘
//! ```

mod decorator;
mod file;
mod iterator;
mod memory;

pub use decorator::{CallTiming, LoggedStore, TimedStore};
pub use file::{FileIterator, FileStore};
pub use iterator::{RecordIterator, Records};
pub use memory::{MemoryIterator, MemoryStore};

use crate::error::Result;
use crate::query::Criteria;
use crate::record::{FieldChanges, Record, RecordData};
use crate::snapshot::Snapshot;

/// Slot counts of a store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreStat {
    /// Slots ever written and not yet purged
    pub total: usize,
    /// Records visible to queries
    pub live: usize,
}

impl StoreStat {
    /// Tombstoned slots awaiting purge
    pub fn removed(&self) -> usize {
        self.total - self.live
    }
}

/// Result of a bulk update
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// Ids of the records that were changed
    pub updated: Vec<u32>,
    /// Field names in the change set that name no field
    pub skipped_fields: Vec<String>,
}

/// Result of a purge
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeOutcome {
    /// Tombstoned slots removed
    pub purged: usize,
    /// Slots before the purge
    pub total_before: usize,
}

/// The store contract shared by every backend and wrapper
pub trait RecordStore {
    /// Add a record under a fresh id and return that id
    ///
    /// Ids are never reused within the lifetime of a store.
    fn create(&mut self, data: RecordData) -> Result<u32>;

    /// Replace the live record with the same id, or append it as given
    fn insert(&mut self, record: Record) -> Result<()>;

    /// Apply `changes` to every record matching all of `criteria`
    ///
    /// The criteria combine by AND regardless of their own combinator.
    fn update(&mut self, changes: &FieldChanges, criteria: &Criteria) -> Result<UpdateOutcome>;

    /// Delete the records matching one `field = value` predicate
    fn delete(&mut self, predicate: &str) -> Result<Vec<u32>>;

    /// Physically drop deleted records
    fn purge(&mut self) -> Result<PurgeOutcome>;

    /// Lazily traverse the records matching `criteria`
    fn find(&self, criteria: &Criteria) -> Result<Box<dyn RecordIterator + '_>>;

    /// Lazily traverse every live record
    fn iter(&self) -> Result<Box<dyn RecordIterator + '_>>;

    /// Copy of every live record, in store order
    fn get_records(&self) -> Result<Vec<Record>> {
        self.iter()?.records().collect()
    }

    fn stat(&self) -> Result<StoreStat>;

    /// Point-in-time copy of the live records
    fn snapshot(&self) -> Result<Snapshot> {
        Ok(Snapshot::new(self.get_records()?))
    }

    /// Replace the whole visible record set with the snapshot's records
    fn restore(&mut self, snapshot: &Snapshot) -> Result<()>;
}

impl<S: RecordStore + ?Sized> RecordStore for Box<S> {
    fn create(&mut self, data: RecordData) -> Result<u32> {
        (**self).create(data)
    }

    fn insert(&mut self, record: Record) -> Result<()> {
        (**self).insert(record)
    }

    fn update(&mut self, changes: &FieldChanges, criteria: &Criteria) -> Result<UpdateOutcome> {
        (**self).update(changes, criteria)
    }

    fn delete(&mut self, predicate: &str) -> Result<Vec<u32>> {
        (**self).delete(predicate)
    }

    fn purge(&mut self) -> Result<PurgeOutcome> {
        (**self).purge()
    }

    fn find(&self, criteria: &Criteria) -> Result<Box<dyn RecordIterator + '_>> {
        (**self).find(criteria)
    }

    fn iter(&self) -> Result<Box<dyn RecordIterator + '_>> {
        (**self).iter()
    }

    fn get_records(&self) -> Result<Vec<Record>> {
        (**self).get_records()
    }

    fn stat(&self) -> Result<StoreStat> {
        (**self).stat()
    }

    fn snapshot(&self) -> Result<Snapshot> {
        (**self).snapshot()
    }

    fn restore(&mut self, snapshot: &Snapshot) -> Result<()> {
        (**self).restore(snapshot)
    }
}
