//! In-memory store
//!
//! Vec-backed reference implementation of the store contract.

use std::collections::HashSet;

use crate::error::{Result, RosterError};
use crate::query::{select, Combinator, Criteria, Criterion};
use crate::record::{FieldChanges, Record, RecordData};
use crate::snapshot::Snapshot;

use super::iterator::Cursor;
use super::{PurgeOutcome, RecordIterator, RecordStore, StoreStat, UpdateOutcome};

/// Records held in a Vec for the lifetime of the store
///
/// Deleted records are removed immediately, so `stat` never reports
/// tombstones and `purge` has nothing to do.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Vec<Record>,
    /// Highest id ever handed out or inserted
    last_id: u32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Borrow the live records
    pub fn as_slice(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn next_id(&mut self) -> Result<u32> {
        let id = self
            .last_id
            .checked_add(1)
            .ok_or_else(|| RosterError::Storage("Record id space exhausted".to_string()))?;
        self.last_id = id;
        Ok(id)
    }
}

impl RecordStore for MemoryStore {
    fn create(&mut self, data: RecordData) -> Result<u32> {
        data.check_names()?;
        let id = self.next_id()?;
        self.records.push(Record::new(id, data));
        tracing::debug!(id, "Created record in memory");
        Ok(id)
    }

    fn insert(&mut self, record: Record) -> Result<()> {
        if record.id == 0 {
            return Err(RosterError::InvalidArgument("id must be positive".to_string()));
        }
        record.data.check_names()?;
        self.last_id = self.last_id.max(record.id);

        match self.records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => {
                existing.data = record.data;
                tracing::debug!(id = record.id, "Replaced record in memory");
            }
            None => {
                tracing::debug!(id = record.id, "Appended record in memory");
                self.records.push(record);
            }
        }
        Ok(())
    }

    fn update(&mut self, changes: &FieldChanges, criteria: &Criteria) -> Result<UpdateOutcome> {
        let resolved = changes.resolve()?;
        for name in &resolved.unknown {
            tracing::warn!(field = %name, "Skipping unknown field in update");
        }

        let criteria = criteria.clone().with_combinator(Combinator::And);
        let ids: HashSet<u32> = select(&criteria, &self.records)
            .into_iter()
            .map(|r| r.id)
            .collect();

        let mut updated = Vec::new();
        for record in self.records.iter_mut().filter(|r| ids.contains(&r.id)) {
            resolved.apply(&mut record.data);
            updated.push(record.id);
        }

        tracing::debug!(count = updated.len(), "Updated records in memory");
        Ok(UpdateOutcome {
            updated,
            skipped_fields: resolved.unknown,
        })
    }

    fn delete(&mut self, predicate: &str) -> Result<Vec<u32>> {
        let criterion = Criterion::parse(predicate)?;

        let mut removed = Vec::new();
        self.records.retain(|record| {
            if criterion.matches(record) {
                removed.push(record.id);
                false
            } else {
                true
            }
        });

        tracing::debug!(predicate = %criterion, ?removed, "Deleted records in memory");
        Ok(removed)
    }

    fn purge(&mut self) -> Result<PurgeOutcome> {
        Ok(PurgeOutcome {
            purged: 0,
            total_before: self.records.len(),
        })
    }

    fn find(&self, criteria: &Criteria) -> Result<Box<dyn RecordIterator + '_>> {
        Ok(Box::new(MemoryIterator::new(
            &self.records,
            Some(criteria.clone()),
        )))
    }

    fn iter(&self) -> Result<Box<dyn RecordIterator + '_>> {
        Ok(Box::new(MemoryIterator::new(&self.records, None)))
    }

    fn get_records(&self) -> Result<Vec<Record>> {
        Ok(self.records.clone())
    }

    fn stat(&self) -> Result<StoreStat> {
        Ok(StoreStat {
            total: self.records.len(),
            live: self.records.len(),
        })
    }

    fn restore(&mut self, snapshot: &Snapshot) -> Result<()> {
        snapshot.check_unique_ids()?;
        self.records = snapshot.records().to_vec();
        let max_id = self.records.iter().map(|r| r.id).max().unwrap_or(0);
        self.last_id = self.last_id.max(max_id);
        tracing::info!(records = self.records.len(), "Restored memory store from snapshot");
        Ok(())
    }
}

/// Iterator over a slice of records, by position
pub struct MemoryIterator<'a> {
    records: &'a [Record],
    /// Index of the next record to examine
    position: usize,
    filter: Option<Criteria>,
    cursor: Cursor,
}

impl<'a> MemoryIterator<'a> {
    /// Iterate `records`, keeping only matches of `filter` (all when `None`)
    pub fn new(records: &'a [Record], filter: Option<Criteria>) -> Self {
        Self {
            records,
            position: 0,
            filter,
            cursor: Cursor::NotStarted,
        }
    }
}

impl RecordIterator for MemoryIterator<'_> {
    fn has_more(&mut self) -> Result<bool> {
        let records = self.records;
        let filter = &self.filter;
        let position = &mut self.position;

        self.cursor.decide(|| {
            while let Some(record) = records.get(*position) {
                *position += 1;
                if filter.as_ref().map_or(true, |c| c.matches(record)) {
                    return Ok(Some(record.clone()));
                }
            }
            Ok(None)
        })
    }

    fn get_next(&mut self) -> Result<Record> {
        if !self.has_more()? {
            return Err(RosterError::IteratorExhausted);
        }
        self.cursor.take()
    }
}
