//! File-backed store
//!
//! Records persisted as fixed-size slots in one flat file.
//!
//! ## File Format
//! ```text
//! ┌──────────┬──────────┬──────────┬─────┐
//! │ Slot 0   │ Slot 1   │ Slot 2   │ ... │   each SLOT_SIZE bytes
//! └──────────┴──────────┴──────────┴─────┘
//! ```
//! No header and no version field: slot `n` lives at `n * SLOT_SIZE`
//! (see [`crate::record::SLOT_SIZE`]).
//! A slot never moves until purge. Delete flips its status to
//! [`SlotStatus::Deleted`] in place; purge rewrites the file with only
//! live slots, preserving order and ids.
//!
//! ## Resource Model
//! File handles are opened per operation (or per iterator) and dropped on
//! every exit path. Rewrites go through a `.tmp` sibling which is synced
//! and renamed over the data file.

mod iterator;

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::error::{Result, RosterError};
use crate::query::{Combinator, Criteria, Criterion};
use crate::record::{encode_slot, FieldChanges, Record, RecordData, SlotStatus};
use crate::snapshot::Snapshot;

use super::{PurgeOutcome, RecordIterator, RecordStore, StoreStat, UpdateOutcome};

pub use iterator::FileIterator;
use iterator::SlotReader;

/// Thin cursor over a flat data file
///
/// Holds no records in memory: only the path and the id counter, which is
/// re-derived from the file on every open.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    /// Highest id present in any slot, live or deleted, or handed out since open
    last_id: u32,
}

impl FileStore {
    /// Open or create a data file
    ///
    /// On open:
    /// 1. Create the parent directory and an empty file if missing
    /// 2. Validate that the length is a whole number of slots
    /// 3. Derive the id counter from the highest id in any slot
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        OpenOptions::new().create(true).append(true).open(&path)?;

        let mut reader = SlotReader::open(&path)?;
        let mut last_id = 0;
        while let Some((_, _, record)) = reader.next_slot()? {
            last_id = last_id.max(record.id);
        }

        tracing::info!(
            path = %path.display(),
            slots = reader.slot_count(),
            last_id,
            "Opened file store"
        );

        Ok(Self { path, last_id })
    }

    /// Path of the data file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Highest id known to the store (for testing/debugging)
    pub fn last_id(&self) -> u32 {
        self.last_id
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn next_id(&mut self) -> Result<u32> {
        let id = self
            .last_id
            .checked_add(1)
            .ok_or_else(|| RosterError::Storage("Record id space exhausted".to_string()))?;
        self.last_id = id;
        Ok(id)
    }

    /// Live slots accepted by `predicate`, with their offsets
    fn matching_slots<F>(&self, predicate: F) -> Result<Vec<(u64, Record)>>
    where
        F: Fn(&Record) -> bool,
    {
        let mut reader = SlotReader::open(&self.path)?;
        let mut matches = Vec::new();
        while let Some((offset, status, record)) = reader.next_slot()? {
            if status == SlotStatus::Live && predicate(&record) {
                matches.push((offset, record));
            }
        }
        Ok(matches)
    }

    /// Offset of the live slot holding `id`
    fn find_live_slot(&self, id: u32) -> Result<Option<u64>> {
        let mut reader = SlotReader::open(&self.path)?;
        while let Some((offset, status, record)) = reader.next_slot()? {
            if status == SlotStatus::Live && record.id == id {
                return Ok(Some(offset));
            }
        }
        Ok(None)
    }

    /// Overwrite the slot at `offset`
    fn write_slot(&self, offset: u64, record: &Record) -> Result<()> {
        let mut file = OpenOptions::new().write(true).open(&self.path)?;
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(&encode_slot(record, SlotStatus::Live))?;
        file.sync_data()?;
        Ok(())
    }

    /// Append a live slot, rolling the file back if the write fails
    fn append_slot(&self, record: &Record) -> Result<()> {
        let mut file = OpenOptions::new().write(true).open(&self.path)?;
        let len = file.seek(SeekFrom::End(0))?;

        let written = file
            .write_all(&encode_slot(record, SlotStatus::Live))
            .and_then(|_| file.sync_data());
        if let Err(e) = written {
            let _ = file.set_len(len);
            return Err(RosterError::Io(e));
        }
        Ok(())
    }

    /// Flip the status of the slots at `offsets` to deleted
    fn mark_deleted(&self, offsets: &[u64]) -> Result<()> {
        let mut file = OpenOptions::new().write(true).open(&self.path)?;
        for &offset in offsets {
            file.seek(SeekFrom::Start(offset))?;
            file.write_all(&SlotStatus::Deleted.to_le_bytes())?;
        }
        file.sync_data()?;
        Ok(())
    }

    /// Replace the data file with `records` as fresh live slots
    ///
    /// Writes `<file>.tmp`, syncs it, then renames it over the data file.
    fn rewrite<'a, I>(&self, records: I) -> Result<usize>
    where
        I: IntoIterator<Item = &'a Record>,
    {
        let tmp_path = self.tmp_path();
        let result = Self::write_slots(&tmp_path, records);

        match result {
            Ok(count) => {
                fs::rename(&tmp_path, &self.path)?;
                Ok(count)
            }
            Err(e) => {
                let _ = fs::remove_file(&tmp_path);
                Err(e)
            }
        }
    }

    fn write_slots<'a, I>(path: &Path, records: I) -> Result<usize>
    where
        I: IntoIterator<Item = &'a Record>,
    {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        let mut writer = BufWriter::new(file);

        let mut count = 0;
        for record in records {
            writer.write_all(&encode_slot(record, SlotStatus::Live))?;
            count += 1;
        }

        let file: File = writer
            .into_inner()
            .map_err(|e| RosterError::Io(e.into_error()))?;
        file.sync_all()?;
        Ok(count)
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

impl RecordStore for FileStore {
    fn create(&mut self, data: RecordData) -> Result<u32> {
        data.check_names()?;
        let id = self.next_id()?;
        self.append_slot(&Record::new(id, data))?;
        tracing::debug!(id, "Appended new slot");
        Ok(id)
    }

    fn insert(&mut self, record: Record) -> Result<()> {
        if record.id == 0 {
            return Err(RosterError::InvalidArgument("id must be positive".to_string()));
        }
        record.data.check_names()?;

        match self.find_live_slot(record.id)? {
            Some(offset) => {
                self.write_slot(offset, &record)?;
                tracing::debug!(id = record.id, offset, "Overwrote slot in place");
            }
            None => {
                self.append_slot(&record)?;
                tracing::debug!(id = record.id, "Appended inserted slot");
            }
        }
        self.last_id = self.last_id.max(record.id);
        Ok(())
    }

    fn update(&mut self, changes: &FieldChanges, criteria: &Criteria) -> Result<UpdateOutcome> {
        let resolved = changes.resolve()?;
        for name in &resolved.unknown {
            tracing::warn!(field = %name, "Skipping unknown field in update");
        }

        let criteria = criteria.clone().with_combinator(Combinator::And);
        let matches = self.matching_slots(|r| criteria.matches(r))?;

        let mut updated = Vec::with_capacity(matches.len());
        for (offset, mut record) in matches {
            resolved.apply(&mut record.data);
            self.write_slot(offset, &record)?;
            updated.push(record.id);
        }

        tracing::debug!(count = updated.len(), "Updated slots");
        Ok(UpdateOutcome {
            updated,
            skipped_fields: resolved.unknown,
        })
    }

    fn delete(&mut self, predicate: &str) -> Result<Vec<u32>> {
        let criterion = Criterion::parse(predicate)?;

        let matches = self.matching_slots(|r| criterion.matches(r))?;
        if matches.is_empty() {
            return Ok(Vec::new());
        }

        let offsets: Vec<u64> = matches.iter().map(|(offset, _)| *offset).collect();
        self.mark_deleted(&offsets)?;

        let removed: Vec<u32> = matches.into_iter().map(|(_, record)| record.id).collect();
        tracing::debug!(predicate = %criterion, ?removed, "Tombstoned slots");
        Ok(removed)
    }

    fn purge(&mut self) -> Result<PurgeOutcome> {
        let mut reader = SlotReader::open(&self.path)?;
        let total_before = reader.slot_count();

        let mut live = Vec::new();
        while let Some((_, status, record)) = reader.next_slot()? {
            if status == SlotStatus::Live {
                live.push(record);
            }
        }
        drop(reader);

        let purged = total_before - live.len();
        if purged > 0 {
            self.rewrite(&live)?;
        }

        tracing::info!(purged, remaining = live.len(), "Purged data file");
        Ok(PurgeOutcome {
            purged,
            total_before,
        })
    }

    fn find(&self, criteria: &Criteria) -> Result<Box<dyn RecordIterator + '_>> {
        Ok(Box::new(FileIterator::open(
            &self.path,
            Some(criteria.clone()),
        )?))
    }

    fn iter(&self) -> Result<Box<dyn RecordIterator + '_>> {
        Ok(Box::new(FileIterator::open(&self.path, None)?))
    }

    fn stat(&self) -> Result<StoreStat> {
        let mut reader = SlotReader::open(&self.path)?;
        let total = reader.slot_count();

        let mut live = 0;
        while let Some((_, status, _)) = reader.next_slot()? {
            if status == SlotStatus::Live {
                live += 1;
            }
        }
        Ok(StoreStat { total, live })
    }

    fn restore(&mut self, snapshot: &Snapshot) -> Result<()> {
        snapshot.check_unique_ids()?;

        let count = self.rewrite(snapshot.records())?;
        let max_id = snapshot.records().iter().map(|r| r.id).max().unwrap_or(0);
        self.last_id = self.last_id.max(max_id);

        tracing::info!(records = count, "Restored file store from snapshot");
        Ok(())
    }
}
