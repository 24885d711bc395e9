//! File iterators
//!
//! Sequential slot scanning over the data file.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::error::{Result, RosterError};
use crate::query::Criteria;
use crate::record::{decode_slot, Record, SlotStatus, SLOT_SIZE};
use crate::storage::iterator::Cursor;
use crate::storage::RecordIterator;

/// Raw scan over every slot, tombstones included
pub(crate) struct SlotReader {
    file: BufReader<File>,
    /// Stop reading at this offset (file length at open)
    end_offset: u64,
    /// Byte offset of the next slot
    offset: u64,
    buf: Vec<u8>,
}

impl SlotReader {
    pub(crate) fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let end_offset = file.metadata()?.len();
        if end_offset % SLOT_SIZE as u64 != 0 {
            return Err(RosterError::Storage(format!(
                "Data file length {} is not a multiple of the {}-byte slot size",
                end_offset, SLOT_SIZE
            )));
        }

        Ok(Self {
            file: BufReader::new(file),
            end_offset,
            offset: 0,
            buf: vec![0u8; SLOT_SIZE],
        })
    }

    /// Read the next slot as `(offset, status, record)`
    pub(crate) fn next_slot(&mut self) -> Result<Option<(u64, SlotStatus, Record)>> {
        if self.offset >= self.end_offset {
            return Ok(None);
        }

        let offset = self.offset;
        self.file.read_exact(&mut self.buf)?;
        self.offset += SLOT_SIZE as u64;

        let (status, record) = decode_slot(&self.buf)?;
        Ok(Some((offset, status, record)))
    }

    /// Number of slots in the file when it was opened
    pub(crate) fn slot_count(&self) -> usize {
        (self.end_offset / SLOT_SIZE as u64) as usize
    }
}

/// Lazy search over the live slots of a data file
///
/// The file stays open for the lifetime of the iterator and is closed
/// when it is dropped.
pub struct FileIterator {
    reader: SlotReader,
    filter: Option<Criteria>,
    cursor: Cursor,
}

impl FileIterator {
    /// Iterate the file at `path`, keeping only matches of `filter` (all when `None`)
    pub fn open(path: &Path, filter: Option<Criteria>) -> Result<Self> {
        Ok(Self {
            reader: SlotReader::open(path)?,
            filter,
            cursor: Cursor::NotStarted,
        })
    }
}

impl RecordIterator for FileIterator {
    fn has_more(&mut self) -> Result<bool> {
        let reader = &mut self.reader;
        let filter = &self.filter;

        self.cursor.decide(|| {
            while let Some((_, status, record)) = reader.next_slot()? {
                if status == SlotStatus::Deleted {
                    continue;
                }
                if filter.as_ref().map_or(true, |c| c.matches(&record)) {
                    return Ok(Some(record));
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
