//! Record iteration protocol
//!
//! Forward-only, single-pass traversal over the records a store selects.
//!
//! ```text
//! not started ──has_more()──▶ decided ──get_next()──▶ advanced ──▶ ... ──▶ exhausted
//! ```
//!
//! `has_more()` never consumes. `get_next()` past the end is a programming
//! error and fails with [`RosterError::IteratorExhausted`]; iterators never
//! wrap around and cannot be restarted.

use crate::error::{Result, RosterError};
use crate::record::Record;

/// Lazy traversal implemented by each backend over its own representation
pub trait RecordIterator {
    /// Whether another record is available, without consuming it
    fn has_more(&mut self) -> Result<bool>;

    /// Consume and return the next record
    fn get_next(&mut self) -> Result<Record>;

    /// Adapt into a standard [`Iterator`]
    fn records(self) -> Records<Self>
    where
        Self: Sized,
    {
        Records {
            inner: self,
            failed: false,
        }
    }
}

impl<I: RecordIterator + ?Sized> RecordIterator for Box<I> {
    fn has_more(&mut self) -> Result<bool> {
        (**self).has_more()
    }

    fn get_next(&mut self) -> Result<Record> {
        (**self).get_next()
    }
}

/// [`Iterator`] adapter over a [`RecordIterator`]
///
/// Stops after the first error.
pub struct Records<I> {
    inner: I,
    failed: bool,
}

impl<I: RecordIterator> Iterator for Records<I> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let item = match self.inner.has_more() {
            Ok(true) => self.inner.get_next(),
            Ok(false) => return None,
            Err(e) => Err(e),
        };

        if item.is_err() {
            self.failed = true;
        }
        Some(item)
    }
}

/// Shared bookkeeping for backend iterators
///
/// Holds the record decided by `has_more()` until `get_next()` takes it.
#[derive(Debug, Default)]
pub(crate) enum Cursor {
    #[default]
    NotStarted,
    Decided(Record),
    Advanced,
    Exhausted,
}

impl Cursor {
    /// Run the decision step unless a record is already decided
    ///
    /// `advance` finds the next candidate; `None` exhausts the cursor.
    pub(crate) fn decide<F>(&mut self, advance: F) -> Result<bool>
    where
        F: FnOnce() -> Result<Option<Record>>,
    {
        match self {
            Cursor::Decided(_) => Ok(true),
            Cursor::Exhausted => Ok(false),
            Cursor::NotStarted | Cursor::Advanced => match advance()? {
                Some(record) => {
                    *self = Cursor::Decided(record);
                    Ok(true)
                }
                None => {
                    *self = Cursor::Exhausted;
                    Ok(false)
                }
            },
        }
    }

    /// Take the decided record, leaving the cursor advanced
    pub(crate) fn take(&mut self) -> Result<Record> {
        match std::mem::replace(self, Cursor::Advanced) {
            Cursor::Decided(record) => Ok(record),
            previous => {
                *self = previous;
                Err(RosterError::IteratorExhausted)
            }
        }
    }
}
