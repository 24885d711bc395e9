//! Engine Module
//!
//! Builds the store a caller asked for.
//!
//! ## Responsibilities
//! - Select the backend at construction time
//! - Compose the optional timing and call-logging decorators
//!
//! Callers hold a `Box<dyn RecordStore>` and never inspect which backend
//! sits behind it.

use crate::config::{Backend, Config};
use crate::error::Result;
use crate::storage::{FileStore, LoggedStore, MemoryStore, RecordStore, TimedStore};

/// Open the store described by `config`
///
/// Decorators wrap from the inside out: backend, then timing, then call log,
/// so logged calls include the timing overhead.
pub fn open_store(config: &Config) -> Result<Box<dyn RecordStore>> {
    let mut store: Box<dyn RecordStore> = match config.backend {
        Backend::Memory => Box::new(MemoryStore::new()),
        Backend::File => Box::new(FileStore::open(&config.data_file)?),
    };

    if config.timing {
        store = Box::new(TimedStore::new(store));
    }
    if config.call_log {
        store = Box::new(LoggedStore::new(store));
    }

    tracing::info!(
        backend = ?config.backend,
        timing = config.timing,
        call_log = config.call_log,
        "Store ready"
    );
    Ok(store)
}
