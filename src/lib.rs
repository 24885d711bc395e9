//! # RosterDB
//!
//! A small record store for personal records with:
//! - An in-memory backend and a flat-file backend behind one store contract
//! - Tombstone delete with purge/compaction on the file backend
//! - AND/OR predicate queries shared by find, update and delete
//! - Lazy, forward-only iteration over search results
//! - Snapshots with CSV and XML interchange
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Caller (command handlers)                    │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │  Box<dyn RecordStore>
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │          LoggedStore → TimedStore  (optional)                │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐       ┌───────────┐
//!   │ MemoryStore │          │  FileStore  │──────▶│ slot file │
//!   │   (Vec)     │          │  (slots)    │       └───────────┘
//!   └──────┬──────┘          └──────┬──────┘
//!          └────────────┬───────────┘
//!                       ▼
//!   ┌──────────────────────────┐      ┌────────────────────────┐
//!   │ Query evaluator          │      │ Snapshot  (csv / xml)  │
//!   └──────────────────────────┘      └────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod record;
pub mod query;
pub mod storage;
pub mod snapshot;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{RosterError, Result};
pub use config::{Backend, Config};
pub use engine::open_store;
pub use query::{Combinator, Criteria, Criterion};
pub use record::{Field, FieldChanges, Record, RecordData};
pub use snapshot::{Format, Snapshot};
pub use storage::{FileStore, MemoryStore, RecordIterator, RecordStore, StoreStat};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of RosterDB
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
