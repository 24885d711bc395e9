//! Error types for RosterDB
//!
//! Provides a unified error type for all store, query and interchange operations.
//! A query that matches nothing is not an error: it yields zero records.

use thiserror::Error;

/// Result type alias using RosterError
pub type Result<T> = std::result::Result<T, RosterError>;

/// Unified error type for RosterDB operations
#[derive(Debug, Error)]
pub enum RosterError {
    // -------------------------------------------------------------------------
    // Caller Errors
    // -------------------------------------------------------------------------
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unknown field: {0}")]
    UnknownField(String),

    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Iterator exhausted: no more records")]
    IteratorExhausted,

    // -------------------------------------------------------------------------
    // Interchange Errors
    // -------------------------------------------------------------------------
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    #[error("Interchange error: {0}")]
    Interchange(String),
}

impl From<csv::Error> for RosterError {
    fn from(err: csv::Error) -> Self {
        if err.is_io_error() {
            match err.into_kind() {
                csv::ErrorKind::Io(io) => RosterError::Io(io),
                other => RosterError::Interchange(format!("{:?}", other)),
            }
        } else {
            RosterError::Interchange(err.to_string())
        }
    }
}
