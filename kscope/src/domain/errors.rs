//! Structured error types for kscope
//!
//! Using thiserror for automatic Display implementation and error chaining.

use super::types::{Status, TableKind};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DumpError {
    #[error("couldn't get copy of {table}: {status}")]
    SnapshotUnavailable { table: TableKind, status: Status },

    #[error("couldn't get {table} needed to interpret the dump: {status}")]
    MetadataUnavailable { table: TableKind, status: Status },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DumpError {
    /// Whether the dump can be reported to the operator and skipped
    ///
    /// Snapshot and metadata failures are reported on the output sink; only
    /// a broken sink aborts the session.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, DumpError::Io(_))
    }
}

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to read kernel image {path}: {error}")]
    Read { path: String, error: std::io::Error },

    #[error("Failed to parse kernel image: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{table} holds {count} entries, capacity is {capacity}")]
    TableOverflow { table: TableKind, count: usize, capacity: usize },

    #[error("{table}: entry {nr} has no slot in the table")]
    SlotOutOfRange { table: TableKind, nr: i64 },

    #[error("{table}: slot {slot} given twice")]
    DuplicateSlot { table: TableKind, slot: usize },

    #[error("{table}: field {field} is {len} bytes, at most {max} fit")]
    FieldTooLong { table: TableKind, field: &'static str, len: usize, max: usize },
}
