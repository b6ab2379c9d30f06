//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::record::{Record, RecordKind};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors that can occur while persisting records or archive files
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store lock poisoned by a panicked writer")]
    LockPoisoned,
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, PersistError>;

/// Trait for structured store implementations
///
/// The store is three append-only collections, one per [`RecordKind`].
/// The record variant alone decides the target collection.
pub trait Storage {
    /// Appends a record and returns its surrogate id
    ///
    /// The row must be durable once this returns.
    fn append(&mut self, record: &Record) -> StorageResult<i64>;

    /// Counts the rows stored for one variant
    fn count_records(&self, kind: RecordKind) -> StorageResult<u64>;

    /// Counts rows for every variant
    fn snapshot_counts(&self) -> StorageResult<BTreeMap<RecordKind, u64>> {
        let mut counts = BTreeMap::new();
        for kind in RecordKind::ALL {
            counts.insert(kind, self.count_records(kind)?);
        }
        Ok(counts)
    }
}
