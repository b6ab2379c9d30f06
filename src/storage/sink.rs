//! Persistence sink shared by every worker
//!
//! The sink owns the structured store and the archive directory. Appends go
//! through one mutex (a single logical writer), so concurrent workers never
//! interleave inside a row. Archive writes need no lock: each write gets its
//! own file name.

use crate::record::{Record, RecordKind};
use crate::storage::archive::{Archive, ArchiveKind};
use crate::storage::sqlite::SqliteStorage;
use crate::storage::traits::{PersistError, Storage, StorageResult};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Store plus archive, safe to share behind an `Arc`
pub struct PersistenceSink {
    store: Mutex<SqliteStorage>,
    archive: Archive,
    database_path: PathBuf,
}

impl PersistenceSink {
    /// Opens the sink rooted at `data_dir`
    ///
    /// Creates the directory, then opens (or creates) `database_name` inside it.
    pub fn open(data_dir: &Path, database_name: &str) -> StorageResult<Self> {
        let archive = Archive::open(data_dir)?;
        let database_path = data_dir.join(database_name);
        let store = SqliteStorage::new(&database_path)?;

        Ok(Self {
            store: Mutex::new(store),
            archive,
            database_path,
        })
    }

    /// Directory holding the database and archive files
    pub fn data_dir(&self) -> &Path {
        self.archive.dir()
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, SqliteStorage>> {
        self.store.lock().map_err(|_| PersistError::LockPoisoned)
    }

    /// Appends one record; durable once this returns `Ok`
    pub fn append(&self, record: &Record) -> StorageResult<i64> {
        let id = self.lock()?.append(record)?;
        tracing::debug!("Saved {} row {} to {}", record.kind(), id, record.kind().table_name());
        Ok(id)
    }

    /// Row counts for every record variant
    pub fn snapshot_counts(&self) -> StorageResult<BTreeMap<RecordKind, u64>> {
        self.lock()?.snapshot_counts()
    }

    /// Writes an immutable archive copy of `payload`
    ///
    /// Independent of the structured store: an archive failure never rolls
    /// back an append, and vice versa.
    pub fn archive_raw<T: Serialize + ?Sized>(&self, kind: ArchiveKind, payload: &T) -> StorageResult<PathBuf> {
        self.archive.write(kind, payload)
    }
}
