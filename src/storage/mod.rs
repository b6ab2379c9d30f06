//! Storage module for persisting collected records
//!
//! This module handles:
//! - SQLite database initialization and schema management
//! - Appending records to the table matching their variant
//! - The flat-file archive of fetched pages and API documents
//! - The shared [`PersistenceSink`] that serializes concurrent writes

mod archive;
mod schema;
mod sink;
mod sqlite;
mod traits;

pub use archive::{archive_file_name, is_archive_file, Archive, ArchiveKind};
pub use sink::PersistenceSink;
pub use sqlite::SqliteStorage;
pub use traits::{PersistError, Storage, StorageResult};

use std::path::Path;

/// Opens the persistence sink rooted at `data_dir`
///
/// # Returns
///
/// * `Ok(PersistenceSink)` - Directory created and database ready
/// * `Err(PersistError)` - Failed to create the directory or open the database
pub fn open_sink(data_dir: &Path, database_name: &str) -> StorageResult<PersistenceSink> {
    PersistenceSink::open(data_dir, database_name)
}
