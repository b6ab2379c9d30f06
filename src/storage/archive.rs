//! Flat-file archive of fetched content
//!
//! One JSON file per successful page or API fetch, written next to the
//! database. File names carry a second-resolution timestamp plus a
//! per-archive sequence number, so two writes finishing in the same second
//! still land in different files. Files are created with `create_new`: a
//! name clash is reported as an error and never overwrites an earlier file.

use crate::storage::traits::StorageResult;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Which kind of payload an archive file holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    WebPage,
    Api,
}

impl ArchiveKind {
    /// Fixed file name prefix for this kind
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::WebPage => "webpage_",
            Self::Api => "api_",
        }
    }
}

/// Returns true if `file_name` looks like an archive file
pub fn is_archive_file(file_name: &str) -> bool {
    file_name.ends_with(".json")
        && [ArchiveKind::WebPage, ArchiveKind::Api]
            .iter()
            .any(|kind| file_name.starts_with(kind.prefix()))
}

/// Builds an archive file name: `<prefix><YYYYMMDD_HHMMSS>_<seq>.json`
pub fn archive_file_name(kind: ArchiveKind, at: DateTime<Utc>, sequence: u64) -> String {
    format!(
        "{}{}_{:04}.json",
        kind.prefix(),
        at.format("%Y%m%d_%H%M%S"),
        sequence
    )
}

/// Archive directory writer
#[derive(Debug)]
pub struct Archive {
    dir: PathBuf,
    sequence: AtomicU64,
}

impl Archive {
    /// Creates the archive directory if needed
    pub fn open(dir: &Path) -> StorageResult<Self> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            sequence: AtomicU64::new(0),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes `payload` pretty-printed into a new archive file
    ///
    /// # Returns
    ///
    /// * `Ok(PathBuf)` - Path of the file written
    /// * `Err(PersistError)` - Serialization or filesystem failure
    pub fn write<T: Serialize + ?Sized>(&self, kind: ArchiveKind, payload: &T) -> StorageResult<PathBuf> {
        let body = serde_json::to_string_pretty(payload)?;

        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        let path = self.dir.join(archive_file_name(kind, Utc::now(), sequence));

        let mut file = OpenOptions::new().write(true).create_new(true).open(&path)?;
        file.write_all(body.as_bytes())?;
        file.sync_all()?;

        Ok(path)
    }
}
