//! Collection report generation
//!
//! The report is a read-only snapshot: row counts per record variant, the
//! byte footprint of the data directory, and the number of archive files.

use crate::record::RecordKind;
use crate::storage::{is_archive_file, PersistError, PersistenceSink};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while generating or writing the report
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Store unreachable: {0}")]
    Store(#[from] PersistError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Row counts keyed the way the report file names them
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DataSources {
    pub web_scraping: u64,
    pub api_data: u64,
    pub news_articles: u64,
}

impl DataSources {
    pub fn get(&self, kind: RecordKind) -> u64 {
        match kind {
            RecordKind::WebPage => self.web_scraping,
            RecordKind::ApiPayload => self.api_data,
            RecordKind::NewsArticle => self.news_articles,
        }
    }

    pub fn total(&self) -> u64 {
        self.web_scraping + self.api_data + self.news_articles
    }
}

/// End-of-run summary; never mutated after creation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionReport {
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: DateTime<Utc>,

    pub data_sources: DataSources,

    #[serde(rename = "storage_size", serialize_with = "serialize_size")]
    pub storage_size_bytes: u64,

    #[serde(rename = "file_count")]
    pub file_count: u64,
}

impl CollectionReport {
    /// Storage footprint as shown in the report file
    pub fn storage_size(&self) -> String {
        format_size(self.storage_size_bytes)
    }
}

fn serialize_timestamp<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Micros, true))
}

fn serialize_size<S: Serializer>(bytes: &u64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_size(*bytes))
}

/// Formats a byte count in megabytes with two decimals, e.g. `"12.34 MB"`
pub fn format_size(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
}

/// Totals gathered from walking the data directory
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DirectoryFootprint {
    pub total_bytes: u64,
    pub archive_files: u64,
}

/// Walks `dir` recursively, summing file sizes and counting archive files
///
/// `exclude` (the report file) is left out so regenerating the report does
/// not change its own storage figure.
pub fn measure_directory(dir: &Path, exclude: Option<&Path>) -> std::io::Result<DirectoryFootprint> {
    let mut footprint = DirectoryFootprint::default();
    let mut stack = vec![dir.to_path_buf()];

    while let Some(current) = stack.pop() {
        for entry in std::fs::read_dir(&current)? {
            let entry = entry?;
            let path = entry.path();
            let file_type = entry.file_type()?;

            if file_type.is_dir() {
                stack.push(path);
                continue;
            }
            if exclude.map_or(false, |ex| ex == path.as_path()) {
                continue;
            }

            footprint.total_bytes += entry.metadata()?.len();
            if entry.file_name().to_str().map_or(false, is_archive_file) {
                footprint.archive_files += 1;
            }
        }
    }

    Ok(footprint)
}

/// Builds the report from the sink's current state
///
/// # Arguments
///
/// * `sink` - The persistence sink to read from (never written)
/// * `report_path` - Where the report will be written; excluded from the size
///
/// # Returns
///
/// * `Ok(CollectionReport)` - Counts and footprint
/// * `Err(ReportError)` - The store or data directory could not be read
pub fn generate_report(sink: &PersistenceSink, report_path: &Path) -> Result<CollectionReport, ReportError> {
    let counts = sink.snapshot_counts()?;
    let count = |kind: RecordKind| counts.get(&kind).copied().unwrap_or(0);

    let footprint = measure_directory(sink.data_dir(), Some(report_path))?;

    Ok(CollectionReport {
        timestamp: Utc::now(),
        data_sources: DataSources {
            web_scraping: count(RecordKind::WebPage),
            api_data: count(RecordKind::ApiPayload),
            news_articles: count(RecordKind::NewsArticle),
        },
        storage_size_bytes: footprint.total_bytes,
        file_count: footprint.archive_files,
    })
}

/// Writes the report as pretty-printed JSON
pub fn write_report(report: &CollectionReport, path: &Path) -> Result<(), ReportError> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(path, json)?;
    Ok(())
}
