//! Statistics from an existing data directory
//!
//! Used by `--stats` to inspect what previous runs left behind without
//! fetching anything.

use crate::output::report::{format_size, measure_directory};
use crate::record::RecordKind;
use crate::storage::PersistenceSink;
use crate::HarvestError;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Store statistics summary
#[derive(Debug, Clone)]
pub struct StoreStatistics {
    /// Database file the counts were read from
    pub database_path: PathBuf,

    /// Row count per record variant
    pub records_by_kind: BTreeMap<RecordKind, u64>,

    /// Bytes used by every file under the data directory
    pub storage_bytes: u64,

    /// Number of archive files
    pub archive_files: u64,
}

impl StoreStatistics {
    pub fn total_records(&self) -> u64 {
        self.records_by_kind.values().sum()
    }
}

/// Loads statistics from the sink and its data directory
///
/// # Returns
///
/// * `Ok(StoreStatistics)` - Successfully loaded statistics
/// * `Err(HarvestError)` - The store or directory could not be read
pub fn load_statistics(sink: &PersistenceSink) -> Result<StoreStatistics, HarvestError> {
    let records_by_kind = sink.snapshot_counts()?;
    let footprint = measure_directory(sink.data_dir(), None)?;

    Ok(StoreStatistics {
        database_path: sink.database_path().to_path_buf(),
        records_by_kind,
        storage_bytes: footprint.total_bytes,
        archive_files: footprint.archive_files,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &StoreStatistics) {
    println!("=== Collection Statistics ===\n");

    println!("Database: {}", stats.database_path.display());
    println!("  Total records: {}", stats.total_records());
    println!();

    println!("Records by Kind:");
    let total = stats.total_records();
    for kind in RecordKind::ALL {
        let count = stats.records_by_kind.get(&kind).copied().unwrap_or(0);
        let percentage = if total > 0 {
            (count as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        println!(
            "  {} ({}): {} ({:.1}%)",
            kind.report_key(),
            kind.table_name(),
            count,
            percentage
        );
    }
    println!();

    println!("Storage:");
    println!("  Size: {}", format_size(stats.storage_bytes));
    println!("  Archive files: {}", stats.archive_files);
}
