//! Output module for reporting on collected data
//!
//! This module handles:
//! - Generating the end-of-run collection report
//! - Writing the report as JSON into the data directory
//! - Loading and printing statistics for an existing data directory

mod report;
pub mod stats;

pub use report::{
    format_size, generate_report, measure_directory, write_report, CollectionReport, DataSources,
    DirectoryFootprint, ReportError,
};
pub use stats::{load_statistics, print_statistics, StoreStatistics};
