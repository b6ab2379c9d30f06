//! Global Harvester: a multi-source data collector
//!
//! This crate fetches web pages, JSON APIs and RSS feeds from a fixed list of
//! sources, normalizes each response into a [`record::Record`], persists the
//! records to SQLite plus a flat-file archive, and writes a summary report.

pub mod collector;
pub mod config;
pub mod output;
pub mod record;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for harvester operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Persistence error: {0}")]
    Persist(#[from] storage::PersistError),

    #[error("Report error: {0}")]
    Report(#[from] output::ReportError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Collection run interrupted before dispatch drained")]
    Interrupted,
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for harvester operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use collector::{CollectionRun, Dispatcher, Job, JobKind};
pub use config::Config;
pub use output::CollectionReport;
pub use record::{Record, RecordKind};
pub use state::JobOutcome;
pub use storage::PersistenceSink;
