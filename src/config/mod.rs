//! Configuration module for the harvester
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key is optional; missing values fall back to [`Config::default`].
//!
//! # Example
//!
//! ```no_run
//! use global_harvester::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvester.toml")).unwrap();
//! println!("Worker pool size: {}", config.collector.max_concurrency);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{CollectorConfig, Config, OutputConfig, SourcesConfig, DEFAULT_USER_AGENT};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
