//! Global Harvester main entry point
//!
//! This is the command-line interface for the multi-source data collector.

use clap::Parser;
use global_harvester::collector::{build_jobs, CollectionRun};
use global_harvester::config::{load_config_with_hash, validate, Config};
use global_harvester::HarvestError;
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use tracing_subscriber::EnvFilter;

/// Global Harvester: a multi-source data collector
///
/// Fetches web pages, JSON APIs and RSS feeds with a bounded number of
/// concurrent requests, stores the results in SQLite plus a flat-file
/// archive, and writes a summary report.
#[derive(Parser, Debug)]
#[command(name = "global-harvester")]
#[command(version = "1.0.0")]
#[command(about = "A multi-source data collector", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in sources when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show the jobs that would run without fetching
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the data directory and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_collect(config).await?;
    }

    Ok(())
}

fn load(path: Option<&Path>) -> Result<Config, HarvestError> {
    match path {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            Ok(config)
        }
        None => {
            tracing::info!("No configuration file given, using built-in sources");
            let config = Config::default();
            validate(&config)?;
            Ok(config)
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("global_harvester=info,warn"),
            1 => EnvFilter::new("global_harvester=debug,info"),
            2 => EnvFilter::new("global_harvester=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the validated config and job list
fn handle_dry_run(config: &Config) {
    println!("=== Global Harvester Dry Run ===\n");

    println!("Collector Configuration:");
    println!("  Max concurrency: {}", config.collector.max_concurrency);
    println!("  Request timeout: {}ms", config.collector.request_timeout_ms);
    println!("  User agent: {}", config.collector.user_agent);

    println!("\nOutput:");
    println!("  Data directory: {}", config.output.data_dir);
    println!("  Database: {}", config.output.database_name);
    println!("  Report: {}", config.output.report_name);

    if !config.sources.social.is_empty() {
        println!("\nSkipped Social Sources ({}):", config.sources.social.len());
        for url in &config.sources.social {
            println!("  - {}", url);
        }
    }

    let jobs = build_jobs(&config.sources);
    println!("\nJobs ({}):", jobs.len());
    for job in &jobs {
        println!("  - [{}] {}", job.kind(), job.source_url());
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would dispatch {} jobs", jobs.len());
}

/// Handles the --stats mode: shows counts and footprint from the data directory
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    use global_harvester::output::{load_statistics, print_statistics};
    use global_harvester::storage::open_sink;

    let sink = open_sink(Path::new(&config.output.data_dir), &config.output.database_name)?;
    let stats = load_statistics(&sink)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main collection run
async fn handle_collect(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let run = CollectionRun::new(config)?;

    let cancelled = run.cancellation_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight jobs");
            cancelled.store(true, Ordering::SeqCst);
        }
    });

    match run.execute().await {
        Ok(report) => {
            tracing::info!(
                "Collected {} pages, {} API payloads, {} news articles ({}, {} files)",
                report.data_sources.web_scraping,
                report.data_sources.api_data,
                report.data_sources.news_articles,
                report.storage_size(),
                report.file_count
            );
            tracing::info!("Data collection process completed");
            Ok(())
        }
        Err(HarvestError::Interrupted) => {
            tracing::warn!("Data collection interrupted by user");
            Ok(())
        }
        Err(e) => {
            tracing::error!("Collection failed: {}", e);
            Err(e.into())
        }
    }
}
