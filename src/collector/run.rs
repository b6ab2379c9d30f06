//! Collection run - end-to-end orchestration of one invocation
//!
//! A run:
//! 1. Opens the persistence sink under the configured data directory
//! 2. Builds the job list from every configured source group
//! 3. Dispatches the jobs and waits for all of them to finish
//! 4. Generates and writes the collection report
//!
//! Everything a run needs is held by the `CollectionRun` value itself, so
//! several independent runs can coexist in one process.

use crate::collector::dispatcher::Dispatcher;
use crate::collector::fetcher::Fetcher;
use crate::collector::job::{build_jobs, Job};
use crate::config::{validate, Config};
use crate::output::{generate_report, write_report, CollectionReport};
use crate::state::DispatchSummary;
use crate::storage::PersistenceSink;
use crate::HarvestError;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Report plus the per-job accounting behind it
#[derive(Debug)]
pub struct RunSummary {
    pub report: CollectionReport,
    pub dispatch: DispatchSummary,
    pub report_path: PathBuf,
}

/// One end-to-end collection
pub struct CollectionRun {
    config: Config,
    sink: Arc<PersistenceSink>,
    fetcher: Arc<Fetcher>,
    cancelled: Arc<AtomicBool>,
}

impl CollectionRun {
    /// Prepares a run: validates the config, opens storage and builds the
    /// HTTP client
    ///
    /// # Returns
    ///
    /// * `Ok(CollectionRun)` - Ready to execute
    /// * `Err(HarvestError)` - Invalid config, or storage or client setup failed
    pub fn new(config: Config) -> Result<Self, HarvestError> {
        validate(&config)?;

        let data_dir = Path::new(&config.output.data_dir);
        let sink = PersistenceSink::open(data_dir, &config.output.database_name)?;
        let fetcher = Fetcher::new(&config.collector)?;

        Ok(Self {
            config,
            sink: Arc::new(sink),
            fetcher: Arc::new(fetcher),
            cancelled: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Flag that, once set, stops the run from starting further jobs
    pub fn cancellation_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    pub fn sink(&self) -> &PersistenceSink {
        &self.sink
    }

    /// The jobs this run will dispatch
    pub fn jobs(&self) -> Vec<Job> {
        build_jobs(&self.config.sources)
    }

    fn report_path(&self) -> PathBuf {
        self.sink.data_dir().join(&self.config.output.report_name)
    }

    /// Runs the collection and returns the written report
    pub async fn execute(&self) -> Result<CollectionReport, HarvestError> {
        Ok(self.execute_with_summary().await?.report)
    }

    /// Runs the collection and returns the report with per-job outcomes
    ///
    /// The concurrency setting is checked before any job runs. When the run
    /// is cancelled during dispatch no report is written and
    /// `HarvestError::Interrupted` is returned; records already appended stay.
    pub async fn execute_with_summary(&self) -> Result<RunSummary, HarvestError> {
        let dispatcher = Dispatcher::new(
            Arc::clone(&self.fetcher),
            Arc::clone(&self.sink),
            self.config.collector.max_concurrency as usize,
        )?
        .with_cancellation(Arc::clone(&self.cancelled));

        tracing::info!(
            "Starting global data collection process with {} workers",
            dispatcher.max_concurrency()
        );
        let start_time = Instant::now();

        let jobs = self.jobs();
        let dispatch = dispatcher.run(jobs).await;

        tracing::info!(
            "Completed data collection in {:.2} seconds",
            start_time.elapsed().as_secs_f64()
        );

        if self.cancelled.load(Ordering::SeqCst) {
            tracing::warn!(
                "Collection interrupted: {} jobs never started, skipping report",
                dispatch.cancelled()
            );
            return Err(HarvestError::Interrupted);
        }

        let report_path = self.report_path();
        let report = generate_report(&self.sink, &report_path)?;
        write_report(&report, &report_path)?;
        tracing::info!("Generated summary report at {}", report_path.display());

        Ok(RunSummary {
            report,
            dispatch,
            report_path,
        })
    }
}

/// Runs one complete collection with the given configuration
///
/// # Example
///
/// ```no_run
/// use global_harvester::collector::run_collection;
/// use global_harvester::config::Config;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let report = run_collection(Config::default()).await?;
/// println!("{} pages", report.data_sources.web_scraping);
/// # Ok(())
/// # }
/// ```
pub async fn run_collection(config: Config) -> Result<CollectionReport, HarvestError> {
    CollectionRun::new(config)?.execute().await
}
