//! Bounded-concurrency job dispatcher
//!
//! This module handles:
//! - Capping in-flight jobs with a semaphore (`max_concurrency` permits)
//! - Running fetch → parse → append for each job on its own task
//! - Isolating failures: a failed job only ends that job
//! - Joining every spawned task and collecting a per-job outcome
//! - Cooperative cancellation between job starts

use crate::collector::fetcher::Fetcher;
use crate::collector::job::{Job, JobKind};
use crate::collector::parser;
use crate::record::Record;
use crate::state::{DispatchSummary, JobError, JobOutcome, JobReport};
use crate::storage::{ArchiveKind, PersistenceSink};
use crate::ConfigError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

/// Runs jobs across a bounded pool of tokio tasks
pub struct Dispatcher {
    fetcher: Arc<Fetcher>,
    sink: Arc<PersistenceSink>,
    max_concurrency: usize,
    cancelled: Arc<AtomicBool>,
}

impl Dispatcher {
    /// Creates a dispatcher
    ///
    /// # Returns
    ///
    /// * `Ok(Dispatcher)` - Ready to run jobs
    /// * `Err(ConfigError)` - `max_concurrency` is zero
    pub fn new(
        fetcher: Arc<Fetcher>,
        sink: Arc<PersistenceSink>,
        max_concurrency: usize,
    ) -> Result<Self, ConfigError> {
        if max_concurrency == 0 {
            return Err(ConfigError::Validation(
                "max_concurrency must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            fetcher,
            sink,
            max_concurrency,
            cancelled: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Uses an external cancellation flag instead of the dispatcher's own
    pub fn with_cancellation(mut self, cancelled: Arc<AtomicBool>) -> Self {
        self.cancelled = cancelled;
        self
    }

    /// Handle that cancels this dispatcher when set to `true`
    pub fn cancellation_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Runs every job and returns once all of them reached a terminal state
    ///
    /// Jobs start in list order but may finish in any order. The flag is
    /// checked before each job starts; jobs already running are allowed to
    /// finish. Jobs never started are reported as `Cancelled`.
    pub async fn run(&self, jobs: Vec<Job>) -> DispatchSummary {
        if jobs.is_empty() {
            return DispatchSummary::default();
        }

        tracing::info!(
            "Dispatching {} jobs with up to {} in flight ({}ms fetch timeout)",
            jobs.len(),
            self.max_concurrency,
            self.fetcher.timeout().as_millis()
        );

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut pending: Vec<(Job, Option<JoinHandle<JobOutcome>>)> = Vec::with_capacity(jobs.len());

        for job in jobs {
            if self.is_cancelled() {
                pending.push((job, None));
                continue;
            }

            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    pending.push((job, None));
                    continue;
                }
            };

            // Re-check: cancellation may have arrived while waiting for a slot
            if self.is_cancelled() {
                pending.push((job, None));
                continue;
            }

            let fetcher = Arc::clone(&self.fetcher);
            let sink = Arc::clone(&self.sink);
            let task_job = job.clone();
            let handle = tokio::spawn(async move {
                let outcome = run_job(&fetcher, &sink, &task_job).await;
                drop(permit);
                outcome
            });
            pending.push((job, Some(handle)));
        }

        let mut summary = DispatchSummary::default();
        for (job, handle) in pending {
            let outcome = match handle {
                None => JobOutcome::Cancelled,
                Some(handle) => match handle.await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        tracing::error!("Worker for {} did not finish: {}", job, e);
                        JobOutcome::Failed(JobError::Worker {
                            source_url: job.source_url().to_string(),
                            message: e.to_string(),
                        })
                    }
                },
            };
            summary.reports.push(JobReport { job, outcome });
        }

        if summary.cancelled() > 0 {
            tracing::warn!("{} jobs were cancelled before starting", summary.cancelled());
        }
        tracing::info!(
            "Dispatch finished: {} succeeded, {} partial, {} failed, {} records appended",
            summary.succeeded(),
            summary.partial(),
            summary.failed(),
            summary.records_appended()
        );

        summary
    }
}

/// Runs one job: fetch, then parse, then append each record
///
/// Fetch and parse failures end the job. A failed append drops only that
/// record. Archive failures are logged and never affect the outcome.
pub async fn run_job(fetcher: &Fetcher, sink: &PersistenceSink, job: &Job) -> JobOutcome {
    let body = match fetcher.fetch(job.source_url()).await {
        Ok(body) => body,
        Err(e) => {
            tracing::error!("FetchError for {} ({}): {}", job.source_url(), job.kind(), e.cause);
            return JobOutcome::Failed(JobError::Fetch(e));
        }
    };

    let records = match parser::parse(job.kind(), &body.bytes, body.charset(), job.source_url()) {
        Ok(records) => records,
        Err(e) => {
            tracing::error!("ParseError for {} ({}): {}", job.source_url(), job.kind(), e);
            return JobOutcome::Failed(JobError::Parse(e));
        }
    };

    let mut appended = 0;
    let mut dropped = 0;
    for record in &records {
        match sink.append(record) {
            Ok(_) => appended += 1,
            Err(e) => {
                dropped += 1;
                tracing::warn!(
                    "Dropped {} record from {}: {}",
                    record.kind(),
                    job.source_url(),
                    e
                );
            }
        }
    }

    archive(sink, job, &records);

    tracing::info!(
        "Collected {} of {} records from {} ({})",
        appended,
        records.len(),
        job.source_url(),
        job.kind()
    );

    JobOutcome::Completed { appended, dropped }
}

/// Mirrors page and API results into the archive directory
fn archive(sink: &PersistenceSink, job: &Job, records: &[Record]) {
    let result = match (job.kind(), records.first()) {
        (JobKind::Page, Some(record)) if matches!(record, Record::WebPage(_)) => {
            sink.archive_raw(ArchiveKind::WebPage, record)
        }
        (JobKind::Api, Some(Record::ApiPayload(payload))) => {
            match serde_json::from_str::<serde_json::Value>(&payload.raw_json) {
                Ok(document) => sink.archive_raw(ArchiveKind::Api, &document),
                Err(e) => Err(e.into()),
            }
        }
        _ => return,
    };

    match result {
        Ok(path) => tracing::debug!("Archived {} to {}", job.source_url(), path.display()),
        Err(e) => tracing::warn!("Failed to archive {}: {}", job.source_url(), e),
    }
}
