//! Terminal job outcomes and per-run dispatch accounting
//!
//! Every submitted job ends in exactly one [`JobOutcome`]. Failures keep the
//! stage that produced them so logs and summaries can attribute them precisely.
use crate::collector::{FetchError, Job, ParseError};
use std::fmt;
use thiserror::Error;

/// A staged per-job failure
#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The worker task panicked or was aborted
    #[error("worker task for {source_url} did not finish: {message}")]
    Worker { source_url: String, message: String },
}

impl JobError {
    /// Name of the stage that failed
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Fetch(_) => "fetch",
            Self::Parse(_) => "parse",
            Self::Worker { .. } => "worker",
        }
    }
}

/// How a job ended
#[derive(Debug)]
pub enum JobOutcome {
    /// Fetch and parse succeeded; `dropped` records failed to persist
    Completed { appended: usize, dropped: usize },

    /// A stage failed before any record was produced
    Failed(JobError),

    /// Never started because the run was cancelled
    Cancelled,
}

impl JobOutcome {
    /// Every produced record was persisted (including zero-record feeds)
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed { dropped: 0, .. })
    }

    /// Some records were persisted and others dropped
    pub fn is_partial(&self) -> bool {
        matches!(self, Self::Completed { dropped, .. } if *dropped > 0)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Records this job left in the store
    pub fn appended(&self) -> usize {
        match self {
            Self::Completed { appended, .. } => *appended,
            _ => 0,
        }
    }

    /// Returns the failure, if any
    pub fn error(&self) -> Option<&JobError> {
        match self {
            Self::Failed(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for JobOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed {
                appended,
                dropped: 0,
            } => write!(f, "succeeded ({} records)", appended),
            Self::Completed { appended, dropped } => write!(
                f,
                "partially succeeded ({} records, {} dropped)",
                appended, dropped
            ),
            Self::Failed(e) => write!(f, "failed at {}: {}", e.stage(), e),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A job paired with how it ended
#[derive(Debug)]
pub struct JobReport {
    pub job: Job,
    pub outcome: JobOutcome,
}

/// Outcomes of every job submitted to one dispatch, in submission order
#[derive(Debug, Default)]
pub struct DispatchSummary {
    pub reports: Vec<JobReport>,
}

impl DispatchSummary {
    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.count(JobOutcome::is_success)
    }

    pub fn partial(&self) -> usize {
        self.count(JobOutcome::is_partial)
    }

    pub fn failed(&self) -> usize {
        self.count(JobOutcome::is_failed)
    }

    pub fn cancelled(&self) -> usize {
        self.count(JobOutcome::is_cancelled)
    }

    /// Total records persisted across all jobs
    pub fn records_appended(&self) -> usize {
        self.reports.iter().map(|r| r.outcome.appended()).sum()
    }

    /// Reports for jobs that failed
    pub fn failures(&self) -> impl Iterator<Item = &JobReport> {
        self.reports.iter().filter(|r| r.outcome.is_failed())
    }

    fn count(&self, pred: fn(&JobOutcome) -> bool) -> usize {
        self.reports.iter().filter(|r| pred(&r.outcome)).count()
    }
}
