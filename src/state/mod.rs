//! State module for tracking collection progress
//!
//! # Components
//!
//! - `JobOutcome`: the terminal state of one job (completed, failed, cancelled)
//! - `JobError`: a failure attributed to the stage that raised it
//! - `DispatchSummary`: per-job outcomes for a whole dispatch

mod job_state;

// Re-export main types
pub use job_state::{DispatchSummary, JobError, JobOutcome, JobReport};
