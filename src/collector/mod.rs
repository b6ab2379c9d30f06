//! Collector module: the concurrent collection pipeline
//!
//! This module contains the core collection logic, including:
//! - Job construction from configured source groups
//! - Single-attempt HTTP fetching
//! - Page, API and RSS parsing into records
//! - Bounded-concurrency dispatch with per-job failure isolation
//! - Run orchestration and report generation

mod dispatcher;
mod fetcher;
mod job;
mod parser;
mod run;

pub use dispatcher::{run_job, Dispatcher};
pub use fetcher::{build_http_client, fetch_url, FetchError, FetchFailure, FetchedBody, Fetcher};
pub use job::{build_jobs, classify_news_source, Job, JobKind};
pub use parser::{parse, parse_api, parse_feed, parse_page, ParseError, NO_TITLE};
pub use run::{run_collection, CollectionRun, RunSummary};
