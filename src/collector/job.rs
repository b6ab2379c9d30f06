//! Jobs: one fetch/parse unit of work per configured source

use crate::config::SourcesConfig;
use std::fmt;

/// How a source is fetched and parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    /// HTML page, scraped into one WebPage record
    Page,
    /// JSON endpoint, wrapped into one ApiPayload record
    Api,
    /// RSS feed, one NewsArticle record per item
    RssFeed,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Page => "page",
            Self::Api => "api",
            Self::RssFeed => "rss",
        };
        write!(f, "{}", name)
    }
}

/// A single immutable unit of work
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    source_url: String,
    kind: JobKind,
}

impl Job {
    pub fn new(source_url: impl Into<String>, kind: JobKind) -> Self {
        Self {
            source_url: source_url.into(),
            kind,
        }
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn kind(&self) -> JobKind {
        self.kind
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.source_url, self.kind)
    }
}

/// Picks the parser for a news source: feeds are recognized by "rss" in the URL
pub fn classify_news_source(url: &str) -> JobKind {
    if url.contains("rss") {
        JobKind::RssFeed
    } else {
        JobKind::Api
    }
}

/// Flattens every configured source group into the job list for one run
///
/// Dataset and government groups are scraped like pages. Social entries need
/// credentials this system does not hold; each is logged and skipped.
pub fn build_jobs(sources: &SourcesConfig) -> Vec<Job> {
    let mut jobs = Vec::new();

    jobs.extend(sources.pages.iter().map(|u| Job::new(u, JobKind::Page)));
    jobs.extend(sources.apis.iter().map(|u| Job::new(u, JobKind::Api)));
    jobs.extend(sources.feeds.iter().map(|u| Job::new(u, JobKind::RssFeed)));
    jobs.extend(
        sources
            .news
            .iter()
            .map(|u| Job::new(u, classify_news_source(u))),
    );
    jobs.extend(sources.datasets.iter().map(|u| Job::new(u, JobKind::Page)));
    jobs.extend(sources.government.iter().map(|u| Job::new(u, JobKind::Page)));

    for platform in &sources.social {
        tracing::warn!(
            "Social media collection for {} would require API authentication; skipping",
            platform
        );
    }

    jobs
}
