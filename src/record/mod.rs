//! Normalized records produced by the parsers
//!
//! A [`Record`] is the unit that gets persisted. The variant alone decides
//! which table it lands in; see [`RecordKind::table_name`].

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Source tag stamped on every scraped web page
pub const WEB_SCRAPING_SOURCE: &str = "web_scraping";

/// A scraped HTML page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebPage {
    pub url: String,
    pub title: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub source: String,
}

/// One opaque JSON document returned by an API endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiPayload {
    pub endpoint: String,
    pub data_type: String,
    pub raw_json: String,
    pub timestamp: DateTime<Utc>,
}

/// One `item` of an RSS feed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewsArticle {
    pub title: String,
    pub content: String,
    pub source: String,
    pub published_date: String,
    pub url: String,
    pub authors: String,
    pub timestamp: DateTime<Utc>,
}

/// A normalized, persistable unit of collected data
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Record {
    WebPage(WebPage),
    ApiPayload(ApiPayload),
    NewsArticle(NewsArticle),
}

impl Record {
    /// Returns the variant of this record
    pub fn kind(&self) -> RecordKind {
        match self {
            Self::WebPage(_) => RecordKind::WebPage,
            Self::ApiPayload(_) => RecordKind::ApiPayload,
            Self::NewsArticle(_) => RecordKind::NewsArticle,
        }
    }

    /// Returns the moment this record was parsed
    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::WebPage(r) => r.timestamp,
            Self::ApiPayload(r) => r.timestamp,
            Self::NewsArticle(r) => r.timestamp,
        }
    }
}

/// The closed set of record variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordKind {
    WebPage,
    ApiPayload,
    NewsArticle,
}

impl RecordKind {
    /// All variants, in report order
    pub const ALL: [RecordKind; 3] = [Self::WebPage, Self::ApiPayload, Self::NewsArticle];

    /// Table backing this variant in the structured store
    pub fn table_name(&self) -> &'static str {
        match self {
            Self::WebPage => "web_data",
            Self::ApiPayload => "api_data",
            Self::NewsArticle => "news_articles",
        }
    }

    /// Key used for this variant in the collection report
    pub fn report_key(&self) -> &'static str {
        match self {
            Self::WebPage => "web_scraping",
            Self::ApiPayload => "api_data",
            Self::NewsArticle => "news_articles",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::WebPage => "WebPage",
            Self::ApiPayload => "ApiPayload",
            Self::NewsArticle => "NewsArticle",
        };
        write!(f, "{}", name)
    }
}
