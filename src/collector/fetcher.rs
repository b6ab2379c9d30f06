//! HTTP fetcher implementation
//!
//! One blocking-for-the-worker GET per call with a fixed timeout. There is
//! no retry: a non-success status, a timeout, or any transport failure all
//! come back as a [`FetchError`]. Content is never inspected here; whether
//! the body is valid HTML/JSON/XML is the parser's concern. The declared
//! charset is kept alongside the raw bytes so the parser can decode them.

use crate::config::CollectorConfig;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

/// Why a fetch failed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchFailure {
    #[error("HTTP status {0}")]
    Status(u16),

    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("failed to read response body: {0}")]
    Body(String),

    #[error("{0}")]
    Transport(String),
}

/// A failed fetch, tagged with the URL it was for
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("FetchError for {url}: {cause}")]
pub struct FetchError {
    pub url: String,
    pub cause: FetchFailure,
}

impl FetchError {
    fn new(url: &str, cause: FetchFailure) -> Self {
        Self {
            url: url.to_string(),
            cause,
        }
    }
}

/// Raw response body plus the charset named in its Content-Type header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedBody {
    pub bytes: Vec<u8>,
    pub charset: Option<String>,
}

impl FetchedBody {
    pub fn charset(&self) -> Option<&str> {
        self.charset.as_deref()
    }
}

/// Extracts the `charset` parameter from a Content-Type header
fn content_type_charset(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(CONTENT_TYPE)?.to_str().ok()?;
    value.split(';').skip(1).find_map(|param| {
        let (name, charset) = param.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| charset.trim().trim_matches('"').to_string())
    })
}

/// Builds the HTTP client shared by every worker in a run
///
/// # Arguments
///
/// * `config` - The collector configuration (user agent, timeout)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &CollectorConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_millis(config.request_timeout_ms))
        .connect_timeout(Duration::from_millis(config.request_timeout_ms))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL once and returns the raw body
///
/// | Condition | Result |
/// |-----------|--------|
/// | 2xx | body bytes + declared charset |
/// | any other status | `FetchFailure::Status` |
/// | timeout | `FetchFailure::Timeout` |
/// | connection refused / DNS / TLS | `FetchFailure::Connect` |
/// | body read failure | `FetchFailure::Body` |
pub async fn fetch_url(client: &Client, url: &str, timeout: Duration) -> Result<FetchedBody, FetchError> {
    let response = client
        .get(url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| FetchError::new(url, classify_error(&e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::new(url, FetchFailure::Status(status.as_u16())));
    }
    let charset = content_type_charset(response.headers());

    let body = response.bytes().await.map_err(|e| {
        if e.is_timeout() {
            FetchError::new(url, FetchFailure::Timeout)
        } else {
            FetchError::new(url, FetchFailure::Body(e.to_string()))
        }
    })?;

    Ok(FetchedBody {
        bytes: body.to_vec(),
        charset,
    })
}

fn classify_error(e: &reqwest::Error) -> FetchFailure {
    if e.is_timeout() {
        FetchFailure::Timeout
    } else if e.is_connect() {
        FetchFailure::Connect(e.to_string())
    } else {
        FetchFailure::Transport(e.to_string())
    }
}

/// Fetch capability handed to the dispatcher
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    timeout: Duration,
}

impl Fetcher {
    /// Creates a fetcher from the collector configuration
    pub fn new(config: &CollectorConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client(config)?,
            timeout: Duration::from_millis(config.request_timeout_ms),
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Performs a single fetch attempt
    pub async fn fetch(&self, url: &str) -> Result<FetchedBody, FetchError> {
        fetch_url(&self.client, url, self.timeout).await
    }
}
