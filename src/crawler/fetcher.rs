//! HTTP fetcher implementation
//!
//! This module handles every request the crawler makes:
//! - Building one HTTP client with a browser-like header set and a fixed timeout
//! - Sleeping a randomized politeness delay before each request
//! - Turning transport errors and non-success responses into soft failures
//!
//! There is no retry. One attempt per call is final for that call.

use crate::config::PolitenessConfig;
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, UPGRADE_INSECURE_REQUESTS};
use reqwest::Client;
use scraper::Html;
use std::fmt;
use std::time::Duration;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// A successfully fetched page
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Final URL after redirects
    pub url: String,
    /// HTTP status code
    pub status: u16,
    /// Raw response body
    pub body: String,
}

impl Document {
    pub fn new(url: impl Into<String>, status: u16, body: String) -> Self {
        Self {
            url: url.into(),
            status,
            body,
        }
    }

    /// Parses the body into a DOM
    pub fn html(&self) -> Html {
        Html::parse_document(&self.body)
    }
}

/// Why a fetch produced no document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    /// The server answered with a non-success status
    Status(u16),
    /// The request did not finish within the configured timeout
    Timeout,
    /// The connection could not be established
    Connect(String),
    /// The body could not be read
    Body(String),
    /// Any other transport error
    Other(String),
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(code) => write!(f, "HTTP {}", code),
            Self::Timeout => f.write_str("request timeout"),
            Self::Connect(e) => write!(f, "connection failed: {}", e),
            Self::Body(e) => write!(f, "failed to read body: {}", e),
            Self::Other(e) => f.write_str(e),
        }
    }
}

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchOutcome {
    Document(Document),
    Failure(FetchFailure),
}

/// A randomized pause drawn uniformly from `[min, max]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolitenessDelay {
    min: Duration,
    max: Duration,
}

impl PolitenessDelay {
    pub fn from_millis(min_ms: u64, max_ms: u64) -> Self {
        Self {
            min: Duration::from_millis(min_ms.min(max_ms)),
            max: Duration::from_millis(max_ms.max(min_ms)),
        }
    }

    /// Pause applied before every request
    pub fn before_request(config: &PolitenessConfig) -> Self {
        Self::from_millis(config.min_delay_ms, config.max_delay_ms)
    }

    /// Extra pause applied after a newly seen book
    pub fn after_book(config: &PolitenessConfig) -> Self {
        Self::from_millis(config.book_delay_min_ms, config.book_delay_max_ms)
    }

    /// Draws one delay from the range
    pub fn sample(&self) -> Duration {
        if self.max <= self.min {
            return self.min;
        }
        let (min, max) = (self.min.as_millis() as u64, self.max.as_millis() as u64);
        Duration::from_millis(rand::thread_rng().gen_range(min..=max))
    }

    pub async fn wait(&self) {
        let delay = self.sample();
        if !delay.is_zero() {
            tracing::trace!("Politeness delay {}ms", delay.as_millis());
            tokio::time::sleep(delay).await;
        }
    }
}

/// Builds the HTTP client shared by every request of a run
///
/// # Arguments
///
/// * `config` - The politeness configuration (for the request timeout)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &PolitenessConfig) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));

    Client::builder()
        .user_agent(BROWSER_USER_AGENT)
        .default_headers(headers)
        .timeout(config.request_timeout())
        .connect_timeout(config.request_timeout())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Politeness-delayed, single-attempt page fetcher
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    delay: PolitenessDelay,
}

impl Fetcher {
    pub fn new(client: Client, delay: PolitenessDelay) -> Self {
        Self { client, delay }
    }

    /// Builds a fetcher and its client from configuration
    pub fn from_config(config: &PolitenessConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::new(
            build_http_client(config)?,
            PolitenessDelay::before_request(config),
        ))
    }

    /// Fetches a page after the politeness delay
    ///
    /// Failures are logged here and returned as values; they are never fatal.
    pub async fn fetch(&self, url: &str) -> FetchOutcome {
        self.delay.wait().await;
        tracing::debug!("Requesting: {}", url);

        let outcome = fetch_url(&self.client, url).await;
        if let FetchOutcome::Failure(failure) = &outcome {
            tracing::warn!("Fetch failed for {}: {}", url, failure);
        }
        outcome
    }
}

/// Sends one GET and classifies the result
pub async fn fetch_url(client: &Client, url: &str) -> FetchOutcome {
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => return FetchOutcome::Failure(classify_error(&e)),
    };

    let status = response.status();
    if !status.is_success() {
        return FetchOutcome::Failure(FetchFailure::Status(status.as_u16()));
    }

    let final_url = response.url().to_string();
    match response.text().await {
        Ok(body) => FetchOutcome::Document(Document::new(final_url, status.as_u16(), body)),
        Err(e) if e.is_timeout() => FetchOutcome::Failure(FetchFailure::Timeout),
        Err(e) => FetchOutcome::Failure(FetchFailure::Body(e.to_string())),
    }
}

fn classify_error(e: &reqwest::Error) -> FetchFailure {
    if e.is_timeout() {
        FetchFailure::Timeout
    } else if e.is_connect() {
        FetchFailure::Connect(e.to_string())
    } else {
        FetchFailure::Other(e.to_string())
    }
}
