use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for bookgraph
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub politeness: PolitenessConfig,
    #[serde(default)]
    pub site: SiteConfig,
    pub output: OutputConfig,
}

/// Traversal parameters, fixed for the lifetime of a run
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// User the breadth-first walk starts from
    #[serde(rename = "seed-user")]
    pub seed_user: String,

    /// Number of BFS levels to process (0 processes nothing)
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Maximum reviewers harvested per book
    #[serde(rename = "reviewers-per-book")]
    pub reviewers_per_book: usize,

    /// Cap on read-list pages fetched per user; unlimited when absent
    #[serde(rename = "max-interaction-pages", default)]
    pub max_interaction_pages: Option<u32>,
}

/// Request pacing and HTTP timeouts
#[derive(Debug, Clone, Deserialize)]
pub struct PolitenessConfig {
    /// Lower bound of the randomized pause before every request (milliseconds)
    #[serde(rename = "min-delay-ms", default = "default_min_delay_ms")]
    pub min_delay_ms: u64,

    /// Upper bound of the randomized pause before every request (milliseconds)
    #[serde(rename = "max-delay-ms", default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Lower bound of the extra pause after a newly seen book (milliseconds)
    #[serde(rename = "book-delay-min-ms", default = "default_book_delay_min_ms")]
    pub book_delay_min_ms: u64,

    /// Upper bound of the extra pause after a newly seen book (milliseconds)
    #[serde(rename = "book-delay-max-ms", default = "default_book_delay_max_ms")]
    pub book_delay_max_ms: u64,

    /// Whole-request timeout (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl PolitenessConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for PolitenessConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: default_min_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            book_delay_min_ms: default_book_delay_min_ms(),
            book_delay_max_ms: default_book_delay_max_ms(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_min_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    3000
}

fn default_book_delay_min_ms() -> u64 {
    1000
}

fn default_book_delay_max_ms() -> u64 {
    2000
}

fn default_request_timeout_secs() -> u64 {
    10
}

/// Target site
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Scheme and host every page URL is built from
    #[serde(rename = "base-url", default = "default_base_url")]
    pub base_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

fn default_base_url() -> String {
    "https://www.goodreads.com".to_string()
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Directory holding the visited-user and visited-book snapshots
    #[serde(rename = "state-dir")]
    pub state_dir: String,
}
