//! bookgraph: a resumable breadth-first crawler for a social-reading site
//!
//! Starting from a seed user, the crawler walks user → read books → other
//! reviewers of those books, persisting profiles, interactions and book
//! metadata into SQLite. Visited users and books are snapshotted after every
//! mutation so an interrupted crawl picks up where it left off.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for bookgraph operations
#[derive(Debug, Error)]
pub enum BookgraphError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Visited-state error: {0}")]
    State(#[from] state::StateError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for bookgraph operations
pub type Result<T> = std::result::Result<T, BookgraphError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

pub use config::Config;
pub use crawler::{Coordinator, CrawlReport};
pub use extract::{BookMetadata, EntityKind, Extraction, Interaction, Rating, UserProfile};
pub use state::{CrawlPhase, VisitedDomain, VisitedSet};
