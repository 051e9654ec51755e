//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlPhase`: where the orchestrator is in its run (idle, running at a depth, done)
//! - `VisitedSet`: durable, grow-only set of user or book identifiers already handled

mod crawl_phase;
mod visited;

use std::path::PathBuf;
use thiserror::Error;

pub use crawl_phase::CrawlPhase;
pub use visited::{VisitedDomain, VisitedSet};

/// Errors raised while persisting visited-set snapshots
#[derive(Debug, Error)]
pub enum StateError {
    #[error("Snapshot IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Snapshot serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
