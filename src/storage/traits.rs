//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::extract::{BookMetadata, EntityKind, Interaction, UserProfile};
use crate::storage::{PopularBook, Record, RunRecord, RunStatus};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Batch declared as {expected} contains a {found} record")]
    KindMismatch {
        expected: EntityKind,
        found: EntityKind,
    },

    #[error("Entity kind {0} is not persisted")]
    UnsupportedKind(EntityKind),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Every write is an idempotent upsert keyed by the record's primary
/// identifier; the most recent write of an identifier wins.
pub trait Storage {
    // ===== Run Management =====

    /// Creates a new crawl run and returns its ID
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Updates the status of a run
    fn update_run_status(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()>;

    /// Marks a run as completed with a finish timestamp
    fn complete_run(&mut self, run_id: i64) -> StorageResult<()>;

    // ===== Entity Upserts =====

    /// Upserts a single record declared as `kind`
    fn upsert_one(&mut self, kind: EntityKind, record: &Record) -> StorageResult<()>;

    /// Upserts a batch of records declared as `kind` inside one transaction
    ///
    /// Either every record is written or none is. Records without a primary
    /// identifier are skipped. Returns the number of records written.
    fn upsert_batch(&mut self, kind: EntityKind, records: &[Record]) -> StorageResult<usize>;

    // ===== Reads =====

    fn get_user(&self, user_id: &str) -> StorageResult<Option<UserProfile>>;

    fn get_book(&self, book_id: &str) -> StorageResult<Option<BookMetadata>>;

    /// All interactions of one user, ordered by book ID
    fn get_interactions(&self, user_id: &str) -> StorageResult<Vec<Interaction>>;

    // ===== Statistics =====

    /// Counts persisted records of `kind`
    fn count_records(&self, kind: EntityKind) -> StorageResult<u64>;

    /// Books ranked by number of rated interactions
    ///
    /// Only books with at least `min_ratings` rated interactions qualify.
    fn popular_books(&self, n: usize, min_ratings: u64) -> StorageResult<Vec<PopularBook>>;
}
