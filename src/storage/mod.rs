//! Storage module for persisting crawl data
//!
//! This module handles all database operations for the crawler, including:
//! - SQLite database initialization and schema management
//! - Idempotent upserts of users, interactions and books
//! - Run tracking
//! - The log-and-continue `PersistenceSink` the crawler writes through

mod schema;
mod sink;
mod sqlite;
mod traits;

pub use sink::PersistenceSink;
pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::extract::{BookMetadata, EntityKind, Interaction, UserProfile};
use crate::BookgraphError;

use std::path::Path;

/// Initializes or opens a storage database
pub fn open_storage(path: &Path) -> Result<SqliteStorage, BookgraphError> {
    SqliteStorage::new(path)
}

/// A persistable entity
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    User(UserProfile),
    Interaction(Interaction),
    Book(BookMetadata),
}

impl Record {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::User(_) => EntityKind::UserProfile,
            Self::Interaction(_) => EntityKind::Interaction,
            Self::Book(_) => EntityKind::BookMetadata,
        }
    }

    /// The identifier the record is keyed on
    ///
    /// Interactions are keyed on the `(user_id, book_id)` pair.
    pub fn primary_key(&self) -> String {
        match self {
            Self::User(user) => user.user_id.clone(),
            Self::Interaction(i) => format!("{}:{}", i.user_id, i.book_id),
            Self::Book(book) => book.book_id.clone(),
        }
    }

    /// Returns false when any part of the primary key is blank
    pub fn has_identifier(&self) -> bool {
        match self {
            Self::User(user) => !user.user_id.trim().is_empty(),
            Self::Interaction(i) => !i.user_id.trim().is_empty() && !i.book_id.trim().is_empty(),
            Self::Book(book) => !book.book_id.trim().is_empty(),
        }
    }
}

impl From<UserProfile> for Record {
    fn from(user: UserProfile) -> Self {
        Self::User(user)
    }
}

impl From<Interaction> for Record {
    fn from(interaction: Interaction) -> Self {
        Self::Interaction(interaction)
    }
}

impl From<BookMetadata> for Record {
    fn from(book: BookMetadata) -> Self {
        Self::Book(book)
    }
}

/// A row of the popular-books ranking
#[derive(Debug, Clone, PartialEq)]
pub struct PopularBook {
    pub book_id: String,
    pub title: Option<String>,
    pub cover_image_url: Option<String>,
    pub rated_count: u64,
}

/// Represents a crawl run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Interrupted,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Interrupted => "interrupted",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "interrupted" => Some(Self::Interrupted),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
