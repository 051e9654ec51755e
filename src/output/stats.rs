//! Statistics generation from crawl database
//!
//! This module provides functionality for extracting and displaying
//! crawl statistics from the storage layer and the visited-set snapshots.

use crate::extract::EntityKind;
use crate::state::{VisitedDomain, VisitedSet};
use crate::storage::{PopularBook, RunRecord, Storage};
use crate::Result;
use std::path::Path;

/// How many books the popular list shows
pub const POPULAR_BOOKS_LIMIT: usize = 10;

/// Minimum rated interactions for a book to be listed as popular
pub const POPULAR_MIN_RATINGS: u64 = 1;

/// Crawl statistics summary
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    /// Persisted user profiles
    pub users: u64,

    /// Persisted read-list rows
    pub interactions: u64,

    /// Persisted book metadata rows
    pub books: u64,

    /// Size of the visited-user snapshot
    pub visited_users: usize,

    /// Size of the visited-book snapshot
    pub visited_books: usize,

    /// Most recent run, if any
    pub latest_run: Option<RunRecord>,

    /// Books with the most rated interactions
    pub popular: Vec<PopularBook>,
}

/// Loads statistics from storage and the snapshots in `state_dir`
pub fn load_statistics(storage: &dyn Storage, state_dir: &Path) -> Result<CrawlStatistics> {
    Ok(CrawlStatistics {
        users: storage.count_records(EntityKind::UserProfile)?,
        interactions: storage.count_records(EntityKind::Interaction)?,
        books: storage.count_records(EntityKind::BookMetadata)?,
        visited_users: VisitedSet::load(VisitedDomain::Users, state_dir).len(),
        visited_books: VisitedSet::load(VisitedDomain::Books, state_dir).len(),
        latest_run: storage.get_latest_run()?,
        popular: storage.popular_books(POPULAR_BOOKS_LIMIT, POPULAR_MIN_RATINGS)?,
    })
}

/// Seconds between a run's start and finish, when both parse
pub fn run_duration_seconds(run: &RunRecord) -> Option<i64> {
    let started = run
        .started_at
        .parse::<chrono::DateTime<chrono::Utc>>()
        .ok()?;
    let finished = run
        .finished_at
        .as_deref()?
        .parse::<chrono::DateTime<chrono::Utc>>()
        .ok()?;
    Some((finished - started).num_seconds())
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Persisted:");
    println!("  Users: {}", stats.users);
    println!("  Interactions: {}", stats.interactions);
    println!("  Books: {}", stats.books);
    println!();

    println!("Visited:");
    println!("  Users: {}", stats.visited_users);
    println!("  Books: {}", stats.visited_books);
    println!();

    match &stats.latest_run {
        Some(run) => {
            println!("Latest Run:");
            println!("  ID: {}", run.id);
            println!("  Status: {}", run.status.to_db_string());
            println!("  Started: {}", run.started_at);
            if let Some(finished) = &run.finished_at {
                println!("  Finished: {}", finished);
            }
            if let Some(secs) = run_duration_seconds(run) {
                println!("  Duration: {}s", secs);
            }
            println!("  Config hash: {}", run.config_hash);
        }
        None => println!("No crawl runs recorded"),
    }
    println!();

    if !stats.popular.is_empty() {
        println!("Popular Books ({}):", stats.popular.len());
        for (rank, book) in stats.popular.iter().enumerate() {
            println!(
                "  {:>2}. {} [{}] - {} ratings",
                rank + 1,
                book.title.as_deref().unwrap_or("(untitled)"),
                book.book_id,
                book.rated_count
            );
        }
    }
}
