//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the breadth-first crawl loop, including:
//! - Loading the visited user and book sets from their snapshots
//! - Recording the run in storage
//! - Draining one BFS level at a time, feeding reviewers into the next
//! - Snapshotting visited state after every mutation

use crate::config::{Config, CrawlerConfig};
use crate::crawler::{PolitenessDelay, Site};
use crate::extract::{EntityKind, Extraction};
use crate::state::{CrawlPhase, VisitedDomain, VisitedSet};
use crate::storage::{PersistenceSink, Record, RunStatus, SqliteStorage, Storage};
use crate::Result;
use std::collections::{HashSet, VecDeque};
use std::path::Path;

/// Counters describing one crawl run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    /// Users dequeued and fully processed
    pub users_processed: usize,
    /// Users dequeued but already visited
    pub users_skipped: usize,
    /// Books fetched for the first time
    pub books_discovered: usize,
    /// Reviewer ids pushed onto a next-level queue
    pub reviewers_enqueued: usize,
    /// Deepest level that was drained, if any
    pub depth_reached: Option<u32>,
    /// Writes the persistence sink gave up on
    pub persistence_failures: u64,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    crawler: CrawlerConfig,
    site: Site,
    sink: PersistenceSink<SqliteStorage>,
    visited_users: VisitedSet,
    visited_books: VisitedSet,
    book_delay: PolitenessDelay,
    seeds: VecDeque<String>,
    phase: CrawlPhase,
    run_id: i64,
    report: CrawlReport,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `config_hash` - Hash of the configuration file, recorded on the run
    /// * `fresh` - Discard visited-set snapshots before loading them
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(BookgraphError)` - Failed to open storage or build the HTTP client
    pub fn new(config: Config, config_hash: &str, fresh: bool) -> Result<Self> {
        let state_dir = Path::new(&config.output.state_dir);

        if fresh {
            tracing::info!("Discarding visited snapshots in {}", state_dir.display());
            VisitedSet::discard(VisitedDomain::Users, state_dir)?;
            VisitedSet::discard(VisitedDomain::Books, state_dir)?;
        }

        let visited_users = VisitedSet::load(VisitedDomain::Users, state_dir);
        let visited_books = VisitedSet::load(VisitedDomain::Books, state_dir);
        tracing::info!(
            "Loaded {} visited users and {} visited books",
            visited_users.len(),
            visited_books.len()
        );

        let mut storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
        let run_id = storage.create_run(config_hash)?;

        let site = Site::from_config(&config)?;
        let book_delay = PolitenessDelay::after_book(&config.politeness);

        Ok(Self {
            crawler: config.crawler,
            site,
            sink: PersistenceSink::new(storage),
            visited_users,
            visited_books,
            book_delay,
            seeds: VecDeque::new(),
            phase: CrawlPhase::Idle,
            run_id,
            report: CrawlReport::default(),
        })
    }

    /// Queues a seed user for depth 0
    ///
    /// Returns false if the user was already visited in an earlier run.
    pub fn add_seed(&mut self, user_id: &str) -> bool {
        if self.visited_users.contains(user_id) {
            tracing::info!("Seed user {} already visited, skipping", user_id);
            return false;
        }
        self.seeds.push_back(user_id.to_string());
        true
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    pub fn run_id(&self) -> i64 {
        self.run_id
    }

    pub fn report(&self) -> &CrawlReport {
        &self.report
    }

    pub fn visited_users(&self) -> &VisitedSet {
        &self.visited_users
    }

    pub fn visited_books(&self) -> &VisitedSet {
        &self.visited_books
    }

    /// Closes the run row with a status other than completed
    ///
    /// Used when a crawl is cut short. The visited snapshots are left as they
    /// are so the next run resumes from them.
    pub fn close_run(&mut self, status: RunStatus) {
        tracing::info!("Marking run {} as {}", self.run_id, status.to_db_string());
        if let Err(e) = self
            .sink
            .storage_mut()
            .update_run_status(self.run_id, status)
        {
            tracing::error!("Failed to update run {}: {}", self.run_id, e);
        }
    }

    fn transition(&mut self, next: CrawlPhase) {
        debug_assert!(
            self.phase.can_transition_to(&next),
            "illegal phase change {} -> {}",
            self.phase,
            next
        );
        tracing::debug!("Phase {} -> {}", self.phase, next);
        self.phase = next;
    }

    /// Runs the breadth-first crawl to completion
    ///
    /// Each level's queue is drained before the next level starts. The crawl
    /// ends when a level produces no reviewers or `max_depth` levels have run.
    pub async fn run(&mut self) -> Result<CrawlReport> {
        if self.phase.is_terminal() {
            return Ok(self.report.clone());
        }

        tracing::info!("Starting crawl run {}", self.run_id);
        let start_time = std::time::Instant::now();

        let max_depth = self.crawler.max_depth;
        let mut current = std::mem::take(&mut self.seeds);
        let mut depth = 0;

        while depth < max_depth && !current.is_empty() {
            self.transition(CrawlPhase::Running { depth });
            tracing::info!("Depth {}: {} users queued", depth, current.len());

            let mut next = VecDeque::new();
            while let Some(user_id) = current.pop_front() {
                if self.visited_users.contains(&user_id) {
                    tracing::debug!("User {} already visited, skipping", user_id);
                    self.report.users_skipped += 1;
                    continue;
                }

                self.process_user(&user_id, &mut next).await;

                self.visited_users.mark(&user_id);
                if let Err(e) = self.visited_users.snapshot() {
                    tracing::error!("Failed to snapshot visited users: {}", e);
                }
                self.report.users_processed += 1;
            }

            self.report.depth_reached = Some(depth);
            current = next;
            depth += 1;
        }

        if !current.is_empty() {
            tracing::info!(
                "Depth bound {} reached with {} users left in the queue",
                max_depth,
                current.len()
            );
        }

        self.transition(CrawlPhase::Done);
        self.report.persistence_failures = self.sink.failures();
        self.sink.storage_mut().complete_run(self.run_id)?;

        tracing::info!(
            "Crawl completed: {} users processed, {} skipped, {} new books in {:?}",
            self.report.users_processed,
            self.report.users_skipped,
            self.report.books_discovered,
            start_time.elapsed()
        );

        Ok(self.report.clone())
    }

    /// Processes a single user
    ///
    /// This method:
    /// 1. Persists the user's profile
    /// 2. Persists every row of the user's read list
    /// 3. Fetches metadata for books not seen before
    /// 4. Queues each book's reviewers for the next level
    ///
    /// Fetch and persistence problems are logged here and never propagate.
    /// The caller marks the user visited afterwards.
    async fn process_user(&mut self, user_id: &str, next: &mut VecDeque<String>) {
        tracing::info!("Processing user {}", user_id);

        match self.site.user_profile(user_id).await {
            Extraction::Complete(profile) => {
                self.sink.upsert_one(EntityKind::UserProfile, profile);
            }
            Extraction::Partial { record, missing } => {
                tracing::debug!("Profile for user {} missing {:?}", user_id, missing);
                self.sink.upsert_one(EntityKind::UserProfile, record);
            }
            Extraction::Failed(reason) => {
                tracing::debug!("No profile for user {}: {}", user_id, reason);
            }
        }

        let interactions = self.site.user_interactions(user_id).await;
        if interactions.is_empty() {
            tracing::info!("User {} has no readable interactions", user_id);
            return;
        }

        let records: Vec<Record> = interactions.iter().cloned().map(Record::from).collect();
        let written = self.sink.upsert_batch(EntityKind::Interaction, &records);
        tracing::debug!("Persisted {} interactions for user {}", written, user_id);

        let mut distinct = HashSet::new();
        let books: Vec<&str> = interactions
            .iter()
            .map(|i| i.book_id.as_str())
            .filter(|id| distinct.insert(*id))
            .collect();

        for book_id in books {
            if !self.visited_books.contains(book_id) {
                self.process_book(book_id).await;
            }

            let reviewers = self
                .site
                .reviewers(book_id, self.crawler.reviewers_per_book)
                .await;
            for reviewer in reviewers {
                if !self.visited_users.contains(&reviewer) {
                    next.push_back(reviewer);
                    self.report.reviewers_enqueued += 1;
                }
            }
        }
    }

    /// Fetches and persists a newly seen book, then marks it visited
    ///
    /// A failed snapshot is logged; the book stays visited in memory.
    async fn process_book(&mut self, book_id: &str) {
        match self.site.book(book_id).await {
            Extraction::Complete(book) => {
                self.sink.upsert_one(EntityKind::BookMetadata, book);
            }
            Extraction::Partial { record, missing } => {
                tracing::debug!("Book {} missing {:?}", book_id, missing);
                self.sink.upsert_one(EntityKind::BookMetadata, record);
            }
            Extraction::Failed(reason) => {
                tracing::debug!("No metadata for book {}: {}", book_id, reason);
            }
        }

        self.visited_books.mark(book_id);
        if let Err(e) = self.visited_books.snapshot() {
            tracing::error!("Failed to snapshot visited books: {}", e);
        }
        self.report.books_discovered += 1;

        self.book_delay.wait().await;
    }
}

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Load the visited user and book sets
/// 2. Open storage and record a new run
/// 3. Walk users breadth-first from the configured seed
/// 4. Close the run as completed, failed, or interrupted on Ctrl-C
///
/// An interrupted crawl returns the counters gathered so far.
pub async fn run_crawl(config: Config, config_hash: &str, fresh: bool) -> Result<CrawlReport> {
    let seed = config.crawler.seed_user.clone();
    let mut coordinator = Coordinator::new(config, config_hash, fresh)?;
    coordinator.add_seed(&seed);

    let outcome = tokio::select! {
        result = coordinator.run() => Some(result),
        Ok(()) = tokio::signal::ctrl_c() => None,
    };

    match outcome {
        Some(Ok(report)) => Ok(report),
        Some(Err(e)) => {
            coordinator.close_run(RunStatus::Failed);
            Err(e)
        }
        None => {
            tracing::warn!("Crawl interrupted, visited snapshots kept for the next run");
            coordinator.close_run(RunStatus::Interrupted);
            Ok(coordinator.report().clone())
        }
    }
}
