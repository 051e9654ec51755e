//! Restart behaviour: re-runs, crash recovery and fresh starts

use crate::support::*;
use bookgraph::crawler::Coordinator;
use bookgraph::extract::{EntityKind, Interaction};
use bookgraph::state::{VisitedDomain, VisitedSet};
use bookgraph::storage::{open_storage, Record, Storage};
use tempfile::TempDir;
use wiremock::MockServer;

async fn mount_small_graph(server: &MockServer) {
    mount_user(server, "1", &["100", "200"]).await;
    mount_user(server, "2", &["100"]).await;
    mount_book(server, "100", &["2"]).await;
    mount_book(server, "200", &[]).await;
}

fn counts(dir: &TempDir) -> (u64, u64, u64) {
    let storage = open_storage(&dir.path().join("bookgraph.db")).unwrap();
    (
        storage.count_records(EntityKind::UserProfile).unwrap(),
        storage.count_records(EntityKind::Interaction).unwrap(),
        storage.count_records(EntityKind::BookMetadata).unwrap(),
    )
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_small_graph(&server).await;

    let config = test_config(&server.uri(), dir.path(), "1", 2);

    let mut first = Coordinator::new(config.clone(), "test-hash", false).unwrap();
    first.add_seed("1");
    first.run().await.unwrap();
    let after_first = counts(&dir);
    assert_eq!(after_first, (2, 3, 2));

    // Same seed, snapshots discarded: everything is fetched again
    let mut second = Coordinator::new(config.clone(), "test-hash", true).unwrap();
    assert!(second.add_seed("1"));
    let report = second.run().await.unwrap();
    assert_eq!(report.users_processed, 2);
    assert_eq!(counts(&dir), after_first);

    // Snapshots kept: the seed is already visited and nothing is fetched
    let requests_before = server.received_requests().await.unwrap_or_default().len();
    let mut third = Coordinator::new(config, "test-hash", false).unwrap();
    assert!(!third.add_seed("1"));
    let report = third.run().await.unwrap();
    assert_eq!(report.users_processed, 0);
    assert_eq!(
        server.received_requests().await.unwrap_or_default().len(),
        requests_before
    );

    let storage = open_storage(&dir.path().join("bookgraph.db")).unwrap();
    assert_eq!(storage.get_latest_run().unwrap().unwrap().id, third.run_id());
}

#[tokio::test]
async fn test_crash_after_book_before_user() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let state_dir = dir.path().join("state");

    // State left behind by an interrupted run: book 100 was finished and
    // user 1's first interaction written, but user 1 was never marked.
    let mut books = VisitedSet::load(VisitedDomain::Books, &state_dir);
    books.mark("100");
    books.snapshot().unwrap();
    {
        let mut storage = open_storage(&dir.path().join("bookgraph.db")).unwrap();
        storage
            .upsert_batch(
                EntityKind::Interaction,
                &[Record::from(Interaction::new("1", "100"))],
            )
            .unwrap();
    }

    profile_mock("1", "Springfield").expect(1).mount(&server).await;
    read_list_mock("1", &["100", "200"]).expect(1).mount(&server).await;
    book_mock("100").expect(0).mount(&server).await;
    book_mock("200").expect(1).mount(&server).await;
    // Reviewers are fetched whether or not the book was already seen
    reviews_mock("100", &["2"]).expect(1).mount(&server).await;
    reviews_mock("200", &[]).expect(1).mount(&server).await;

    let config = test_config(&server.uri(), dir.path(), "1", 1);
    let mut coordinator = Coordinator::new(config, "test-hash", false).unwrap();
    assert!(coordinator.add_seed("1"));
    let report = coordinator.run().await.unwrap();

    assert_eq!(report.books_discovered, 1);
    assert!(coordinator.visited_users().contains("1"));
    assert!(coordinator.visited_books().contains("200"));

    let storage = open_storage(&dir.path().join("bookgraph.db")).unwrap();
    assert_eq!(storage.get_interactions("1").unwrap().len(), 2);
    assert!(storage.get_book("100").unwrap().is_none());
    assert!(storage.get_book("200").unwrap().is_some());
}

#[tokio::test]
async fn test_corrupt_snapshot_starts_empty() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let state_dir = dir.path().join("state");
    std::fs::create_dir_all(&state_dir).unwrap();
    std::fs::write(state_dir.join("visited_users.json"), "[\"1\",").unwrap();

    mount_small_graph(&server).await;

    let config = test_config(&server.uri(), dir.path(), "1", 1);
    let mut coordinator = Coordinator::new(config, "test-hash", false).unwrap();
    assert!(coordinator.visited_users().is_empty());
    assert!(coordinator.add_seed("1"));
    let report = coordinator.run().await.unwrap();
    assert_eq!(report.users_processed, 1);

    // The snapshot is rewritten whole after the user is marked
    let reloaded = VisitedSet::load(VisitedDomain::Users, &state_dir);
    assert!(reloaded.contains("1"));
}
