//! End-to-end crawl tests: traversal shape, persistence and failure isolation

use crate::support::*;
use bookgraph::crawler::Coordinator;
use bookgraph::extract::{EntityKind, Rating};
use bookgraph::state::{CrawlPhase, VisitedDomain, VisitedSet};
use bookgraph::storage::{open_storage, RunStatus, Storage};
use chrono::NaiveDate;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_full_bfs_crawl() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    // 1 reads 100, 200; 100 is reviewed by 2 and 3; 200 by 3 and 1.
    // 2 reads 100, 300; 300 is reviewed by 4. 3 reads 200. 4 has no read list.
    mount_user(&server, "1", &["100", "200"]).await;
    mount_user(&server, "2", &["100", "300"]).await;
    mount_user(&server, "3", &["200"]).await;
    profile_mock("4", "Shelbyville").mount(&server).await;

    // Every book page is fetched exactly once across the whole crawl
    book_mock("100").expect(1).mount(&server).await;
    book_mock("200").expect(1).mount(&server).await;
    book_mock("300").expect(1).mount(&server).await;
    reviews_mock("100", &["2", "3"]).mount(&server).await;
    reviews_mock("200", &["3", "1"]).mount(&server).await;
    reviews_mock("300", &["4"]).mount(&server).await;

    let config = test_config(&server.uri(), dir.path(), "1", 3);
    let mut coordinator = Coordinator::new(config, "test-hash", false).unwrap();
    assert!(coordinator.add_seed("1"));

    let report = coordinator.run().await.unwrap();

    assert_eq!(coordinator.phase(), CrawlPhase::Done);
    assert_eq!(report.users_processed, 4);
    assert_eq!(report.books_discovered, 3);
    assert_eq!(report.depth_reached, Some(2));
    assert!(report.users_skipped > 0);
    assert_eq!(report.persistence_failures, 0);

    let state_dir = dir.path().join("state");
    let users = VisitedSet::load(VisitedDomain::Users, &state_dir);
    for id in ["1", "2", "3", "4"] {
        assert!(users.contains(id), "user {} should be visited", id);
    }
    let books = VisitedSet::load(VisitedDomain::Books, &state_dir);
    assert_eq!(books.len(), 3);

    let storage = open_storage(&dir.path().join("bookgraph.db")).unwrap();
    assert_eq!(storage.count_records(EntityKind::UserProfile).unwrap(), 4);
    assert_eq!(storage.count_records(EntityKind::Interaction).unwrap(), 5);
    assert_eq!(storage.count_records(EntityKind::BookMetadata).unwrap(), 3);

    let profile = storage.get_user("1").unwrap().unwrap();
    assert_eq!(profile.location.as_deref(), Some("Springfield"));
    assert_eq!(profile.join_date, NaiveDate::from_ymd_opt(2016, 9, 1));
    assert_eq!(profile.last_active, NaiveDate::from_ymd_opt(2025, 1, 1));
    assert_eq!(profile.num_ratings, Some(12));

    let interactions = storage.get_interactions("2").unwrap();
    assert_eq!(interactions.len(), 2);
    assert_eq!(interactions[0].book_id, "100");
    assert_eq!(interactions[0].rating, Some(Rating::new(3)));
    assert_eq!(interactions[0].date_read, NaiveDate::from_ymd_opt(2024, 1, 1));
    assert!(interactions[0].shelves.contains("read"));

    let book = storage.get_book("300").unwrap().unwrap();
    assert_eq!(book.title.as_deref(), Some("Title 300"));
    assert_eq!(book.ratings_count, Some(1024));
    assert_eq!(book.publication_year, Some(1999));

    let run = storage.get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.config_hash, "test-hash");
}

#[tokio::test]
async fn test_levels_are_drained_in_order() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    // Level 0: 1. Level 1: 2, 3. Level 2: 4 (via 2), 5 (via 3).
    mount_user(&server, "1", &["100", "200"]).await;
    mount_user(&server, "2", &["300"]).await;
    mount_user(&server, "3", &["400"]).await;
    mount_user(&server, "4", &[]).await;
    mount_user(&server, "5", &[]).await;
    mount_book(&server, "100", &["2"]).await;
    mount_book(&server, "200", &["3"]).await;
    mount_book(&server, "300", &["4"]).await;
    mount_book(&server, "400", &["5"]).await;

    let config = test_config(&server.uri(), dir.path(), "1", 3);
    let mut coordinator = Coordinator::new(config, "test-hash", false).unwrap();
    coordinator.add_seed("1");
    coordinator.run().await.unwrap();

    // Depth-first would visit 4 before 3
    assert_eq!(
        profile_requests(&server).await,
        vec![
            "/user/show/1",
            "/user/show/2",
            "/user/show/3",
            "/user/show/4",
            "/user/show/5"
        ]
    );
}

#[tokio::test]
async fn test_depth_bound_stops_expansion() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_user(&server, "1", &["100"]).await;
    mount_book(&server, "100", &["2"]).await;
    profile_mock("2", "Elsewhere").expect(0).mount(&server).await;

    let config = test_config(&server.uri(), dir.path(), "1", 1);
    let mut coordinator = Coordinator::new(config, "test-hash", false).unwrap();
    coordinator.add_seed("1");
    let report = coordinator.run().await.unwrap();

    assert_eq!(report.users_processed, 1);
    assert_eq!(report.reviewers_enqueued, 1);
    assert!(!coordinator.visited_users().contains("2"));
}

#[tokio::test]
async fn test_fetch_failures_are_isolated() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_user(&server, "1", &["100", "200"]).await;
    // User 2 is entirely unavailable
    Mock::given(method("GET"))
        .and(path("/user/show/2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/review/list/2"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    mount_user(&server, "3", &["100"]).await;

    // Book 200's page fails but its reviews still load
    Mock::given(method("GET"))
        .and(path("/book/show/200"))
        .and(NoQuery)
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;
    reviews_mock("200", &["3"]).mount(&server).await;
    mount_book(&server, "100", &["2"]).await;

    let config = test_config(&server.uri(), dir.path(), "1", 2);
    let mut coordinator = Coordinator::new(config, "test-hash", false).unwrap();
    coordinator.add_seed("1");
    let report = coordinator.run().await.unwrap();

    assert_eq!(report.users_processed, 3);
    assert!(coordinator.visited_users().contains("2"));
    assert!(coordinator.visited_users().contains("3"));
    assert!(coordinator.visited_books().contains("200"));

    let storage = open_storage(&dir.path().join("bookgraph.db")).unwrap();
    assert!(storage.get_user("2").unwrap().is_none());
    assert!(storage.get_interactions("2").unwrap().is_empty());
    assert!(storage.get_user("3").unwrap().is_some());
    assert_eq!(storage.get_interactions("3").unwrap().len(), 1);
    assert!(storage.get_book("200").unwrap().is_none());
    assert!(storage.get_book("100").unwrap().is_some());
}

#[tokio::test]
async fn test_read_list_pagination() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    profile_mock("1", "Springfield").mount(&server).await;
    read_list_page_mock("1", 1, &["100", "200"], true)
        .mount(&server)
        .await;
    read_list_page_mock("1", 2, &["300"], false)
        .mount(&server)
        .await;
    read_list_page_mock("1", 3, &["400"], false)
        .expect(0)
        .mount(&server)
        .await;
    for book in ["100", "200", "300"] {
        mount_book(&server, book, &[]).await;
    }

    let config = test_config(&server.uri(), dir.path(), "1", 1);
    let mut coordinator = Coordinator::new(config, "test-hash", false).unwrap();
    coordinator.add_seed("1");
    let report = coordinator.run().await.unwrap();

    assert_eq!(report.books_discovered, 3);
    let storage = open_storage(&dir.path().join("bookgraph.db")).unwrap();
    assert_eq!(storage.get_interactions("1").unwrap().len(), 3);
}

#[tokio::test]
async fn test_interaction_page_cap() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    profile_mock("1", "Springfield").mount(&server).await;
    read_list_page_mock("1", 1, &["100"], true)
        .mount(&server)
        .await;
    read_list_page_mock("1", 2, &["200"], false)
        .expect(0)
        .mount(&server)
        .await;
    mount_book(&server, "100", &[]).await;

    let mut config = test_config(&server.uri(), dir.path(), "1", 1);
    config.crawler.max_interaction_pages = Some(1);
    let mut coordinator = Coordinator::new(config, "test-hash", false).unwrap();
    coordinator.add_seed("1");
    coordinator.run().await.unwrap();

    let storage = open_storage(&dir.path().join("bookgraph.db")).unwrap();
    assert_eq!(storage.get_interactions("1").unwrap().len(), 1);
}

#[tokio::test]
async fn test_book_snapshot_failure_does_not_stop_expansion() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_user(&server, "1", &["100", "200"]).await;
    mount_user(&server, "2", &[]).await;
    mount_user(&server, "3", &[]).await;
    mount_book(&server, "100", &["2"]).await;
    mount_book(&server, "200", &["3"]).await;

    // A directory in the snapshot's place makes every rename fail
    let state_dir = dir.path().join("state");
    std::fs::create_dir_all(state_dir.join(VisitedDomain::Books.file_name())).unwrap();

    let config = test_config(&server.uri(), dir.path(), "1", 2);
    let mut coordinator = Coordinator::new(config, "test-hash", false).unwrap();
    coordinator.add_seed("1");
    let report = coordinator.run().await.unwrap();

    assert_eq!(report.books_discovered, 2);
    assert_eq!(report.reviewers_enqueued, 2);
    assert_eq!(report.users_processed, 3);
    assert_eq!(
        profile_requests(&server).await,
        vec!["/user/show/1", "/user/show/2", "/user/show/3"]
    );
    assert!(coordinator.visited_books().contains("200"));

    let storage = open_storage(&dir.path().join("bookgraph.db")).unwrap();
    assert_eq!(storage.count_records(EntityKind::BookMetadata).unwrap(), 2);
}
