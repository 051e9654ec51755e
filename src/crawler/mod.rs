//! Crawler module for fetching pages and driving the traversal
//!
//! This module contains the core crawling logic, including:
//! - Politeness-delayed HTTP fetching with soft failures
//! - Site page addressing and read-list pagination
//! - Breadth-first crawl coordination over users

mod coordinator;
mod fetcher;
mod site;

pub use coordinator::{run_crawl, Coordinator, CrawlReport};
pub use fetcher::{
    build_http_client, fetch_url, Document, FetchFailure, FetchOutcome, Fetcher, PolitenessDelay,
};
pub use site::Site;
