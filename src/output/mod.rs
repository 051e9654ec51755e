//! Output module for reporting crawl results
//!
//! This module handles:
//! - Printing the report of a finished crawl
//! - Loading and printing statistics for `--stats`

pub mod stats;

pub use stats::{load_statistics, print_statistics, CrawlStatistics};

use crate::crawler::CrawlReport;

/// Prints the counters of a finished crawl to stdout
pub fn print_report(report: &CrawlReport) {
    println!("=== Crawl Complete ===\n");
    println!("  Users processed: {}", report.users_processed);
    println!("  Users skipped: {}", report.users_skipped);
    println!("  Books discovered: {}", report.books_discovered);
    println!("  Reviewers enqueued: {}", report.reviewers_enqueued);
    match report.depth_reached {
        Some(depth) => println!("  Deepest level: {}", depth),
        None => println!("  Deepest level: none"),
    }
    if report.persistence_failures > 0 {
        println!("  Persistence failures: {}", report.persistence_failures);
    }
}
