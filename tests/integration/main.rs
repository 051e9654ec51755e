//! Integration tests for bookgraph
//!
//! These tests run the real `Coordinator` against a wiremock server that
//! serves fixture pages for users, read lists, books and review listings.

mod crawl_tests;
mod resume_tests;
mod support;
