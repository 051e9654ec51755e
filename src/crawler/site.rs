//! Page addressing and fetch+extract pairings for the target site
//!
//! `Site` knows where each kind of page lives under the configured base URL
//! and runs the matching extractor over whatever the fetcher returns. A
//! failed fetch surfaces as `Extraction::Failed(FailureReason::Fetch(_))`.

use crate::config::Config;
use crate::crawler::{FetchOutcome, Fetcher};
use crate::extract::{
    BookMetadata, BookMetadataExtractor, Extraction, Extractor, FailureReason, Interaction,
    InteractionsExtractor, ReviewerExtractor, UserProfile, UserProfileExtractor,
};
use crate::BookgraphError;
use url::Url;

/// The crawled site: base URL, fetcher and pagination bound
#[derive(Debug, Clone)]
pub struct Site {
    fetcher: Fetcher,
    base: Url,
    max_interaction_pages: Option<u32>,
}

impl Site {
    pub fn new(
        fetcher: Fetcher,
        base_url: &str,
        max_interaction_pages: Option<u32>,
    ) -> Result<Self, url::ParseError> {
        Ok(Self {
            fetcher,
            base: Url::parse(base_url)?,
            max_interaction_pages,
        })
    }

    /// Builds the fetcher and site from configuration
    pub fn from_config(config: &Config) -> Result<Self, BookgraphError> {
        let fetcher = Fetcher::from_config(&config.politeness)?;
        Ok(Self::new(
            fetcher,
            &config.site.base_url,
            config.crawler.max_interaction_pages,
        )?)
    }

    fn page_url(&self, path: &str, query: Option<&str>) -> String {
        let mut url = self.base.clone();
        url.set_path(path);
        url.set_query(query);
        url.into()
    }

    pub fn profile_url(&self, user_id: &str) -> String {
        self.page_url(&format!("/user/show/{}", user_id), None)
    }

    /// One page of a user's read shelf, most recently read first
    pub fn read_list_url(&self, user_id: &str, page: u32) -> String {
        let query = format!("page={}&shelf=read&sort=date_read&order=d", page);
        self.page_url(&format!("/review/list/{}", user_id), Some(&query))
    }

    pub fn book_url(&self, book_id: &str) -> String {
        self.page_url(&format!("/book/show/{}", book_id), None)
    }

    pub fn reviews_url(&self, book_id: &str) -> String {
        self.page_url(&format!("/book/show/{}", book_id), Some("page=1"))
    }

    async fn fetch_with<E: Extractor>(&self, url: &str, extractor: &E) -> Extraction<E::Output> {
        match self.fetcher.fetch(url).await {
            FetchOutcome::Document(document) => extractor.extract(&document),
            FetchOutcome::Failure(failure) => Extraction::Failed(FailureReason::Fetch(failure)),
        }
    }

    pub async fn user_profile(&self, user_id: &str) -> Extraction<UserProfile> {
        let url = self.profile_url(user_id);
        self.fetch_with(&url, &UserProfileExtractor { user_id }).await
    }

    /// Walks a user's read list page by page
    ///
    /// Stops on a failed fetch, a page without review rows, a page without a
    /// next-page link, or the configured page cap.
    pub async fn user_interactions(&self, user_id: &str) -> Vec<Interaction> {
        let extractor = InteractionsExtractor { user_id };
        let mut interactions = Vec::new();
        let mut page = 1;

        loop {
            if self.max_interaction_pages.is_some_and(|cap| page > cap) {
                tracing::debug!("Read list for user {} capped at {} pages", user_id, page - 1);
                break;
            }

            let url = self.read_list_url(user_id, page);
            let result = match self.fetch_with(&url, &extractor).await {
                Extraction::Complete(result) => result,
                Extraction::Partial { record, missing } => {
                    tracing::debug!(
                        "Read list page {} for user {} missing {:?}",
                        page,
                        user_id,
                        missing
                    );
                    record
                }
                Extraction::Failed(reason) => {
                    tracing::debug!(
                        "Read list for user {} ends at page {}: {}",
                        user_id,
                        page,
                        reason
                    );
                    break;
                }
            };

            if result.dropped > 0 {
                tracing::debug!(
                    "Dropped {} rows without a book id on page {} for user {}",
                    result.dropped,
                    page,
                    user_id
                );
            }
            for row in &result.rows {
                tracing::trace!(
                    "User {} read {} ({} by {})",
                    user_id,
                    row.book_id,
                    row.book_title.as_deref().unwrap_or("?"),
                    row.book_author.as_deref().unwrap_or("?")
                );
            }

            interactions.extend(result.rows);

            if !result.has_next {
                break;
            }
            page += 1;
        }

        interactions
    }

    pub async fn book(&self, book_id: &str) -> Extraction<BookMetadata> {
        let url = self.book_url(book_id);
        self.fetch_with(&url, &BookMetadataExtractor { book_id }).await
    }

    /// Up to `limit` distinct reviewer ids from a book's first review page
    pub async fn reviewers(&self, book_id: &str, limit: usize) -> Vec<String> {
        let url = self.reviews_url(book_id);
        match self.fetch_with(&url, &ReviewerExtractor { limit }).await {
            Extraction::Failed(reason) => {
                tracing::debug!("No reviewers for book {}: {}", book_id, reason);
                Vec::new()
            }
            extraction => extraction.into_record().unwrap_or_default(),
        }
    }
}
