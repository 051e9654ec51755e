//! Site-specific extractors
//!
//! Each extractor turns one fetched [`Document`] into structured records.
//! Extraction never fails hard: a field that cannot be found degrades to
//! `None`, and the outcome says whether the record is complete, partial,
//! or could not be produced at all.
//!
//! - [`profile`]: user profile page → [`UserProfile`]
//! - [`interactions`]: one read-list page → [`Interaction`] rows
//! - [`book`]: book page → [`BookMetadata`]
//! - [`reviewers`]: book review listing → reviewer user ids

pub mod book;
pub mod dates;
pub mod fields;
pub mod interactions;
mod models;
pub mod profile;
pub mod reviewers;

pub use book::extract_book;
pub use dates::normalize_date;
pub use interactions::{extract_interactions_page, InteractionsPage};
pub use models::{BookMetadata, EntityKind, Interaction, Rating, UserProfile};
pub use profile::extract_profile;
pub use reviewers::extract_reviewers;

use crate::crawler::{Document, FetchFailure};
use std::fmt;

/// Outcome of one extraction attempt
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction<T> {
    /// Every field was found
    Complete(T),

    /// The record is usable but some fields degraded to unknown
    Partial {
        record: T,
        missing: Vec<&'static str>,
    },

    /// No record could be produced
    Failed(FailureReason),
}

/// Why an extraction produced nothing
#[derive(Debug, Clone, PartialEq)]
pub enum FailureReason {
    /// The page could not be fetched
    Fetch(FetchFailure),

    /// The primary identifier could not be found
    MissingIdentifier,

    /// The page held no records of the expected kind
    NoRecords,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fetch(failure) => write!(f, "fetch failed: {}", failure),
            Self::MissingIdentifier => f.write_str("primary identifier missing"),
            Self::NoRecords => f.write_str("no records on page"),
        }
    }
}

impl<T> Extraction<T> {
    /// The record, if one was produced
    pub fn record(&self) -> Option<&T> {
        match self {
            Self::Complete(record) | Self::Partial { record, .. } => Some(record),
            Self::Failed(_) => None,
        }
    }

    pub fn into_record(self) -> Option<T> {
        match self {
            Self::Complete(record) | Self::Partial { record, .. } => Some(record),
            Self::Failed(_) => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Names of the fields that degraded to unknown
    pub fn missing_fields(&self) -> &[&'static str] {
        match self {
            Self::Partial { missing, .. } => missing,
            _ => &[],
        }
    }
}

/// Common shape of the single-document extractors
pub trait Extractor {
    type Output;

    fn extract(&self, document: &Document) -> Extraction<Self::Output>;
}

/// Profile extractor for one user
pub struct UserProfileExtractor<'a> {
    pub user_id: &'a str,
}

impl Extractor for UserProfileExtractor<'_> {
    type Output = UserProfile;

    fn extract(&self, document: &Document) -> Extraction<UserProfile> {
        extract_profile(document, self.user_id)
    }
}

/// Single read-list page extractor for one user
pub struct InteractionsExtractor<'a> {
    pub user_id: &'a str,
}

impl Extractor for InteractionsExtractor<'_> {
    type Output = InteractionsPage;

    fn extract(&self, document: &Document) -> Extraction<InteractionsPage> {
        extract_interactions_page(document, self.user_id)
    }
}

/// Book page extractor
pub struct BookMetadataExtractor<'a> {
    pub book_id: &'a str,
}

impl Extractor for BookMetadataExtractor<'_> {
    type Output = BookMetadata;

    fn extract(&self, document: &Document) -> Extraction<BookMetadata> {
        extract_book(document, self.book_id)
    }
}

/// Review listing extractor, bounded to `limit` distinct reviewers
pub struct ReviewerExtractor {
    pub limit: usize,
}

impl Extractor for ReviewerExtractor {
    type Output = Vec<String>;

    fn extract(&self, document: &Document) -> Extraction<Vec<String>> {
        let reviewers = extract_reviewers(document, self.limit);
        if reviewers.is_empty() {
            Extraction::Failed(FailureReason::NoRecords)
        } else {
            Extraction::Complete(reviewers)
        }
    }
}
