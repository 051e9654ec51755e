//! Records produced by the extractors

use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::fmt;

/// The kinds of entity the crawler extracts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    UserProfile,
    Interaction,
    BookMetadata,
    /// Transient; only ever used to seed the next BFS level
    ReviewerRef,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserProfile => "user",
            Self::Interaction => "interaction",
            Self::BookMetadata => "book",
            Self::ReviewerRef => "reviewer",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed five-point scale used by the star widget's title text
const RATING_SCALE: [(&str, u8); 5] = [
    ("did not like it", 1),
    ("it was ok", 2),
    ("liked it", 3),
    ("really liked it", 4),
    ("it was amazing", 5),
];

/// A user's star rating, always within `1..=5`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// Builds a rating, clamping out-of-range values into `1..=5`
    pub fn new(value: i64) -> Self {
        Self(value.clamp(Self::MIN as i64, Self::MAX as i64) as u8)
    }

    /// Maps a star-widget phrase such as `"it was amazing"` onto the scale
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim().to_lowercase();
        RATING_SCALE
            .iter()
            .find(|(phrase, _)| *phrase == label)
            .map(|(_, value)| Self(*value))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

/// Profile page data for one user
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub user_id: String,
    pub join_date: Option<NaiveDate>,
    pub last_active: Option<NaiveDate>,
    pub location: Option<String>,
    pub num_ratings: Option<u32>,
    pub avg_rating_given: Option<f32>,
}

impl UserProfile {
    /// A profile with only its identifier known
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            join_date: None,
            last_active: None,
            location: None,
            num_ratings: None,
            avg_rating_given: None,
        }
    }
}

/// One row of a user's read list
#[derive(Debug, Clone, PartialEq)]
pub struct Interaction {
    pub user_id: String,
    pub book_id: String,
    pub rating: Option<Rating>,
    pub date_read: Option<NaiveDate>,
    pub shelves: BTreeSet<String>,
    /// Shown on the row; logged but not persisted
    pub book_title: Option<String>,
    pub book_author: Option<String>,
}

impl Interaction {
    pub fn new(user_id: impl Into<String>, book_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            book_id: book_id.into(),
            rating: None,
            date_read: None,
            shelves: BTreeSet::new(),
            book_title: None,
            book_author: None,
        }
    }
}

/// Book page metadata
#[derive(Debug, Clone, PartialEq)]
pub struct BookMetadata {
    pub book_id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub author_id: Option<String>,
    pub author_name: Option<String>,
    pub average_rating: Option<f32>,
    pub ratings_count: Option<u64>,
    pub publication_year: Option<i32>,
    pub genres: Vec<String>,
    pub num_pages: Option<u32>,
    pub cover_image_url: Option<String>,
}

impl BookMetadata {
    pub fn new(book_id: impl Into<String>) -> Self {
        Self {
            book_id: book_id.into(),
            title: None,
            description: None,
            author_id: None,
            author_name: None,
            average_rating: None,
            ratings_count: None,
            publication_year: None,
            genres: Vec::new(),
            num_pages: None,
            cover_image_url: None,
        }
    }
}
