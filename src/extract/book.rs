//! Book page extraction

use crate::crawler::Document;
use crate::extract::fields::{FieldRule, FieldTable, Locate};
use crate::extract::models::{BookMetadata, EntityKind};
use crate::extract::{Extraction, FailureReason};
use once_cell::sync::Lazy;
use regex::Regex;

static BOOK_FIELDS: FieldTable = FieldTable {
    kind: EntityKind::BookMetadata,
    rules: &[
        FieldRule {
            name: "title",
            selector: r#"h1[data-testid="bookTitle"]"#,
            locate: Locate::Text,
        },
        FieldRule {
            name: "description",
            selector: r#"div[data-testid="description"] span.Formatted"#,
            locate: Locate::Text,
        },
        FieldRule {
            name: "author_href",
            selector: "a.ContributorLink",
            locate: Locate::Attr("href"),
        },
        FieldRule {
            name: "author_name",
            selector: "span.ContributorLink__name",
            locate: Locate::Text,
        },
        FieldRule {
            name: "average_rating",
            selector: "div.RatingStatistics__rating",
            locate: Locate::Text,
        },
        FieldRule {
            name: "ratings_count",
            selector: r#"span[data-testid="ratingsCount"]"#,
            locate: Locate::Text,
        },
        FieldRule {
            name: "publication_info",
            selector: r#"p[data-testid="publicationInfo"]"#,
            locate: Locate::Text,
        },
        FieldRule {
            name: "genres",
            selector: "span.BookPageMetadataSection__genreButton span.Button__labelItem",
            locate: Locate::AllText,
        },
        FieldRule {
            name: "pages_format",
            selector: r#"p[data-testid="pagesFormat"]"#,
            locate: Locate::Text,
        },
        FieldRule {
            name: "cover_image_url",
            selector: "img.ResponsiveImage",
            locate: Locate::Attr("src"),
        },
    ],
};

/// UI affordance that expands the genre list; never a genre
const MORE_GENRES: &str = "...more";

static AUTHOR_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/author/show/(\d+)").expect("author id pattern is valid"));

static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{4})\b").expect("year pattern is valid"));

static LEADING_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d[\d,]*)").expect("page count pattern is valid"));

/// Extracts book metadata; the identifier comes from the caller
pub fn extract_book(document: &Document, book_id: &str) -> Extraction<BookMetadata> {
    if book_id.is_empty() {
        return Extraction::Failed(FailureReason::MissingIdentifier);
    }

    let html = document.html();
    let mut fields = BOOK_FIELDS.reader(html.root_element());

    let mut book = BookMetadata::new(book_id);
    book.title = fields.text("title");
    book.description = fields.text("description");
    book.author_id = fields.parse("author_href", author_id_from_href);
    book.author_name = fields.text("author_name");
    book.average_rating = fields.parse("average_rating", |s| s.trim().parse::<f32>().ok());
    book.ratings_count = fields.parse("ratings_count", parse_ratings_count);
    book.publication_year = fields.parse("publication_info", parse_publication_year);
    book.genres = fields
        .all("genres")
        .into_iter()
        .filter(|genre| genre != MORE_GENRES)
        .collect();
    book.num_pages = fields.parse("pages_format", parse_page_count);
    book.cover_image_url = fields.text("cover_image_url");

    fields.finish(book)
}

/// Drops every non-digit character, then parses what is left
pub fn parse_ratings_count(text: &str) -> Option<u64> {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

fn author_id_from_href(href: &str) -> Option<String> {
    AUTHOR_ID
        .captures(href)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// "First published March 3, 2020" → 2020
fn parse_publication_year(text: &str) -> Option<i32> {
    YEAR.captures_iter(text)
        .last()
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// "336 pages, Hardcover" → 336
fn parse_page_count(text: &str) -> Option<u32> {
    let number = LEADING_NUMBER.captures(text)?.get(1)?.as_str().replace(',', "");
    number.parse().ok()
}
