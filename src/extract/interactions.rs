//! Read-list page extraction
//!
//! A user's read list is paginated; this module handles a single page.
//! Walking the pages is the caller's job: it stops once a page yields no
//! rows or has no next-page link.

use crate::crawler::Document;
use crate::extract::dates::normalize_date;
use crate::extract::fields::{FieldRule, FieldTable, Locate};
use crate::extract::models::{EntityKind, Interaction, Rating};
use crate::extract::{Extraction, FailureReason};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Selector};

static ROW_FIELDS: FieldTable = FieldTable {
    kind: EntityKind::Interaction,
    rules: &[
        FieldRule {
            name: "book_href",
            selector: "td.field.title a",
            locate: Locate::Attr("href"),
        },
        FieldRule {
            name: "book_title",
            selector: "td.field.title a",
            locate: Locate::Attr("title"),
        },
        FieldRule {
            name: "book_author",
            selector: "td.field.author a",
            locate: Locate::Text,
        },
        FieldRule {
            name: "rating",
            selector: "td.field.rating div.value span.staticStars",
            locate: Locate::Attr("title"),
        },
        FieldRule {
            name: "shelves",
            selector: "td.field.shelves a.shelfLink",
            locate: Locate::AllText,
        },
        FieldRule {
            name: "date_read",
            selector: "span.date_read_value",
            locate: Locate::AllText,
        },
    ],
};

static BOOK_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/book/show/(\d+)").expect("book id pattern is valid"));

/// Rows parsed from one read-list page
#[derive(Debug, Clone, PartialEq)]
pub struct InteractionsPage {
    pub rows: Vec<Interaction>,
    /// Rows on the page that had no usable book identifier
    pub dropped: usize,
    /// Whether the page links to a following page
    pub has_next: bool,
}

/// Extracts every review row on a read-list page
///
/// Returns `Failed(NoRecords)` when the page has no review rows at all,
/// which ends pagination.
pub fn extract_interactions_page(document: &Document, user_id: &str) -> Extraction<InteractionsPage> {
    let html = document.html();
    let (Ok(row_selector), Ok(title_cell), Ok(next_page)) = (
        Selector::parse(r#"tr[id^="review_"]"#),
        Selector::parse("td.field.title"),
        Selector::parse("a.next_page"),
    ) else {
        return Extraction::Failed(FailureReason::NoRecords);
    };

    let review_rows: Vec<ElementRef<'_>> = html
        .select(&row_selector)
        .filter(|row| is_review_row_id(row.value().id().unwrap_or_default()))
        .collect();

    if review_rows.is_empty() {
        return Extraction::Failed(FailureReason::NoRecords);
    }

    let mut page = InteractionsPage {
        rows: Vec::with_capacity(review_rows.len()),
        dropped: 0,
        has_next: html.select(&next_page).next().is_some(),
    };
    let mut missing: Vec<&'static str> = Vec::new();

    for row in review_rows {
        if row.select(&title_cell).next().is_none() {
            page.dropped += 1;
            continue;
        }

        match parse_row(row, user_id) {
            Extraction::Complete(interaction) => page.rows.push(interaction),
            Extraction::Partial { record, missing: row_missing } => {
                for field in row_missing {
                    if !missing.contains(&field) {
                        missing.push(field);
                    }
                }
                page.rows.push(record);
            }
            Extraction::Failed(reason) => {
                tracing::debug!("Dropping read-list row for user {}: {}", user_id, reason);
                page.dropped += 1;
            }
        }
    }

    if missing.is_empty() {
        Extraction::Complete(page)
    } else {
        Extraction::Partial {
            record: page,
            missing,
        }
    }
}

/// Parses one `<tr id="review_NNN">` row
fn parse_row(row: ElementRef<'_>, user_id: &str) -> Extraction<Interaction> {
    let mut fields = ROW_FIELDS.reader(row);

    let Some(book_id) = fields.parse("book_href", book_id_from_href) else {
        return Extraction::Failed(FailureReason::MissingIdentifier);
    };

    let mut interaction = Interaction::new(user_id, book_id);
    interaction.book_title = fields.text("book_title");
    interaction.book_author = fields.text("book_author");
    interaction.rating = fields.parse("rating", Rating::from_label);
    interaction.shelves = fields.all("shelves").into_iter().collect();
    // Rows can carry several read dates; keep the latest that parses.
    interaction.date_read = fields
        .all("date_read")
        .iter()
        .filter_map(|raw| normalize_date(raw))
        .max();

    fields.finish(interaction)
}

/// Pulls the numeric book id out of `/book/show/<id>[.Slug]`
pub fn book_id_from_href(href: &str) -> Option<String> {
    BOOK_ID
        .captures(href)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn is_review_row_id(id: &str) -> bool {
    id.strip_prefix("review_")
        .map(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
        .unwrap_or(false)
}
