//! Reviewer identifiers from a book's review listing

use crate::crawler::Document;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Selector;

static USER_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/user/show/(\d+)").expect("user id pattern is valid"));

/// Collects up to `limit` distinct reviewer ids in document order
pub fn extract_reviewers(document: &Document, limit: usize) -> Vec<String> {
    let mut reviewers: Vec<String> = Vec::new();
    if limit == 0 {
        return reviewers;
    }

    let Ok(selector) = Selector::parse("div.ReviewerProfile__name a[href]") else {
        return reviewers;
    };

    let html = document.html();
    let ids = html
        .select(&selector)
        .filter_map(|link| link.value().attr("href"))
        .filter_map(user_id_from_href);

    for id in ids {
        if reviewers.contains(&id) {
            continue;
        }
        reviewers.push(id);
        if reviewers.len() >= limit {
            break;
        }
    }

    reviewers
}

/// Pulls the numeric user id out of `/user/show/<id>[-slug]`
pub fn user_id_from_href(href: &str) -> Option<String> {
    USER_ID
        .captures(href)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
