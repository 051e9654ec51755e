//! Normalization of the free-text dates the site prints
//!
//! Accepted shapes, everything else yields `None`:
//!
//! | Input            | Result                          |
//! |------------------|---------------------------------|
//! | `"Sep 25, 2025"` | 2025-09-25                      |
//! | `"Sep 2025"`     | 2025-09-01 (first of the month) |
//! | `"2025"`         | 2025-01-01 (January 1)          |
//! | `"not set"`      | no date                         |

use chrono::NaiveDate;

/// Parses a date as printed on read-list rows
pub fn normalize_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("not set") || raw.eq_ignore_ascii_case("none") {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(raw, "%B %d, %Y") {
        return Some(date);
    }

    if let Some(date) = parse_month_year(raw) {
        return Some(date);
    }

    parse_year(raw)
}

/// Parses `"<Month> <Year>"`, pinning the day to the first of the month
///
/// Month names may be abbreviated (`Sep`) or spelled out (`September`).
pub fn parse_month_year(raw: &str) -> Option<NaiveDate> {
    let mut parts = raw.split_whitespace();
    let (month, year) = (parts.next()?, parts.next()?);
    if parts.next().is_some() || !is_year(year) {
        return None;
    }

    // `%B` also accepts the three-letter abbreviation
    NaiveDate::parse_from_str(&format!("{} {} 1", month, year), "%B %Y %d").ok()
}

fn parse_year(raw: &str) -> Option<NaiveDate> {
    if !is_year(raw) {
        return None;
    }
    NaiveDate::from_ymd_opt(raw.parse().ok()?, 1, 1)
}

fn is_year(s: &str) -> bool {
    s.len() == 4 && s.bytes().all(|b| b.is_ascii_digit())
}
