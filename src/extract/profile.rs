//! User profile page extraction

use crate::crawler::Document;
use crate::extract::dates::parse_month_year;
use crate::extract::fields::{FieldRule, FieldTable, Locate};
use crate::extract::models::{EntityKind, UserProfile};
use crate::extract::{Extraction, FailureReason};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

static PROFILE_FIELDS: FieldTable = FieldTable {
    kind: EntityKind::UserProfile,
    rules: &[
        FieldRule {
            name: "activity",
            selector: "div.infoBoxRowTitle",
            locate: Locate::Labelled {
                label: "Activity",
                value_class: "infoBoxRowItem",
            },
        },
        FieldRule {
            name: "location",
            selector: "div.infoBoxRowTitle",
            locate: Locate::Labelled {
                label: "Location",
                value_class: "infoBoxRowItem",
            },
        },
        // The two stats links sit in a fixed order under the stats anchor:
        // "<n> ratings" then "(<avg> avg)". A layout change loses both.
        FieldRule {
            name: "num_ratings",
            selector: "div.profilePageUserStatsInfo a",
            locate: Locate::NthText(0),
        },
        FieldRule {
            name: "avg_rating_given",
            selector: "div.profilePageUserStatsInfo a",
            locate: Locate::NthText(1),
        },
    ],
};

static ACTIVITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"Joined in ([A-Za-z]+\s+\d{4}),?\s*last active in ([A-Za-z]+\s+\d{4})")
        .expect("activity pattern is valid")
});

static COUNT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d[\d,]*)").expect("count pattern is valid"));

static AVERAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(?(\d+\.\d+)\)?").expect("average pattern is valid"));

/// Extracts a user profile; the identifier comes from the caller, not the page
pub fn extract_profile(document: &Document, user_id: &str) -> Extraction<UserProfile> {
    if user_id.is_empty() {
        return Extraction::Failed(FailureReason::MissingIdentifier);
    }

    let html = document.html();
    let mut fields = PROFILE_FIELDS.reader(html.root_element());

    let mut profile = UserProfile::new(user_id);

    if let Some((joined, last_active)) = fields.parse("activity", parse_activity) {
        profile.join_date = Some(joined);
        profile.last_active = Some(last_active);
    }
    profile.location = fields.text("location");
    profile.num_ratings = fields.parse("num_ratings", parse_count);
    profile.avg_rating_given = fields.parse("avg_rating_given", parse_average);

    fields.finish(profile)
}

/// Parses `"Joined in <Month Year>, last active in <Month Year>"`
fn parse_activity(text: &str) -> Option<(NaiveDate, NaiveDate)> {
    let caps = ACTIVITY.captures(text)?;
    let joined = parse_month_year(caps.get(1)?.as_str())?;
    let last_active = parse_month_year(caps.get(2)?.as_str())?;
    Some((joined, last_active))
}

fn parse_count(text: &str) -> Option<u32> {
    let digits = COUNT.captures(text)?.get(1)?.as_str().replace(',', "");
    digits.parse().ok()
}

fn parse_average(text: &str) -> Option<f32> {
    AVERAGE.captures(text)?.get(1)?.as_str().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(body: &str) -> Document {
        Document::new("https://www.goodreads.com/user/show/1", 200, body.to_string())
    }

    const PROFILE: &str = r#"<html><body>
        <div class="profilePageUserStatsInfo">
            <a href="/review/list/1?shelf=read">1,204 ratings</a>
            <a href="/review/list/1?sort=rating">(3.87 avg)</a>
        </div>
        <div class="infoBoxRowTitle">Details</div>
        <div class="infoBoxRowItem">Age 34</div>
        <div class="clear"></div>
        <div class="infoBoxRowTitle">Location</div>
        <div class="infoBoxRowItem">Lisbon, Portugal</div>
        <div class="infoBoxRowTitle">Activity</div>
        <div class="infoBoxRowItem">
            Joined in September 2016, last active in Mar 2024
        </div>
    </body></html>"#;

    #[test]
    fn test_complete_profile() {
        let extraction = extract_profile(&doc(PROFILE), "1");
        assert!(extraction.is_complete(), "{:?}", extraction.missing_fields());

        let profile = extraction.into_record().unwrap();
        assert_eq!(profile.user_id, "1");
        assert_eq!(profile.join_date, NaiveDate::from_ymd_opt(2016, 9, 1));
        assert_eq!(profile.last_active, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert_eq!(profile.location.as_deref(), Some("Lisbon, Portugal"));
        assert_eq!(profile.num_ratings, Some(1204));
        assert_eq!(profile.avg_rating_given, Some(3.87));
    }

    #[test]
    fn test_empty_page_keeps_identifier() {
        let extraction = extract_profile(&doc("<html><body></body></html>"), "77");

        assert!(!extraction.is_failed());
        assert_eq!(
            extraction.missing_fields(),
            &["activity", "location", "num_ratings", "avg_rating_given"]
        );
        assert_eq!(extraction.into_record(), Some(UserProfile::new("77")));
    }

    #[test]
    fn test_unmatched_activity_phrase_degrades_dates_only() {
        let html = r#"<html><body>
            <div class="infoBoxRowTitle">Activity</div>
            <div class="infoBoxRowItem">Joined in May 2012, last active this month</div>
            <div class="profilePageUserStatsInfo"><a>12 ratings</a><a>(4.50 avg)</a></div>
        </body></html>"#;
        let profile = extract_profile(&doc(html), "5").into_record().unwrap();

        assert_eq!(profile.join_date, None);
        assert_eq!(profile.last_active, None);
        assert_eq!(profile.num_ratings, Some(12));
        assert_eq!(profile.avg_rating_given, Some(4.5));
    }

    #[test]
    fn test_missing_identifier_fails() {
        assert_eq!(
            extract_profile(&doc(PROFILE), ""),
            Extraction::Failed(FailureReason::MissingIdentifier)
        );
    }
}
