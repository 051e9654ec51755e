//! Fixture pages and mock helpers shared by the integration tests

use bookgraph::config::{Config, CrawlerConfig, OutputConfig, PolitenessConfig, SiteConfig};
use std::path::Path;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

/// Matches requests without a query string
///
/// A book page and its review listing share a path; only the listing
/// carries `?page=1`.
pub struct NoQuery;

impl Match for NoQuery {
    fn matches(&self, request: &Request) -> bool {
        request.url.query().is_none()
    }
}

/// Creates a test configuration pointed at `base_url` with no delays
pub fn test_config(base_url: &str, dir: &Path, seed: &str, max_depth: u32) -> Config {
    Config {
        crawler: CrawlerConfig {
            seed_user: seed.to_string(),
            max_depth,
            reviewers_per_book: 5,
            max_interaction_pages: None,
        },
        politeness: PolitenessConfig {
            min_delay_ms: 0,
            max_delay_ms: 0,
            book_delay_min_ms: 0,
            book_delay_max_ms: 0,
            request_timeout_secs: 5,
        },
        site: SiteConfig {
            base_url: base_url.to_string(),
        },
        output: OutputConfig {
            database_path: dir.join("bookgraph.db").to_string_lossy().into_owned(),
            state_dir: dir.join("state").to_string_lossy().into_owned(),
        },
    }
}

pub fn profile_page(location: &str) -> String {
    format!(
        r#"<html><body>
        <div class="profilePageUserStatsInfo">
            <a href="/review/list/1?shelf=read">12 ratings</a>
            <a href="/review/list/1?sort=rating">(3.50 avg)</a>
        </div>
        <div class="infoBoxRowTitle">Location</div>
        <div class="infoBoxRowItem">{location}</div>
        <div class="infoBoxRowTitle">Activity</div>
        <div class="infoBoxRowItem">Joined in September 2016, last active in January 2025</div>
        </body></html>"#
    )
}

pub fn read_list_page(book_ids: &[&str], has_next: bool) -> String {
    let rows: String = book_ids
        .iter()
        .enumerate()
        .map(|(i, book_id)| {
            format!(
                r##"<tr id="review_{review}">
                <td class="field title"><div class="value">
                    <a title="Book {book_id}" href="/book/show/{book_id}-some-title">Book {book_id}</a></div></td>
                <td class="field author"><div class="value"><a href="/author/show/9">Some Author</a></div></td>
                <td class="field rating"><div class="value">
                    <span class="staticStars notranslate" title="liked it"></span></div></td>
                <td class="field shelves"><div class="value"><a class="shelfLink" href="#">read</a></div></td>
                <td class="field date_read"><div class="value"><span class="date_read_value">Jan 2024</span></div></td>
                </tr>"##,
                review = 9000 + i,
                book_id = book_id
            )
        })
        .collect();
    let next = if has_next {
        r#"<a class="next_page" rel="next" href="?page=2">next »</a>"#
    } else {
        ""
    };
    format!("<html><body><table><tbody>{rows}</tbody></table>{next}</body></html>")
}

pub fn book_page(title: &str) -> String {
    format!(
        r#"<html><body>
        <h1 data-testid="bookTitle">{title}</h1>
        <a class="ContributorLink" href="/author/show/9.Some_Author"><span class="ContributorLink__name">Some Author</span></a>
        <div class="RatingStatistics__rating">4.10</div>
        <span data-testid="ratingsCount">1,024 ratings</span>
        <p data-testid="publicationInfo">First published June 1, 1999</p>
        </body></html>"#
    )
}

pub fn reviews_page(reviewer_ids: &[&str]) -> String {
    let cards: String = reviewer_ids
        .iter()
        .map(|id| {
            format!(
                r#"<article class="ReviewCard"><div class="ReviewerProfile__name"><a href="/user/show/{id}-reader">Reader</a></div></article>"#
            )
        })
        .collect();
    format!("<html><body>{cards}</body></html>")
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html")
}

pub fn profile_mock(user_id: &str, location: &str) -> Mock {
    Mock::given(method("GET"))
        .and(path(format!("/user/show/{}", user_id)))
        .respond_with(html(profile_page(location)))
}

/// Single-page read list
pub fn read_list_mock(user_id: &str, book_ids: &[&str]) -> Mock {
    Mock::given(method("GET"))
        .and(path(format!("/review/list/{}", user_id)))
        .respond_with(html(read_list_page(book_ids, false)))
}

/// One page of a paginated read list
pub fn read_list_page_mock(user_id: &str, page: u32, book_ids: &[&str], has_next: bool) -> Mock {
    Mock::given(method("GET"))
        .and(path(format!("/review/list/{}", user_id)))
        .and(query_param("page", page.to_string()))
        .respond_with(html(read_list_page(book_ids, has_next)))
}

pub fn book_mock(book_id: &str) -> Mock {
    Mock::given(method("GET"))
        .and(path(format!("/book/show/{}", book_id)))
        .and(NoQuery)
        .respond_with(html(book_page(&format!("Title {}", book_id))))
}

pub fn reviews_mock(book_id: &str, reviewer_ids: &[&str]) -> Mock {
    Mock::given(method("GET"))
        .and(path(format!("/book/show/{}", book_id)))
        .and(query_param("page", "1"))
        .respond_with(html(reviews_page(reviewer_ids)))
}

/// Mounts a profile and a single-page read list
pub async fn mount_user(server: &MockServer, user_id: &str, book_ids: &[&str]) {
    profile_mock(user_id, "Springfield").mount(server).await;
    read_list_mock(user_id, book_ids).mount(server).await;
}

/// Mounts a book page and its review listing
pub async fn mount_book(server: &MockServer, book_id: &str, reviewer_ids: &[&str]) {
    book_mock(book_id).mount(server).await;
    reviews_mock(book_id, reviewer_ids).mount(server).await;
}

/// Paths of the profile requests the server saw, in arrival order
pub async fn profile_requests(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .map(|r| r.url.path().to_string())
        .filter(|p| p.starts_with("/user/show/"))
        .collect()
}
