//! Shared fixtures: configuration, page builders and mock mounting

use programme_harvest::config::Config;
use programme_harvest::record::{FailureRecord, ListingRecord, ScrapedRecord};
use programme_harvest::storage::read_json_array;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MORE_LINK: &str = "link link--nowrap u-stretched-link u-position-static result__link qa-more-link u-text-primary u-font-italic";

/// Creates a test configuration pointing at `server` and writing into `dir`
pub fn create_test_config(server: &MockServer, dir: &TempDir) -> Config {
    let file = |name: &str| dir.path().join(name).display().to_string();

    let mut config = Config::default();
    config.crawler.batch_size = 2;
    config.crawler.batch_delay_ms = 10;
    config.crawler.request_timeout_secs = 1;
    config.crawler.discovery_failure_limit = 2;
    config.user_agent.crawler_name = "TestBot".to_string();
    config.source.base_origin = server.uri();
    config.source.listing_url = format!("{}/list?limit=100", server.uri());
    config.source.page_param = "p".to_string();
    config.source.last_page = None;
    config.output.listings_path = file("universities.json");
    config.output.programmes_path = file("programs_detailed.json");
    config.output.failures_path = file("failed_urls.json");
    config.output.summary_path = file("summary.md");
    config.output.database_path = file("programmes.db");
    config
}

/// A listing page with one card per `(name, href)`
pub fn listing_page(cards: &[(&str, &str)]) -> String {
    let body: String = cards
        .iter()
        .map(|(name, href)| {
            format!(
                r#"<div class="result"><a class="{}" href="{}"><span class="sr-only">More about {}</span></a></div>"#,
                MORE_LINK, href, name
            )
        })
        .collect();
    format!("<html><body><div class=\"results\">{}</div></body></html>", body)
}

/// A detail page with a header, key facts, a deadline, a language and a contact
pub fn detail_page(name: &str, degree: &str) -> String {
    format!(
        r#"<html><body>
        <h2 class="u-divider"><span class="u-text-primary">{name}</span><span>Test University</span></h2>
        <dl><div class="keyfact__item"><dt>Degree</dt><dd>{degree}</dd></div>
            <div class="keyfact__item"><dt>Location</dt><dd>Berlin</dd></div></dl>
        <div id="hsk-detail-overview"><h4>Study Type</h4><p>Full-time</p></div>
        <div id="hsk-detail-deadlines"><ul><li class="mb-16"><h5>Winter semester</h5>
            <p class="js-dynamic-content">15 July</p></li></ul></div>
        <div id="hsk-detail-languages"><h4>English</h4><p>All courses</p></div>
        <aside><div class="qa-contact-list"><h3>Admissions</h3><h4>Office</h4>
            <a class="qa-email">admissions at test dot example</a></div></aside>
        </body></html>"#
    )
}

/// Mounts a listing page at `/list?p=<page>`
pub async fn mount_listing(server: &MockServer, page: u32, body: String) {
    Mock::given(method("GET"))
        .and(path("/list"))
        .and(query_param("p", page.to_string()))
        .respond_with(html(body))
        .mount(server)
        .await;
}

/// An HTML 200 response
pub fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html")
}

pub fn read_successes(config: &Config) -> Vec<ScrapedRecord> {
    read_json_array(Path::new(&config.output.programmes_path)).unwrap()
}

pub fn read_failures(config: &Config) -> Vec<FailureRecord> {
    read_json_array(Path::new(&config.output.failures_path)).unwrap()
}

pub fn read_listings(config: &Config) -> Vec<ListingRecord> {
    read_json_array(Path::new(&config.output.listings_path)).unwrap()
}
