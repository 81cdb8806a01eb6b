//! Listing discovery tests

use crate::support::{create_test_config, html, listing_page, mount_listing, read_listings};
use programme_harvest::crawler::Coordinator;
use programme_harvest::PipelinePhase;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_discovery_resolves_and_dedups_across_pages() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir);

    let a = format!("{}/programmes/a/", server.uri());
    mount_listing(&server, 1, listing_page(&[("Alpha", &a), ("Beta", "/programmes/b/")])).await;
    mount_listing(&server, 2, listing_page(&[("Beta", "/programmes/b/"), ("Delta", "/programmes/d/")])).await;
    mount_listing(&server, 3, listing_page(&[])).await;

    let mut coordinator = Coordinator::new(config.clone()).unwrap();
    let report = coordinator.discover_listings().await.unwrap();
    coordinator.finish().unwrap();

    assert_eq!(report.pages_ok, 3);
    assert_eq!(report.new_listings, 3);
    assert_eq!(coordinator.phase(), PipelinePhase::Done);

    let listings = read_listings(&config);
    let urls: Vec<&str> = listings.iter().map(|l| l.url.as_str()).collect();
    assert_eq!(
        urls,
        vec![
            a.as_str(),
            &format!("{}/programmes/b/", server.uri()),
            &format!("{}/programmes/d/", server.uri()),
        ]
    );
}

#[tokio::test]
async fn test_timed_out_page_is_skipped() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server, &dir);
    config.source.last_page = Some(3);

    mount_listing(&server, 1, listing_page(&[("Alpha", "/programmes/a/")])).await;
    Mock::given(method("GET"))
        .and(path("/list"))
        .and(query_param("p", "2"))
        .respond_with(
            html(listing_page(&[("Slow", "/programmes/slow/")])).set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;
    mount_listing(&server, 3, listing_page(&[("Gamma", "/programmes/c/")])).await;

    let mut coordinator = Coordinator::new(config.clone()).unwrap();
    let report = coordinator.discover_listings().await.unwrap();

    assert_eq!(report.pages_ok, 2);
    assert_eq!(report.pages_failed, 1);

    let names: Vec<String> = read_listings(&config).into_iter().map(|l| l.name).collect();
    assert_eq!(names, vec!["Alpha".to_string(), "Gamma".to_string()]);
}

#[tokio::test]
async fn test_discovery_resumes_from_saved_listings() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir);

    mount_listing(&server, 1, listing_page(&[("Alpha", "/programmes/a/")])).await;
    mount_listing(&server, 2, listing_page(&[])).await;

    let mut first = Coordinator::new(config.clone()).unwrap();
    first.discover_listings().await.unwrap();

    let mut second = Coordinator::new(config.clone()).unwrap();
    let report = second.discover_listings().await.unwrap();

    assert_eq!(report.new_listings, 0);
    assert_eq!(report.total_listings, 1);
}

#[tokio::test]
async fn test_open_ended_discovery_gives_up_after_failures() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir);

    Mock::given(method("GET"))
        .and(path("/list"))
        .respond_with(ResponseTemplate::new(502))
        .expect(2)
        .mount(&server)
        .await;

    let mut coordinator = Coordinator::new(config.clone()).unwrap();
    let report = coordinator.discover_listings().await.unwrap();

    assert_eq!(report.pages_failed, 2);
    assert!(read_listings(&config).is_empty());
}
