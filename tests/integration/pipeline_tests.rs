//! End-to-end pipeline tests: discovery, extraction, resume and retry

use crate::support::{
    create_test_config, detail_page, html, listing_page, mount_listing, read_failures,
    read_listings, read_successes,
};
use programme_harvest::crawler::Coordinator;
use programme_harvest::record::{DetailRecord, ScrapedRecord};
use programme_harvest::run_pipeline;
use programme_harvest::storage::write_json_atomic;
use std::collections::HashSet;
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mounts page 1 with three programmes (one relative href) and an empty page 2
async fn mount_three_programme_listing(server: &MockServer) {
    let a = format!("{}/programmes/a/", server.uri());
    let b = format!("{}/programmes/b/", server.uri());
    mount_listing(
        server,
        1,
        listing_page(&[("Alpha", &a), ("Beta", &b), ("Gamma", "/programmes/c/")]),
    )
    .await;
    mount_listing(server, 2, listing_page(&[])).await;
}

async fn mount_detail(server: &MockServer, slug: &str, name: &str, expected: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/programmes/{}/", slug)))
        .respond_with(html(detail_page(name, "Master of Science")))
        .expect(expected)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_pipeline_records_every_key_once() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir);

    mount_three_programme_listing(&server).await;
    mount_detail(&server, "a", "Alpha", 1).await;
    mount_detail(&server, "b", "Beta", 1).await;
    Mock::given(method("GET"))
        .and(path("/programmes/c/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let (successes, failures) = run_pipeline(config.clone()).await.unwrap();
    assert_eq!((successes, failures), (2, 1));

    let listings = read_listings(&config);
    assert_eq!(listings.len(), 3);
    assert_eq!(listings[2].name, "Gamma");
    assert_eq!(listings[2].url, format!("{}/programmes/c/", server.uri()));

    let records = read_successes(&config);
    let alpha = records
        .iter()
        .find(|r| r.detail.name.as_deref() == Some("Alpha"))
        .unwrap();
    assert_eq!(
        alpha.detail.link.as_deref(),
        Some(format!("{}/programmes/a/", server.uri()).as_str())
    );
    assert_eq!(alpha.detail.degree.as_deref(), Some("Master of Science"));
    assert_eq!(alpha.detail.application_deadlines.len(), 1);
    assert_eq!(
        alpha.detail.contacts["Admissions"].email.as_deref(),
        Some("admissions@test dot example")
    );
    assert!(!alpha.scraped_at.is_empty());

    let failed = read_failures(&config);
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].url, format!("{}/programmes/c/", server.uri()));
    assert_eq!(failed[0].error, "HTTP 503");

    // Every discovered key is in exactly one collection.
    let ok: HashSet<String> = records.iter().filter_map(|r| r.detail.link.clone()).collect();
    let bad: HashSet<String> = failed.iter().map(|f| f.url.clone()).collect();
    assert!(ok.is_disjoint(&bad));
    for listing in &listings {
        assert!(ok.contains(&listing.url) ^ bad.contains(&listing.url));
    }
}

#[tokio::test]
async fn test_second_run_is_idempotent() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir);

    mount_three_programme_listing(&server).await;
    // Each detail page may be fetched once across both runs.
    mount_detail(&server, "a", "Alpha", 1).await;
    mount_detail(&server, "b", "Beta", 1).await;
    mount_detail(&server, "c", "Gamma", 1).await;

    let first = run_pipeline(config.clone()).await.unwrap();
    let snapshot = std::fs::read_to_string(&config.output.programmes_path).unwrap();

    let second = run_pipeline(config.clone()).await.unwrap();
    let after = std::fs::read_to_string(&config.output.programmes_path).unwrap();

    assert_eq!(first, (3, 0));
    assert_eq!(second, (3, 0));
    assert_eq!(snapshot, after);
}

#[tokio::test]
async fn test_resume_skips_checkpointed_successes() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir);

    // A previous, interrupted run already extracted "a".
    let done = ScrapedRecord {
        detail: DetailRecord::for_link(format!("{}/programmes/a/", server.uri())),
        scraped_at: "2024-01-01T00:00:00+00:00".to_string(),
    };
    write_json_atomic(Path::new(&config.output.programmes_path), &[done]).unwrap();

    mount_three_programme_listing(&server).await;
    mount_detail(&server, "a", "Alpha", 0).await;
    mount_detail(&server, "b", "Beta", 1).await;
    mount_detail(&server, "c", "Gamma", 1).await;

    let (successes, failures) = run_pipeline(config.clone()).await.unwrap();
    assert_eq!((successes, failures), (3, 0));

    let links: Vec<String> = read_successes(&config)
        .into_iter()
        .filter_map(|r| r.detail.link)
        .collect();
    let unique: HashSet<&String> = links.iter().collect();
    assert_eq!(links.len(), unique.len());
}

#[tokio::test]
async fn test_retry_failures_recovers_failed_keys() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir);

    mount_three_programme_listing(&server).await;
    mount_detail(&server, "a", "Alpha", 1).await;
    mount_detail(&server, "b", "Beta", 1).await;
    // "c" fails once, then recovers.
    Mock::given(method("GET"))
        .and(path("/programmes/c/"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_detail(&server, "c", "Gamma", 1).await;

    let (successes, failures) = run_pipeline(config.clone()).await.unwrap();
    assert_eq!((successes, failures), (2, 1));
    assert_eq!(read_failures(&config)[0].error, "HTTP 500");

    let mut coordinator = Coordinator::new(config.clone()).unwrap();
    let report = coordinator.retry_failures().await.unwrap();

    assert_eq!(report.attempted, 1);
    assert_eq!(report.total_successes, 3);
    assert_eq!(report.total_failures, 0);
    assert!(read_failures(&config).is_empty());
}

#[tokio::test]
async fn test_timeout_is_recorded_as_failure() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir);

    mount_three_programme_listing(&server).await;
    mount_detail(&server, "a", "Alpha", 1).await;
    mount_detail(&server, "b", "Beta", 1).await;
    Mock::given(method("GET"))
        .and(path("/programmes/c/"))
        .respond_with(html(detail_page("Gamma", "PhD")).set_delay(std::time::Duration::from_secs(3)))
        .mount(&server)
        .await;

    let (successes, failures) = run_pipeline(config.clone()).await.unwrap();
    assert_eq!((successes, failures), (2, 1));
    assert_eq!(read_failures(&config)[0].error, "Timeout");
}

#[tokio::test]
async fn test_details_only_without_listings_attempts_nothing() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir);

    let mut coordinator = Coordinator::new(config).unwrap();
    let report = coordinator.extract_details().await.unwrap();

    assert_eq!(report.attempted, 0);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_every_request_carries_identification_header() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir);
    let agent = config.user_agent.header_value();
    assert!(agent.starts_with("TestBot/"));

    let a = format!("{}/programmes/a/", server.uri());
    for (page, body) in [(1, listing_page(&[("Alpha", &a)])), (2, listing_page(&[]))] {
        Mock::given(method("GET"))
            .and(path("/list"))
            .and(query_param("p", page.to_string()))
            .and(header("user-agent", agent.as_str()))
            .respond_with(html(body))
            .expect(1)
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/programmes/a/"))
        .and(header("user-agent", agent.as_str()))
        .respond_with(html(detail_page("Alpha", "Master of Science")))
        .expect(1)
        .mount(&server)
        .await;

    let (successes, failures) = run_pipeline(config).await.unwrap();

    assert_eq!((successes, failures), (1, 0));
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}
