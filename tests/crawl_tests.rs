//! End-to-end crawl tests
//!
//! These tests run the traversal engine against wiremock HTTP servers and
//! check the crawler's externally observable behavior: which URLs are
//! yielded, which pages are fetched (and how many times), and what survives
//! in the state database.

use gleaner::crawler::RetryPolicy;
use gleaner::storage::{SqliteStateStore, StateStore};
use gleaner::url::url_hash;
use gleaner::{Crawler, CrawlerOptions, FilterMode, FilterRules, GleanerError};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Crawler options with fast retries for testing
fn options(seed: &str) -> CrawlerOptions {
    CrawlerOptions {
        seed_url: seed.to_string(),
        user_agent: "gleaner-test/0.1".to_string(),
        retry: RetryPolicy {
            max_retries: 0,
            delay: Duration::from_millis(10),
        },
        ..Default::default()
    }
}

/// Mounts HEAD + GET mocks serving an HTML page at the given path
async fn serve_page(server: &MockServer, page_path: &str, body: &str) {
    Mock::given(method("HEAD"))
        .and(path(page_path))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "text/html"))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body.to_string())
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

/// Like serve_page, but asserts the page is fetched exactly `hits` times
async fn serve_page_expect(server: &MockServer, page_path: &str, body: &str, hits: u64) {
    Mock::given(method("HEAD"))
        .and(path(page_path))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "text/html"))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body.to_string())
                .insert_header("content-type", "text/html"),
        )
        .expect(hits)
        .mount(server)
        .await;
}

/// Runs the crawl to completion, collecting yielded URLs and errors
async fn run_crawl(crawler: Crawler, max_depth: u32) -> (Vec<String>, Vec<GleanerError>) {
    let (mut urls, mut errors) = crawler.start(max_depth);

    let mut yielded = Vec::new();
    while let Some(url) = urls.recv().await {
        yielded.push(url);
    }

    let mut failures = Vec::new();
    while let Some(err) = errors.recv().await {
        failures.push(err);
    }

    (yielded, failures)
}

#[tokio::test]
async fn test_crawl_yields_links_in_document_order() {
    let server = MockServer::start().await;
    let base = server.uri();
    let seed = format!("{}/", base);

    serve_page(
        &server,
        "/",
        r#"<html><body><a href="/page1">1</a><a href="/page2">2</a></body></html>"#,
    )
    .await;
    serve_page(&server, "/page1", "<html><body>no links</body></html>").await;
    serve_page(&server, "/page2", "<html><body>no links</body></html>").await;

    let crawler = Crawler::new(options(&seed)).unwrap();
    let (yielded, failures) = run_crawl(crawler, 2).await;

    assert_eq!(
        yielded,
        vec![format!("{}/page1", base), format!("{}/page2", base)]
    );
    assert!(failures.is_empty());
}

#[tokio::test]
async fn test_domain_confinement() {
    let server = MockServer::start().await;
    let base = server.uri();
    let seed = format!("{}/", base);

    serve_page(
        &server,
        "/",
        r#"<html><body>
            <a href="https://elsewhere.org/x">external</a>
            <a href="/ok">internal</a>
        </body></html>"#,
    )
    .await;
    serve_page(&server, "/ok", "<html><body></body></html>").await;

    let crawler = Crawler::new(options(&seed)).unwrap();
    let (yielded, failures) = run_crawl(crawler, 3).await;

    assert_eq!(yielded, vec![format!("{}/ok", base)]);
    assert!(failures.is_empty(), "external URL must never be fetched");
}

#[tokio::test]
async fn test_seed_and_current_entry_never_yielded() {
    let server = MockServer::start().await;
    let base = server.uri();
    let seed = format!("{}/", base);

    // The seed page links to itself (relative and absolute) and to /self,
    // which links to itself and back to the seed
    serve_page_expect(
        &server,
        "/",
        &format!(
            r#"<html><body>
                <a href="/">home</a>
                <a href="{}/">home again</a>
                <a href="/self">self page</a>
            </body></html>"#,
            base
        ),
        1,
    )
    .await;
    serve_page_expect(
        &server,
        "/self",
        r#"<html><body><a href="/self">me</a><a href="/">home</a></body></html>"#,
        1,
    )
    .await;

    let crawler = Crawler::new(options(&seed)).unwrap();
    let (yielded, failures) = run_crawl(crawler, 3).await;

    assert_eq!(yielded, vec![format!("{}/self", base)]);
    assert!(failures.is_empty());
}

#[tokio::test]
async fn test_cycle_expanded_once() {
    let server = MockServer::start().await;
    let base = server.uri();
    let seed = format!("{}/", base);

    serve_page(&server, "/", r#"<a href="/b">b</a>"#).await;
    serve_page_expect(&server, "/b", r#"<a href="/c">c</a>"#, 1).await;
    serve_page_expect(&server, "/c", r#"<a href="/b">back</a>"#, 1).await;

    let crawler = Crawler::new(options(&seed)).unwrap();
    let (yielded, failures) = run_crawl(crawler, 10).await;

    // /b is yielded twice (discovered from / and from /c) but expanded once
    assert_eq!(
        yielded,
        vec![
            format!("{}/b", base),
            format!("{}/c", base),
            format!("{}/b", base)
        ]
    );
    assert!(failures.is_empty());
}

#[tokio::test]
async fn test_depth_boundary_children_not_fetched() {
    let server = MockServer::start().await;
    let base = server.uri();
    let seed = format!("{}/", base);

    serve_page(&server, "/", r#"<a href="/child">child</a>"#).await;
    serve_page_expect(&server, "/child", r#"<a href="/grandchild">g</a>"#, 0).await;

    let crawler = Crawler::new(options(&seed)).unwrap();
    let (yielded, failures) = run_crawl(crawler, 1).await;

    // Children are discovered and classified but never fetched
    assert_eq!(yielded, vec![format!("{}/child", base)]);
    assert!(failures.is_empty());
}

#[tokio::test]
async fn test_depth_two_stops_at_grandchildren() {
    let server = MockServer::start().await;
    let base = server.uri();
    let seed = format!("{}/", base);

    serve_page(&server, "/", r#"<a href="/child">child</a>"#).await;
    serve_page_expect(&server, "/child", r#"<a href="/grandchild">g</a>"#, 1).await;
    serve_page_expect(&server, "/grandchild", "<html></html>", 0).await;

    let crawler = Crawler::new(options(&seed)).unwrap();
    let (yielded, _) = run_crawl(crawler, 2).await;

    assert_eq!(
        yielded,
        vec![format!("{}/child", base), format!("{}/grandchild", base)]
    );
}

#[tokio::test]
async fn test_entry_and_yield_filters_are_independent() {
    let server = MockServer::start().await;
    let base = server.uri();
    let seed = format!("{}/", base);

    serve_page(
        &server,
        "/",
        r#"<a href="/blog/a">post</a><a href="/about">about</a>"#,
    )
    .await;
    // Yielded but never entered
    serve_page_expect(&server, "/blog/a", r#"<a href="/hidden">x</a>"#, 0).await;
    // Entered but never yielded
    serve_page_expect(&server, "/about", r#"<a href="/blog/b">post</a>"#, 1).await;

    let mut opts = options(&seed);
    opts.entry_filter = Some(FilterRules::new(FilterMode::Deny, &["/blog/"]).unwrap());
    opts.yield_filter = Some(FilterRules::new(FilterMode::Allow, &["/blog/"]).unwrap());

    let crawler = Crawler::new(opts).unwrap();
    let (yielded, failures) = run_crawl(crawler, 3).await;

    assert_eq!(
        yielded,
        vec![format!("{}/blog/a", base), format!("{}/blog/b", base)]
    );
    assert!(failures.is_empty());
}

#[tokio::test]
async fn test_resume_from_pending_entries() {
    let server = MockServer::start().await;
    let base = server.uri();
    let seed = format!("{}/", base);

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("state.db");

    // Simulate an interrupted prior run: two URLs still pending
    let pending = vec![format!("{}/a", base), format!("{}/b", base)];
    {
        let mut store = SqliteStateStore::open(&db_path, &url_hash(&seed)).unwrap();
        store.add_many(&pending).unwrap();
    }

    // The seed page must NOT be fetched on resume
    serve_page_expect(&server, "/", "<html></html>", 0).await;
    serve_page(&server, "/a", r#"<a href="/x">x</a>"#).await;
    serve_page(&server, "/b", r#"<a href="/y">y</a>"#).await;

    let mut opts = options(&seed);
    opts.state_db = Some(db_path.clone());

    let crawler = Crawler::new(opts).unwrap();
    let (yielded, failures) = run_crawl(crawler, 1).await;

    assert_eq!(yielded, vec![format!("{}/x", base), format!("{}/y", base)]);
    assert!(failures.is_empty());

    // Both pending records were removed on successful expansion
    let store = SqliteStateStore::open(&db_path, &url_hash(&seed)).unwrap();
    assert!(!store.exists().unwrap());
}

#[tokio::test]
async fn test_failed_page_keeps_pending_record() {
    let server = MockServer::start().await;
    let base = server.uri();
    let seed = format!("{}/", base);

    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("state.db");

    // /broken is discovered and persisted, then fails to fetch
    Mock::given(method("HEAD"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    serve_page(&server, "/", r#"<a href="/broken">broken</a>"#).await;

    let mut opts = options(&seed);
    opts.state_db = Some(db_path.clone());

    let crawler = Crawler::new(opts).unwrap();
    let (yielded, failures) = run_crawl(crawler, 2).await;

    assert_eq!(yielded, vec![format!("{}/broken", base)]);
    assert_eq!(failures.len(), 1);

    // The abandoned page stays pending so a future run can retry it
    let store = SqliteStateStore::open(&db_path, &url_hash(&seed)).unwrap();
    assert_eq!(store.list_all().unwrap(), vec![format!("{}/broken", base)]);
}

#[tokio::test]
async fn test_retry_exhaustion_attempt_count() {
    let server = MockServer::start().await;
    let seed = format!("{}/", server.uri());

    // max_retries = 2 means exactly 3 attempts, then the branch is abandoned
    Mock::given(method("HEAD"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let mut opts = options(&seed);
    opts.retry = RetryPolicy {
        max_retries: 2,
        delay: Duration::from_millis(10),
    };

    let crawler = Crawler::new(opts).unwrap();
    let (yielded, failures) = run_crawl(crawler, 2).await;

    assert!(yielded.is_empty());
    assert_eq!(failures.len(), 1);
    assert!(matches!(
        failures[0],
        GleanerError::Fetch(gleaner::crawler::FetchError::Network { .. })
    ));
}

#[tokio::test]
async fn test_content_type_mismatch_not_retried() {
    let server = MockServer::start().await;
    let seed = format!("{}/", server.uri());

    Mock::given(method("HEAD"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "application/pdf"))
        .expect(1)
        .mount(&server)
        .await;

    let mut opts = options(&seed);
    opts.retry = RetryPolicy {
        max_retries: 5,
        delay: Duration::from_millis(10),
    };

    let crawler = Crawler::new(opts).unwrap();
    let (yielded, failures) = run_crawl(crawler, 2).await;

    assert!(yielded.is_empty());
    assert_eq!(failures.len(), 1);
    assert!(matches!(
        failures[0],
        GleanerError::Fetch(gleaner::crawler::FetchError::ContentType { .. })
    ));
}

#[tokio::test]
async fn test_dropped_receiver_stops_traversal() {
    let server = MockServer::start().await;
    let base = server.uri();
    let seed = format!("{}/", base);

    serve_page(&server, "/", r#"<a href="/a">a</a><a href="/b">b</a>"#).await;
    serve_page_expect(&server, "/a", "<html></html>", 0).await;
    serve_page_expect(&server, "/b", "<html></html>", 0).await;

    let crawler = Crawler::new(options(&seed)).unwrap();
    let (urls, mut errors) = crawler.start(3);

    // Consumer goes away before pulling anything
    drop(urls);

    // Wait for the producer task to wind down
    while errors.recv().await.is_some() {}
}

#[tokio::test]
async fn test_fetch_failures_do_not_abort_siblings() {
    let server = MockServer::start().await;
    let base = server.uri();
    let seed = format!("{}/", base);

    serve_page(
        &server,
        "/",
        r#"<a href="/dead">dead</a><a href="/alive">alive</a>"#,
    )
    .await;
    Mock::given(method("HEAD"))
        .and(path("/dead"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    serve_page_expect(&server, "/alive", r#"<a href="/deeper">d</a>"#, 1).await;

    let crawler = Crawler::new(options(&seed)).unwrap();
    let (yielded, failures) = run_crawl(crawler, 2).await;

    // The dead branch is abandoned; the sibling still expands
    assert_eq!(
        yielded,
        vec![
            format!("{}/dead", base),
            format!("{}/alive", base),
            format!("{}/deeper", base)
        ]
    );
    assert_eq!(failures.len(), 1);
}
