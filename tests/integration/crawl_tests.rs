//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use bald_stalker::config::UserAgentConfig;
use bald_stalker::crawler::{build_http_client, crawl, CrawlOptions, CrawlOutcome, Crawler};
use bald_stalker::normalize_url;
use bald_stalker::output::{build_graph, write_csv_report};
use bald_stalker::state::PageState;
use std::time::{Duration, Instant};
use wiremock::matchers::{header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Upper bound for any single crawl in these tests
const CRAWL_DEADLINE: Duration = Duration::from_secs(30);

fn html(body: impl Into<String>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.into().into_bytes(), "text/html")
}

fn page_linking_to(title: &str, links: &[String]) -> String {
    let anchors: String = links
        .iter()
        .map(|l| format!(r#"<a href="{}">{}</a>"#, l, l))
        .collect();
    format!(
        "<html><body><h1>{}</h1><p>About {}.</p>{}</body></html>",
        title, title, anchors
    )
}

async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html(body))
        .mount(server)
        .await;
}

async fn run_crawl(seed: &str, max_concurrency: usize, max_pages: usize) -> CrawlOutcome {
    let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(10))
        .expect("client");
    let crawler = Crawler::new(
        seed,
        CrawlOptions {
            max_concurrency,
            max_pages,
        },
        client,
    )
    .expect("valid seed");

    tokio::time::timeout(CRAWL_DEADLINE, crawler.run())
        .await
        .expect("crawl did not terminate")
}

#[tokio::test]
async fn test_single_page_without_links() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("user-agent", "BaldStalker/1.0"))
        .respond_with(html(page_linking_to("Home", &[])))
        .expect(1)
        .mount(&server)
        .await;

    let pages = crawl(&format!("{}/", server.uri()), 3, 10)
        .await
        .expect("crawl");

    assert_eq!(pages.len(), 1);
    let record = &pages["127.0.0.1"];
    assert_eq!(record.url, format!("{}/", server.uri()));
    assert_eq!(record.heading, "Home");
    assert_eq!(record.first_paragraph, "About Home.");
    assert!(record.outgoing_links.is_empty());
}

#[tokio::test]
async fn test_cycle_visits_each_page_once() {
    let server = MockServer::start().await;
    let base = server.uri();

    for (route, next) in [("/", "/b"), ("/b", "/c"), ("/c", "/")] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(html(page_linking_to(route, &[format!("{}{}", base, next)])))
            .expect(1)
            .mount(&server)
            .await;
    }

    let outcome = run_crawl(&format!("{}/", base), 5, 10).await;

    let keys: Vec<&str> = outcome.pages.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["127.0.0.1", "127.0.0.1/b", "127.0.0.1/c"]);
    assert!(!outcome.budget_exhausted);
}

#[tokio::test]
async fn test_linear_chain_stops_at_budget() {
    let server = MockServer::start().await;
    let base = server.uri();

    for i in 0..20 {
        let next = format!("{}/p{}", base, i + 1);
        mount_page(&server, &format!("/p{}", i), page_linking_to("chain", &[next])).await;
    }

    let outcome = run_crawl(&format!("{}/p0", base), 5, 5).await;

    assert_eq!(outcome.pages.len(), 5);
    assert_eq!(outcome.visited.len(), 5);
    assert!(outcome.budget_exhausted);
    for i in 0..5 {
        assert!(outcome.pages.contains_key(&format!("127.0.0.1/p{}", i)));
    }
}

#[tokio::test]
async fn test_star_never_exceeds_budget() {
    let server = MockServer::start().await;
    let base = server.uri();

    let children: Vec<String> = (0..20).map(|i| format!("{}/child{}", base, i)).collect();
    mount_page(&server, "/", page_linking_to("hub", &children)).await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/child\d+$"))
        .respond_with(html(page_linking_to("leaf", &[])).set_delay(Duration::from_millis(50)))
        .mount(&server)
        .await;

    let outcome = run_crawl(&format!("{}/", base), 3, 5).await;

    assert!(outcome.pages.len() <= 5);
    assert!(outcome.visited.len() <= 5);
    assert!(outcome.pages.contains_key("127.0.0.1"));
    assert!(outcome.budget_exhausted);
}

#[tokio::test]
async fn test_budget_stop_cancels_in_flight_fetches() {
    let server = MockServer::start().await;
    let base = server.uri();

    let children: Vec<String> = (0..10).map(|i| format!("{}/slow{}", base, i)).collect();
    mount_page(&server, "/", page_linking_to("hub", &children)).await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/slow\d+$"))
        .respond_with(html(page_linking_to("slow", &[])).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let start = Instant::now();
    let outcome = run_crawl(&format!("{}/", base), 5, 2).await;

    // The one claimed child was still downloading when the budget ran out
    assert!(start.elapsed() < Duration::from_secs(4), "{:?}", start.elapsed());
    assert_eq!(outcome.pages.len(), 1);
    assert_eq!(outcome.visited.len(), 2);
    assert!(outcome
        .visited
        .iter()
        .any(|(_, state)| *state == PageState::SkippedFetchFailed));
}

#[tokio::test]
async fn test_equivalent_links_fetched_once() {
    let server = MockServer::start().await;
    let base = server.uri();

    let links = vec![
        format!("{}/a", base),
        format!("{}/a/", base),
        format!("{}/a?ref=nav", base),
        format!("{}/a#top", base),
    ];
    mount_page(&server, "/", page_linking_to("Home", &links)).await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/a/?$"))
        .respond_with(html(page_linking_to("A", &[])))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = run_crawl(&format!("{}/", base), 4, 10).await;

    assert_eq!(outcome.pages.len(), 2);
    assert!(outcome.pages.contains_key("127.0.0.1/a"));
}

#[tokio::test]
async fn test_other_hosts_are_never_fetched() {
    let server = MockServer::start().await;
    let other = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(html(page_linking_to("Elsewhere", &[])))
        .expect(0)
        .mount(&other)
        .await;

    // Same address, different host name
    let foreign = other.uri().replace("127.0.0.1", "localhost");
    let links = vec![format!("{}/", foreign), "https://example.invalid/x".to_string()];
    mount_page(&server, "/", page_linking_to("Home", &links)).await;

    let outcome = run_crawl(&format!("{}/", server.uri()), 2, 10).await;

    assert_eq!(outcome.pages.len(), 1);
    assert_eq!(outcome.visited.len(), 1);
    assert!(outcome.pages.keys().all(|k| k.starts_with("127.0.0.1")));
    // The foreign links are still reported on the page
    assert_eq!(outcome.pages["127.0.0.1"].outgoing_links.len(), 2);
}

#[tokio::test]
async fn test_failed_and_non_html_pages_consume_budget() {
    let server = MockServer::start().await;
    let base = server.uri();

    let links = vec![format!("{}/missing", base), format!("{}/logo.png", base)];
    mount_page(&server, "/", page_linking_to("Home", &links)).await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_raw("<h1>Gone</h1>", "text/html"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/logo.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0x89, 0x50], "image/png"))
        .mount(&server)
        .await;

    let outcome = run_crawl(&format!("{}/", base), 2, 10).await;

    assert_eq!(outcome.pages.len(), 1);
    assert_eq!(outcome.visited.len(), 3);
    assert_eq!(
        outcome.visited.get("127.0.0.1/missing"),
        Some(&PageState::SkippedNotHtml)
    );
    assert_eq!(
        outcome.visited.get("127.0.0.1/logo.png"),
        Some(&PageState::SkippedNotHtml)
    );

    // With room for only one child, the other finds the budget spent
    let tight = run_crawl(&format!("{}/", base), 2, 2).await;
    assert_eq!(tight.pages.len(), 1);
    assert_eq!(tight.visited.len(), 2);
    assert!(tight.budget_exhausted);
}

#[tokio::test]
async fn test_cross_host_redirect_yields_no_record() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", page_linking_to("Home", &[format!("{}/out", base)])).await;
    Mock::given(method("GET"))
        .and(path("/out"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("location", "http://example.invalid/"),
        )
        .mount(&server)
        .await;

    let outcome = run_crawl(&format!("{}/", base), 2, 10).await;

    assert_eq!(outcome.pages.len(), 1);
    assert_eq!(
        outcome.visited.get("127.0.0.1/out"),
        Some(&PageState::SkippedNotHtml)
    );
}

#[tokio::test]
async fn test_records_keep_original_url() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", page_linking_to("Home", &["/About/".to_string()])).await;
    mount_page(&server, "/About/", page_linking_to("About", &[])).await;

    let pages = crawl(&format!("{}/", base), 2, 10).await.expect("crawl");

    let about = &pages["127.0.0.1/About"];
    assert_eq!(about.url, format!("{}/About/", base));
    assert_eq!(about.heading, "About");

    for (key, record) in &pages {
        assert_eq!(&normalize_url(&record.url).expect("valid url"), key);
    }
}

#[tokio::test]
async fn test_crawl_to_csv_and_graph() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        r#"<html><body><h1>Home, sweet home</h1><main><p>Welcome.</p></main>
            <a href="/docs">Docs</a><img src="/hero.png"></body></html>"#
            .to_string(),
    )
    .await;
    mount_page(&server, "/docs", page_linking_to("Docs", &["/".to_string()])).await;

    let pages = crawl(&format!("{}/", base), 2, 10).await.expect("crawl");

    let dir = tempfile::tempdir().expect("tempdir");
    let report = dir.path().join("report.csv");
    assert_eq!(write_csv_report(&pages, &report).expect("csv"), 2);

    let content = std::fs::read_to_string(&report).expect("read report");
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(
        lines[0],
        "page_url,h1,first_paragraph,outgoing_link_urls,image_urls"
    );
    assert_eq!(
        lines[1],
        format!(
            r#"{}/,"Home, sweet home",Welcome.,{}/docs,{}/hero.png"#,
            base, base, base
        )
    );
    assert!(lines[2].starts_with(&format!("{}/docs,Docs,", base)));

    let graph = build_graph(&pages);
    assert_eq!(graph.nodes.len(), 2);
    assert_eq!(graph.links.len(), 2);
}
