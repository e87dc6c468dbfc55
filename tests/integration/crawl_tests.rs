//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end through the real HTTP fetcher.

use arachne::output::write_markdown_summary;
use arachne::{crawl_site, CrawlOptions, CrawlStatus, Page, Website};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mounts an HTML page at `route`
async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html"))
        .mount(server)
        .await;
}

/// Builds an HTML body linking to each of `links`
fn html_with_links(title: &str, links: &[String]) -> String {
    let anchors: String = links
        .iter()
        .map(|l| format!(r#"<a href="{}">{}</a>"#, l, l))
        .collect();
    format!(
        "<html><head><title>{}</title></head><body>{}</body></html>",
        title, anchors
    )
}

/// Mounts a small site: / -> /page1, /page2; /page1 -> /page3 and an external link
async fn mount_small_site(server: &MockServer) {
    let base = server.uri();
    mount_page(
        server,
        "/",
        html_with_links(
            "Home",
            &[format!("{}/page1", base), "/page2".to_string()],
        ),
    )
    .await;
    mount_page(
        server,
        "/page1",
        html_with_links(
            "Page 1",
            &[
                "page3".to_string(),
                "https://external.invalid/".to_string(),
                "/page1#section".to_string(),
            ],
        ),
    )
    .await;
    mount_page(server, "/page2", html_with_links("Page 2", &["/".to_string()])).await;
    mount_page(server, "/page3", html_with_links("Page 3", &[])).await;
}

fn sorted(mut links: Vec<String>) -> Vec<String> {
    links.sort();
    links
}

/// A subscriber that keeps every delivered page
fn collecting_options() -> (CrawlOptions, Arc<Mutex<Vec<Page>>>) {
    let pages = Arc::new(Mutex::new(Vec::new()));
    let store = Arc::clone(&pages);
    let options = CrawlOptions::new().subscribe(move |page| {
        store.lock().unwrap().push(page.clone());
        Ok(())
    });
    (options, pages)
}

#[tokio::test]
async fn test_full_crawl_single_domain() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();
    mount_small_site(&mock_server).await;

    let website = Website::new(&format!("{}/", base));
    let summary = website.crawl().await.expect("crawl failed");

    assert_eq!(
        sorted(website.get_links()),
        vec![
            format!("{}/", base),
            format!("{}/page1", base),
            format!("{}/page2", base),
            format!("{}/page3", base),
        ]
    );
    assert_eq!(website.get_links()[0], format!("{}/", base));
    assert_eq!(summary.status, CrawlStatus::Finished);
    assert_eq!(summary.pages_visited, 4);
    assert_eq!(summary.pages_failed, 0);
    assert!(!summary.has_issues());
}

#[tokio::test]
async fn test_subscriber_sees_page_content() {
    let mock_server = MockServer::start().await;
    mount_small_site(&mock_server).await;

    let (options, pages) = collecting_options();
    Website::new(&mock_server.uri())
        .crawl_with(options)
        .await
        .expect("crawl failed");

    let pages = pages.lock().unwrap();
    assert_eq!(pages.len(), 4);

    let home = pages
        .iter()
        .find(|p| p.title().as_deref() == Some("Home"))
        .expect("home page delivered");
    assert_eq!(home.status_code, 200);
    assert!(home.html().unwrap().contains("page1"));
    assert!(home
        .content_type
        .as_deref()
        .unwrap()
        .starts_with("text/html"));
}

#[tokio::test]
async fn test_custom_user_agent_and_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("user-agent", "BotBot"))
        .and(header("x-api-key", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<html></html>", "text/html"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (options, pages) = collecting_options();
    Website::new(&mock_server.uri())
        .with_user_agent("BotBot")
        .with_headers([("X-Api-Key", "secret")])
        .crawl_with(options)
        .await
        .expect("crawl failed");

    assert_eq!(pages.lock().unwrap()[0].status_code, 200);
}

#[tokio::test]
async fn test_global_budget_limits_requests() {
    let mock_server = MockServer::start().await;
    mount_small_site(&mock_server).await;

    let website = Website::new(&mock_server.uri())
        .with_budget([("*", 2)])
        .with_max_concurrency(1);
    let summary = website.crawl().await.expect("crawl failed");

    assert_eq!(website.size(), 2);
    // Once the budget is spent no further links are queued
    assert_eq!(summary.budget_rejected, 0);
    assert_eq!(summary.links_discovered, 3);

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
}

#[tokio::test]
async fn test_path_budget() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();
    let docs: Vec<String> = (0..5).map(|i| format!("/docs/{}", i)).collect();
    let mut links = docs.clone();
    links.push("/about".to_string());
    mount_page(&mock_server, "/", html_with_links("Home", &links)).await;
    for route in docs.iter().chain(["/about".to_string()].iter()) {
        mount_page(&mock_server, route, html_with_links(route, &[])).await;
    }

    let website = Website::new(&base).with_budget([("/docs", 2)]);
    website.crawl().await.expect("crawl failed");

    let links = website.get_links();
    assert_eq!(links.iter().filter(|l| l.contains("/docs/")).count(), 2);
    assert!(links.contains(&format!("{}/about", base)));
}

#[tokio::test]
async fn test_respects_robots_txt() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("User-agent: *\nDisallow: /private\n", "text/plain"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_page(
        &mock_server,
        "/",
        html_with_links("Home", &["/private/data".to_string(), "/public".to_string()]),
    )
    .await;
    mount_page(&mock_server, "/public", html_with_links("Public", &[])).await;
    Mock::given(method("GET"))
        .and(path("/private/data"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("secret", "text/html"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let website = Website::new(&base).with_respect_robots_txt(true);
    let summary = website.crawl().await.expect("crawl failed");

    assert_eq!(
        sorted(website.get_links()),
        vec![format!("{}/", base), format!("{}/public", base)]
    );
    assert_eq!(summary.robots_rejected, 1);
}

#[tokio::test]
async fn test_missing_pages_are_delivered() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();
    mount_page(
        &mock_server,
        "/",
        html_with_links("Home", &["/missing".to_string()]),
    )
    .await;

    let (options, pages) = collecting_options();
    let website = Website::new(&base);
    let summary = website.crawl_with(options).await.expect("crawl failed");

    assert_eq!(website.size(), 2);
    assert_eq!(summary.pages_failed, 1);

    let pages = pages.lock().unwrap();
    let missing = pages
        .iter()
        .find(|p| p.url.ends_with("/missing"))
        .expect("missing page delivered");
    assert_eq!(missing.status_code, 404);
    assert!(missing.is_error());
}

#[tokio::test]
async fn test_redirect_records_final_url() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();
    mount_page(
        &mock_server,
        "/",
        html_with_links("Home", &["/old".to_string()]),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/new"))
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/new", html_with_links("New", &[])).await;

    let (options, pages) = collecting_options();
    Website::new(&base)
        .crawl_with(options)
        .await
        .expect("crawl failed");

    let pages = pages.lock().unwrap();
    let old = pages
        .iter()
        .find(|p| p.url.ends_with("/old"))
        .expect("redirected page delivered");
    assert_eq!(old.status_code, 200);
    assert_eq!(old.final_url, format!("{}/new", base));
}

#[tokio::test]
async fn test_background_crawl_can_be_stopped() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();
    let links: Vec<String> = (0..20).map(|i| format!("/slow/{}", i)).collect();
    mount_page(&mock_server, "/", html_with_links("Home", &links)).await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<html></html>", "text/html")
                .set_delay(Duration::from_millis(100)),
        )
        .mount(&mock_server)
        .await;

    let website = Website::new(&base).with_max_concurrency(2);
    let task = website
        .crawl_background(CrawlOptions::new())
        .expect("crawl failed to start");

    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(website.stop());

    let summary = task.join().await.expect("crawl task failed");
    assert!(summary.stopped);
    assert!(website.size() < 21);
    assert_eq!(website.status(), CrawlStatus::Finished);
}

#[tokio::test]
async fn test_crawl_site_shortcut() {
    let mock_server = MockServer::start().await;
    mount_small_site(&mock_server).await;

    let output = crawl_site(&mock_server.uri()).await.expect("crawl failed");

    assert_eq!(output.links.len(), 4);
    assert_eq!(output.pages.len(), 4);
    let mut titles: Vec<String> = output.pages.iter().filter_map(Page::title).collect();
    titles.sort();
    assert_eq!(titles, vec!["Home", "Page 1", "Page 2", "Page 3"]);
}

#[tokio::test]
async fn test_markdown_report() {
    let mock_server = MockServer::start().await;
    mount_small_site(&mock_server).await;

    let website = Website::new(&mock_server.uri());
    let summary = website.crawl().await.expect("crawl failed");

    let dir = tempfile::TempDir::new().unwrap();
    let report = dir.path().join("summary.md");
    write_markdown_summary(&report, &website.config().url, &summary, &website.get_links())
        .expect("failed to write report");

    let content = std::fs::read_to_string(&report).unwrap();
    assert!(content.contains("page3"));
    assert!(content.contains("finished"));
}
