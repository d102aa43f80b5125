//! Integration tests for the HTTP renderer
//!
//! These tests use wiremock to create mock HTTP servers and exercise the
//! renderer and a full sweep over real HTTP.

use std::path::Path;
use std::time::Duration;
use sumi_sweep::config::{parse_config, TimingConfig, UserAgentConfig};
use sumi_sweep::crawler::{run_sweep, CrawlOutcome, StopSignal, SweepOptions};
use sumi_sweep::render::{HttpRenderer, RenderError, Renderer};
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CATEGORY_HTML: &str = r##"<html>
<head>
  <link rel="canonical" href="/catalog-shoes">
  <script type="application/ld+json">{"@type": "Product", "name": "Runner"}</script>
</head>
<body>
  <a href="/item-1.html">Runner</a>
  <a href="mailto:shop@example.com">Mail</a>
  <a href="#top">Top</a>
  <a href="?page=2" rel="next">Next</a>
  <span>$49.99</span>
</body>
</html>"##;

fn renderer() -> HttpRenderer {
    HttpRenderer::new(UserAgentConfig::default(), &TimingConfig::default())
        .expect("Failed to build renderer")
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html; charset=utf-8")
}

#[tokio::test]
async fn test_render_extracts_page() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/catalog-shoes"))
        .respond_with(html(CATEGORY_HTML))
        .mount(&mock_server)
        .await;

    let base = mock_server.uri();
    let url = Url::parse(&format!("{}/catalog-shoes", base)).unwrap();
    let page = renderer()
        .render(&url, Duration::from_secs(5))
        .await
        .expect("page renders");

    assert!(page
        .outbound_hrefs
        .contains(&format!("{}/item-1.html", base)));
    assert!(page
        .outbound_hrefs
        .contains(&format!("{}/catalog-shoes", base)));
    assert!(!page.outbound_hrefs.iter().any(|h| h.starts_with("mailto:")));
    assert_eq!(
        page.pagination_hints,
        vec![format!("{}/catalog-shoes?page=2", base)]
    );
    assert_eq!(page.structured_data_blocks.len(), 1);
    assert!(page.markup.contains("$49.99"));
}

#[tokio::test]
async fn test_sends_user_agent() {
    let mock_server = MockServer::start().await;
    let user_agent = UserAgentConfig {
        crawler_name: "TestBot".to_string(),
        crawler_version: "1.0.0".to_string(),
        contact_url: Some("https://example.com/contact".to_string()),
    };
    Mock::given(method("GET"))
        .and(path("/"))
        .and(header(
            "user-agent",
            "TestBot/1.0.0 (+https://example.com/contact)",
        ))
        .respond_with(html("<a href=\"/about\">About</a>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let renderer = HttpRenderer::new(user_agent, &TimingConfig::default()).unwrap();
    let url = Url::parse(&format!("{}/", mock_server.uri())).unwrap();
    let links = renderer.links(&url, Duration::from_secs(5)).await.unwrap();

    assert_eq!(links, vec![format!("{}/about", mock_server.uri())]);
}

#[tokio::test]
async fn test_http_error_status() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let url = Url::parse(&format!("{}/gone", mock_server.uri())).unwrap();
    let result = renderer().render(&url, Duration::from_secs(5)).await;

    assert!(matches!(result, Err(RenderError::Status { status: 404, .. })));
}

#[tokio::test]
async fn test_non_html_is_rejected() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("{\"items\": []}", "application/json"),
        )
        .mount(&mock_server)
        .await;

    let url = Url::parse(&format!("{}/feed", mock_server.uri())).unwrap();
    let result = renderer().render(&url, Duration::from_secs(5)).await;

    assert!(matches!(result, Err(RenderError::NotHtml { .. })));
}

#[tokio::test]
async fn test_navigation_timeout() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html("<p>late</p>").set_delay(Duration::from_secs(2)))
        .mount(&mock_server)
        .await;

    let url = Url::parse(&format!("{}/slow", mock_server.uri())).unwrap();
    let result = renderer().render(&url, Duration::from_millis(100)).await;

    assert!(matches!(
        result,
        Err(RenderError::Timeout {
            timeout_ms: 100,
            ..
        })
    ));
}

#[tokio::test]
async fn test_sweep_over_http() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<a href="/about">About</a> <a href="/item-1.html">Item</a> <a href="https://elsewhere.test/">Off-site</a>"#,
        ))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(html(r#"<a href="/">Home</a>"#))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/item-1.html"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = sweep_config(&mock_server.uri(), dir.path());
    let report = run_sweep(config, renderer(), &SweepOptions::default(), StopSignal::new())
        .await
        .unwrap();

    assert_eq!(report.outcome, CrawlOutcome::Done);
    assert_eq!(report.pages_crawled, 3);
    assert_eq!(report.pages_failed, 1);
    assert_eq!(report.pages_discovered, 3);
}

fn sweep_config(base: &str, output: &Path) -> sumi_sweep::Config {
    parse_config(&format!(
        r#"
        [crawler]
        start-urls = ["{}/"]

        [output]
        directory = '{}'

        [timing]
        navigation-timeout-ms = 5000
        "#,
        base,
        output.display()
    ))
    .expect("test config parses")
}
