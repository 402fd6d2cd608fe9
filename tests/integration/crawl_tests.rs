//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full harvest cycle end-to-end.

use serde_json::json;
use std::sync::Arc;
use sumi_harvest::config::{Config, FormatterConfig, RetrievalModeKind, ScopeConfig};
use sumi_harvest::crawler::{
    build_http_client, ContentSource, HttpSource, RetrievalMode, RetryPolicy, DISCOVERED_SENTINEL,
};
use sumi_harvest::format::{ChatCompletionsFormatter, FormatterPool};
use sumi_harvest::output::{index_path, write_pages};
use sumi_harvest::{Address, Crawler};
use wiremock::matchers::{body_json, header, header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration with short retry delays
fn create_test_config(retry_delays_ms: Vec<u64>) -> Config {
    let mut config = Config::default();
    config.crawler.retry_delays_ms = retry_delays_ms;
    config.crawler.request_timeout_secs = 5;
    config.user_agent.crawler_name = "TestBot".to_string();
    config
}

fn html_page(title: &str, body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!(
            "<html><head><title>{}</title></head><body>{}</body></html>",
            title, body
        ))
        .insert_header("content-type", "text/html")
}

async fn mount_page(server: &MockServer, route: &str, title: &str, body: &str, expected_hits: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html_page(title, body))
        .expect(expected_hits)
        .mount(server)
        .await;
}

fn address(server: &MockServer, route: &str) -> Address {
    Address::parse(&format!("{}{}", server.uri(), route)).expect("Failed to parse mock address")
}

#[tokio::test]
async fn test_depth_zero_fetches_only_root() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "Home", r#"<p>Welcome</p><a href="/page1">Page 1</a>"#, 1).await;
    mount_page(&server, "/page1", "Page 1", "<p>One</p>", 0).await;

    let crawler = Crawler::from_config(&create_test_config(vec![])).unwrap();
    let root = address(&server, "/");
    let result = crawler.crawl(&root, 0).await;

    assert_eq!(result.len(), 1);
    assert_eq!(
        result.get(&root),
        Some("<h1>Home</h1>\n<p>Welcome</p>\n<a href=\"/page1\">Page 1</a>")
    );
}

#[tokio::test]
async fn test_depth_one_lists_links_with_sentinel() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        "Home",
        r##"<a href="/page1">1</a><a href="/page2#part">2</a><a href="/page2">2 again</a><a href="#top">top</a>"##,
        1,
    )
    .await;
    mount_page(&server, "/page1", "Page 1", "<p>One</p>", 0).await;
    mount_page(&server, "/page2", "Page 2", "<p>Two</p>", 0).await;

    let crawler = Crawler::from_config(&create_test_config(vec![])).unwrap();
    let root = address(&server, "/");
    let result = crawler.crawl(&root, 1).await;

    assert_eq!(result.len(), 3);
    assert!(!result.is_discovered(&root));
    assert_eq!(result.get(&address(&server, "/page1")), Some(DISCOVERED_SENTINEL));
    assert_eq!(result.get(&address(&server, "/page2")), Some(DISCOVERED_SENTINEL));
}

#[tokio::test]
async fn test_cycles_never_fetch_twice() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "Home", r#"<a href="/a">a</a><a href="/b">b</a><a href="/">self</a>"#, 1).await;
    mount_page(&server, "/a", "A", r#"<p>a</p><a href="/">home</a><a href="/b">b</a>"#, 1).await;
    mount_page(&server, "/b", "B", r#"<p>b</p><a href="/a">a</a><a href="/c">c</a>"#, 1).await;
    mount_page(&server, "/c", "C", r#"<p>c</p><a href="/">home</a>"#, 1).await;

    let crawler = Crawler::from_config(&create_test_config(vec![])).unwrap();
    let root = address(&server, "/");
    let (result, stats) = crawler.crawl_with_stats(&root, 4).await;

    assert_eq!(result.downloaded().count(), 4);
    assert_eq!(result.discovered().count(), 0);
    assert_eq!(stats.visited, 4);
    assert_eq!(stats.failed, 0);
}

#[tokio::test]
async fn test_depth_two_lists_grandchildren_once() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "Home", r#"<a href="/a">a</a><a href="/b">b</a>"#, 1).await;
    mount_page(&server, "/a", "A", r#"<p>a</p><a href="/shared">s</a>"#, 1).await;
    mount_page(&server, "/b", "B", r#"<p>b</p><a href="/shared">s</a><a href="/only-b">o</a>"#, 1).await;
    mount_page(&server, "/shared", "Shared", "<p>s</p>", 0).await;
    mount_page(&server, "/only-b", "Only B", "<p>o</p>", 0).await;

    let crawler = Crawler::from_config(&create_test_config(vec![])).unwrap();
    let root = address(&server, "/");
    let result = crawler.crawl(&root, 2).await;

    assert_eq!(result.downloaded().count(), 3);
    assert!(result.is_discovered(&address(&server, "/shared")));
    assert!(result.is_discovered(&address(&server, "/only-b")));
    assert_eq!(result.len(), 5);
}

#[tokio::test]
async fn test_failing_child_is_pruned_after_retries() {
    let server = MockServer::start().await;
    mount_page(&server, "/", "Home", r#"<a href="/broken">x</a><a href="/fine">ok</a>"#, 1).await;
    mount_page(&server, "/fine", "Fine", r#"<p>fine</p><a href="/deeper">d</a>"#, 1).await;
    mount_page(&server, "/deeper", "Deeper", "<p>deep</p>", 1).await;

    // One attempt plus two retries
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let crawler = Crawler::from_config(&create_test_config(vec![10, 20])).unwrap();
    let (result, stats) = crawler.crawl_with_stats(&address(&server, "/"), 3).await;

    assert!(!result.contains(&address(&server, "/broken")));
    assert!(result.get(&address(&server, "/deeper")).unwrap().contains("deep"));
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.downloaded, 3);
}

#[tokio::test]
async fn test_root_failure_yields_empty_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(404))
        .expect(2)
        .mount(&server)
        .await;

    let crawler = Crawler::from_config(&create_test_config(vec![10])).unwrap();
    let result = crawler
        .crawl_url(&format!("{}/", server.uri()), 3)
        .await
        .unwrap();

    assert!(result.is_empty());
}

#[tokio::test]
async fn test_transient_failures_recover() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    mount_page(&server, "/", "Home", "<p>finally</p>", 1).await;

    let crawler = Crawler::from_config(&create_test_config(vec![10, 20, 30])).unwrap();
    let root = address(&server, "/");
    let result = crawler.crawl(&root, 0).await;

    assert_eq!(result.get(&root), Some("<h1>Home</h1>\n<p>finally</p>"));
}

#[tokio::test]
async fn test_scope_keeps_to_host_and_path_prefix() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/docs/",
        "Docs",
        r#"<a href="/docs/guide">g</a><a href="/blog/post">b</a><a href="https://elsewhere.test/x">x</a>"#,
        1,
    )
    .await;
    mount_page(&server, "/docs/guide", "Guide", "<p>guide</p>", 1).await;
    mount_page(&server, "/blog/post", "Post", "<p>post</p>", 0).await;

    let mut config = create_test_config(vec![]);
    config.crawler.scope = ScopeConfig {
        same_host: true,
        same_path_prefix: true,
        allowed_domains: vec![],
    };
    let crawler = Crawler::from_config(&config).unwrap();
    let result = crawler.crawl(&address(&server, "/docs/"), 2).await;

    assert_eq!(result.len(), 2);
    assert!(result.contains(&address(&server, "/docs/guide")));
}

#[tokio::test]
async fn test_local_proxy_mode() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/proxy"))
        .and(query_param("url", "https://site.test/"))
        .and(header_exists("accept"))
        .respond_with(html_page("Proxied", r#"<p>via proxy</p><a href="/next">n</a>"#))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/proxy"))
        .and(query_param("url", "https://site.test/next"))
        .respond_with(html_page("Next", "<p>next</p>"))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = create_test_config(vec![]);
    config.retrieval.mode = RetrievalModeKind::LocalProxy;
    config.retrieval.proxy_url = Some(server.uri());

    let crawler = Crawler::from_config(&config).unwrap();
    let result = crawler.crawl_url("https://site.test/", 2).await.unwrap();

    assert_eq!(result.downloaded().count(), 2);
    assert!(result
        .get(&Address::parse("https://site.test/next").unwrap())
        .unwrap()
        .contains("<p>next</p>"));
}

#[tokio::test]
async fn test_local_proxy_under_a_base_path() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dev/proxy"))
        .and(query_param("url", "https://site.test/"))
        .respond_with(html_page("Proxied", "<p>under dev</p>"))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = create_test_config(vec![]);
    config.retrieval.mode = RetrievalModeKind::LocalProxy;
    config.retrieval.proxy_url = Some(format!("{}/dev", server.uri()));

    let crawler = Crawler::from_config(&config).unwrap();
    let root = Address::parse("https://site.test/").unwrap();
    let result = crawler.crawl(&root, 0).await;

    assert_eq!(result.get(&root), Some("<h1>Proxied</h1>\n<p>under dev</p>"));
}

#[tokio::test]
async fn test_render_proxy_mode() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/render"))
        .and(body_json(json!({ "url": "https://site.test/" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "html": "<html><head><title>Rendered</title></head><body><p>from js</p></body></html>"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = create_test_config(vec![]);
    config.retrieval.mode = RetrievalModeKind::RenderProxy;
    config.retrieval.proxy_url = Some(format!("{}/render", server.uri()));

    let crawler = Crawler::from_config(&config).unwrap();
    let root = Address::parse("https://site.test/").unwrap();
    let result = crawler.crawl(&root, 1).await;

    assert_eq!(result.get(&root), Some("<h1>Rendered</h1>\n<p>from js</p>"));
}

#[tokio::test]
async fn test_render_reply_without_html_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/render"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "error": "timeout" })))
        .mount(&server)
        .await;

    let client = build_http_client(&Config::default().user_agent, std::time::Duration::from_secs(5)).unwrap();
    let endpoint = url::Url::parse(&format!("{}/render", server.uri())).unwrap();
    let source = HttpSource::new(client, RetrievalMode::RenderProxy { endpoint });

    let err = source
        .retrieve(&Address::parse("https://site.test/").unwrap())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("html"));
}

#[tokio::test]
async fn test_user_agent_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .and(header(
            "user-agent",
            "TestBot/1.0.0 (+https://example.com/sumi-harvest; harvest@example.com)",
        ))
        .respond_with(html_page("Home", "<p>hi</p>"))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = create_test_config(vec![]);
    config.user_agent.crawler_version = "1.0.0".to_string();
    let crawler = Crawler::from_config(&config).unwrap();
    let result = crawler.crawl(&address(&server, "/"), 0).await;

    assert_eq!(result.len(), 1);
}

#[tokio::test]
async fn test_crawl_then_format_then_write() {
    let site = MockServer::start().await;
    mount_page(&site, "/", "Home", r#"<p>Welcome</p><a href="/about">About</a>"#, 1).await;
    mount_page(&site, "/about", "About", "<p>About us</p>", 0).await;

    let llm = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": "# Home\n\nWelcome\n<EOF>" } }]
        })))
        .expect(1)
        .mount(&llm)
        .await;

    let crawler = Crawler::from_config(&create_test_config(vec![])).unwrap();
    let root = address(&site, "/");
    let result = crawler.crawl(&root, 1).await;

    let formatter_config = FormatterConfig {
        enabled: true,
        endpoint: format!("{}/v1/chat/completions", llm.uri()),
        ..FormatterConfig::default()
    };
    let formatter = ChatCompletionsFormatter::new(
        reqwest::Client::new(),
        &formatter_config,
        "test-key".to_string(),
    );
    let pool = FormatterPool::new(Arc::new(formatter), 2, RetryPolicy::none());
    let markdown = pool.format_all(&result).await;
    assert_eq!(markdown[&root].as_deref().unwrap(), "# Home\n\nWelcome");

    let dir = tempfile::tempdir().unwrap();
    let entries = write_pages(&result, dir.path(), Some(&markdown)).unwrap();
    assert_eq!(entries.len(), 2);

    let root_file = entries[0].file_name.as_ref().unwrap();
    assert!(root_file.ends_with(".md"));
    assert_eq!(
        std::fs::read_to_string(dir.path().join(root_file)).unwrap(),
        "# Home\n\nWelcome"
    );

    let index = std::fs::read_to_string(index_path(dir.path())).unwrap();
    assert!(index.contains(&format!("| {} | discovered |", address(&site, "/about"))));
}
