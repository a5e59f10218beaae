//! End-to-end crawls against a mock site

use super::{server_domain, test_config};
use ripple_crawler::crawler::{page_record, Crawler, ParserDefinition};
use ripple_crawler::output::{ChannelSink, CollectingSink, JsonLinesSink, PipelineSink};
use ripple_crawler::url::UrlMatcher;
use ripple_crawler::{Config, PageState};
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html(body: String) -> ResponseTemplate {
    // set_body_string would force text/plain
    ResponseTemplate::new(200).set_body_raw(body.into_bytes(), "text/html")
}

async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html(body))
        .mount(server)
        .await;
}

fn crawler(domain: &str, seeds: Vec<String>, config: Config) -> Crawler {
    Crawler::builder()
        .domain(domain)
        .start_urls(seeds)
        .expect("Seeds rejected")
        .parse(ParserDefinition::new("page", page_record))
        .config(config)
        .build()
        .expect("Failed to build crawler")
}

#[tokio::test]
async fn test_full_crawl_single_domain() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nAllow: /"))
        .mount(&server)
        .await;

    mount_page(
        &server,
        "/",
        format!(
            r#"<html><head><title>Home</title></head><body>
            <a href="{base}/page1">Page 1</a>
            <a href="/page2">Page 2</a>
            <a href="https://example.org/elsewhere">External</a>
            </body></html>"#
        ),
    )
    .await;
    mount_page(
        &server,
        "/page1",
        r#"<title>Page 1</title><a href="/">Home</a><a href="/page2">Page 2</a>"#.to_string(),
    )
    .await;
    mount_page(&server, "/page2", "<title>Page 2</title>".to_string()).await;

    let crawler = crawler(&server_domain(&server), vec![format!("{base}/")], test_config());
    let sink = Arc::new(CollectingSink::new());
    let stats = crawler.crawl(sink.clone()).await.expect("Crawl failed");

    assert_eq!(stats.count(PageState::Processed), 3);
    assert_eq!(stats.records_emitted, 3);
    assert_eq!(stats.urls_rejected, 1);
    assert!(!stats.cancelled);

    let mut titles: Vec<String> = sink
        .records()
        .iter()
        .filter_map(|r| r["title"].as_str().map(str::to_string))
        .collect();
    titles.sort();
    assert_eq!(titles, vec!["Home", "Page 1", "Page 2"]);

    // Every page fetched exactly once
    let requests = server.received_requests().await.expect("Recording disabled");
    let page_requests = requests
        .iter()
        .filter(|r| r.url.path() != "/robots.txt")
        .count();
    assert_eq!(page_requests, 3);
}

#[tokio::test]
async fn test_robots_txt_respect() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private"),
        )
        .expect(1)
        .mount(&server)
        .await;

    mount_page(
        &server,
        "/",
        r#"<a href="/public">Public</a><a href="/private/secret">Secret</a>"#.to_string(),
    )
    .await;
    mount_page(&server, "/public", "<title>Public</title>".to_string()).await;

    Mock::given(method("GET"))
        .and(path("/private/secret"))
        .respond_with(html("secret".to_string()))
        .expect(0) // Should never be called
        .mount(&server)
        .await;

    let crawler = crawler(&server_domain(&server), vec![format!("{base}/")], test_config());
    let stats = crawler
        .crawl(Arc::new(CollectingSink::new()))
        .await
        .expect("Crawl failed");

    assert_eq!(stats.robots_denied, 1);
    assert_eq!(stats.count(PageState::Processed), 2);
    // Wiremock verifies the expectations when the server drops
}

#[tokio::test]
async fn test_redirects_are_followed() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/new"))
        .mount(&server)
        .await;
    mount_page(&server, "/new", "<title>New home</title>".to_string()).await;

    let config = Config {
        respect_robots_txt: false,
        ..test_config()
    };
    let crawler = crawler(&server_domain(&server), vec![format!("{base}/old")], config);
    let sink = Arc::new(CollectingSink::new());
    crawler.crawl(sink.clone()).await.expect("Crawl failed");

    let records = sink.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["url"], format!("{base}/new"));
    assert_eq!(records[0]["title"], "New home");
}

#[tokio::test]
async fn test_redirect_loop_fails_the_url() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/b"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/a"))
        .mount(&server)
        .await;

    let config = Config {
        respect_robots_txt: false,
        max_redirects: 3,
        ..test_config()
    };
    let crawler = crawler(&server_domain(&server), vec![format!("{base}/a")], config);
    let stats = crawler
        .crawl(Arc::new(CollectingSink::new()))
        .await
        .expect("Crawl failed");

    assert_eq!(stats.count(PageState::Failed), 1);
    assert_eq!(stats.records_emitted, 0);
}

#[tokio::test]
async fn test_unreachable_url_does_not_abort() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_page(&server, "/", "<title>Up</title>".to_string()).await;

    let config = Config {
        respect_robots_txt: false,
        ..test_config()
    };
    // Nothing listens on port 1
    let crawler = crawler(
        &server_domain(&server),
        vec!["http://127.0.0.1:1/".to_string(), format!("{base}/")],
        config,
    );
    let stats = crawler
        .crawl(Arc::new(CollectingSink::new()))
        .await
        .expect("Crawl failed");

    assert_eq!(stats.count(PageState::Failed), 1);
    assert_eq!(stats.count(PageState::Processed), 1);
}

#[tokio::test]
async fn test_error_statuses_are_dispatched() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("not here"))
        .mount(&server)
        .await;

    let config = Config {
        respect_robots_txt: false,
        ..test_config()
    };
    let crawler = crawler(&server_domain(&server), vec![format!("{base}/missing")], config);
    let sink = Arc::new(CollectingSink::new());
    let stats = crawler.crawl(sink.clone()).await.expect("Crawl failed");

    assert_eq!(stats.count(PageState::Processed), 1);
    assert_eq!(sink.records()[0]["status"], 404);
}

#[tokio::test]
async fn test_parser_selection_by_priority() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(
        &server,
        "/",
        r#"<a href="/blog/first">First</a><a href="/about">About</a>"#.to_string(),
    )
    .await;
    mount_page(&server, "/blog/first", "<title>First</title>".to_string()).await;
    mount_page(&server, "/about", "<title>About</title>".to_string()).await;

    let crawler = Crawler::builder()
        .domain(server_domain(&server))
        .start_urls([format!("{base}/")])
        .unwrap()
        .parse(ParserDefinition::new("page", page_record))
        .parse(
            ParserDefinition::new("blog", |response| {
                let mut out = ripple_crawler::ParseOutput::new();
                out.add_item(&serde_json::json!({
                    "kind": "post",
                    "url": response.uri.as_str(),
                }))?;
                Ok(out)
            })
            .with_priority(10)
            .with_matcher(UrlMatcher::path_prefix("/blog/")),
        )
        .config(Config {
            respect_robots_txt: false,
            ..test_config()
        })
        .build()
        .unwrap();

    let sink = Arc::new(CollectingSink::new());
    crawler.crawl(sink.clone()).await.unwrap();

    let posts: Vec<_> = sink
        .records()
        .into_iter()
        .filter(|r| r.get("kind").is_some())
        .collect();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["url"], format!("{base}/blog/first"));
    assert_eq!(sink.len(), 3);
}

#[tokio::test]
async fn test_records_streamed_through_channel() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_page(&server, "/", r#"<a href="/next">Next</a>"#.to_string()).await;
    mount_page(&server, "/next", "<title>Next</title>".to_string()).await;

    let config = Config {
        respect_robots_txt: false,
        ..test_config()
    };
    let crawler = crawler(&server_domain(&server), vec![format!("{base}/")], config);

    let (sink, mut receiver) = ChannelSink::channel(16);
    let sink: Arc<dyn PipelineSink> = Arc::new(sink);
    let stats = crawler.crawl(sink).await.unwrap();

    let mut received = 0;
    while let Ok(record) = receiver.try_recv() {
        assert!(record.contains_key("url"));
        received += 1;
    }
    assert_eq!(received, 2);
    assert_eq!(stats.records_emitted, 2);
}

#[tokio::test]
async fn test_json_lines_output_file() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_page(&server, "/", "<title>Only page</title>".to_string()).await;

    let config = Config {
        respect_robots_txt: false,
        ..test_config()
    };
    let crawler = crawler(&server_domain(&server), vec![format!("{base}/")], config);

    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let out_path = dir.path().join("records.jsonl");
    let file = std::fs::File::create(&out_path).expect("Failed to create output");
    crawler
        .crawl(Arc::new(JsonLinesSink::new(file)))
        .await
        .expect("Crawl failed");

    let content = std::fs::read_to_string(&out_path).expect("Failed to read output");
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 1);

    let record: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(record["title"], "Only page");
}
