//! Crawl files driving real crawls

use super::server_domain;
use ripple_crawler::config::{load_config_with_hash, CrawlFile};
use ripple_crawler::crawler::{page_record, Crawler, ParserDefinition};
use ripple_crawler::output::CollectingSink;
use ripple_crawler::url::UrlMatcher;
use ripple_crawler::PageState;
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn write_crawl_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write crawl file");
    file
}

fn build(file: &CrawlFile) -> Crawler {
    let mut builder = Crawler::builder()
        .domain(file.site.domain.clone().expect("domain missing"))
        .start_urls(file.site.start_urls.clone())
        .expect("Seeds rejected")
        .config(file.crawler.clone());

    for entry in &file.parsers {
        let matcher = match &entry.pattern {
            Some(pattern) => UrlMatcher::regex(pattern).expect("Invalid pattern"),
            None => UrlMatcher::any(),
        };
        builder = builder.parse(
            ParserDefinition::new(entry.name.clone(), page_record)
                .with_priority(entry.priority)
                .with_follow_links(entry.follow_links)
                .with_matcher(matcher),
        );
    }

    builder.build().expect("Failed to build crawler")
}

#[tokio::test]
async fn test_crawl_driven_by_file() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"<a href="/docs/a">A</a><a href="/docs/b">B</a>"#, "text/html"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/docs/a"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"<a href="/deeper">Deeper</a>"#, "text/html"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/deeper"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0) // docs pages do not follow links
        .mount(&server)
        .await;

    let content = format!(
        r#"
[crawler]
user-agent = "TestBot/1.0"
concurrent-requests = 2
respect-robots-txt = false
max-retries = 0

[site]
domain = "{domain}"
start-urls = ["{base}/"]

[[parser]]
name = "home"

[[parser]]
name = "docs"
pattern = "/docs/"
priority = 5
follow-links = false
"#,
        domain = server_domain(&server),
    );
    let crawl_file = write_crawl_file(&content);

    let (file, hash) = load_config_with_hash(crawl_file.path()).expect("Failed to load");
    assert_eq!(hash.len(), 64);
    assert_eq!(file.parsers.len(), 2);

    let crawler = build(&file);
    let stats = crawler
        .crawl(Arc::new(CollectingSink::new()))
        .await
        .expect("Crawl failed");

    // /docs/b is unmocked and answers 404, which is still dispatched
    assert_eq!(stats.count(PageState::Processed), 3);
    assert_eq!(stats.pages_crawled(), 3);
}

#[test]
fn test_invalid_crawl_file_is_rejected() {
    let crawl_file = write_crawl_file(
        r#"
[crawler]
concurrent-requests = 0

[site]
domain = "example.com"
start-urls = ["https://example.com/"]
"#,
    );

    let err = load_config_with_hash(crawl_file.path()).unwrap_err();
    assert!(err.to_string().contains("concurrent_requests"));
}
