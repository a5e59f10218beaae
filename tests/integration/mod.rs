//! Integration tests for the crawl engine
//!
//! These tests use wiremock to create mock HTTP servers and run full crawls
//! end-to-end through the public API.

mod crawl_tests;
mod crawl_file_tests;

use ripple_crawler::Config;
use wiremock::MockServer;

/// Host of a mock server, used as the crawl domain (e.g. "127.0.0.1")
pub fn server_domain(server: &MockServer) -> String {
    url::Url::parse(&server.uri())
        .expect("Failed to parse mock server URI")
        .host_str()
        .expect("Mock server URI has no host")
        .to_string()
}

/// Fast settings for tests: no retries, no pacing
pub fn test_config() -> Config {
    Config {
        user_agent: "TestBot/1.0".to_string(),
        concurrent_requests: 2,
        request_timeout: 5.0,
        max_retries: 0,
        retry_wait_time: 0.0,
        ..Config::default()
    }
}
