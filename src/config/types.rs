use serde::Deserialize;
use std::time::Duration;

/// Crawl engine tunables
///
/// Durations are expressed in (fractional) seconds, matching the crawl file
/// format. Use the `*_duration` accessors to get `Duration` values.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
    /// User agent sent with every request
    pub user_agent: String,

    /// Whether 3xx responses are followed
    pub follow_redirects: bool,

    /// Maximum number of redirect hops per fetch
    pub max_redirects: u32,

    /// Whether robots.txt is consulted before enqueueing a URL
    pub respect_robots_txt: bool,

    /// Maximum number of fetches in flight at once
    pub concurrent_requests: usize,

    /// Per-request timeout (seconds)
    pub request_timeout: f64,

    /// Minimum spacing between successive fetch starts, across all workers (seconds)
    pub delay: f64,

    /// Number of retries after a network failure
    pub max_retries: u32,

    /// Fixed pause between retries (seconds)
    pub retry_wait_time: f64,

    /// Maximum link depth from the seeds; unlimited when absent
    pub max_depth: Option<u32>,

    /// Default log level for the CLI
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            follow_redirects: true,
            max_redirects: 5,
            respect_robots_txt: true,
            concurrent_requests: 4,
            request_timeout: 30.0,
            delay: 0.0,
            max_retries: 3,
            retry_wait_time: 1.0,
            max_depth: None,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Checks every field; see [`validate`](crate::config::validate)
    pub fn validate(&self) -> Result<(), crate::ConfigError> {
        crate::config::validate(self)
    }

    pub fn request_timeout_duration(&self) -> Duration {
        Duration::from_secs_f64(self.request_timeout)
    }

    pub fn delay_duration(&self) -> Duration {
        Duration::from_secs_f64(self.delay)
    }

    pub fn retry_wait_duration(&self) -> Duration {
        Duration::from_secs_f64(self.retry_wait_time)
    }

    /// Product token used for robots.txt matching ("RippleCrawler/0.1 (+...)" -> "RippleCrawler")
    pub fn robots_agent(&self) -> &str {
        self.user_agent
            .split(|c: char| c == '/' || c.is_whitespace())
            .next()
            .unwrap_or(&self.user_agent)
    }
}

fn default_user_agent() -> String {
    format!("RippleCrawler/{}", env!("CARGO_PKG_VERSION"))
}

/// A complete crawl file: engine settings plus the site and parser definitions
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CrawlFile {
    #[serde(default)]
    pub crawler: Config,

    #[serde(default)]
    pub site: SiteConfig,

    #[serde(default, rename = "parser")]
    pub parsers: Vec<ParserEntry>,

    #[serde(default)]
    pub output: OutputConfig,
}

/// The site to crawl
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SiteConfig {
    /// Domain the crawl is restricted to (e.g., "example.com")
    pub domain: Option<String>,

    /// Seed URLs
    #[serde(default)]
    pub start_urls: Vec<String>,
}

/// A parser declared in a crawl file
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ParserEntry {
    pub name: String,

    /// Regular expression matched against the full URL; matches everything when absent
    pub pattern: Option<String>,

    #[serde(default)]
    pub priority: i32,

    #[serde(default = "default_follow_links")]
    pub follow_links: bool,
}

fn default_follow_links() -> bool {
    true
}

/// Output configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    /// Path of the JSON lines file records are written to; stdout when absent
    pub path: Option<String>,
}
