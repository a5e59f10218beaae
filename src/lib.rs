//! Ripple Crawler: a domain-restricted crawl engine
//!
//! This crate fetches pages from a set of seed URLs confined to one domain,
//! dispatches every response to the highest-priority matching parser, and
//! forwards the extracted records to a pipeline sink.

pub mod config;
pub mod crawler;
pub mod output;
pub mod robots;
pub mod state;
pub mod url;

#[cfg(test)]
pub(crate) mod test_support;

use thiserror::Error;

/// Main error type for Ripple operations
#[derive(Debug, Error)]
pub enum RippleError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Crawler error: {0}")]
    Crawler(#[from] CrawlerError),

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while defining a crawler or dispatching a response
#[derive(Debug, Error)]
pub enum CrawlerError {
    #[error("Domain must be specified")]
    MissingDomain,

    #[error("Start URLs must be specified")]
    MissingStartUrls,

    #[error("{0}")]
    InvalidArgument(String),

    #[error("no parser found for {url}")]
    NoParser { url: String },

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Fetch failures
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Connection failed for {url}: {message}")]
    Connect { url: String, message: String },

    #[error("Request failed for {url}: {message}")]
    Request { url: String, message: String },

    #[error("Failed to read body of {url}: {message}")]
    Body { url: String, message: String },

    #[error("too many redirects from {url} (limit {limit})")]
    TooManyRedirects { url: String, limit: u32 },

    #[error("retries exhausted for {url} after {attempts} attempts: {source}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        #[source]
        source: Box<NetworkError>,
    },
}

/// Errors raised by a parser handler during extraction
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("{0}")]
    Message(String),

    #[error("handler panicked: {0}")]
    Panicked(String),

    #[error("invalid record: {0}")]
    Json(#[from] serde_json::Error),
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Result type alias for Ripple operations
pub type Result<T> = std::result::Result<T, RippleError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{
    CrawlRequest, CrawlResponse, Crawler, CrawlerBuilder, ParseOutput, ParserDefinition,
};
pub use output::{CrawlStatistics, PipelineSink, Record};
pub use state::PageState;
pub use crate::url::{normalize_url, DomainScope, UrlMatcher};
