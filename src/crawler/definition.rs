//! Crawler definitions: parser descriptors and the builder producing an
//! immutable `Crawler`

use crate::config::{self, validate_domain_pattern, Config};
use crate::crawler::{CrawlResponse, ParserRegistry, Transport};
use crate::output::Record;
use crate::robots::RobotsPolicy;
use crate::url::{has_http_scheme, DomainScope, UrlMatcher};
use crate::{CrawlerError, ParseError};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use url::Url;

/// Parser callback: turns a response into records and follow-up URLs
pub type Handler = dyn Fn(&CrawlResponse) -> Result<ParseOutput, ParseError> + Send + Sync;

/// What a parser extracted from one response
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseOutput {
    pub records: Vec<Record>,

    /// Follow-up URLs, possibly relative to the response URI
    pub follow: Vec<String>,
}

impl ParseOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_record(&mut self, record: Record) {
        self.records.push(record);
    }

    /// Serializes `item` into a record; it must serialize to a JSON object
    pub fn add_item<T: Serialize>(&mut self, item: &T) -> Result<(), ParseError> {
        match serde_json::to_value(item)? {
            serde_json::Value::Object(map) => {
                self.records.push(map);
                Ok(())
            }
            other => Err(ParseError::new(format!(
                "record must serialize to a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    pub fn follow(&mut self, url: impl Into<String>) {
        self.follow.push(url.into());
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.follow.is_empty()
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// A named parser: which URLs it handles and how
///
/// Defaults: priority 0, follows links, matches every URL.
///
/// ```
/// use ripple_crawler::{ParseOutput, ParserDefinition};
/// use ripple_crawler::url::UrlMatcher;
///
/// let articles = ParserDefinition::new("articles", |response| {
///     let mut out = ParseOutput::new();
///     out.add_item(&serde_json::json!({ "url": response.uri.as_str() }))?;
///     Ok(out)
/// })
/// .with_priority(10)
/// .with_matcher(UrlMatcher::path_prefix("/articles/"));
///
/// assert_eq!(articles.name(), "articles");
/// assert!(articles.follows_links());
/// ```
#[derive(Clone)]
pub struct ParserDefinition {
    name: String,
    priority: i32,
    follow_links: bool,
    matcher: UrlMatcher,
    handler: Arc<Handler>,
}

impl ParserDefinition {
    pub fn new<F>(name: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&CrawlResponse) -> Result<ParseOutput, ParseError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            priority: 0,
            follow_links: true,
            matcher: UrlMatcher::any(),
            handler: Arc::new(handler),
        }
    }

    /// Higher priorities are tried first
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_follow_links(mut self, follow_links: bool) -> Self {
        self.follow_links = follow_links;
        self
    }

    pub fn with_matcher(mut self, matcher: UrlMatcher) -> Self {
        self.matcher = matcher;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn follows_links(&self) -> bool {
        self.follow_links
    }

    pub fn matcher(&self) -> &UrlMatcher {
        &self.matcher
    }

    pub fn matches(&self, url: &Url) -> bool {
        self.matcher.matches(url)
    }

    /// Runs the handler
    pub fn parse(&self, response: &CrawlResponse) -> Result<ParseOutput, ParseError> {
        (self.handler)(response)
    }
}

impl fmt::Debug for ParserDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParserDefinition")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("follow_links", &self.follow_links)
            .field("matcher", &self.matcher)
            .finish_non_exhaustive()
    }
}

/// A fully defined crawler
///
/// Immutable once built; `crawl` may be called any number of times, each run
/// starting from the seeds with a fresh frontier.
pub struct Crawler {
    pub(crate) scope: DomainScope,
    pub(crate) start_urls: Vec<String>,
    pub(crate) registry: Arc<ParserRegistry>,
    pub(crate) config: Arc<Config>,
    pub(crate) transport: Option<Arc<dyn Transport>>,
    pub(crate) robots: Option<Arc<dyn RobotsPolicy>>,
}

impl Crawler {
    pub fn builder() -> CrawlerBuilder {
        CrawlerBuilder::new()
    }

    pub fn domain(&self) -> &str {
        self.scope.domain()
    }

    pub fn start_urls(&self) -> &[String] {
        &self.start_urls
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn parsers(&self) -> &ParserRegistry {
        &self.registry
    }
}

impl fmt::Debug for Crawler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Crawler")
            .field("domain", &self.scope.domain())
            .field("start_urls", &self.start_urls)
            .field("parsers", &self.registry.names())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Builder for `Crawler`
#[derive(Default)]
pub struct CrawlerBuilder {
    domain: Option<String>,
    start_urls: Vec<String>,
    parsers: Vec<ParserDefinition>,
    config: Option<Config>,
    transport: Option<Arc<dyn Transport>>,
    robots: Option<Arc<dyn RobotsPolicy>>,
}

impl fmt::Debug for CrawlerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parsers: Vec<&str> = self.parsers.iter().map(|p| p.name()).collect();
        f.debug_struct("CrawlerBuilder")
            .field("domain", &self.domain)
            .field("start_urls", &self.start_urls)
            .field("parsers", &parsers)
            .field("config", &self.config)
            .field("custom_transport", &self.transport.is_some())
            .field("custom_robots", &self.robots.is_some())
            .finish()
    }
}

impl CrawlerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the crawl to this domain and its subdomains
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Sets the seed URLs
    ///
    /// URLs without an http(s) scheme are kept but logged; the frontier will
    /// reject them when the crawl starts.
    pub fn start_urls<I, S>(mut self, urls: I) -> Result<Self, CrawlerError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let urls: Vec<String> = urls.into_iter().map(Into::into).collect();
        if urls.is_empty() {
            return Err(CrawlerError::InvalidArgument(
                "At least one start URL must be provided".to_string(),
            ));
        }

        for url in &urls {
            if !has_http_scheme(url) {
                tracing::warn!("URL '{}' should start with http:// or https://", url);
            }
        }

        self.start_urls = urls;
        Ok(self)
    }

    /// Registers a parser; a later definition with the same name replaces it
    pub fn parse(mut self, definition: ParserDefinition) -> Self {
        self.parsers.push(definition);
        self
    }

    /// Overrides the process-wide configuration for this crawler
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Replaces the robots.txt policy used when `respect_robots_txt` is on
    pub fn robots_policy(mut self, policy: Arc<dyn RobotsPolicy>) -> Self {
        self.robots = Some(policy);
        self
    }

    pub fn build(self) -> Result<Crawler, CrawlerError> {
        let domain = match self.domain.as_deref().map(str::trim) {
            Some(d) if !d.is_empty() => d.to_string(),
            _ => return Err(CrawlerError::MissingDomain),
        };
        validate_domain_pattern(&domain)?;

        if self.start_urls.is_empty() {
            return Err(CrawlerError::MissingStartUrls);
        }

        let config = match self.config {
            Some(config) => {
                config.validate()?;
                Arc::new(config)
            }
            None => config::current(),
        };

        if self.parsers.is_empty() {
            tracing::warn!("No parsers registered for {}; every page will be unparsed", domain);
        }

        let mut registry = ParserRegistry::new();
        for definition in self.parsers {
            registry.register(definition);
        }

        Ok(Crawler {
            scope: DomainScope::new(&domain),
            start_urls: self.start_urls,
            registry: Arc::new(registry),
            config,
            transport: self.transport,
            robots: self.robots,
        })
    }
}
