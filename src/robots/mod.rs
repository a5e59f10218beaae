//! Robots.txt handling module
//!
//! The crawl engine consults a `RobotsPolicy` before enqueueing a URL when
//! `respect_robots_txt` is enabled. `RobotsCache` is the default policy: it
//! fetches, parses and caches robots.txt per origin.

mod cache;
mod parser;

pub use cache::CachedRobots;
pub use parser::ParsedRobots;

use crate::config::Config;
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use tokio::sync::Mutex;
use url::Url;

/// Decides whether a URL may be crawled
#[async_trait]
pub trait RobotsPolicy: Send + Sync {
    async fn allows(&self, url: &Url) -> bool;
}

/// Policy that allows every URL
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

#[async_trait]
impl RobotsPolicy for AllowAll {
    async fn allows(&self, _url: &Url) -> bool {
        true
    }
}

/// Fetches robots.txt for the origin of a URL
///
/// | Response | Result |
/// |----------|--------|
/// | 2xx | parsed rules |
/// | 4xx | allow all |
/// | 5xx / network error | allow all, logged as a warning |
pub async fn fetch_robots(client: &Client, url: &Url) -> ParsedRobots {
    let robots_url = match url.join("/robots.txt") {
        Ok(u) => u,
        Err(e) => {
            tracing::debug!("Cannot build robots.txt URL for {}: {}", url, e);
            return ParsedRobots::allow_all();
        }
    };

    let response = match client.get(robots_url.clone()).send().await {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!("Failed to fetch {}: {}; allowing all", robots_url, e);
            return ParsedRobots::allow_all();
        }
    };

    let status = response.status();
    if status.is_success() {
        match response.text().await {
            Ok(body) => ParsedRobots::from_content(&body),
            Err(e) => {
                tracing::warn!("Failed to read {}: {}; allowing all", robots_url, e);
                ParsedRobots::allow_all()
            }
        }
    } else if status.is_client_error() {
        tracing::debug!("{} returned {}; allowing all", robots_url, status);
        ParsedRobots::allow_all()
    } else {
        tracing::warn!("{} returned {}; allowing all", robots_url, status);
        ParsedRobots::allow_all()
    }
}

/// Robots policy backed by per-origin cached robots.txt files
pub struct RobotsCache {
    client: Client,
    agent: String,
    entries: Mutex<HashMap<String, CachedRobots>>,
}

impl RobotsCache {
    /// Creates a cache that fetches with the given client and matches rules for `agent`
    pub fn new(client: Client, agent: impl Into<String>) -> Self {
        Self {
            client,
            agent: agent.into(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Builds a cache with its own client using the configured user agent and timeout
    ///
    /// Unlike page fetches, robots.txt requests follow redirects.
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.request_timeout_duration())
            .build()?;
        Ok(Self::new(client, config.robots_agent()))
    }

    /// Number of origins with cached rules
    pub async fn cached_origins(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[async_trait]
impl RobotsPolicy for RobotsCache {
    async fn allows(&self, url: &Url) -> bool {
        let origin = url.origin().ascii_serialization();

        // Held across the fetch so concurrent checks for one origin fetch once
        let mut entries = self.entries.lock().await;

        let fresh = entries.get(&origin).map(|c| !c.is_stale()).unwrap_or(false);
        if !fresh {
            tracing::debug!("Fetching robots.txt for {}", origin);
            let parsed = fetch_robots(&self.client, url).await;
            entries.insert(origin.clone(), CachedRobots::new(parsed));
        }

        let allowed = entries
            .get(&origin)
            .map(|cached| cached.is_allowed(url.as_str(), &self.agent))
            .unwrap_or(true);

        if !allowed {
            tracing::info!("URL {} disallowed by robots.txt", url);
        }
        allowed
    }
}
