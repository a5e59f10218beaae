//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client with the configured user agent and timeout
//! - Manual redirect following with a hop limit
//! - Retry logic for network failures
//! - Error classification
//!
//! A `Transport` performs exactly one HTTP exchange. The `Fetcher` layers
//! pacing, redirects and retries on top of it.

use crate::config::Config;
use crate::crawler::{CrawlRequest, CrawlResponse, Headers, RateGate};
use crate::url::DomainScope;
use crate::NetworkError;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use url::Url;

/// One HTTP exchange for a URL, without following redirects
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, url: &Url) -> Result<CrawlResponse, NetworkError>;
}

/// Builds an HTTP client from the crawl configuration
///
/// Redirects are disabled on the client; the fetcher follows them itself so
/// that every hop is paced and counted.
pub fn build_http_client(config: &Config) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(config.request_timeout_duration())
        .redirect(Policy::none()) // Handle redirects manually
        .gzip(true)
        .brotli(true)
        .build()
}

/// `Transport` backed by reqwest
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        build_http_client(config).map(Self::new)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, url: &Url) -> Result<CrawlResponse, NetworkError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status().as_u16();
        let headers = Headers::from_header_map(response.headers());

        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                NetworkError::Timeout {
                    url: url.to_string(),
                }
            } else {
                NetworkError::Body {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        Ok(CrawlResponse::new(url.clone(), status, headers, body))
    }
}

fn classify_error(url: &Url, error: reqwest::Error) -> NetworkError {
    if error.is_timeout() {
        NetworkError::Timeout {
            url: url.to_string(),
        }
    } else if error.is_connect() {
        NetworkError::Connect {
            url: url.to_string(),
            message: error.to_string(),
        }
    } else {
        NetworkError::Request {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}

/// Fetches requests with pacing, redirects and retries
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | HTTP 2xx-5xx | Returned as a response |
/// | Timeout, connection or body failure | Retry up to `max_retries`, fixed wait |
/// | Redirect chain > `max_redirects` | Terminal, no retry |
/// | Redirect leaving the scope | 3xx returned as a response |
pub struct Fetcher {
    transport: Arc<dyn Transport>,
    config: Arc<Config>,
    gate: Arc<RateGate>,
    scope: Option<DomainScope>,
}

impl Fetcher {
    pub fn new(transport: Arc<dyn Transport>, config: Arc<Config>, gate: Arc<RateGate>) -> Self {
        Self {
            transport,
            config,
            gate,
            scope: None,
        }
    }

    /// Only follow redirects whose target lies inside `scope`
    pub fn with_scope(mut self, scope: DomainScope) -> Self {
        self.scope = Some(scope);
        self
    }

    pub async fn fetch(&self, request: CrawlRequest) -> Result<CrawlResponse, NetworkError> {
        self.fetch_until(request, &CancellationToken::new()).await
    }

    /// Like `fetch`, but gives up retrying once `cancel` fires
    pub async fn fetch_until(
        &self,
        mut request: CrawlRequest,
        cancel: &CancellationToken,
    ) -> Result<CrawlResponse, NetworkError> {
        loop {
            let error = match self.fetch_once(&request.url).await {
                Ok(response) => return Ok(response),
                Err(e) => e,
            };

            if matches!(error, NetworkError::TooManyRedirects { .. })
                || request.retry_count >= self.config.max_retries
                || cancel.is_cancelled()
            {
                return Err(terminal_error(&request, error));
            }

            let wait = self.config.retry_wait_duration();
            tracing::warn!(
                "Fetch of {} failed (attempt {}/{}): {}; retrying in {:?}",
                request.url,
                request.retry_count + 1,
                self.config.max_retries + 1,
                error,
                wait
            );

            tokio::select! {
                _ = cancel.cancelled() => return Err(terminal_error(&request, error)),
                _ = tokio::time::sleep(wait) => {}
            }

            request.retry_count += 1;
        }
    }

    /// One attempt: the initial request plus any redirect hops
    async fn fetch_once(&self, url: &Url) -> Result<CrawlResponse, NetworkError> {
        let mut current = url.clone();
        let mut hops = 0u32;

        loop {
            self.gate.acquire().await;
            let response = self.transport.send(&current).await?;

            if !self.config.follow_redirects || !response.is_redirect() {
                return Ok(response);
            }

            let location = response.location().unwrap_or_default();
            let next = match current.join(location) {
                Ok(next) if next.scheme() == "http" || next.scheme() == "https" => next,
                _ => {
                    tracing::debug!(
                        "Not following redirect from {} to '{}'",
                        current,
                        location
                    );
                    return Ok(response);
                }
            };

            if let Some(scope) = &self.scope {
                if !scope.contains(&next) {
                    tracing::debug!("Not following off-domain redirect {} -> {}", current, next);
                    return Ok(response);
                }
            }

            hops += 1;
            if hops > self.config.max_redirects {
                return Err(NetworkError::TooManyRedirects {
                    url: url.to_string(),
                    limit: self.config.max_redirects,
                });
            }

            tracing::debug!("Redirect {} -> {} ({})", current, next, response.status);
            current = next;
        }
    }
}

fn terminal_error(request: &CrawlRequest, error: NetworkError) -> NetworkError {
    if request.retry_count == 0 {
        error
    } else {
        NetworkError::RetriesExhausted {
            url: request.url.to_string(),
            attempts: request.retry_count + 1,
            source: Box::new(error),
        }
    }
}
