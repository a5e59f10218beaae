//! Crawler coordinator - wires one crawl run together
//!
//! For each run this module:
//! - Builds the HTTP transport and robots.txt policy (unless overridden)
//! - Seeds a fresh frontier, consulting robots.txt for every seed
//! - Hands the frontier to the scheduler
//! - Reports the final statistics

use crate::crawler::scheduler::record_enqueue;
use crate::crawler::{
    Crawler, Dispatcher, Fetcher, Frontier, HttpTransport, RateGate, Scheduler, Transport,
};
use crate::output::{CrawlStatistics, PipelineSink};
use crate::robots::{RobotsCache, RobotsPolicy};
use crate::url::has_http_scheme;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use url::Url;

impl Crawler {
    /// Runs a crawl to completion, delivering records to `sink`
    ///
    /// Per-URL failures are logged and counted, never returned. Only building
    /// the HTTP clients can fail.
    pub async fn crawl(&self, sink: Arc<dyn PipelineSink>) -> crate::Result<CrawlStatistics> {
        self.crawl_until(sink, CancellationToken::new()).await
    }

    /// Like `crawl`, stopping early once `cancel` fires
    pub async fn crawl_until(
        &self,
        sink: Arc<dyn PipelineSink>,
        cancel: CancellationToken,
    ) -> crate::Result<CrawlStatistics> {
        let started = Instant::now();
        let config = Arc::clone(&self.config);

        tracing::info!(
            "Starting crawl of {} from {} seed URLs ({} parsers, {} concurrent requests)",
            self.scope.domain(),
            self.start_urls.len(),
            self.registry.len(),
            config.concurrent_requests
        );

        let transport: Arc<dyn Transport> = match &self.transport {
            Some(transport) => Arc::clone(transport),
            None => Arc::new(HttpTransport::from_config(&config)?),
        };

        let robots: Option<Arc<dyn RobotsPolicy>> = if config.respect_robots_txt {
            Some(match &self.robots {
                Some(policy) => Arc::clone(policy),
                None => Arc::new(RobotsCache::from_config(&config)?),
            })
        } else {
            None
        };

        let mut frontier = Frontier::new(self.scope.clone(), config.max_depth);
        let mut seeding = CrawlStatistics::new();

        for seed in &self.start_urls {
            if let Some(policy) = &robots {
                if let Some(url) = seed_url(seed) {
                    if self.scope.contains(&url) && !policy.allows(&url).await {
                        seeding.robots_denied += 1;
                        continue;
                    }
                }
            }
            record_enqueue(&mut seeding, frontier.enqueue(seed));
        }

        if frontier.is_empty() {
            tracing::warn!("No seed URL could be queued for {}", self.scope.domain());
        }

        let gate = Arc::new(RateGate::new(config.delay_duration()));
        let fetcher = Fetcher::new(transport, Arc::clone(&config), gate);
        let dispatcher = Dispatcher::new(Arc::clone(&self.registry), sink);
        let scheduler = Scheduler::new(
            fetcher,
            dispatcher,
            self.scope.clone(),
            robots,
            config.concurrent_requests,
        );

        let mut stats = scheduler.run(&mut frontier, &cancel).await;
        stats.urls_enqueued += seeding.urls_enqueued;
        stats.urls_rejected += seeding.urls_rejected;
        stats.duplicates += seeding.duplicates;
        stats.robots_denied += seeding.robots_denied;
        stats.elapsed = started.elapsed();

        tracing::info!(
            "Crawl of {} finished: {} pages, {} records in {:.2?}",
            self.scope.domain(),
            stats.pages_crawled(),
            stats.records_emitted,
            stats.elapsed
        );

        Ok(stats)
    }
}

fn seed_url(seed: &str) -> Option<Url> {
    if !has_http_scheme(seed) {
        return None;
    }
    Url::parse(seed.trim()).ok()
}
