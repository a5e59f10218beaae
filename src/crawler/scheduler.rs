//! Scheduler driving the crawl loop
//!
//! This module handles:
//! - Handing frontier URLs to a bounded set of workers
//! - Feeding discovered links back into the frontier
//! - Recording the terminal state of every URL
//! - Cooperative cancellation
//!
//! The scheduler loop is the only owner of the `Frontier`. Workers never
//! touch it; each returns a `WorkerReport` through the `JoinSet`.

use crate::crawler::dispatcher::panic_message;
use crate::crawler::{CrawlRequest, CrawlResponse, Dispatcher, EnqueueOutcome, Fetcher, Frontier};
use crate::output::CrawlStatistics;
use crate::robots::RobotsPolicy;
use crate::state::PageState;
use crate::url::DomainScope;
use crate::RippleError;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use url::Url;

/// How often (in finished pages) progress is logged
const PROGRESS_INTERVAL: u64 = 10;

/// What a worker learned about one URL
#[derive(Debug)]
struct WorkerReport {
    request: CrawlRequest,
    /// Where the fetch ended up when redirects moved it
    final_uri: Option<Url>,
    state: PageState,
    records: usize,
    /// Follow-ups reported by the parser, before filtering
    discovered: usize,
    /// Follow-ups inside the domain and allowed by robots.txt
    follow: Vec<Url>,
    out_of_scope: usize,
    robots_denied: usize,
}

impl WorkerReport {
    fn new(request: CrawlRequest, state: PageState) -> Self {
        Self {
            request,
            final_uri: None,
            state,
            records: 0,
            discovered: 0,
            follow: Vec::new(),
            out_of_scope: 0,
            robots_denied: 0,
        }
    }

    fn fetched(request: CrawlRequest, response: &CrawlResponse, state: PageState) -> Self {
        let mut report = Self::new(request, state);
        if response.uri != report.request.url {
            report.final_uri = Some(response.uri.clone());
        }
        report
    }
}

struct Worker {
    fetcher: Fetcher,
    dispatcher: Dispatcher,
    scope: DomainScope,
    robots: Option<Arc<dyn RobotsPolicy>>,
}

impl Worker {
    /// Fetch, dispatch, then filter follow-ups
    async fn process(&self, request: CrawlRequest, cancel: CancellationToken) -> WorkerReport {
        let response = match self.fetcher.fetch_until(request.clone(), &cancel).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Failed to fetch {}: {}", request.url, e);
                return WorkerReport::new(request, PageState::Failed);
            }
        };

        let outcome = match self.dispatcher.dispatch(&response).await {
            Ok(outcome) => outcome,
            Err(RippleError::Crawler(e)) => {
                tracing::warn!("Skipping {}: {}", request.url, e);
                return WorkerReport::fetched(request, &response, PageState::Unparsed);
            }
            Err(e) => {
                tracing::error!("Failed to parse {}: {}", request.url, e);
                return WorkerReport::fetched(request, &response, PageState::ParseFailed);
            }
        };

        let mut report = WorkerReport::fetched(request, &response, PageState::Processed);
        report.records = outcome.records;
        report.discovered = outcome.follow.len();

        for url in outcome.follow {
            if !self.scope.contains(&url) {
                tracing::trace!("Ignoring off-domain link {}", url);
                report.out_of_scope += 1;
                continue;
            }
            if let Some(robots) = &self.robots {
                if !robots.allows(&url).await {
                    report.robots_denied += 1;
                    continue;
                }
            }
            report.follow.push(url);
        }

        report
    }
}

pub struct Scheduler {
    worker: Arc<Worker>,
    concurrency: usize,
}

impl Scheduler {
    /// Creates a scheduler running at most `concurrency` workers at once
    ///
    /// `robots` is consulted for every discovered link when present. The
    /// fetcher is restricted to redirects inside `scope`.
    pub fn new(
        fetcher: Fetcher,
        dispatcher: Dispatcher,
        scope: DomainScope,
        robots: Option<Arc<dyn RobotsPolicy>>,
        concurrency: usize,
    ) -> Self {
        Self {
            worker: Arc::new(Worker {
                fetcher: fetcher.with_scope(scope.clone()),
                dispatcher,
                scope,
                robots,
            }),
            concurrency: concurrency.max(1),
        }
    }

    /// Crawls until the frontier is exhausted or `cancel` fires
    ///
    /// After cancellation no new URL is dequeued; in-flight workers are
    /// drained before returning.
    pub async fn run(
        &self,
        frontier: &mut Frontier,
        cancel: &CancellationToken,
    ) -> CrawlStatistics {
        let started = Instant::now();
        let mut stats = CrawlStatistics::new();
        let mut workers = JoinSet::new();

        loop {
            while workers.len() < self.concurrency && !cancel.is_cancelled() {
                let Some(request) = frontier.dequeue() else {
                    break;
                };
                tracing::debug!("Dispatching {} (depth {})", request.url, request.depth);

                let worker = Arc::clone(&self.worker);
                let token = cancel.clone();
                workers.spawn(async move {
                    let url = request.url.clone();
                    AssertUnwindSafe(worker.process(request, token))
                        .catch_unwind()
                        .await
                        .map_err(|payload| (url, panic_message(payload.as_ref())))
                });
            }

            let Some(joined) = workers.join_next().await else {
                break;
            };

            match joined {
                Ok(Ok(report)) => self.absorb(report, frontier, &mut stats),
                Ok(Err((url, message))) => {
                    tracing::error!("Worker panicked while processing {}: {}", url, message);
                    frontier.complete(url.as_str(), PageState::Failed);
                    stats.record_page(PageState::Failed);
                }
                Err(e) => tracing::error!("Worker task failed: {}", e),
            }

            if stats.pages_crawled() > 0 && stats.pages_crawled() % PROGRESS_INTERVAL == 0 {
                tracing::info!(
                    "Progress: {} pages crawled, {} pending, {} in flight",
                    stats.pages_crawled(),
                    frontier.pending_len(),
                    frontier.in_flight_len()
                );
            }
        }

        // A task lost to a JoinError never reported its URL
        for url in frontier.fail_in_flight() {
            tracing::error!("No report received for {}; marking it failed", url);
            stats.record_page(PageState::Failed);
        }

        stats.cancelled = cancel.is_cancelled();
        stats.elapsed = started.elapsed();
        if stats.cancelled {
            tracing::info!(
                "Crawl cancelled with {} URLs still pending",
                frontier.pending_len()
            );
        }
        stats
    }

    /// Enqueues a report's follow-ups, then records its terminal state
    fn absorb(&self, report: WorkerReport, frontier: &mut Frontier, stats: &mut CrawlStatistics) {
        stats.links_discovered += report.discovered as u64;
        stats.urls_rejected += report.out_of_scope as u64;
        stats.robots_denied += report.robots_denied as u64;
        stats.records_emitted += report.records as u64;

        if let Some(final_uri) = &report.final_uri {
            frontier.complete(final_uri.as_str(), report.state);
        }

        let depth = report.request.depth + 1;
        for url in &report.follow {
            record_enqueue(stats, frontier.enqueue_at(url.as_str(), depth));
        }

        frontier.complete(report.request.url.as_str(), report.state);
        stats.record_page(report.state);
    }
}

/// Tallies one frontier decision
pub(crate) fn record_enqueue(stats: &mut CrawlStatistics, outcome: EnqueueOutcome) {
    match outcome {
        EnqueueOutcome::Queued => stats.urls_enqueued += 1,
        EnqueueOutcome::Duplicate => stats.duplicates += 1,
        _ => stats.urls_rejected += 1,
    }
}
