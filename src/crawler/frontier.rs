//! The crawl frontier: pending URLs plus the state of every URL seen so far
//!
//! URLs are de-duplicated on their normalized form and served breadth-first.
//! A URL moves `Queued` -> `Fetching` -> terminal, and never goes back.

use crate::crawler::CrawlRequest;
use crate::state::PageState;
use crate::url::{has_http_scheme, normalize_url, DomainScope};
use std::collections::{HashMap, VecDeque};
use url::Url;

/// What `enqueue` did with a URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Queued,
    /// Already pending, in flight or visited
    Duplicate,
    OutOfDomain,
    UnsupportedScheme,
    Malformed,
    /// Deeper than the configured maximum depth
    TooDeep,
}

impl EnqueueOutcome {
    pub fn is_queued(&self) -> bool {
        matches!(self, Self::Queued)
    }
}

pub struct Frontier {
    pending: VecDeque<(String, CrawlRequest)>,
    states: HashMap<String, PageState>,
    scope: DomainScope,
    max_depth: Option<u32>,
    in_flight: usize,
    visited: usize,
}

impl Frontier {
    pub fn new(scope: DomainScope, max_depth: Option<u32>) -> Self {
        Self {
            pending: VecDeque::new(),
            states: HashMap::new(),
            scope,
            max_depth,
            in_flight: 0,
            visited: 0,
        }
    }

    pub fn scope(&self) -> &DomainScope {
        &self.scope
    }

    /// Enqueues a seed URL (depth 0)
    pub fn enqueue(&mut self, url: &str) -> EnqueueOutcome {
        self.enqueue_at(url, 0)
    }

    pub fn enqueue_at(&mut self, url: &str, depth: u32) -> EnqueueOutcome {
        if !has_http_scheme(url) {
            tracing::warn!("URL '{}' should start with http:// or https://", url);
            return EnqueueOutcome::UnsupportedScheme;
        }

        let normalized = match normalize_url(url) {
            Ok(u) => u,
            Err(e) => {
                tracing::debug!("Skipping malformed URL '{}': {}", url, e);
                return EnqueueOutcome::Malformed;
            }
        };

        if !self.scope.contains(&normalized) {
            tracing::debug!(
                "Skipping {}: outside domain {}",
                normalized,
                self.scope.domain()
            );
            return EnqueueOutcome::OutOfDomain;
        }

        if let Some(max) = self.max_depth {
            if depth > max {
                tracing::debug!("Skipping {}: depth {} exceeds {}", normalized, depth, max);
                return EnqueueOutcome::TooDeep;
            }
        }

        let key = String::from(normalized.clone());
        if self.states.contains_key(&key) {
            tracing::trace!("Already known: {}", key);
            return EnqueueOutcome::Duplicate;
        }

        // Fetch the URL as written, minus its fragment
        let target = match Url::parse(url.trim()) {
            Ok(mut parsed) => {
                parsed.set_fragment(None);
                parsed
            }
            Err(_) => normalized,
        };

        tracing::trace!("Queued {} at depth {}", key, depth);
        self.states.insert(key.clone(), PageState::Queued);
        self.pending.push_back((key, CrawlRequest::new(target, depth)));
        EnqueueOutcome::Queued
    }

    /// Takes the oldest pending URL and marks it in flight
    pub fn dequeue(&mut self) -> Option<CrawlRequest> {
        let (key, request) = self.pending.pop_front()?;
        self.states.insert(key, PageState::Fetching);
        self.in_flight += 1;
        Some(request)
    }

    /// Marks a URL visited
    ///
    /// Idempotent. A URL already in a terminal state keeps it; otherwise it
    /// becomes `Processed`.
    pub fn mark_visited(&mut self, url: &str) {
        self.complete(url, PageState::Processed);
    }

    /// Records the terminal outcome of a URL
    ///
    /// The first terminal state recorded for a URL wins. Non-terminal states
    /// are ignored.
    pub fn complete(&mut self, url: &str, state: PageState) {
        if !state.is_terminal() {
            tracing::debug!("Ignoring non-terminal completion {} for {}", state, url);
            return;
        }

        let key = match normalize_url(url) {
            Ok(u) => String::from(u),
            Err(e) => {
                tracing::debug!("Cannot mark '{}' visited: {}", url, e);
                return;
            }
        };

        match self.states.get(&key).copied() {
            Some(current) if current.is_terminal() => return,
            Some(PageState::Queued) => self.pending.retain(|(k, _)| *k != key),
            Some(PageState::Fetching) => self.in_flight -= 1,
            _ => {}
        }

        self.states.insert(key, state);
        self.visited += 1;
    }

    /// Marks every URL still in flight `Failed` and returns them
    ///
    /// For URLs whose worker vanished without reporting back.
    pub fn fail_in_flight(&mut self) -> Vec<String> {
        let stranded: Vec<String> = self
            .states
            .iter()
            .filter(|(_, state)| **state == PageState::Fetching)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &stranded {
            self.complete(key, PageState::Failed);
        }
        stranded
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn visited_len(&self) -> usize {
        self.visited
    }

    pub fn in_flight_len(&self) -> usize {
        self.in_flight
    }

    pub fn is_pending(&self, url: &str) -> bool {
        self.state_of(url) == Some(PageState::Queued)
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.state_of(url).map(|s| s.is_terminal()).unwrap_or(false)
    }

    /// True when nothing is pending (in-flight URLs are not counted)
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Number of known URLs: pending, in flight and visited
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn state_of(&self, url: &str) -> Option<PageState> {
        let key = normalize_url(url).ok().map(String::from)?;
        self.states.get(&key).copied()
    }
}
