//! Statistics gathered during a crawl run

use crate::state::PageState;
use std::collections::HashMap;
use std::fmt::Write;
use std::time::Duration;

/// Crawl statistics summary
#[derive(Debug, Clone, Default)]
pub struct CrawlStatistics {
    /// Count of finished URLs by terminal state
    pub pages_by_state: HashMap<PageState, u64>,

    /// Records forwarded to the pipeline sink
    pub records_emitted: u64,

    /// Follow-up URLs reported by parsers (before de-duplication)
    pub links_discovered: u64,

    /// URLs accepted into the frontier, seeds included
    pub urls_enqueued: u64,

    /// URLs rejected by the frontier (scheme, domain, depth or malformed)
    pub urls_rejected: u64,

    /// URLs ignored because they were already known
    pub duplicates: u64,

    /// URLs skipped because robots.txt disallows them
    pub robots_denied: u64,

    /// Whether the run stopped because of a cancellation request
    pub cancelled: bool,

    /// Wall-clock duration of the run
    pub elapsed: Duration,
}

impl CrawlStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the terminal state of one URL
    pub fn record_page(&mut self, state: PageState) {
        *self.pages_by_state.entry(state).or_insert(0) += 1;
    }

    pub fn count(&self, state: PageState) -> u64 {
        self.pages_by_state.get(&state).copied().unwrap_or(0)
    }

    /// Total number of URLs that reached a terminal state
    pub fn pages_crawled(&self) -> u64 {
        self.pages_by_state.values().sum()
    }

    /// Share of finished URLs that were processed successfully, in percent
    pub fn success_rate(&self) -> f64 {
        let total = self.pages_crawled();
        if total == 0 {
            return 0.0;
        }
        self.count(PageState::Processed) as f64 / total as f64 * 100.0
    }
}

/// Renders statistics as a human-readable report
pub fn format_statistics(stats: &CrawlStatistics) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "=== Crawl Statistics ===\n");

    let _ = writeln!(out, "Overview:");
    let _ = writeln!(out, "  Pages crawled: {}", stats.pages_crawled());
    let _ = writeln!(out, "  Records emitted: {}", stats.records_emitted);
    let _ = writeln!(out, "  Links discovered: {}", stats.links_discovered);
    let _ = writeln!(out, "  URLs enqueued: {}", stats.urls_enqueued);
    let _ = writeln!(out, "  URLs rejected: {}", stats.urls_rejected);
    let _ = writeln!(out, "  Duplicates skipped: {}", stats.duplicates);
    let _ = writeln!(out, "  Disallowed by robots.txt: {}", stats.robots_denied);
    let _ = writeln!(out, "  Elapsed: {:.2?}", stats.elapsed);
    if stats.cancelled {
        let _ = writeln!(out, "  Run was cancelled");
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "Pages by State:");
    let total = stats.pages_crawled();
    for state in PageState::terminal_states() {
        let count = stats.count(state);
        if count == 0 {
            continue;
        }
        let percentage = if total > 0 {
            (count as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        let _ = writeln!(out, "  {}: {} ({:.1}%)", state, count, percentage);
    }
    let _ = writeln!(out);

    let _ = writeln!(
        out,
        "Success Rate: {:.1}% ({} / {} pages successfully processed)",
        stats.success_rate(),
        stats.count(PageState::Processed),
        total
    );

    out
}
