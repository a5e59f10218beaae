/// Page state definitions for tracking crawl progress
///
/// This module defines every state a URL can be in once the frontier knows about it.
use std::fmt;

/// Represents the current state of a URL in the crawl process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageState {
    // ===== Active States =====
    /// URL is pending in the frontier
    Queued,

    /// URL has been handed to a worker
    Fetching,

    // ===== Terminal Success States =====
    /// Page was fetched and dispatched to a parser
    Processed,

    // ===== Terminal Error States =====
    /// Fetch failed after exhausting retries
    Failed,

    /// Page was fetched but no parser matched its URL
    Unparsed,

    /// The selected parser returned an error or panicked
    ParseFailed,
}

impl PageState {
    /// Returns true if this is a terminal state (the URL counts as visited)
    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }

    /// Returns true if this is an active state (the URL is pending or in flight)
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Queued | Self::Fetching)
    }

    /// Returns true if this represents a successful completion
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Processed)
    }

    /// Returns true if this represents an error state
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failed | Self::Unparsed | Self::ParseFailed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Fetching => "fetching",
            Self::Processed => "processed",
            Self::Failed => "failed",
            Self::Unparsed => "unparsed",
            Self::ParseFailed => "parse_failed",
        }
    }

    /// Returns all terminal states, in reporting order
    pub fn terminal_states() -> [Self; 4] {
        [
            Self::Processed,
            Self::Failed,
            Self::Unparsed,
            Self::ParseFailed,
        ]
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
