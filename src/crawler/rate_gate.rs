//! Global pacing of fetch starts

use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Spaces fetch starts at least `spacing` apart across all workers
///
/// The lock is held while waiting, so concurrent callers are served one at a
/// time in lock order.
#[derive(Debug)]
pub struct RateGate {
    spacing: Duration,
    last_start: Mutex<Option<Instant>>,
}

impl RateGate {
    pub fn new(spacing: Duration) -> Self {
        Self {
            spacing,
            last_start: Mutex::new(None),
        }
    }

    pub fn spacing(&self) -> Duration {
        self.spacing
    }

    /// Waits for this caller's turn, then records the new start time
    pub async fn acquire(&self) {
        if self.spacing.is_zero() {
            return;
        }

        let mut last = self.last_start.lock().await;
        if let Some(previous) = *last {
            tokio::time::sleep_until(previous + self.spacing).await;
        }
        *last = Some(Instant::now());
    }
}
