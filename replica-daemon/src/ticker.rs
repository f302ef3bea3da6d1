//! Cycle pacing.
//!
//! The runner never sleeps on its own; it asks a [`Ticker`] when the next
//! cycle is due. Production uses [`IntervalTicker`] on the tokio clock, which
//! tests can pause and advance by hand.

use std::future::Future;
use std::time::Duration;

/// Source of "next cycle is due" signals.
pub trait Ticker {
    /// Wait for the next cycle. Returns `false` once no more cycles will come.
    fn tick(&mut self) -> impl Future<Output = bool>;
}

/// Sleeps a fixed interval per tick, forever.
///
/// The interval is measured from the moment `tick` is called, i.e. from the end
/// of the previous cycle, so the real period is interval plus cycle duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalTicker {
    interval: Duration,
}

impl IntervalTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn from_secs(secs: u64) -> Self {
        Self::new(Duration::from_secs(secs))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Ticker for IntervalTicker {
    async fn tick(&mut self) -> bool {
        tokio::time::sleep(self.interval).await;
        true
    }
}
