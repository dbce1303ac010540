use async_trait::async_trait;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{Instant, MissedTickBehavior};

/// One periodic timer. Each `tick` resolves once per period.
#[async_trait]
pub trait Ticker: Send {
    async fn tick(&mut self);
}

/// Timer primitive the scheduler is built on.
///
/// `ticker` is called synchronously from `RefreshScheduler::start`, inside
/// a Tokio runtime; the returned ticker is then driven on its own task.
/// Cancelling means dropping the ticker.
pub trait Clock: Send + Sync {
    fn ticker(&self, period: Duration) -> Box<dyn Ticker>;
}

// ── Tokio ───────────────────────────────────────────────────────────

/// Wall-clock timer backed by `tokio::time::interval`.
/// The first tick fires one full period after the ticker is created.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

struct TokioTicker {
    interval: tokio::time::Interval,
}

impl Clock for TokioClock {
    fn ticker(&self, period: Duration) -> Box<dyn Ticker> {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        // A slow refresh must not cause a burst of catch-up ticks.
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Box::new(TokioTicker { interval })
    }
}

#[async_trait]
impl Ticker for TokioTicker {
    async fn tick(&mut self) {
        self.interval.tick().await;
    }
}

// ── Manual ──────────────────────────────────────────────────────────

const MANUAL_CLOCK_CAPACITY: usize = 64;

/// A clock that only ticks when told to. Every live ticker observes every
/// `fire`; the period is ignored. Useful for tests and for embedders that
/// already own a timer loop.
#[derive(Debug, Clone)]
pub struct ManualClock {
    tx: broadcast::Sender<()>,
}

struct ManualTicker {
    rx: broadcast::Receiver<()>,
}

impl ManualClock {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(MANUAL_CLOCK_CAPACITY);
        Self { tx }
    }

    /// Fire one tick. Returns how many tickers were listening.
    pub fn fire(&self) -> usize {
        self.tx.send(()).unwrap_or(0)
    }

    /// Number of tickers that have not been dropped yet.
    pub fn live_tickers(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn ticker(&self, _period: Duration) -> Box<dyn Ticker> {
        Box::new(ManualTicker {
            rx: self.tx.subscribe(),
        })
    }
}

#[async_trait]
impl Ticker for ManualTicker {
    async fn tick(&mut self) {
        match self.rx.recv().await {
            // Missed ticks collapse into one, like MissedTickBehavior::Delay.
            Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => {}
            Err(broadcast::error::RecvError::Closed) => std::future::pending::<()>().await,
        }
    }
}
