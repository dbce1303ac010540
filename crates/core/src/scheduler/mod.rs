pub mod clock;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use self::clock::Clock;

/// Action run on every scheduler tick.
///
/// Implementations should only hand the work off (e.g. post a message to
/// the state-owning task); they run on the timer task.
pub trait RefreshTrigger: Send + Sync + 'static {
    fn fire(&self);
}

impl<F> RefreshTrigger for F
where
    F: Fn() + Send + Sync + 'static,
{
    fn fire(&self) {
        self()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
}

impl fmt::Display for SchedulerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulerState::Idle => write!(f, "Idle"),
            SchedulerState::Running => write!(f, "Running"),
        }
    }
}

/// Owns the single periodic refresh trigger.
///
/// There is at most one timer task at any time: `start` cancels the
/// running one before creating its replacement, `stop` cancels it, and
/// dropping the scheduler cancels it too.
#[must_use]
pub struct RefreshScheduler {
    clock: Arc<dyn Clock>,
    period: Duration,
    trigger: Arc<dyn RefreshTrigger>,
    task: Option<JoinHandle<()>>,
    starts: u64,
}

impl fmt::Debug for RefreshScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshScheduler")
            .field("state", &self.state())
            .field("period", &self.period)
            .field("starts", &self.starts)
            .finish()
    }
}

impl RefreshScheduler {
    pub fn new(clock: Arc<dyn Clock>, period: Duration, trigger: Arc<dyn RefreshTrigger>) -> Self {
        Self {
            clock,
            period,
            trigger,
            task: None,
            starts: 0,
        }
    }

    pub fn state(&self) -> SchedulerState {
        if self.task.is_some() {
            SchedulerState::Running
        } else {
            SchedulerState::Idle
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == SchedulerState::Running
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Change the period. A running timer is restarted with the new period.
    pub fn set_period(&mut self, period: Duration) {
        self.period = period;
        if self.is_running() {
            self.start();
        }
    }

    /// Idle → Running. When already running, the current timer is cancelled
    /// and replaced. Must be called from within a Tokio runtime.
    pub fn start(&mut self) {
        let replaced = self.cancel();

        let mut ticker = self.clock.ticker(self.period);
        let trigger = Arc::clone(&self.trigger);
        self.starts += 1;
        let generation = self.starts;

        self.task = Some(tokio::spawn(async move {
            loop {
                ticker.tick().await;
                debug!(generation, "refresh tick");
                trigger.fire();
            }
        }));

        info!(period = ?self.period, replaced, "auto refresh started");
    }

    /// Running → Idle. Calling it while idle does nothing.
    pub fn stop(&mut self) {
        if self.cancel() {
            info!("auto refresh stopped");
        }
    }

    fn cancel(&mut self) -> bool {
        match self.task.take() {
            Some(handle) => {
                handle.abort();
                true
            }
            None => false,
        }
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}
