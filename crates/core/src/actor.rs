//! Single-writer ownership of the tracker.
//!
//! One Tokio task owns the [`PortfolioTracker`] and is the only place state
//! is mutated. User commands and scheduler ticks both arrive on the same
//! channel and are applied one at a time. Market fetches run on their own
//! task and post the result back, so the write happens on the owning task
//! against the flags as they are at that moment.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::CoreError;
use crate::models::coin::CoinRecord;
use crate::models::holding::NewHolding;
use crate::models::market::{MarketSnapshot, RefreshReport};
use crate::models::portfolio::Portfolio;
use crate::models::settings::{RefreshMode, Settings};
use crate::models::transaction::Transaction;
use crate::providers::traits::CoinSource;
use crate::scheduler::clock::Clock;
use crate::scheduler::{RefreshScheduler, SchedulerState};
use crate::PortfolioTracker;

type Job = Box<dyn FnOnce(&mut PortfolioTracker) + Send>;
type RefreshReply = oneshot::Sender<Result<RefreshReport, CoreError>>;

enum Command {
    /// Run a closure against the tracker on the owning task.
    Apply(Job),
    StartAutoRefresh(oneshot::Sender<()>),
    StopAutoRefresh(oneshot::Sender<()>),
    AutoRefreshState(oneshot::Sender<SchedulerState>),
    SetRefreshInterval {
        secs: u64,
        reply: oneshot::Sender<Result<(), CoreError>>,
    },
    RefreshNow(RefreshReply),
    /// Posted by the scheduler.
    Tick,
    /// Posted by a fetch task. `reply` is set for `refresh_now` requests.
    FetchCompleted {
        result: Result<MarketSnapshot, CoreError>,
        reply: Option<RefreshReply>,
    },
}

/// Cloneable handle to a tracker running on its own task.
///
/// Mutations are sent to the owning task and awaited. Reads go through
/// [`TrackerHandle::snapshot`], an immutable copy published after every
/// change, so a half-applied mutation is never visible.
#[derive(Clone)]
pub struct TrackerHandle {
    tx: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<Arc<Portfolio>>,
}

impl std::fmt::Debug for TrackerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackerHandle")
            .field("revision", &self.snapshots.borrow().revision)
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

impl TrackerHandle {
    /// Move `tracker` onto a new task. Must be called within a Tokio runtime.
    ///
    /// `source` supplies market data for refreshes; `clock` drives the
    /// periodic trigger. Auto refresh starts out stopped.
    pub fn spawn(
        tracker: PortfolioTracker,
        source: Arc<dyn CoinSource>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (tx, commands) = mpsc::unbounded_channel();
        let (publisher, snapshots) = watch::channel(Arc::new(tracker.portfolio().clone()));

        // The scheduler only holds a weak sender: ticks must not keep the
        // task alive once every handle is gone.
        let weak = tx.downgrade();
        let trigger = move || {
            if let Some(tx) = weak.upgrade() {
                let _ = tx.send(Command::Tick);
            }
        };
        let scheduler = RefreshScheduler::new(
            clock,
            tracker.settings().refresh_interval(),
            Arc::new(trigger),
        );

        let actor = TrackerActor {
            published_revision: tracker.revision(),
            tracker,
            source,
            scheduler,
            self_tx: tx.downgrade(),
            publisher,
            tick_fetch_in_flight: false,
        };
        tokio::spawn(actor.run(commands));

        Self { tx, snapshots }
    }

    // ── Reads ───────────────────────────────────────────────────────

    /// Latest published state.
    #[must_use]
    pub fn snapshot(&self) -> Arc<Portfolio> {
        self.snapshots.borrow().clone()
    }

    /// Receiver that is notified on every published change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<Portfolio>> {
        self.snapshots.clone()
    }

    #[must_use]
    pub fn favorites(&self) -> Vec<CoinRecord> {
        self.snapshot().favorites().into_iter().cloned().collect()
    }

    #[must_use]
    pub fn total_value(&self) -> f64 {
        self.snapshot().total_value()
    }

    // ── Catalog & Watchlist ─────────────────────────────────────────

    pub async fn toggle_favorite(&self, id: impl Into<String>) -> Result<bool, CoreError> {
        let id = id.into();
        self.apply(move |t| t.toggle_favorite(&id)).await
    }

    pub async fn remove_from_watchlist(&self, id: impl Into<String>) -> Result<bool, CoreError> {
        let id = id.into();
        self.apply(move |t| t.remove_from_watchlist(&id)).await
    }

    pub async fn reorder_favorites(
        &self,
        source_indices: Vec<usize>,
        destination: usize,
    ) -> Result<(), CoreError> {
        self.apply(move |t| t.reorder_favorites(&source_indices, destination))
            .await?
    }

    pub async fn add_coin(&self, coin: CoinRecord) -> Result<(), CoreError> {
        self.apply(move |t| t.add_coin(coin)).await?
    }

    pub async fn remove_coin(&self, id: impl Into<String>) -> Result<Option<CoinRecord>, CoreError> {
        let id = id.into();
        self.apply(move |t| t.remove_coin(&id)).await
    }

    pub async fn update_coin_quote(
        &self,
        id: impl Into<String>,
        price: f64,
        change_24h_pct: f64,
    ) -> Result<(), CoreError> {
        let id = id.into();
        self.apply(move |t| t.update_coin_quote(&id, price, change_24h_pct))
            .await?
    }

    // ── Ledger ──────────────────────────────────────────────────────

    pub async fn add_holding(&self, fields: NewHolding) -> Result<Uuid, CoreError> {
        self.apply(move |t| t.add_holding(fields)).await?
    }

    pub async fn remove_holdings(&self, indices: Vec<usize>) -> Result<usize, CoreError> {
        self.apply(move |t| t.remove_holdings(&indices)).await?
    }

    pub async fn remove_holding(&self, id: Uuid) -> Result<bool, CoreError> {
        self.apply(move |t| t.remove_holding(id)).await
    }

    pub async fn toggle_holding_favorite(&self, id: Uuid) -> Result<bool, CoreError> {
        self.apply(move |t| t.toggle_holding_favorite(id)).await
    }

    pub async fn record_transaction(&self, tx: Transaction) -> Result<(), CoreError> {
        self.apply(move |t| t.record_transaction(tx)).await
    }

    pub async fn delete_manual_transaction(&self, tx: Transaction) -> Result<bool, CoreError> {
        self.apply(move |t| t.delete_manual_transaction(&tx)).await
    }

    // ── Settings ────────────────────────────────────────────────────

    #[must_use]
    pub fn settings(&self) -> Settings {
        self.snapshot().settings.clone()
    }

    pub async fn set_refresh_mode(&self, mode: RefreshMode) -> Result<(), CoreError> {
        self.apply(move |t| t.set_refresh_mode(mode)).await
    }

    /// Change the refresh period. A running auto refresh restarts with it.
    pub async fn set_refresh_interval(&self, secs: u64) -> Result<(), CoreError> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(Command::SetRefreshInterval { secs, reply })?;
        rx.await?
    }

    // ── Refresh ─────────────────────────────────────────────────────

    /// Fetch now and wait for the result to be applied.
    pub async fn refresh_now(&self) -> Result<RefreshReport, CoreError> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(Command::RefreshNow(reply))?;
        rx.await?
    }

    pub async fn start_auto_refresh(&self) -> Result<(), CoreError> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(Command::StartAutoRefresh(reply))?;
        Ok(rx.await?)
    }

    pub async fn stop_auto_refresh(&self) -> Result<(), CoreError> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(Command::StopAutoRefresh(reply))?;
        Ok(rx.await?)
    }

    pub async fn auto_refresh_state(&self) -> Result<SchedulerState, CoreError> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(Command::AutoRefreshState(reply))?;
        Ok(rx.await?)
    }

    // ── Internal ────────────────────────────────────────────────────

    async fn apply<R, F>(&self, f: F) -> Result<R, CoreError>
    where
        R: Send + 'static,
        F: FnOnce(&mut PortfolioTracker) -> R + Send + 'static,
    {
        let (reply, rx) = oneshot::channel();
        let job: Job = Box::new(move |tracker| {
            let _ = reply.send(f(tracker));
        });
        self.tx.send(Command::Apply(job))?;
        Ok(rx.await?)
    }
}

struct TrackerActor {
    tracker: PortfolioTracker,
    source: Arc<dyn CoinSource>,
    scheduler: RefreshScheduler,
    self_tx: mpsc::WeakUnboundedSender<Command>,
    publisher: watch::Sender<Arc<Portfolio>>,
    published_revision: u64,
    tick_fetch_in_flight: bool,
}

impl TrackerActor {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        debug!("tracker task started");
        while let Some(command) = commands.recv().await {
            self.handle(command);
            self.publish();
        }
        self.scheduler.stop();
        debug!("tracker task finished");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Apply(job) => job(&mut self.tracker),
            Command::StartAutoRefresh(reply) => {
                self.scheduler.start();
                let _ = reply.send(());
            }
            Command::StopAutoRefresh(reply) => {
                self.scheduler.stop();
                let _ = reply.send(());
            }
            Command::AutoRefreshState(reply) => {
                let _ = reply.send(self.scheduler.state());
            }
            Command::SetRefreshInterval { secs, reply } => {
                let result = self.tracker.set_refresh_interval(secs);
                if result.is_ok() {
                    self.scheduler
                        .set_period(self.tracker.settings().refresh_interval());
                }
                let _ = reply.send(result);
            }
            Command::RefreshNow(reply) => self.spawn_fetch(Some(reply)),
            Command::Tick => {
                if !self.scheduler.is_running() {
                    debug!("tick after stop, ignoring");
                } else if self.tick_fetch_in_flight {
                    debug!("previous refresh still running, skipping tick");
                } else {
                    self.tick_fetch_in_flight = true;
                    self.spawn_fetch(None);
                }
            }
            Command::FetchCompleted { result, reply } => {
                if reply.is_none() {
                    self.tick_fetch_in_flight = false;
                }
                let outcome = result.and_then(|snapshot| self.tracker.apply_market_snapshot(snapshot));
                match &outcome {
                    Ok(report) => info!(
                        updated = report.updated,
                        added = report.added,
                        removed = report.removed,
                        "market refresh applied"
                    ),
                    // Keep state and schedule as they are; the next tick retries.
                    Err(e) => warn!(error = %e, "market refresh failed, keeping current state"),
                }
                if let Some(reply) = reply {
                    let _ = reply.send(outcome);
                }
            }
        }
    }

    /// Fetch off the owning task, then post the result back to it.
    fn spawn_fetch(&mut self, reply: Option<RefreshReply>) {
        let Some(tx) = self.self_tx.upgrade() else {
            self.tick_fetch_in_flight = false;
            return;
        };
        let source = Arc::clone(&self.source);
        tokio::spawn(async move {
            debug!(source = source.name(), "fetching market data");
            let result = source.fetch().await;
            let _ = tx.send(Command::FetchCompleted { result, reply });
        });
    }

    fn publish(&mut self) {
        let revision = self.tracker.revision();
        if revision != self.published_revision {
            self.published_revision = revision;
            self.publisher
                .send_replace(Arc::new(self.tracker.portfolio().clone()));
        }
    }
}
