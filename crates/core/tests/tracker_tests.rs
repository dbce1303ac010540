// ═══════════════════════════════════════════════════════════════════
// Tracker Tests — PortfolioTracker facade and the TrackerHandle
// single-writer task (commands, snapshots, refresh cycle)
// ═══════════════════════════════════════════════════════════════════

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;

use coinfolio_core::errors::CoreError;
use coinfolio_core::models::coin::CoinRecord;
use coinfolio_core::models::holding::NewHolding;
use coinfolio_core::models::market::MarketSnapshot;
use coinfolio_core::models::portfolio::Portfolio;
use coinfolio_core::models::settings::RefreshMode;
use coinfolio_core::models::transaction::{Transaction, TransactionKind};
use coinfolio_core::providers::registry::SourceRegistry;
use coinfolio_core::providers::static_source::StaticSource;
use coinfolio_core::providers::traits::CoinSource;
use coinfolio_core::scheduler::clock::ManualClock;
use coinfolio_core::scheduler::SchedulerState;
use coinfolio_core::{PortfolioTracker, TrackerHandle};

// ═══════════════════════════════════════════════════════════════════
// Test sources
// ═══════════════════════════════════════════════════════════════════

/// Always fails, counting attempts.
struct FailingSource {
    calls: AtomicUsize,
}

impl FailingSource {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl CoinSource for FailingSource {
    fn name(&self) -> &str {
        "failing"
    }

    async fn fetch(&self) -> Result<MarketSnapshot, CoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(CoreError::Source {
            source_name: "failing".into(),
            message: "exchange unreachable".into(),
        })
    }
}

/// Blocks inside `fetch` until released, so a test can act mid-fetch.
struct GatedSource {
    coins: Vec<CoinRecord>,
    started: Notify,
    release: Notify,
}

#[async_trait]
impl CoinSource for GatedSource {
    fn name(&self) -> &str {
        "gated"
    }

    async fn fetch(&self) -> Result<MarketSnapshot, CoreError> {
        self.started.notify_one();
        self.release.notified().await;
        Ok(MarketSnapshot::new(self.coins.clone()))
    }
}

fn coin(id: &str, symbol: &str, price: f64) -> CoinRecord {
    CoinRecord::new(id, symbol, id, price)
}

fn seed() -> Vec<CoinRecord> {
    vec![
        coin("bitcoin", "BTC", 35000.0),
        coin("ethereum", "ETH", 1800.0).favorite(true),
        coin("solana", "SOL", 20.0),
    ]
}

fn ids(coins: &[CoinRecord]) -> Vec<String> {
    coins.iter().map(|c| c.id.clone()).collect()
}

fn spawn_with(source: Arc<dyn CoinSource>, clock: &ManualClock) -> TrackerHandle {
    let tracker = PortfolioTracker::from_catalog(seed()).unwrap();
    TrackerHandle::spawn(tracker, source, Arc::new(clock.clone()))
}

/// Wait (bounded) until a published snapshot satisfies `pred`.
async fn wait_for(handle: &TrackerHandle, pred: impl Fn(&Portfolio) -> bool) -> Arc<Portfolio> {
    let mut rx = handle.subscribe();
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            let current = rx.borrow_and_update().clone();
            if pred(&current) {
                return current;
            }
            rx.changed().await.expect("tracker task ended");
        }
    })
    .await
    .expect("timed out waiting for snapshot")
}

async fn wait_until(cond: impl Fn() -> bool) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("timed out waiting for condition");
}

// ═══════════════════════════════════════════════════════════════════
// PortfolioTracker facade
// ═══════════════════════════════════════════════════════════════════

mod facade {
    use super::*;

    #[test]
    fn create_new_is_empty() {
        let tracker = PortfolioTracker::create_new();
        assert!(tracker.catalog().is_empty());
        assert!(tracker.holdings().is_empty());
        assert_eq!(tracker.total_value(), 0.0);
        assert_eq!(tracker.revision(), 0);
    }

    #[test]
    fn from_catalog_rejects_duplicates() {
        let result = PortfolioTracker::from_catalog(vec![coin("a", "A", 1.0), coin("a", "A", 1.0)]);
        assert!(matches!(result, Err(CoreError::DuplicateCoin(_))));
    }

    #[test]
    fn watchlist_scenario() {
        let mut tracker = PortfolioTracker::from_catalog(seed()).unwrap();
        assert!(tracker.toggle_favorite("bitcoin"));

        let favorites: Vec<&str> = tracker.favorites().iter().map(|c| c.id.as_str()).collect();
        let rest: Vec<&str> = tracker.non_favorites().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(favorites, vec!["ethereum", "bitcoin"]);
        assert_eq!(rest, vec!["solana"]);
    }

    #[test]
    fn revision_only_moves_on_change() {
        let mut tracker = PortfolioTracker::from_catalog(seed()).unwrap();
        assert!(!tracker.toggle_favorite("missing"));
        assert!(!tracker.remove_from_watchlist("bitcoin"));
        assert_eq!(tracker.revision(), 0);

        tracker.toggle_favorite("bitcoin");
        assert_eq!(tracker.revision(), 1);
        assert!(tracker.reorder_favorites(&[9], 0).is_err());
        assert_eq!(tracker.revision(), 1);
    }

    #[test]
    fn add_and_remove_coin() {
        let mut tracker = PortfolioTracker::from_catalog(seed()).unwrap();
        tracker.add_coin(coin("dogecoin", "DOGE", 0.1)).unwrap();
        assert_eq!(tracker.catalog().len(), 4);
        assert!(matches!(
            tracker.add_coin(coin("dogecoin", "DOGE", 0.1)),
            Err(CoreError::DuplicateCoin(_))
        ));
        assert!(matches!(
            tracker.add_coin(coin("bad", "BAD", -1.0)),
            Err(CoreError::ValidationError(_))
        ));
        assert_eq!(tracker.remove_coin("dogecoin").unwrap().symbol, "DOGE");
        assert!(tracker.remove_coin("dogecoin").is_none());
    }

    #[test]
    fn update_coin_quote() {
        let mut tracker = PortfolioTracker::from_catalog(seed()).unwrap();
        tracker.update_coin_quote("bitcoin", 40000.0, 2.0).unwrap();
        assert_eq!(tracker.coin("bitcoin").unwrap().price, 40000.0);

        assert!(matches!(
            tracker.update_coin_quote("missing", 1.0, 0.0),
            Err(CoreError::NotFound(id)) if id == "missing"
        ));
        assert!(matches!(
            tracker.update_coin_quote("bitcoin", f64::NAN, 0.0),
            Err(CoreError::ValidationError(_))
        ));
    }

    #[test]
    fn holdings_and_valuation() {
        let mut tracker = PortfolioTracker::create_new();
        tracker
            .add_holding(NewHolding::new("Bitcoin", "BTC", 1.0, 35000.0, 30000.0))
            .unwrap();
        let eth = tracker
            .add_holding(NewHolding::new("Ethereum", "ETH", 10.0, 1800.0, 20000.0))
            .unwrap();

        assert_eq!(tracker.total_value(), 53000.0);
        assert_eq!(tracker.total_cost_basis(), 50000.0);
        assert_eq!(tracker.total_profit_loss(), 3000.0);
        assert_eq!(tracker.holding_metrics().len(), 2);
        assert_eq!(tracker.summary().total_value, 53000.0);

        assert!(tracker.toggle_holding_favorite(eth));
        assert_eq!(tracker.favorite_holdings().len(), 1);
        assert!(tracker.holding(eth).unwrap().is_favorite);

        assert_eq!(tracker.remove_holdings(&[0, 1]).unwrap(), 2);
        assert_eq!(tracker.total_value(), 0.0);
    }

    #[test]
    fn transactions() {
        let mut tracker = PortfolioTracker::create_new();
        let manual = Transaction::manual("bitcoin", TransactionKind::Buy, 1.0, 100.0);
        let system = Transaction::system("bitcoin", TransactionKind::Buy, 1.0, 100.0);
        tracker.record_transaction(manual.clone());
        tracker.record_transaction(system.clone());

        assert_eq!(tracker.transactions_for_coin("bitcoin").len(), 2);
        assert!(!tracker.delete_manual_transaction(&system));
        assert!(tracker.delete_manual_transaction(&manual));
        assert_eq!(tracker.transactions(), &[system]);
    }

    #[test]
    fn settings_validation() {
        let mut tracker = PortfolioTracker::create_new();
        assert!(tracker.set_refresh_interval(0).is_err());
        tracker.set_refresh_interval(30).unwrap();
        tracker.set_refresh_mode(RefreshMode::Replace);
        tracker.set_reprice_holdings(false);
        assert_eq!(tracker.settings().refresh_interval_secs, 30);
        assert_eq!(tracker.settings().refresh_mode, RefreshMode::Replace);
        assert!(!tracker.settings().reprice_holdings);
    }

    #[test]
    fn json_roundtrip() {
        let mut tracker = PortfolioTracker::from_catalog(seed()).unwrap();
        tracker.toggle_favorite("solana");
        tracker
            .add_holding(NewHolding::new("Bitcoin", "BTC", 1.0, 35000.0, 30000.0))
            .unwrap();

        let json = tracker.to_json().unwrap();
        let restored = PortfolioTracker::from_json(&json).unwrap();

        assert_eq!(restored.portfolio(), tracker.portfolio());
    }

    #[test]
    fn from_json_rejects_garbage_and_duplicates() {
        assert!(matches!(
            PortfolioTracker::from_json("not json"),
            Err(CoreError::Deserialization(_))
        ));
        let dup = r#"{"catalog":[
            {"id":"a","symbol":"A","name":"A","price":1.0},
            {"id":"a","symbol":"A","name":"A","price":2.0}
        ],"ledger":{"holdings":[]}}"#;
        assert!(matches!(
            PortfolioTracker::from_json(dup),
            Err(CoreError::DuplicateCoin(_))
        ));
    }

    /// Export a tracker holding one position, then edit its JSON.
    fn exported_holding_json() -> serde_json::Value {
        let mut tracker = PortfolioTracker::create_new();
        tracker
            .add_holding(NewHolding::new("Bitcoin", "BTC", 1.0, 35000.0, 30000.0))
            .unwrap();
        serde_json::from_str(&tracker.to_json().unwrap()).unwrap()
    }

    #[test]
    fn from_json_rejects_repeated_holding_ids() {
        let mut json = exported_holding_json();
        let holdings = json["ledger"]["holdings"].as_array_mut().unwrap();
        let copy = holdings[0].clone();
        holdings.push(copy);

        let result = PortfolioTracker::from_json(&json.to_string());

        assert!(matches!(result, Err(CoreError::ValidationError(msg)) if msg.contains("Duplicate holding")));
    }

    #[test]
    fn from_json_rejects_invalid_holding_amounts() {
        for (field, value) in [
            ("quantity", serde_json::json!(-1.0)),
            ("current_price", serde_json::json!(-0.5)),
            ("cost_basis", serde_json::json!(-2.0)),
        ] {
            let mut json = exported_holding_json();
            json["ledger"]["holdings"][0][field] = value;
            assert!(
                matches!(
                    PortfolioTracker::from_json(&json.to_string()),
                    Err(CoreError::ValidationError(_))
                ),
                "{field} should be rejected"
            );
        }
    }

    #[test]
    fn from_json_upper_cases_catalog_symbols() {
        let json = r#"{"catalog":[{"id":"dogecoin","symbol":"doge","name":"Dogecoin","price":0.1}],
            "ledger":{"holdings":[]}}"#;
        let tracker = PortfolioTracker::from_json(json).unwrap();
        assert_eq!(tracker.coin("dogecoin").unwrap().symbol, "DOGE");
    }

    #[test]
    fn add_coin_upper_cases_symbol() {
        let mut tracker = PortfolioTracker::create_new();
        let mut abc = coin("abc", "ABC", 1.0);
        abc.symbol = "abc".into();

        tracker.add_coin(abc).unwrap();

        assert_eq!(tracker.coin("abc").unwrap().symbol, "ABC");
    }

    #[test]
    fn refresh_upper_cases_new_symbols() {
        let mut tracker = PortfolioTracker::create_new();
        let doge = CoinRecord {
            id: "dogecoin".into(),
            symbol: "doge".into(),
            name: "Dogecoin".into(),
            price: 0.1,
            change_24h_pct: 0.0,
            icon: None,
            is_favorite: false,
        };

        tracker
            .apply_market_snapshot(MarketSnapshot::new(vec![doge]))
            .unwrap();

        assert_eq!(tracker.coin("dogecoin").unwrap().symbol, "DOGE");
    }

    #[test]
    fn refresh_without_changes_keeps_revision() {
        let mut tracker = PortfolioTracker::from_catalog(seed()).unwrap();

        let report = tracker
            .apply_market_snapshot(MarketSnapshot::new(Vec::new()))
            .unwrap();
        assert!(!report.has_changes());
        assert_eq!(tracker.revision(), 0);

        // Same prices as the catalog already holds.
        let report = tracker.apply_market_snapshot(MarketSnapshot::new(seed())).unwrap();
        assert_eq!(report.updated, 0);
        assert_eq!(tracker.revision(), 0);

        tracker
            .apply_market_snapshot(MarketSnapshot::new(vec![coin("bitcoin", "BTC", 1.0)]))
            .unwrap();
        assert_eq!(tracker.revision(), 1);
    }

    #[test]
    fn unchanged_settings_keep_revision() {
        let mut tracker = PortfolioTracker::create_new();
        let settings = tracker.settings().clone();

        tracker.set_refresh_mode(settings.refresh_mode);
        tracker.set_reprice_holdings(settings.reprice_holdings);
        tracker.set_refresh_interval(settings.refresh_interval_secs).unwrap();
        assert_eq!(tracker.revision(), 0);

        tracker.set_reprice_holdings(!settings.reprice_holdings);
        assert_eq!(tracker.revision(), 1);
    }

    #[test]
    fn search_coins() {
        let tracker = PortfolioTracker::from_catalog(seed()).unwrap();
        assert_eq!(tracker.search_coins("eth").len(), 1);
    }

    #[test]
    fn debug_output_is_compact() {
        let tracker = PortfolioTracker::from_catalog(seed()).unwrap();
        let out = format!("{tracker:?}");
        assert!(out.contains("coins: 3"));
    }
}

// ═══════════════════════════════════════════════════════════════════
// TrackerHandle — commands and snapshots
// ═══════════════════════════════════════════════════════════════════

mod handle {
    use super::*;

    fn static_source() -> Arc<StaticSource> {
        Arc::new(StaticSource::new("static", seed()))
    }

    #[tokio::test]
    async fn commands_are_visible_in_snapshots() {
        let clock = ManualClock::new();
        let handle = spawn_with(static_source(), &clock);

        assert!(handle.toggle_favorite("bitcoin").await.unwrap());
        assert_eq!(ids(&handle.favorites()), vec!["ethereum", "bitcoin"]);

        handle.reorder_favorites(vec![1], 0).await.unwrap();
        assert_eq!(ids(&handle.favorites()), vec!["bitcoin", "ethereum"]);

        assert!(handle.remove_from_watchlist("ethereum").await.unwrap());
        assert!(!handle.remove_from_watchlist("ethereum").await.unwrap());
        assert_eq!(ids(&handle.favorites()), vec!["bitcoin"]);
    }

    #[tokio::test]
    async fn errors_are_reported_and_task_keeps_going() {
        let clock = ManualClock::new();
        let handle = spawn_with(static_source(), &clock);
        let before = handle.snapshot();

        let err = handle.reorder_favorites(vec![3], 0).await.unwrap_err();
        assert!(matches!(err, CoreError::IndexOutOfRange { index: 3, len: 1 }));
        assert_eq!(handle.snapshot(), before);

        let err = handle.remove_holdings(vec![0]).await.unwrap_err();
        assert!(matches!(err, CoreError::IndexOutOfRange { index: 0, len: 0 }));

        // Still serving commands.
        assert!(handle.toggle_favorite("solana").await.unwrap());
    }

    #[tokio::test]
    async fn ledger_commands() {
        let clock = ManualClock::new();
        let handle = spawn_with(static_source(), &clock);

        let btc = handle
            .add_holding(NewHolding::new("Bitcoin", "BTC", 1.0, 35000.0, 30000.0))
            .await
            .unwrap();
        handle
            .add_holding(NewHolding::new("Ethereum", "ETH", 10.0, 1800.0, 15000.0))
            .await
            .unwrap();
        assert_eq!(handle.total_value(), 53000.0);

        assert!(handle.toggle_holding_favorite(btc).await.unwrap());
        assert!(handle.remove_holding(btc).await.unwrap());
        assert_eq!(handle.total_value(), 18000.0);
        assert_eq!(handle.remove_holdings(vec![0]).await.unwrap(), 1);
        assert_eq!(handle.total_value(), 0.0);

        let tx = Transaction::manual("bitcoin", TransactionKind::Buy, 1.0, 1.0);
        handle.record_transaction(tx.clone()).await.unwrap();
        assert!(handle.delete_manual_transaction(tx).await.unwrap());
        assert!(handle.snapshot().ledger.transactions.is_empty());
    }

    #[tokio::test]
    async fn catalog_commands() {
        let clock = ManualClock::new();
        let handle = spawn_with(static_source(), &clock);

        handle.add_coin(coin("dogecoin", "DOGE", 0.1).favorite(true)).await.unwrap();
        assert_eq!(ids(&handle.favorites()), vec!["ethereum", "dogecoin"]);
        handle.update_coin_quote("dogecoin", 0.2, 5.0).await.unwrap();
        assert_eq!(
            handle.snapshot().catalog.get("dogecoin").unwrap().price,
            0.2
        );
        assert!(handle.remove_coin("dogecoin").await.unwrap().is_some());
        assert!(handle.remove_coin("dogecoin").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn snapshots_are_immutable_copies() {
        let clock = ManualClock::new();
        let handle = spawn_with(static_source(), &clock);
        let old = handle.snapshot();
        handle.toggle_favorite("bitcoin").await.unwrap();
        assert!(!old.catalog.get("bitcoin").unwrap().is_favorite);
        assert!(handle.snapshot().catalog.get("bitcoin").unwrap().is_favorite);
        assert!(handle.snapshot().revision > old.revision);
    }

    #[tokio::test]
    async fn closed_after_task_ends() {
        let clock = ManualClock::new();
        let handle = spawn_with(static_source(), &clock);
        handle.start_auto_refresh().await.unwrap();
        let snapshot_rx = handle.subscribe();
        drop(handle);
        // The scheduler's weak sender must not keep the task alive.
        let mut rx = snapshot_rx;
        tokio::time::timeout(Duration::from_secs(2), async {
            while rx.changed().await.is_ok() {}
        })
        .await
        .expect("tracker task should stop once all handles are dropped");
    }
}

// ═══════════════════════════════════════════════════════════════════
// TrackerHandle — refresh cycle
// ═══════════════════════════════════════════════════════════════════

mod refresh {
    use super::*;

    #[tokio::test]
    async fn refresh_now_applies_and_preserves_favorites() {
        let source = Arc::new(StaticSource::new("static", seed()));
        let clock = ManualClock::new();
        let handle = spawn_with(source.clone(), &clock);
        handle.toggle_favorite("solana").await.unwrap();

        // Fresh prices, no favorite information at all.
        source.set_coins(vec![
            coin("bitcoin", "BTC", 36000.0),
            coin("ethereum", "ETH", 1900.0),
            coin("solana", "SOL", 25.0),
        ]);
        let report = handle.refresh_now().await.unwrap();

        assert_eq!(report.updated, 3);
        assert_eq!(ids(&handle.favorites()), vec!["ethereum", "solana"]);
        assert_eq!(handle.snapshot().catalog.get("bitcoin").unwrap().price, 36000.0);
    }

    #[tokio::test]
    async fn refresh_reprices_holdings() {
        let source = Arc::new(StaticSource::new("static", seed()));
        let clock = ManualClock::new();
        let handle = spawn_with(source.clone(), &clock);
        handle
            .add_holding(NewHolding::new("Bitcoin", "BTC", 2.0, 30000.0, 50000.0))
            .await
            .unwrap();

        handle.refresh_now().await.unwrap();

        assert_eq!(handle.total_value(), 70000.0);
    }

    #[test_log::test(tokio::test)]
    async fn auto_refresh_fires_on_clock() {
        let source = Arc::new(StaticSource::new("static", seed()));
        let clock = ManualClock::new();
        let handle = spawn_with(source.clone(), &clock);

        handle.start_auto_refresh().await.unwrap();
        assert_eq!(handle.auto_refresh_state().await.unwrap(), SchedulerState::Running);

        source.set_coins(vec![coin("bitcoin", "BTC", 50000.0)]);
        clock.fire();

        let snapshot = wait_for(&handle, |p| {
            p.catalog.get("bitcoin").map(|c| c.price) == Some(50000.0)
        })
        .await;
        assert_eq!(snapshot.catalog.len(), 3);

        handle.stop_auto_refresh().await.unwrap();
        handle.stop_auto_refresh().await.unwrap();
        assert_eq!(handle.auto_refresh_state().await.unwrap(), SchedulerState::Idle);
    }

    #[tokio::test]
    async fn repeated_start_refreshes_once_per_tick() {
        let source = Arc::new(StaticSource::new("static", seed()));
        let clock = ManualClock::new();
        let handle = spawn_with(source.clone(), &clock);

        for _ in 0..3 {
            handle.start_auto_refresh().await.unwrap();
        }
        wait_until(|| clock.live_tickers() == 1).await;

        for round in 1..=3u32 {
            let price = 1000.0 * f64::from(round);
            source.set_coins(vec![coin("bitcoin", "BTC", price)]);
            let revision = handle.snapshot().revision;
            clock.fire();
            let snapshot = wait_for(&handle, |p| p.revision > revision).await;
            assert_eq!(snapshot.revision, revision + 1);
            assert_eq!(snapshot.catalog.get("bitcoin").unwrap().price, price);
        }
    }

    #[test_log::test(tokio::test)]
    async fn failed_refresh_keeps_state_and_keeps_running() {
        let source = FailingSource::new();
        let clock = ManualClock::new();
        let handle = spawn_with(source.clone(), &clock);
        let before = handle.snapshot();

        handle.start_auto_refresh().await.unwrap();
        clock.fire();
        wait_until(|| source.calls.load(Ordering::SeqCst) == 1).await;

        // The failure is applied on the task; a round-trip makes sure it was.
        assert_eq!(handle.auto_refresh_state().await.unwrap(), SchedulerState::Running);
        assert_eq!(handle.snapshot(), before);

        // Retried on the next tick.
        clock.fire();
        wait_until(|| source.calls.load(Ordering::SeqCst) == 2).await;
    }

    #[tokio::test]
    async fn refresh_now_reports_source_failure() {
        let source = FailingSource::new();
        let clock = ManualClock::new();
        let handle = spawn_with(source, &clock);
        let before = handle.snapshot();

        let err = handle.refresh_now().await.unwrap_err();

        assert!(matches!(err, CoreError::Source { .. }));
        assert_eq!(handle.snapshot(), before);
    }

    #[tokio::test]
    async fn empty_registry_reports_no_source() {
        let clock = ManualClock::new();
        let handle = spawn_with(Arc::new(SourceRegistry::new()), &clock);
        assert!(matches!(handle.refresh_now().await, Err(CoreError::NoSource)));
    }

    #[tokio::test]
    async fn registry_falls_back_to_next_source() {
        let registry = SourceRegistry::new()
            .with_source(FailingSource::new())
            .with_source(Arc::new(StaticSource::new(
                "backup",
                vec![coin("bitcoin", "BTC", 42.0)],
            )));
        assert_eq!(registry.source_names(), vec!["failing", "backup"]);

        let clock = ManualClock::new();
        let handle = spawn_with(Arc::new(registry), &clock);
        handle.refresh_now().await.unwrap();
        assert_eq!(handle.snapshot().catalog.get("bitcoin").unwrap().price, 42.0);
    }

    #[tokio::test]
    async fn edit_during_fetch_survives_the_refresh() {
        let source = Arc::new(GatedSource {
            coins: vec![
                coin("bitcoin", "BTC", 36000.0),
                coin("ethereum", "ETH", 1900.0),
                coin("solana", "SOL", 21.0),
            ],
            started: Notify::new(),
            release: Notify::new(),
        });
        let clock = ManualClock::new();
        let handle = spawn_with(source.clone(), &clock);

        let refresher = handle.clone();
        let pending = tokio::spawn(async move { refresher.refresh_now().await });
        source.started.notified().await;

        // The writer task is free while the fetch is in flight.
        handle.toggle_favorite("bitcoin").await.unwrap();
        handle.remove_from_watchlist("ethereum").await.unwrap();

        source.release.notify_one();
        pending.await.unwrap().unwrap();

        let snapshot = handle.snapshot();
        assert_eq!(ids(&handle.favorites()), vec!["bitcoin"]);
        assert_eq!(snapshot.catalog.get("bitcoin").unwrap().price, 36000.0);
        assert!(!snapshot.catalog.get("ethereum").unwrap().is_favorite);
    }

    #[tokio::test]
    async fn set_refresh_interval_updates_settings() {
        let clock = ManualClock::new();
        let handle = spawn_with(Arc::new(StaticSource::new("static", seed())), &clock);
        handle.start_auto_refresh().await.unwrap();

        assert!(matches!(
            handle.set_refresh_interval(0).await,
            Err(CoreError::ValidationError(_))
        ));
        handle.set_refresh_interval(15).await.unwrap();

        assert_eq!(handle.settings().refresh_interval_secs, 15);
        assert_eq!(handle.auto_refresh_state().await.unwrap(), SchedulerState::Running);
        wait_until(|| clock.live_tickers() == 1).await;
    }

    #[tokio::test]
    async fn replace_mode_through_handle() {
        let source = Arc::new(StaticSource::new("static", vec![coin("ethereum", "ETH", 2000.0)]));
        let clock = ManualClock::new();
        let handle = spawn_with(source, &clock);
        handle.set_refresh_mode(RefreshMode::Replace).await.unwrap();

        let report = handle.refresh_now().await.unwrap();

        assert_eq!(report.removed, 2);
        assert_eq!(ids(&handle.favorites()), vec!["ethereum"]);
        assert_eq!(handle.snapshot().catalog.len(), 1);
    }
}
