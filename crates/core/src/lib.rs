pub mod actor;
pub mod errors;
pub mod logging;
pub mod models;
pub mod providers;
pub mod scheduler;
pub mod services;

use models::{
    analytics::{HoldingMetrics, PortfolioSummary},
    catalog::Catalog,
    coin::CoinRecord,
    holding::{Holding, NewHolding},
    market::{MarketSnapshot, RefreshReport},
    portfolio::Portfolio,
    settings::{RefreshMode, Settings},
    transaction::Transaction,
};
use services::{
    favorites_service::FavoritesService, ledger_service::LedgerService,
    refresh_service::RefreshService, valuation_service::ValuationService,
};
use tracing::debug;
use uuid::Uuid;

use errors::CoreError;

pub use actor::TrackerHandle;

/// Main entry point for the coinfolio core library.
/// Holds the portfolio state and all services needed to operate on it.
///
/// Every method here runs synchronously against owned state. For the
/// shared, auto-refreshing variant see [`TrackerHandle`], which owns one
/// of these on a dedicated task.
#[must_use]
pub struct PortfolioTracker {
    portfolio: Portfolio,
    favorites_service: FavoritesService,
    ledger_service: LedgerService,
    valuation_service: ValuationService,
    refresh_service: RefreshService,
}

impl std::fmt::Debug for PortfolioTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortfolioTracker")
            .field("coins", &self.portfolio.catalog.len())
            .field("holdings", &self.portfolio.ledger.holdings.len())
            .field("transactions", &self.portfolio.ledger.transactions.len())
            .field("settings", &self.portfolio.settings)
            .field("revision", &self.portfolio.revision)
            .finish()
    }
}

impl PortfolioTracker {
    /// Create an empty tracker with default settings.
    pub fn create_new() -> Self {
        Self::build(Portfolio::default())
    }

    /// Wrap existing state. Fails if the catalog repeats a coin id, or the
    /// ledger repeats a holding id or carries an invalid amount.
    pub fn from_portfolio(mut portfolio: Portfolio) -> Result<Self, CoreError> {
        portfolio.catalog.validate()?;
        portfolio.ledger.validate()?;
        portfolio.catalog.normalize_symbols();
        Ok(Self::build(portfolio))
    }

    /// Seed a tracker with an initial catalog.
    pub fn from_catalog(coins: Vec<CoinRecord>) -> Result<Self, CoreError> {
        let portfolio = Portfolio {
            catalog: Catalog::from_coins(coins)?,
            ..Portfolio::default()
        };
        Ok(Self::build(portfolio))
    }

    /// Load state from a JSON snapshot produced by [`Self::to_json`].
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let portfolio: Portfolio = serde_json::from_str(json)?;
        Self::from_portfolio(portfolio)
    }

    /// Serialize the full state as pretty JSON.
    pub fn to_json(&self) -> Result<String, CoreError> {
        serde_json::to_string_pretty(&self.portfolio)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize portfolio: {e}")))
    }

    #[must_use]
    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    /// Counter bumped by every mutation that changed something.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.portfolio.revision
    }

    // ── Catalog & Watchlist ─────────────────────────────────────────

    #[must_use]
    pub fn catalog(&self) -> &[CoinRecord] {
        self.portfolio.catalog.coins()
    }

    #[must_use]
    pub fn coin(&self, id: &str) -> Option<&CoinRecord> {
        self.portfolio.catalog.get(id)
    }

    /// The watchlist in its user-controlled order.
    #[must_use]
    pub fn favorites(&self) -> Vec<&CoinRecord> {
        self.favorites_service.project(&self.portfolio.catalog)
    }

    #[must_use]
    pub fn non_favorites(&self) -> Vec<&CoinRecord> {
        self.favorites_service.non_favorites(&self.portfolio.catalog)
    }

    /// Search coins by symbol or name (case-insensitive).
    #[must_use]
    pub fn search_coins(&self, query: &str) -> Vec<&CoinRecord> {
        self.portfolio.catalog.search(query)
    }

    /// Add a coin at the end of the catalog.
    pub fn add_coin(&mut self, coin: CoinRecord) -> Result<(), CoreError> {
        if !coin.has_valid_price() {
            return Err(CoreError::ValidationError(format!(
                "Coin {} has invalid price {}",
                coin.id, coin.price
            )));
        }
        debug!(coin = %coin.id, favorite = coin.is_favorite, "adding coin");
        self.portfolio.catalog.add(coin)?;
        self.touch();
        Ok(())
    }

    /// Remove a coin. Returns the removed record, or `None` if absent.
    pub fn remove_coin(&mut self, id: &str) -> Option<CoinRecord> {
        let removed = self.portfolio.catalog.remove(id);
        if removed.is_some() {
            debug!(coin = id, "removed coin");
            self.touch();
        }
        removed
    }

    /// Manually set a coin's price and daily change.
    pub fn update_coin_quote(
        &mut self,
        id: &str,
        price: f64,
        change_24h_pct: f64,
    ) -> Result<(), CoreError> {
        if !price.is_finite() || price < 0.0 {
            return Err(CoreError::ValidationError(format!(
                "Price must be finite and non-negative, got {price}"
            )));
        }
        let coin = self
            .portfolio
            .catalog
            .get_mut(id)
            .ok_or_else(|| CoreError::NotFound(id.to_string()))?;
        if coin.price == price && coin.change_24h_pct == change_24h_pct {
            return Ok(());
        }
        coin.price = price;
        coin.change_24h_pct = change_24h_pct;
        self.touch();
        Ok(())
    }

    /// Flip a coin's favorite flag. Unknown ids are ignored (`false`).
    pub fn toggle_favorite(&mut self, id: &str) -> bool {
        let changed = self
            .favorites_service
            .toggle_favorite(&mut self.portfolio.catalog, id);
        if changed {
            self.touch();
        }
        changed
    }

    /// Take a coin off the watchlist. Idempotent.
    pub fn remove_from_watchlist(&mut self, id: &str) -> bool {
        let changed = self
            .favorites_service
            .remove_from_watchlist(&mut self.portfolio.catalog, id);
        if changed {
            self.touch();
        }
        changed
    }

    /// Move watchlist entries; indices are positions within the watchlist.
    pub fn reorder_favorites(
        &mut self,
        source_indices: &[usize],
        destination: usize,
    ) -> Result<(), CoreError> {
        self.favorites_service.reorder_favorites(
            &mut self.portfolio.catalog,
            source_indices,
            destination,
        )?;
        if !source_indices.is_empty() {
            self.touch();
        }
        Ok(())
    }

    // ── Holdings ────────────────────────────────────────────────────

    #[must_use]
    pub fn holdings(&self) -> &[Holding] {
        &self.portfolio.ledger.holdings
    }

    #[must_use]
    pub fn holding(&self, id: Uuid) -> Option<&Holding> {
        self.portfolio.ledger.holdings.iter().find(|h| h.id == id)
    }

    #[must_use]
    pub fn favorite_holdings(&self) -> Vec<&Holding> {
        self.ledger_service.favorite_holdings(&self.portfolio.ledger)
    }

    pub fn add_holding(&mut self, fields: NewHolding) -> Result<Uuid, CoreError> {
        let id = self
            .ledger_service
            .add_holding(&mut self.portfolio.ledger, fields)?;
        self.touch();
        Ok(id)
    }

    /// Remove holdings by position (positions as they are before the call).
    pub fn remove_holdings(&mut self, indices: &[usize]) -> Result<usize, CoreError> {
        let removed = self
            .ledger_service
            .remove_holdings(&mut self.portfolio.ledger, indices)?;
        if removed > 0 {
            self.touch();
        }
        Ok(removed)
    }

    pub fn remove_holding(&mut self, id: Uuid) -> bool {
        let removed = self
            .ledger_service
            .remove_holding(&mut self.portfolio.ledger, id);
        if removed {
            self.touch();
        }
        removed
    }

    pub fn toggle_holding_favorite(&mut self, id: Uuid) -> bool {
        let changed = self
            .ledger_service
            .toggle_holding_favorite(&mut self.portfolio.ledger, id);
        if changed {
            self.touch();
        }
        changed
    }

    // ── Transactions ────────────────────────────────────────────────

    #[must_use]
    pub fn transactions(&self) -> &[Transaction] {
        &self.portfolio.ledger.transactions
    }

    #[must_use]
    pub fn transactions_for_coin(&self, coin_id: &str) -> Vec<&Transaction> {
        self.ledger_service
            .transactions_for_coin(&self.portfolio.ledger, coin_id)
    }

    pub fn record_transaction(&mut self, tx: Transaction) {
        self.ledger_service
            .record_transaction(&mut self.portfolio.ledger, tx);
        self.touch();
    }

    /// Delete a user-entered transaction. System-generated ones are kept.
    pub fn delete_manual_transaction(&mut self, tx: &Transaction) -> bool {
        let removed = self
            .ledger_service
            .delete_manual_transaction(&mut self.portfolio.ledger, tx);
        if removed {
            self.touch();
        }
        removed
    }

    // ── Valuation ───────────────────────────────────────────────────

    #[must_use]
    pub fn total_value(&self) -> f64 {
        self.valuation_service.total_value(&self.portfolio.ledger)
    }

    #[must_use]
    pub fn total_cost_basis(&self) -> f64 {
        self.valuation_service.total_cost_basis(&self.portfolio.ledger)
    }

    #[must_use]
    pub fn total_profit_loss(&self) -> f64 {
        self.valuation_service.total_profit_loss(&self.portfolio.ledger)
    }

    #[must_use]
    pub fn holding_metrics(&self) -> Vec<HoldingMetrics> {
        self.valuation_service.holding_metrics(&self.portfolio.ledger)
    }

    #[must_use]
    pub fn summary(&self) -> PortfolioSummary {
        self.valuation_service.summary(&self.portfolio.ledger)
    }

    // ── Refresh ─────────────────────────────────────────────────────

    /// Merge fetched market data into the catalog (and holdings prices),
    /// keeping current favorite flags and order. On error nothing changes.
    pub fn apply_market_snapshot(
        &mut self,
        snapshot: MarketSnapshot,
    ) -> Result<RefreshReport, CoreError> {
        let report = self.refresh_service.apply(&mut self.portfolio, snapshot)?;
        if report.has_changes() {
            self.touch();
        }
        Ok(report)
    }

    // ── Settings ────────────────────────────────────────────────────

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.portfolio.settings
    }

    pub fn set_refresh_interval(&mut self, secs: u64) -> Result<(), CoreError> {
        Settings::validate_interval(secs)?;
        if self.portfolio.settings.refresh_interval_secs != secs {
            self.portfolio.settings.refresh_interval_secs = secs;
            self.touch();
        }
        Ok(())
    }

    pub fn set_refresh_mode(&mut self, mode: RefreshMode) {
        if self.portfolio.settings.refresh_mode != mode {
            self.portfolio.settings.refresh_mode = mode;
            self.touch();
        }
    }

    pub fn set_reprice_holdings(&mut self, enabled: bool) {
        if self.portfolio.settings.reprice_holdings != enabled {
            self.portfolio.settings.reprice_holdings = enabled;
            self.touch();
        }
    }

    // ── Internal ────────────────────────────────────────────────────

    fn touch(&mut self) {
        self.portfolio.revision += 1;
    }

    fn build(portfolio: Portfolio) -> Self {
        Self {
            portfolio,
            favorites_service: FavoritesService::new(),
            ledger_service: LedgerService::new(),
            valuation_service: ValuationService::new(),
            refresh_service: RefreshService::new(),
        }
    }
}

impl Default for PortfolioTracker {
    fn default() -> Self {
        Self::create_new()
    }
}
