use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Valuation of the whole ledger at the moment it was computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    /// Number of holdings in the ledger
    pub holding_count: usize,

    /// Σ quantity × current price
    pub total_value: f64,

    /// Σ cost basis
    pub total_cost_basis: f64,

    /// total_value - total_cost_basis
    pub total_profit_loss: f64,

    /// (total_profit_loss / total_cost_basis) * 100, 0 without a cost basis
    pub total_profit_loss_pct: f64,

    /// Value-weighted 24h change across holdings
    pub weighted_change_24h_pct: f64,

    /// Per-holding breakdown, in ledger order
    pub holdings: Vec<HoldingMetrics>,
}

/// Derived figures for a single holding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingMetrics {
    pub holding_id: Uuid,

    pub symbol: String,

    /// quantity × current price
    pub value: f64,

    /// value - cost basis
    pub profit_loss: f64,

    pub profit_loss_pct: f64,

    /// This holding's share of the total value, in percent
    pub allocation_pct: f64,
}
