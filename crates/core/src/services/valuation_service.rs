use crate::models::analytics::{HoldingMetrics, PortfolioSummary};
use crate::models::ledger::Ledger;

/// Computes portfolio valuation from the ledger.
///
/// Every figure is a fold over the current holdings, recomputed on each
/// call. Nothing is cached, so there is nothing to go stale.
pub struct ValuationService;

impl ValuationService {
    pub fn new() -> Self {
        Self
    }

    /// Σ quantity × current price.
    pub fn total_value(&self, ledger: &Ledger) -> f64 {
        ledger.holdings.iter().map(|h| h.value()).sum()
    }

    /// Σ cost basis.
    pub fn total_cost_basis(&self, ledger: &Ledger) -> f64 {
        ledger.holdings.iter().map(|h| h.cost_basis).sum()
    }

    pub fn total_profit_loss(&self, ledger: &Ledger) -> f64 {
        self.total_value(ledger) - self.total_cost_basis(ledger)
    }

    /// Per-holding value, profit/loss and allocation, in ledger order.
    pub fn holding_metrics(&self, ledger: &Ledger) -> Vec<HoldingMetrics> {
        let total = self.total_value(ledger);
        ledger
            .holdings
            .iter()
            .map(|h| {
                let value = h.value();
                HoldingMetrics {
                    holding_id: h.id,
                    symbol: h.symbol.clone(),
                    value,
                    profit_loss: h.profit_loss(),
                    profit_loss_pct: h.profit_loss_pct(),
                    allocation_pct: if total > 0.0 { value / total * 100.0 } else { 0.0 },
                }
            })
            .collect()
    }

    /// Full summary: totals, overall return, value-weighted daily change and
    /// the per-holding breakdown.
    pub fn summary(&self, ledger: &Ledger) -> PortfolioSummary {
        let total_value = self.total_value(ledger);
        let total_cost_basis = self.total_cost_basis(ledger);
        let total_profit_loss = total_value - total_cost_basis;

        let total_profit_loss_pct = if total_cost_basis > 0.0 {
            total_profit_loss / total_cost_basis * 100.0
        } else {
            0.0
        };

        let weighted_change_24h_pct = if total_value > 0.0 {
            ledger
                .holdings
                .iter()
                .map(|h| h.value() * h.change_24h_pct)
                .sum::<f64>()
                / total_value
        } else {
            0.0
        };

        PortfolioSummary {
            holding_count: ledger.holdings.len(),
            total_value,
            total_cost_basis,
            total_profit_loss,
            total_profit_loss_pct,
            weighted_change_24h_pct,
            holdings: self.holding_metrics(ledger),
        }
    }
}

impl Default for ValuationService {
    fn default() -> Self {
        Self::new()
    }
}
