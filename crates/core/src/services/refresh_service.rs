use std::collections::HashSet;

use tracing::{debug, warn};

use crate::errors::CoreError;
use crate::models::market::{MarketSnapshot, RefreshReport};
use crate::models::portfolio::Portfolio;
use crate::models::settings::RefreshMode;
use crate::services::ledger_service::LedgerService;

/// Applies fetched market data to the portfolio.
///
/// Known coins are updated in place and keep the favorite flag they have
/// at the moment of the call, so a flag the user changed while the fetch
/// was running survives. Nothing is reordered: records stay where they are
/// and new coins are appended.
pub struct RefreshService {
    ledger_service: LedgerService,
}

impl RefreshService {
    pub fn new() -> Self {
        Self {
            ledger_service: LedgerService::new(),
        }
    }

    pub fn apply(
        &self,
        portfolio: &mut Portfolio,
        snapshot: MarketSnapshot,
    ) -> Result<RefreshReport, CoreError> {
        let mode = portfolio.settings.refresh_mode;
        let mut report = RefreshReport::default();

        // Validate first: drop records with unusable prices or repeated ids.
        // A coin reported with a bad price still counts as reported.
        let reported: HashSet<String> = snapshot.coins.iter().map(|c| c.id.clone()).collect();
        let mut seen = HashSet::with_capacity(snapshot.coins.len());
        let mut fresh = Vec::with_capacity(snapshot.coins.len());
        for coin in snapshot.coins {
            if !coin.has_valid_price() {
                warn!(coin = %coin.id, price = coin.price, "rejecting fetched coin with invalid price");
                report.rejected += 1;
                continue;
            }
            if !seen.insert(coin.id.clone()) {
                warn!(coin = %coin.id, "rejecting repeated coin in fetch");
                report.rejected += 1;
                continue;
            }
            fresh.push(coin);
        }

        // Never replace the catalog with nothing.
        if fresh.is_empty() && mode == RefreshMode::Replace {
            return Err(CoreError::Source {
                source_name: "refresh".into(),
                message: "fetch returned no usable coins; keeping current catalog".into(),
            });
        }

        let catalog = &mut portfolio.catalog;
        if mode == RefreshMode::Replace {
            report.removed = catalog.retain(|c| reported.contains(&c.id));
        }

        for coin in &fresh {
            match catalog.get_mut(&coin.id) {
                Some(existing) => {
                    if existing.update_market_fields(coin) {
                        report.updated += 1;
                    }
                }
                None => {
                    catalog.add(coin.clone())?;
                    report.added += 1;
                }
            }
        }

        if portfolio.settings.reprice_holdings {
            for coin in &fresh {
                report.repriced_holdings += self.ledger_service.reprice(
                    &mut portfolio.ledger,
                    &coin.symbol,
                    coin.price,
                    coin.change_24h_pct,
                );
            }
        }

        debug!(
            updated = report.updated,
            added = report.added,
            removed = report.removed,
            rejected = report.rejected,
            repriced = report.repriced_holdings,
            %mode,
            "applied market snapshot"
        );
        Ok(report)
    }
}

impl Default for RefreshService {
    fn default() -> Self {
        Self::new()
    }
}
