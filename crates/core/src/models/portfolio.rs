use serde::{Deserialize, Serialize};

use super::catalog::Catalog;
use super::coin::CoinRecord;
use super::ledger::Ledger;
use super::settings::Settings;

/// The whole tracked state: coin catalog, holdings ledger and settings.
///
/// Readers receive immutable clones of this (see `TrackerHandle::snapshot`),
/// so the derived views below are computed on the snapshot they are read from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Portfolio {
    pub catalog: Catalog,

    pub ledger: Ledger,

    #[serde(default)]
    pub settings: Settings,

    /// Bumped by every successful mutation.
    #[serde(default)]
    pub revision: u64,
}

impl Portfolio {
    /// The watchlist in its user-controlled order.
    pub fn favorites(&self) -> Vec<&CoinRecord> {
        self.catalog.coins().iter().filter(|c| c.is_favorite).collect()
    }

    /// Sum of quantity × current price over all holdings. Never cached.
    pub fn total_value(&self) -> f64 {
        self.ledger.holdings.iter().map(|h| h.value()).sum()
    }
}
