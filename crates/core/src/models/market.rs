use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::coin::CoinRecord;

/// One fetch worth of market data from a `CoinSource`.
///
/// The favorite flags carried here are only trusted for coins the catalog
/// has never seen; known coins keep whatever flag they have at apply time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub coins: Vec<CoinRecord>,
    pub fetched_at: DateTime<Utc>,
}

impl MarketSnapshot {
    pub fn new(coins: Vec<CoinRecord>) -> Self {
        Self {
            coins,
            fetched_at: Utc::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.coins.is_empty()
    }
}

/// What a single refresh changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshReport {
    /// Known coins whose market fields actually changed
    pub updated: usize,
    /// Coins new to the catalog
    pub added: usize,
    /// Coins dropped because the source no longer reports them (Replace mode)
    pub removed: usize,
    /// Fetched records rejected for an invalid price or a repeated id
    pub rejected: usize,
    /// Holdings that received a new price
    pub repriced_holdings: usize,
}

impl RefreshReport {
    /// Whether the refresh changed any stored state.
    pub fn has_changes(&self) -> bool {
        self.updated + self.added + self.removed + self.repriced_holdings > 0
    }
}
