use async_trait::async_trait;
use std::sync::RwLock;

use crate::errors::CoreError;
use crate::models::coin::CoinRecord;
use crate::models::market::MarketSnapshot;

use super::traits::CoinSource;

/// Serves a fixed set of coins. Used for catalog seeding, offline mode and
/// tests; `set_coins` swaps the data the next fetch returns.
pub struct StaticSource {
    name: String,
    coins: RwLock<Vec<CoinRecord>>,
}

impl StaticSource {
    pub fn new(name: impl Into<String>, coins: Vec<CoinRecord>) -> Self {
        Self {
            name: name.into(),
            coins: RwLock::new(coins),
        }
    }

    /// Replace what subsequent fetches return.
    pub fn set_coins(&self, coins: Vec<CoinRecord>) {
        let mut guard = self.coins.write().unwrap_or_else(|e| e.into_inner());
        *guard = coins;
    }
}

#[async_trait]
impl CoinSource for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<MarketSnapshot, CoreError> {
        let coins = self
            .coins
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        Ok(MarketSnapshot::new(coins))
    }
}
