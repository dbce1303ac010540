use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::errors::CoreError;

use super::coin::CoinRecord;

/// Ordered, identity-unique collection of tracked coins.
///
/// The storage order doubles as the favorites order: the watchlist is the
/// subsequence of records with `is_favorite` set, read in storage order.
/// Mutations that move records must keep each partition's relative order
/// intact, so all of them go through the methods here or through
/// `FavoritesService`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    coins: Vec<CoinRecord>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from seed data. Fails on a repeated id.
    pub fn from_coins(coins: Vec<CoinRecord>) -> Result<Self, CoreError> {
        let mut catalog = Self { coins };
        catalog.validate()?;
        catalog.normalize_symbols();
        Ok(catalog)
    }

    /// Check identity uniqueness (used after deserializing foreign data).
    pub fn validate(&self) -> Result<(), CoreError> {
        let mut seen = HashSet::with_capacity(self.coins.len());
        for coin in &self.coins {
            if !seen.insert(coin.id.as_str()) {
                return Err(CoreError::DuplicateCoin(coin.id.clone()));
            }
        }
        Ok(())
    }

    pub fn coins(&self) -> &[CoinRecord] {
        &self.coins
    }

    pub fn len(&self) -> usize {
        self.coins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coins.is_empty()
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.coins.iter().position(|c| c.id == id)
    }

    pub fn get(&self, id: &str) -> Option<&CoinRecord> {
        self.coins.iter().find(|c| c.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut CoinRecord> {
        self.coins.iter_mut().find(|c| c.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    /// Append a coin to the end of storage. A favorite lands last in the
    /// watchlist; existing records never move.
    pub fn add(&mut self, coin: CoinRecord) -> Result<(), CoreError> {
        if self.contains(&coin.id) {
            return Err(CoreError::DuplicateCoin(coin.id));
        }
        let mut coin = coin;
        coin.symbol = coin.symbol.to_uppercase();
        self.coins.push(coin);
        Ok(())
    }

    /// Remove a coin by id. Returns `None` when absent.
    pub fn remove(&mut self, id: &str) -> Option<CoinRecord> {
        let idx = self.position(id)?;
        Some(self.coins.remove(idx))
    }

    /// Keep only coins matching the predicate; survivors keep their order.
    pub fn retain(&mut self, keep: impl FnMut(&CoinRecord) -> bool) -> usize {
        let before = self.coins.len();
        self.coins.retain(keep);
        before - self.coins.len()
    }

    /// Upper-case every stored symbol. Records built elsewhere (deserialized
    /// or hand-assembled) may carry them in any case.
    pub(crate) fn normalize_symbols(&mut self) {
        for coin in &mut self.coins {
            coin.symbol = coin.symbol.to_uppercase();
        }
    }

    /// Flip the favorite flag of `id`. Returns its position and new flag.
    pub(crate) fn flip_favorite(&mut self, id: &str) -> Option<(usize, bool)> {
        let (idx, coin) = self.coins.iter_mut().enumerate().find(|(_, c)| c.id == id)?;
        coin.is_favorite = !coin.is_favorite;
        Some((idx, coin.is_favorite))
    }

    /// Move the record at `idx` to the end of storage.
    pub(crate) fn move_to_end(&mut self, idx: usize) {
        let coin = self.coins.remove(idx);
        self.coins.push(coin);
    }

    /// Split storage into (non-favorites, favorites), each in stored order.
    pub(crate) fn take_partitions(&mut self) -> (Vec<CoinRecord>, Vec<CoinRecord>) {
        std::mem::take(&mut self.coins)
            .into_iter()
            .partition(|c| !c.is_favorite)
    }

    /// Rebuild storage as non-favorites followed by favorites.
    pub(crate) fn merge(&mut self, non_favorites: Vec<CoinRecord>, favorites: Vec<CoinRecord>) {
        let mut coins = non_favorites;
        coins.extend(favorites);
        self.coins = coins;
    }

    /// Case-insensitive match against symbol and name.
    pub fn search(&self, query: &str) -> Vec<&CoinRecord> {
        let q = query.to_lowercase();
        self.coins
            .iter()
            .filter(|c| c.symbol.to_lowercase().contains(&q) || c.name.to_lowercase().contains(&q))
            .collect()
    }
}
