use std::collections::BTreeSet;

use tracing::debug;

use crate::errors::CoreError;
use crate::models::catalog::Catalog;
use crate::models::coin::CoinRecord;

/// Derives the watchlist from the catalog and writes reorders back.
///
/// The watchlist has no storage of its own: it is the favorite subsequence
/// of the catalog, in catalog order. Pure business logic, no I/O.
pub struct FavoritesService;

impl FavoritesService {
    pub fn new() -> Self {
        Self
    }

    /// All favorites, in their stored relative order.
    pub fn project<'a>(&self, catalog: &'a Catalog) -> Vec<&'a CoinRecord> {
        catalog.coins().iter().filter(|c| c.is_favorite).collect()
    }

    /// All non-favorites, in their stored relative order.
    pub fn non_favorites<'a>(&self, catalog: &'a Catalog) -> Vec<&'a CoinRecord> {
        catalog.coins().iter().filter(|c| !c.is_favorite).collect()
    }

    /// Flip the favorite flag of `id`. Returns `false` if the id is unknown.
    ///
    /// A coin becoming a favorite is moved to the end of storage so it is
    /// last in the watchlist. A coin leaving the watchlist stays where it is.
    pub fn toggle_favorite(&self, catalog: &mut Catalog, id: &str) -> bool {
        let Some((idx, now_favorite)) = catalog.flip_favorite(id) else {
            debug!(coin = id, "toggle_favorite: unknown coin, ignoring");
            return false;
        };

        if now_favorite {
            catalog.move_to_end(idx);
        }
        debug!(coin = id, favorite = now_favorite, "toggled favorite");
        true
    }

    /// Un-favorite `id` if it is on the watchlist. Calling it again is a no-op.
    /// Returns whether anything changed.
    pub fn remove_from_watchlist(&self, catalog: &mut Catalog, id: &str) -> bool {
        match catalog.get(id) {
            Some(coin) if coin.is_favorite => self.toggle_favorite(catalog, id),
            _ => false,
        }
    }

    /// Move the favorites at `source_indices` to just before `destination`,
    /// both counted within the watchlist, then merge back as
    /// non-favorites followed by the reordered favorites.
    ///
    /// Indices refer to the watchlist before the move. Out-of-range input
    /// rejects the whole call and leaves the catalog untouched.
    pub fn reorder_favorites(
        &self,
        catalog: &mut Catalog,
        source_indices: &[usize],
        destination: usize,
    ) -> Result<(), CoreError> {
        let favorite_count = catalog.coins().iter().filter(|c| c.is_favorite).count();

        if let Some(&bad) = source_indices.iter().find(|&&i| i >= favorite_count) {
            return Err(CoreError::IndexOutOfRange {
                index: bad,
                len: favorite_count,
            });
        }
        if destination > favorite_count {
            return Err(CoreError::IndexOutOfRange {
                index: destination,
                len: favorite_count,
            });
        }
        if source_indices.is_empty() {
            return Ok(());
        }

        let (non_favorites, favorites) = catalog.take_partitions();
        let favorites = Self::apply_move(favorites, source_indices, destination);
        catalog.merge(non_favorites, favorites);

        debug!(
            sources = ?source_indices,
            destination,
            "reordered favorites"
        );
        Ok(())
    }

    /// Move semantics of a list "move(fromOffsets:toOffset:)": the moved
    /// block keeps its relative order and lands where `destination` pointed
    /// before the removal.
    fn apply_move<T>(items: Vec<T>, sources: &[usize], destination: usize) -> Vec<T> {
        let sources: BTreeSet<usize> = sources.iter().copied().collect();
        let shift = sources.range(..destination).count();
        let insert_at = destination - shift;

        let mut moved = Vec::with_capacity(sources.len());
        let mut rest = Vec::with_capacity(items.len() - sources.len());
        for (i, item) in items.into_iter().enumerate() {
            if sources.contains(&i) {
                moved.push(item);
            } else {
                rest.push(item);
            }
        }

        let tail = rest.split_off(insert_at);
        rest.extend(moved);
        rest.extend(tail);
        rest
    }
}

impl Default for FavoritesService {
    fn default() -> Self {
        Self::new()
    }
}
