use std::collections::BTreeSet;

use tracing::debug;
use uuid::Uuid;

use crate::errors::CoreError;
use crate::models::holding::{Holding, NewHolding};
use crate::models::ledger::Ledger;
use crate::models::transaction::Transaction;

/// Manages holdings and the transaction log.
///
/// Pure business logic, no I/O.
pub struct LedgerService;

impl LedgerService {
    pub fn new() -> Self {
        Self
    }

    /// Append a new holding and return its freshly generated id.
    pub fn add_holding(&self, ledger: &mut Ledger, fields: NewHolding) -> Result<Uuid, CoreError> {
        Self::validate_fields(&fields)?;
        let holding = fields.into_holding();
        let id = holding.id;
        debug!(%id, symbol = %holding.symbol, quantity = holding.quantity, "added holding");
        ledger.holdings.push(holding);
        Ok(id)
    }

    /// Remove the holdings at `indices`, resolved against the sequence as it
    /// is before the call. Duplicates collapse. Any out-of-range index
    /// rejects the whole call. Returns the number of holdings removed.
    pub fn remove_holdings(&self, ledger: &mut Ledger, indices: &[usize]) -> Result<usize, CoreError> {
        let len = ledger.holdings.len();
        if let Some(&bad) = indices.iter().find(|&&i| i >= len) {
            return Err(CoreError::IndexOutOfRange { index: bad, len });
        }

        let doomed: BTreeSet<usize> = indices.iter().copied().collect();
        let mut position = 0;
        ledger.holdings.retain(|_| {
            let keep = !doomed.contains(&position);
            position += 1;
            keep
        });

        debug!(removed = doomed.len(), remaining = ledger.holdings.len(), "removed holdings");
        Ok(doomed.len())
    }

    /// Remove a holding by id. Returns `false` if there was none.
    pub fn remove_holding(&self, ledger: &mut Ledger, id: Uuid) -> bool {
        match ledger.holdings.iter().position(|h| h.id == id) {
            Some(idx) => {
                ledger.holdings.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Flip the ledger-local favorite flag. Returns `false` if the id is unknown.
    pub fn toggle_holding_favorite(&self, ledger: &mut Ledger, id: Uuid) -> bool {
        match ledger.holdings.iter_mut().find(|h| h.id == id) {
            Some(holding) => {
                holding.is_favorite = !holding.is_favorite;
                true
            }
            None => false,
        }
    }

    /// Favorite holdings in ledger order.
    pub fn favorite_holdings<'a>(&self, ledger: &'a Ledger) -> Vec<&'a Holding> {
        ledger.holdings.iter().filter(|h| h.is_favorite).collect()
    }

    /// Append a transaction to the log.
    pub fn record_transaction(&self, ledger: &mut Ledger, tx: Transaction) {
        debug!(id = %tx.id, coin = %tx.coin_id, kind = %tx.kind, manual = tx.is_manual, "recorded transaction");
        ledger.transactions.push(tx);
    }

    /// Delete the first manual transaction whose id matches `tx.id`.
    /// System-generated transactions are never touched.
    pub fn delete_manual_transaction(&self, ledger: &mut Ledger, tx: &Transaction) -> bool {
        match ledger
            .transactions
            .iter()
            .position(|t| t.id == tx.id && t.is_manual)
        {
            Some(idx) => {
                ledger.transactions.remove(idx);
                debug!(id = %tx.id, "deleted manual transaction");
                true
            }
            None => false,
        }
    }

    /// Transactions for one coin, in log order.
    pub fn transactions_for_coin<'a>(&self, ledger: &'a Ledger, coin_id: &str) -> Vec<&'a Transaction> {
        ledger
            .transactions
            .iter()
            .filter(|t| t.coin_id == coin_id)
            .collect()
    }

    /// Copy a coin's latest price onto every holding with the same symbol.
    /// Returns how many holdings changed.
    pub fn reprice(&self, ledger: &mut Ledger, symbol: &str, price: f64, change_24h_pct: f64) -> usize {
        let mut updated = 0;
        for holding in ledger
            .holdings
            .iter_mut()
            .filter(|h| h.symbol.eq_ignore_ascii_case(symbol))
        {
            if holding.current_price != price || holding.change_24h_pct != change_24h_pct {
                holding.current_price = price;
                holding.change_24h_pct = change_24h_pct;
                updated += 1;
            }
        }
        updated
    }

    /// Rules:
    /// - quantity, current price and cost basis must be finite and non-negative
    /// - symbol must not be blank
    fn validate_fields(fields: &NewHolding) -> Result<(), CoreError> {
        if fields.symbol.trim().is_empty() {
            return Err(CoreError::ValidationError("Holding symbol must not be empty".into()));
        }
        for (label, value) in [
            ("quantity", fields.quantity),
            ("current price", fields.current_price),
            ("cost basis", fields.cost_basis),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(CoreError::ValidationError(format!(
                    "Holding {label} must be finite and non-negative, got {value}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for LedgerService {
    fn default() -> Self {
        Self::new()
    }
}
