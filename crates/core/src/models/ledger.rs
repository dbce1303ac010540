use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::errors::CoreError;

use super::holding::Holding;
use super::transaction::Transaction;

/// Holdings plus the parallel transaction log. Both keep insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    pub holdings: Vec<Holding>,

    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check holding ids are unique and amounts are finite and non-negative
    /// (used after deserializing foreign data).
    pub fn validate(&self) -> Result<(), CoreError> {
        let mut seen = HashSet::with_capacity(self.holdings.len());
        for holding in &self.holdings {
            if !seen.insert(holding.id) {
                return Err(CoreError::ValidationError(format!(
                    "Duplicate holding id {}",
                    holding.id
                )));
            }
            let amounts = [
                ("quantity", holding.quantity),
                ("price", holding.current_price),
                ("cost basis", holding.cost_basis),
            ];
            if let Some((field, value)) = amounts.iter().find(|(_, v)| !v.is_finite() || *v < 0.0) {
                return Err(CoreError::ValidationError(format!(
                    "Holding {} has invalid {field} {value}",
                    holding.id
                )));
            }
        }
        Ok(())
    }
}
