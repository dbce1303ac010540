use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Direction of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    Buy,
    Sell,
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionKind::Buy => write!(f, "Buy"),
            TransactionKind::Sell => write!(f, "Sell"),
        }
    }
}

/// A single trade in the transaction log.
///
/// `is_manual` separates user-entered rows from ones the system generated.
/// Only manual rows can be deleted by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,

    /// Catalog id of the traded coin
    pub coin_id: String,

    pub kind: TransactionKind,

    pub quantity: f64,

    /// Unit price at the time of the trade
    pub price: f64,

    pub timestamp: DateTime<Utc>,

    pub is_manual: bool,
}

impl Transaction {
    /// A user-entered transaction.
    pub fn manual(coin_id: impl Into<String>, kind: TransactionKind, quantity: f64, price: f64) -> Self {
        Self::build(coin_id.into(), kind, quantity, price, true)
    }

    /// A system-generated transaction (imports, trade execution).
    pub fn system(coin_id: impl Into<String>, kind: TransactionKind, quantity: f64, price: f64) -> Self {
        Self::build(coin_id.into(), kind, quantity, price, false)
    }

    fn build(coin_id: String, kind: TransactionKind, quantity: f64, price: f64, is_manual: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            coin_id,
            kind,
            quantity,
            price,
            timestamp: Utc::now(),
            is_manual,
        }
    }

    /// Gross amount of the trade.
    pub fn total(&self) -> f64 {
        self.quantity * self.price
    }
}
