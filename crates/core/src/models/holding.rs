use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An owned quantity of a coin, with what was paid for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    /// Unique identifier, generated on insert and never reused
    pub id: Uuid,

    /// Coin display name (e.g., "Bitcoin")
    pub name: String,

    /// Ticker symbol, uppercased
    pub symbol: String,

    /// Amount owned (>= 0)
    pub quantity: f64,

    /// Latest known unit price
    pub current_price: f64,

    /// Total amount paid for the whole position
    pub cost_basis: f64,

    #[serde(default)]
    pub icon: Option<String>,

    /// Ledger-local favorite flag, independent of the catalog's watchlist
    #[serde(default)]
    pub is_favorite: bool,

    #[serde(default)]
    pub change_24h_pct: f64,

    pub purchased_at: DateTime<Utc>,
}

impl Holding {
    /// Current market value: quantity × current price.
    pub fn value(&self) -> f64 {
        self.quantity * self.current_price
    }

    /// Absolute profit or loss against the cost basis.
    pub fn profit_loss(&self) -> f64 {
        self.value() - self.cost_basis
    }

    /// Profit or loss as a percentage of the cost basis (0 when nothing was paid).
    pub fn profit_loss_pct(&self) -> f64 {
        if self.cost_basis > 0.0 {
            self.profit_loss() / self.cost_basis * 100.0
        } else {
            0.0
        }
    }

    /// Average price paid per unit (0 for an empty position).
    pub fn average_cost(&self) -> f64 {
        if self.quantity > 0.0 {
            self.cost_basis / self.quantity
        } else {
            0.0
        }
    }
}

/// Field set for a new holding. Anything not set explicitly takes the
/// ledger defaults: not a favorite, no daily change, no icon, bought now.
#[derive(Debug, Clone, PartialEq)]
pub struct NewHolding {
    pub name: String,
    pub symbol: String,
    pub quantity: f64,
    pub current_price: f64,
    pub cost_basis: f64,
    pub icon: Option<String>,
    pub is_favorite: bool,
    pub change_24h_pct: f64,
    pub purchased_at: Option<DateTime<Utc>>,
}

impl NewHolding {
    pub fn new(
        name: impl Into<String>,
        symbol: impl Into<String>,
        quantity: f64,
        current_price: f64,
        cost_basis: f64,
    ) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            quantity,
            current_price,
            cost_basis,
            icon: None,
            is_favorite: false,
            change_24h_pct: 0.0,
            purchased_at: None,
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn favorite(mut self, is_favorite: bool) -> Self {
        self.is_favorite = is_favorite;
        self
    }

    pub fn with_change(mut self, change_24h_pct: f64) -> Self {
        self.change_24h_pct = change_24h_pct;
        self
    }

    pub fn purchased_at(mut self, at: DateTime<Utc>) -> Self {
        self.purchased_at = Some(at);
        self
    }

    /// Materialize into a `Holding` with a fresh id.
    pub(crate) fn into_holding(self) -> Holding {
        Holding {
            id: Uuid::new_v4(),
            name: self.name,
            symbol: self.symbol.to_uppercase(),
            quantity: self.quantity,
            current_price: self.current_price,
            cost_basis: self.cost_basis,
            icon: self.icon,
            is_favorite: self.is_favorite,
            change_24h_pct: self.change_24h_pct,
            purchased_at: self.purchased_at.unwrap_or_else(Utc::now),
        }
    }
}
