use serde::{Deserialize, Serialize};

/// A tracked coin with its live market fields.
///
/// `id` is the stable identity (e.g., "bitcoin") and never changes after
/// creation. Everything else is refreshed in place from market data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoinRecord {
    /// Stable identifier (e.g., "bitcoin", "ethereum")
    pub id: String,

    /// Ticker symbol, uppercased (e.g., "BTC", "ETH")
    pub symbol: String,

    /// Human-readable name (e.g., "Bitcoin")
    pub name: String,

    /// Latest price, finite and non-negative
    pub price: f64,

    /// Percent change over the last 24 hours
    #[serde(default)]
    pub change_24h_pct: f64,

    /// Optional icon reference (URL or asset name), rendered by the frontend
    #[serde(default)]
    pub icon: Option<String>,

    /// Whether the coin is on the watchlist
    #[serde(default)]
    pub is_favorite: bool,
}

impl CoinRecord {
    pub fn new(
        id: impl Into<String>,
        symbol: impl Into<String>,
        name: impl Into<String>,
        price: f64,
    ) -> Self {
        Self {
            id: id.into(),
            symbol: symbol.into().to_uppercase(),
            name: name.into(),
            price,
            change_24h_pct: 0.0,
            icon: None,
            is_favorite: false,
        }
    }

    pub fn with_change(mut self, change_24h_pct: f64) -> Self {
        self.change_24h_pct = change_24h_pct;
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn favorite(mut self, is_favorite: bool) -> Self {
        self.is_favorite = is_favorite;
        self
    }

    /// A price is usable when it is finite and not negative.
    pub fn has_valid_price(&self) -> bool {
        self.price.is_finite() && self.price >= 0.0
    }

    /// Copy market fields from a fresher record of the same coin.
    /// The favorite flag is left alone. Returns whether anything differed.
    pub fn update_market_fields(&mut self, fresh: &CoinRecord) -> bool {
        let symbol = fresh.symbol.to_uppercase();
        let icon = fresh.icon.clone().or_else(|| self.icon.clone());
        let changed = self.symbol != symbol
            || self.name != fresh.name
            || self.price != fresh.price
            || self.change_24h_pct != fresh.change_24h_pct
            || self.icon != icon;

        self.symbol = symbol;
        self.name = fresh.name.clone();
        self.price = fresh.price;
        self.change_24h_pct = fresh.change_24h_pct;
        self.icon = icon;
        changed
    }
}
