use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::market::MarketSnapshot;

/// A supplier of fresh coin data for the catalog.
///
/// The refresh cycle only needs "give me the current market"; where that
/// comes from (an exchange API, a local file, a fixture) is up to the
/// implementation. Sources are called off the writer task, so they must be
/// `Send + Sync`.
#[async_trait]
pub trait CoinSource: Send + Sync {
    /// Human-readable name of this source (for logs/errors).
    fn name(&self) -> &str;

    /// Fetch the current market. The returned favorite flags are advisory.
    async fn fetch(&self) -> Result<MarketSnapshot, CoreError>;
}
