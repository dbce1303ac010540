use async_trait::async_trait;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::errors::CoreError;
use crate::models::market::MarketSnapshot;

use super::traits::CoinSource;

/// Ordered list of market data sources with automatic fallback.
///
/// `fetch` tries sources in registration order and returns the first
/// success. If the primary fails (down, rate limited, ...) the next one is
/// tried. The registry is itself a `CoinSource`, so the tracker only ever
/// sees one.
#[derive(Clone, Default)]
pub struct SourceRegistry {
    sources: Vec<Arc<dyn CoinSource>>,
}

impl SourceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source after the existing ones.
    pub fn register(&mut self, source: Arc<dyn CoinSource>) {
        self.sources.push(source);
    }

    pub fn with_source(mut self, source: Arc<dyn CoinSource>) -> Self {
        self.register(source);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Names of all sources, in fallback order.
    pub fn source_names(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.name().to_string()).collect()
    }
}

#[async_trait]
impl CoinSource for SourceRegistry {
    fn name(&self) -> &str {
        "registry"
    }

    async fn fetch(&self) -> Result<MarketSnapshot, CoreError> {
        if self.sources.is_empty() {
            return Err(CoreError::NoSource);
        }

        let mut last_error = None;
        for source in &self.sources {
            match source.fetch().await {
                Ok(snapshot) => {
                    debug!(source = source.name(), coins = snapshot.coins.len(), "fetched market snapshot");
                    return Ok(snapshot);
                }
                Err(e) => {
                    warn!(source = source.name(), error = %e, "source failed, trying next");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(CoreError::NoSource))
    }
}
