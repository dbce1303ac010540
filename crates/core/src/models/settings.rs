use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::CoreError;

/// Default period between automatic refreshes, in seconds.
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 60;

/// How a refresh treats coins the source no longer reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefreshMode {
    /// Update what the source reports, keep everything else
    #[default]
    Merge,
    /// Drop catalog coins absent from the fetch
    Replace,
}

impl std::fmt::Display for RefreshMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefreshMode::Merge => write!(f, "Merge"),
            RefreshMode::Replace => write!(f, "Replace"),
        }
    }
}

/// User-configurable settings, stored inside the portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Seconds between automatic refreshes.
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,

    #[serde(default)]
    pub refresh_mode: RefreshMode,

    /// Copy refreshed coin prices onto holdings with the same symbol.
    #[serde(default = "default_true")]
    pub reprice_holdings: bool,
}

fn default_refresh_interval_secs() -> u64 {
    DEFAULT_REFRESH_INTERVAL_SECS
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            refresh_mode: RefreshMode::Merge,
            reprice_holdings: true,
        }
    }
}

impl Settings {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    /// Reject a zero interval; a periodic trigger needs a positive period.
    pub fn validate_interval(secs: u64) -> Result<(), CoreError> {
        if secs == 0 {
            return Err(CoreError::ValidationError(
                "Refresh interval must be at least 1 second".into(),
            ));
        }
        Ok(())
    }
}
