use thiserror::Error;

/// Unified error type for the entire coinfolio-core library.
/// Every public fallible function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Catalog / Ledger ────────────────────────────────────────────
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Index {index} out of range for collection of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Coin already in catalog: {0}")]
    DuplicateCoin(String),

    #[error("Validation failed: {0}")]
    ValidationError(String),

    // ── Market Data Sources ─────────────────────────────────────────
    #[error("Source error ({source_name}): {message}")]
    Source {
        source_name: String,
        message: String,
    },

    #[error("No market data source registered")]
    NoSource,

    // ── Serialization ───────────────────────────────────────────────
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    // ── Runtime ─────────────────────────────────────────────────────
    #[error("Tracker task has shut down")]
    TrackerClosed,
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for CoreError {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        CoreError::TrackerClosed
    }
}

impl From<tokio::sync::oneshot::error::RecvError> for CoreError {
    fn from(_: tokio::sync::oneshot::error::RecvError) -> Self {
        CoreError::TrackerClosed
    }
}
