//! Capability traits – the engine's seams to the outside world.

use crate::record::StarterRecord;

/// Result type for capability operations.
pub type CapResult<T> = Result<T, CapError>;

#[derive(Debug, thiserror::Error)]
pub enum CapError {
    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(String),
}

// ---------------------------------------------------------------------------
// Catalog source
// ---------------------------------------------------------------------------

/// Supplies the full record set once per session.
///
/// Where the records come from (a content index, a directory scan, a
/// remote API) is the implementor's business; the engine only sees the
/// resulting list.
pub trait CatalogSource: Send + Sync {
    fn load(&self) -> CapResult<Vec<StarterRecord>>;

    /// Human-readable origin, used in logs and error messages.
    fn describe(&self) -> String;
}
