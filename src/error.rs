//! Error type shared by every layer of the record store.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T, E = BlacklistError> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlacklistError {
    /// No record is stored under this id.
    #[error("given record {0} does not exist")]
    NotFound(String),

    /// A batch exceeded the caller-configured or store-imposed ceiling.
    #[error("maximum batch size is {limit} and given batch has {actual} records")]
    BatchTooLarge { limit: usize, actual: usize },

    #[error("the given clientId: {client_id} and productId: {product_id} are already in the record")]
    DuplicateRestriction {
        client_id: String,
        product_id: String,
    },

    #[error("the given clientId: {client_id} and productId: {product_id} are not in the record")]
    RestrictionNotFound {
        client_id: String,
        product_id: String,
    },

    /// A stored item is missing an expected attribute or has the wrong type.
    #[error("malformed item: {0}")]
    MalformedItem(String),

    #[error("unsupported filter operator: {0}")]
    UnsupportedOperator(String),

    /// Transport or throttling failure reported by the underlying store.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Batch writes still had unprocessed items after the last retry.
    #[error("batch operation gave up after {attempts} attempts with {unprocessed} unprocessed items")]
    ExhaustedRetries { attempts: u32, unprocessed: usize },

    #[error("invalid scan cursor: {0}")]
    InvalidCursor(String),

    /// A request could not be turned into a domain value.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("lock poisoned during {0}")]
    LockPoisoned(&'static str),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl BlacklistError {
    pub(crate) fn missing(attribute: &str) -> Self {
        BlacklistError::MalformedItem(format!("missing attribute `{}`", attribute))
    }

    pub(crate) fn mistyped(attribute: &str, expected: &str) -> Self {
        BlacklistError::MalformedItem(format!(
            "attribute `{}` is not of type {}",
            attribute, expected
        ))
    }
}

/// Fails with [`BlacklistError::BatchTooLarge`] when `actual` exceeds `limit`.
pub(crate) fn ensure_within(limit: usize, actual: usize) -> Result<()> {
    if actual > limit {
        return Err(BlacklistError::BatchTooLarge { limit, actual });
    }
    Ok(())
}
