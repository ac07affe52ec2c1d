//! Process-wide configuration, built once at startup and shared read-only.

use std::time::Duration;

use crate::batch::ChunkPolicy;
use crate::error::{BlacklistError, Result};
use crate::store::{RetryPolicy, STORE_BATCH_CEILING};

/// Default table name when none is configured.
pub const DEFAULT_TABLE: &str = "blacklist";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Table holding one item per record.
    pub table: String,
    /// Caller-side batch ceiling, at most [`STORE_BATCH_CEILING`].
    pub batch_size: usize,
    /// How streamed requests are grouped into batches.
    pub chunking: ChunkPolicy,
    pub retry: RetryPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            table: DEFAULT_TABLE.to_string(),
            batch_size: STORE_BATCH_CEILING,
            chunking: ChunkPolicy::default(),
            retry: RetryPolicy::default(),
        }
    }
}

impl Config {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_chunking(mut self, chunking: ChunkPolicy) -> Self {
        self.chunking = chunking;
        self
    }

    pub fn with_retry(mut self, max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        self.retry = RetryPolicy {
            max_attempts,
            base_delay,
            max_delay,
        };
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.table.trim().is_empty() {
            return Err(BlacklistError::Config("table name must not be empty".into()));
        }
        if self.batch_size == 0 || self.batch_size > STORE_BATCH_CEILING {
            return Err(BlacklistError::Config(format!(
                "batch size must be between 1 and {}, got {}",
                STORE_BATCH_CEILING, self.batch_size
            )));
        }
        if self.retry.max_attempts == 0 {
            return Err(BlacklistError::Config(
                "retry attempts must be at least 1".into(),
            ));
        }
        if self.retry.base_delay > self.retry.max_delay {
            return Err(BlacklistError::Config(
                "retry base delay exceeds max delay".into(),
            ));
        }
        Ok(())
    }
}
