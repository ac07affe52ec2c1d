use std::collections::HashSet;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, warn};

use super::{Cursor, ItemStore, WriteRequest};
use crate::error::{ensure_within, BlacklistError, Result};
use crate::filter::Filter;
use crate::model::Model;

/// Hard per-request ceiling of batched store operations.
pub const STORE_BATCH_CEILING: usize = 25;

/// How unprocessed batch entries are resubmitted.
///
/// Attempt `n` (counting from the second) waits for an exponentially growing
/// delay, capped at `max_delay`, with jitter in its upper half.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total store calls per batch, including the first.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 8,
            base_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Retry without waiting between attempts.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay before retry number `retry` (1-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(16);
        let cap = self
            .base_delay
            .saturating_mul(1 << exponent)
            .min(self.max_delay);
        let cap_nanos = cap.as_nanos().min(u64::MAX as u128) as u64;
        if cap_nanos == 0 {
            return Duration::ZERO;
        }
        Duration::from_nanos(rand::thread_rng().gen_range(cap_nanos / 2..=cap_nanos))
    }
}

/// Typed access to an [`ItemStore`].
///
/// Absence is never an error here: `get` returns `None` and lets the caller
/// decide. Batched operations are limited to [`STORE_BATCH_CEILING`] entries
/// and resubmit whatever the store leaves unprocessed, under `RetryPolicy`.
#[derive(Clone)]
pub struct StoreAdapter<S> {
    store: S,
    retry: RetryPolicy,
}

impl<S: ItemStore> StoreAdapter<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Access the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    pub async fn get<M: Model>(&self, id: &str) -> Result<Option<M>> {
        debug!(id, "get item");
        self.store
            .get_item(id)
            .await?
            .map(|item| M::from_item(&item))
            .transpose()
    }

    /// Read up to [`STORE_BATCH_CEILING`] items. Absent ids are skipped,
    /// repeated ids are read once and the result is in no particular order.
    pub async fn get_batch<M: Model>(&self, ids: &[String]) -> Result<Vec<M>> {
        ensure_within(STORE_BATCH_CEILING, ids.len())?;
        let mut pending = distinct(ids);
        debug!(count = pending.len(), "batch get items");

        let mut records = Vec::with_capacity(pending.len());
        let mut attempt = 0;
        while !pending.is_empty() {
            attempt += 1;
            if attempt > 1 {
                self.before_retry("batch get", attempt, pending.len()).await?;
            }
            let output = self.store.batch_get_items(&pending).await?;
            for item in &output.items {
                records.push(M::from_item(item)?);
            }
            pending = output.unprocessed;
        }
        Ok(records)
    }

    /// Idempotent upsert.
    pub async fn put<M: Model>(&self, model: M) -> Result<M> {
        debug!(id = %model.key(), "put item");
        self.store.put_item(model.to_item()).await?;
        Ok(model)
    }

    /// Upsert up to [`STORE_BATCH_CEILING`] items. Two models with the same
    /// key in one batch are rejected before any write.
    pub async fn put_batch<M: Model>(&self, models: Vec<M>) -> Result<Vec<M>> {
        ensure_within(STORE_BATCH_CEILING, models.len())?;
        let mut seen = HashSet::with_capacity(models.len());
        if let Some(key) = models.iter().map(|m| m.key()).find(|k| !seen.insert(k.clone())) {
            return Err(BlacklistError::InvalidRequest(format!(
                "duplicate id {} in batch",
                key
            )));
        }
        debug!(count = models.len(), "batch put items");
        let writes = models
            .iter()
            .map(|m| WriteRequest::Put(m.to_item()))
            .collect();
        self.write_with_retry(writes).await?;
        Ok(models)
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        debug!(id, "delete item");
        self.store.delete_item(id).await
    }

    pub async fn delete_batch(&self, ids: &[String]) -> Result<()> {
        ensure_within(STORE_BATCH_CEILING, ids.len())?;
        let writes: Vec<_> = distinct(ids).into_iter().map(WriteRequest::Delete).collect();
        debug!(count = writes.len(), "batch delete items");
        self.write_with_retry(writes).await
    }

    /// One scan page. `filter = None` scans everything.
    pub async fn scan<M: Model>(
        &self,
        filter: Option<&Filter>,
        cursor: Option<&Cursor>,
    ) -> Result<(Vec<M>, Option<Cursor>)> {
        let page = self.store.scan(filter, cursor).await?;
        debug!(
            count = page.items.len(),
            more = page.cursor.is_some(),
            "scan page"
        );
        let records = page
            .items
            .iter()
            .map(M::from_item)
            .collect::<Result<Vec<_>>>()?;
        Ok((records, page.cursor))
    }

    async fn write_with_retry(&self, writes: Vec<WriteRequest>) -> Result<()> {
        if writes.is_empty() {
            return Ok(());
        }
        let mut pending = writes;
        let mut attempt = 0;
        loop {
            attempt += 1;
            if attempt > 1 {
                self.before_retry("batch write", attempt, pending.len()).await?;
            }
            pending = self.store.batch_write(pending).await?;
            if pending.is_empty() {
                return Ok(());
            }
        }
    }

    /// Fails once the attempt budget is spent, otherwise sleeps the backoff.
    async fn before_retry(&self, operation: &str, attempt: u32, unprocessed: usize) -> Result<()> {
        let max_attempts = self.retry.max_attempts.max(1);
        if attempt > max_attempts {
            warn!(operation, attempts = max_attempts, unprocessed, "giving up on unprocessed items");
            return Err(BlacklistError::ExhaustedRetries {
                attempts: max_attempts,
                unprocessed,
            });
        }
        let delay = self.retry.backoff(attempt - 1);
        warn!(operation, attempt, unprocessed, ?delay, "resubmitting unprocessed items");
        tokio::time::sleep(delay).await;
        Ok(())
    }
}

/// `ids` without repeats, first occurrence kept.
fn distinct(ids: &[String]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter().filter(|id| seen.insert(id.as_str())).cloned().collect()
}
