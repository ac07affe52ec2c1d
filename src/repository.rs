//! Repository - domain operations over a store adapter.
//!
//! `Repository<S, M>` turns the adapter's primitives into the operations
//! callers use: lookups that fail on absence, batches limited by the
//! configured batch size, lazily paged filters, and, for [`Record`], the
//! restriction-level read-modify-write cycle.
//!
//! ## Example
//!
//! ```ignore
//! use blacklist_store::{InMemoryItemStore, Product, Record, Repository, StoreAdapter};
//!
//! let repo: Repository<_, Record> = Repository::new(StoreAdapter::new(InMemoryItemStore::new()), 25);
//! repo.upsert_restriction("r1", "c1", Product::new("p1", "Loans")).await?;
//! let record = repo.get_by_id("r1").await?;
//! ```

use std::collections::HashMap;
use std::marker::PhantomData;

use futures_util::stream::{self, BoxStream, StreamExt, TryStreamExt};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{ensure_within, BlacklistError, Result};
use crate::filter::{compile, BetweenQuery, Filter, Query};
use crate::lock::KeyedLocks;
use crate::model::{Model, Product, Record};
use crate::store::{Cursor, ItemStore, StoreAdapter, STORE_BATCH_CEILING};

/// Lazily fetched filter results.
pub type RecordStream<M> = BoxStream<'static, Result<M>>;

/// One page of filter results plus an opaque token for the next page.
#[derive(Debug, Clone)]
pub struct Page<M> {
    pub records: Vec<M>,
    pub next: Option<String>,
}

/// Typed repository over one model type.
///
/// Clone-cheap when the store is: clones share the store handle and the
/// per-record locks.
pub struct Repository<S, M> {
    adapter: StoreAdapter<S>,
    batch_size: usize,
    locks: KeyedLocks,
    _marker: PhantomData<fn() -> M>,
}

impl<S: Clone, M> Clone for Repository<S, M> {
    fn clone(&self) -> Self {
        Self {
            adapter: self.adapter.clone(),
            batch_size: self.batch_size,
            locks: self.locks.clone(),
            _marker: PhantomData,
        }
    }
}

impl<S, M> Repository<S, M>
where
    S: ItemStore + Clone + 'static,
    M: Model,
{
    /// `batch_size` is capped at the store's ceiling.
    pub fn new(adapter: StoreAdapter<S>, batch_size: usize) -> Self {
        Self {
            adapter,
            batch_size: batch_size.clamp(1, STORE_BATCH_CEILING),
            locks: KeyedLocks::new(),
            _marker: PhantomData,
        }
    }

    pub fn from_config(store: S, config: &Config) -> Self {
        Self::new(
            StoreAdapter::new(store).with_retry(config.retry),
            config.batch_size,
        )
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn adapter(&self) -> &StoreAdapter<S> {
        &self.adapter
    }

    /// Fails with `NotFound` when nothing is stored under `id`.
    pub async fn get_by_id(&self, id: &str) -> Result<M> {
        self.adapter
            .get(id)
            .await?
            .ok_or_else(|| BlacklistError::NotFound(id.to_string()))
    }

    /// Records for `ids`, in request order. Absent ids are skipped and a
    /// repeated id is answered once, at its first position.
    pub async fn get_batch(&self, ids: &[String]) -> Result<Vec<M>> {
        ensure_within(self.batch_size, ids.len())?;
        let found: Vec<M> = self.adapter.get_batch(ids).await?;

        let mut by_key: HashMap<String, M> = found.into_iter().map(|m| (m.key(), m)).collect();
        Ok(ids.iter().filter_map(|id| by_key.remove(id)).collect())
    }

    /// Every record matching the conjunction of `queries` and `between`.
    ///
    /// Nothing is read until the stream is polled; each poll that needs more
    /// data costs exactly one store round trip. Invalid operators fail here,
    /// before any I/O.
    pub fn get_by_filter(
        &self,
        queries: &[Query],
        between: &[BetweenQuery],
    ) -> Result<RecordStream<M>> {
        let filter = self.compile_filter(queries, between)?;
        let adapter = self.adapter.clone();

        // None: exhausted; Some(None): first page; Some(Some(c)): resume at c.
        let pages = stream::try_unfold(Some(None::<Cursor>), move |state| {
            let adapter = adapter.clone();
            let filter = filter.clone();
            async move {
                let Some(cursor) = state else {
                    return Ok::<_, BlacklistError>(None);
                };
                let (records, next) = adapter.scan::<M>(filter.as_ref(), cursor.as_ref()).await?;
                Ok(Some((records, next.map(Some))))
            }
        });

        Ok(pages
            .map_ok(|records| stream::iter(records.into_iter().map(Ok::<M, BlacklistError>)))
            .try_flatten()
            .boxed())
    }

    /// One page of filter results. Pass the previous page's `next` token to
    /// continue; pages may be empty while `next` is still set.
    pub async fn get_page(
        &self,
        queries: &[Query],
        between: &[BetweenQuery],
        token: Option<&str>,
    ) -> Result<Page<M>> {
        let filter = self.compile_filter(queries, between)?;
        let cursor = token.map(Cursor::decode).transpose()?;
        let (records, next) = self.adapter.scan(filter.as_ref(), cursor.as_ref()).await?;
        Ok(Page {
            records,
            next: next.map(|c| c.encode()).transpose()?,
        })
    }

    pub async fn save(&self, model: M) -> Result<M> {
        self.adapter.put(model).await
    }

    /// Fails with `InvalidRequest` when two models share a key.
    pub async fn save_batch(&self, models: Vec<M>) -> Result<Vec<M>> {
        ensure_within(self.batch_size, models.len())?;
        self.adapter.put_batch(models).await
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.adapter.delete(id).await
    }

    pub async fn delete_batch(&self, ids: &[String]) -> Result<()> {
        ensure_within(self.batch_size, ids.len())?;
        self.adapter.delete_batch(ids).await
    }

    fn compile_filter(&self, queries: &[Query], between: &[BetweenQuery]) -> Result<Option<Filter>> {
        let filter = compile(queries, between)?;
        if filter.is_none() {
            warn!("filter has no predicates; scanning the whole table");
        }
        Ok(filter)
    }
}

impl<S> Repository<S, Record>
where
    S: ItemStore + Clone + 'static,
{
    /// Add a restriction to a record, creating the record if needed.
    ///
    /// Serialized per record id within this process. Another process writing
    /// the same record concurrently can still overwrite the change.
    pub async fn upsert_restriction(
        &self,
        record_id: &str,
        client_id: &str,
        product: Product,
    ) -> Result<Record> {
        let _guard = self.locks.acquire(record_id).await?;

        let mut record = match self.adapter.get::<Record>(record_id).await? {
            Some(record) => record,
            None => {
                info!(record_id, "creating record");
                Record::new(record_id)
            }
        };
        debug!(record_id, client_id, product_id = %product.id, "adding restriction");
        record.add_restriction(client_id, product)?;
        self.adapter.put(record).await
    }

    /// Remove a restriction. A record left without restrictions is deleted
    /// rather than stored empty. Returns the record after removal.
    pub async fn remove_restriction(
        &self,
        record_id: &str,
        client_id: &str,
        product_id: &str,
    ) -> Result<Record> {
        let _guard = self.locks.acquire(record_id).await?;

        let mut record = self.get_by_id(record_id).await?;
        debug!(record_id, client_id, product_id, "removing restriction");
        record.remove_restriction(client_id, product_id)?;

        if record.is_empty() {
            info!(record_id, "last restriction removed; deleting record");
            self.adapter.delete(record_id).await?;
            Ok(record)
        } else {
            self.adapter.put(record).await
        }
    }
}
