//! InMemoryItemStore - BTreeMap-backed item store for testing and development.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use super::{BatchGetOutput, Cursor, ItemStore, ScanPage, WriteRequest};
use crate::error::{BlacklistError, Result};
use crate::filter::Filter;
use crate::item::{item_id, Item};

const DEFAULT_PAGE_SIZE: usize = 100;
const UNLIMITED: usize = usize::MAX;

/// In-memory item store keyed by item id.
///
/// Behaves like a managed store in the two ways the adapter cares about:
/// scans examine at most `page_size` items per call (filtering happens after
/// the page is cut), and batch reads and writes serve at most
/// `read_capacity` / `write_capacity` entries per call, returning the rest as
/// unprocessed. Clone-friendly via Arc.
#[derive(Clone)]
pub struct InMemoryItemStore {
    items: Arc<RwLock<BTreeMap<String, Item>>>,
    page_size: usize,
    read_capacity: Arc<AtomicUsize>,
    write_capacity: Arc<AtomicUsize>,
    batch_reads: Arc<AtomicU64>,
    batch_writes: Arc<AtomicU64>,
}

impl Default for InMemoryItemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryItemStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            items: Arc::new(RwLock::new(BTreeMap::new())),
            page_size: DEFAULT_PAGE_SIZE,
            read_capacity: Arc::new(AtomicUsize::new(UNLIMITED)),
            write_capacity: Arc::new(AtomicUsize::new(UNLIMITED)),
            batch_reads: Arc::new(AtomicU64::new(0)),
            batch_writes: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Number of items a scan examines per page.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Throttle batch reads to at most `capacity` ids per call.
    /// `None` lifts the throttle.
    pub fn set_read_capacity(&self, capacity: Option<usize>) {
        self.read_capacity
            .store(capacity.unwrap_or(UNLIMITED), Ordering::SeqCst);
    }

    pub fn batch_get_calls(&self) -> u64 {
        self.batch_reads.load(Ordering::SeqCst)
    }

    /// Throttle batch writes to at most `capacity` entries per call.
    /// `None` lifts the throttle.
    pub fn set_write_capacity(&self, capacity: Option<usize>) {
        self.write_capacity
            .store(capacity.unwrap_or(UNLIMITED), Ordering::SeqCst);
    }

    /// How many `batch_write` calls the store has served.
    pub fn batch_write_calls(&self) -> u64 {
        self.batch_writes.load(Ordering::SeqCst)
    }

    /// Number of stored items.
    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.read()?.is_empty())
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, BTreeMap<String, Item>>> {
        self.items
            .read()
            .map_err(|_| BlacklistError::LockPoisoned("item store read"))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, BTreeMap<String, Item>>> {
        self.items
            .write()
            .map_err(|_| BlacklistError::LockPoisoned("item store write"))
    }
}

#[async_trait]
impl ItemStore for InMemoryItemStore {
    async fn get_item(&self, id: &str) -> Result<Option<Item>> {
        Ok(self.read()?.get(id).cloned())
    }

    async fn batch_get_items(&self, ids: &[String]) -> Result<BatchGetOutput> {
        self.batch_reads.fetch_add(1, Ordering::SeqCst);

        let capacity = self.read_capacity.load(Ordering::SeqCst);
        let (served, unprocessed) = ids.split_at(capacity.min(ids.len()));

        let items = self.read()?;
        Ok(BatchGetOutput {
            items: served.iter().filter_map(|id| items.get(id).cloned()).collect(),
            unprocessed: unprocessed.to_vec(),
        })
    }

    async fn put_item(&self, item: Item) -> Result<()> {
        let id = item_id(&item)?;
        self.write()?.insert(id, item);
        Ok(())
    }

    async fn delete_item(&self, id: &str) -> Result<()> {
        self.write()?.remove(id);
        Ok(())
    }

    async fn batch_write(&self, mut writes: Vec<WriteRequest>) -> Result<Vec<WriteRequest>> {
        self.batch_writes.fetch_add(1, Ordering::SeqCst);

        let capacity = self.write_capacity.load(Ordering::SeqCst);
        let unprocessed = if writes.len() > capacity {
            writes.split_off(capacity)
        } else {
            Vec::new()
        };

        let mut items = self.write()?;
        for write in writes {
            match write {
                WriteRequest::Put(item) => {
                    let id = item_id(&item)?;
                    items.insert(id, item);
                }
                WriteRequest::Delete(id) => {
                    items.remove(&id);
                }
            }
        }
        Ok(unprocessed)
    }

    async fn scan(&self, filter: Option<&Filter>, cursor: Option<&Cursor>) -> Result<ScanPage> {
        let items = self.read()?;
        let start = match cursor {
            Some(cursor) => Bound::Excluded(cursor.last_key().to_string()),
            None => Bound::Unbounded,
        };

        let mut page = ScanPage::default();
        let mut examined = 0;
        let mut last_key = None;
        for (id, item) in items.range((start, Bound::Unbounded)) {
            if examined == self.page_size {
                page.cursor = last_key.map(Cursor::new);
                return Ok(page);
            }
            examined += 1;
            last_key = Some(id.clone());
            if filter.map_or(true, |f| f.matches(item)) {
                page.items.push(item.clone());
            }
        }
        Ok(page)
    }
}
