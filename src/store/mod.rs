//! Key-value store access.
//!
//! [`ItemStore`] is the narrow set of primitives a backing store must offer
//! (one item, batched items, filtered scans). [`StoreAdapter`] sits on top of
//! it, maps items to [`Model`](crate::Model)s, enforces the store's batch
//! ceiling and resubmits unprocessed batch entries.
//!
//! Implementations:
//!
//! - [`InMemoryItemStore`]: ordered in-process map, for tests and development.
//! - `DynamoItemStore`: Amazon DynamoDB (requires the `dynamodb` feature).

mod adapter;
mod cursor;
#[cfg(feature = "dynamodb")]
mod dynamodb;
mod in_memory;

use async_trait::async_trait;

use crate::error::Result;
use crate::filter::Filter;
use crate::item::Item;

pub use adapter::{RetryPolicy, StoreAdapter, STORE_BATCH_CEILING};
pub use cursor::Cursor;
#[cfg(feature = "dynamodb")]
pub use dynamodb::DynamoItemStore;
pub use in_memory::InMemoryItemStore;

/// One entry of a batched write.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteRequest {
    Put(Item),
    Delete(String),
}

/// Result of one batched read.
#[derive(Debug, Clone, Default)]
pub struct BatchGetOutput {
    /// Items found, in no particular order.
    pub items: Vec<Item>,
    /// Keys the store did not get to and that must be requested again.
    pub unprocessed: Vec<String>,
}

/// One page of a scan.
#[derive(Debug, Clone, Default)]
pub struct ScanPage {
    pub items: Vec<Item>,
    /// Where the next page starts; `None` once the table is exhausted.
    pub cursor: Option<Cursor>,
}

/// Raw store primitives. Implementations never retry on their own.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Get one item. Absence is `Ok(None)`.
    async fn get_item(&self, id: &str) -> Result<Option<Item>>;

    /// Get several items in one round trip.
    async fn batch_get_items(&self, ids: &[String]) -> Result<BatchGetOutput>;

    /// Insert or replace one item.
    async fn put_item(&self, item: Item) -> Result<()>;

    /// Delete one item. Deleting an absent item is not an error.
    async fn delete_item(&self, id: &str) -> Result<()>;

    /// Apply several writes in one round trip, returning the ones the store
    /// did not apply.
    async fn batch_write(&self, writes: Vec<WriteRequest>) -> Result<Vec<WriteRequest>>;

    /// Read one page of items matching `filter`, starting after `cursor`.
    async fn scan(&self, filter: Option<&Filter>, cursor: Option<&Cursor>) -> Result<ScanPage>;
}
