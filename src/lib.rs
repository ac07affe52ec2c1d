pub mod batch;
pub mod config;
mod error;
pub mod filter;
pub mod item;
mod lock;
pub mod model;
mod repository;
pub mod store;

#[cfg(feature = "grpc")]
pub mod grpc;

pub use batch::{Accumulator, BatchCoordinator, ChunkPolicy, Flushed, StreamReport, StreamState};
pub use config::Config;
pub use error::{BlacklistError, Result};
pub use filter::{compile, BetweenQuery, Filter, Operand, Operator, Query};
pub use item::{AttributeValue, Item};
pub use lock::{KeyGuard, KeyedLocks};
pub use model::{Entry, Model, Product, Record, Restriction, RestrictionKey};
pub use repository::{Page, RecordStream, Repository};
pub use store::{
    Cursor, InMemoryItemStore, ItemStore, RetryPolicy, StoreAdapter, STORE_BATCH_CEILING,
};

#[cfg(feature = "dynamodb")]
pub use store::DynamoItemStore;
