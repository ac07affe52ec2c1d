//! Models - domain records and their mapping to store items.
//!
//! Two record shapes share one table:
//!
//! - [`Record`]: one item per record id, carrying a nested set of
//!   [`Restriction`]s keyed by `(client_id, product_id)`.
//! - [`Entry`]: one flat item per restriction, whose id is derived from
//!   `record_id:client_id:product_id`.
//!
//! Both implement [`Model`], which is all the adapter and repository need.
//!
//! ## Example
//!
//! ```ignore
//! use blacklist_store::{Model, Product, Record};
//!
//! let mut record = Record::new("r1");
//! record.add_restriction("c1", Product::new("p1", "Loans"))?;
//!
//! let item = record.to_item();
//! assert_eq!(Record::from_item(&item)?, record);
//! ```

mod entry;
mod record;

use crate::error::Result;
use crate::item::Item;

pub use entry::Entry;
pub use record::{Product, Record, Restriction, RestrictionKey};

/// Attribute names used by the mapper.
pub mod attr {
    pub const ID: &str = crate::item::ID;
    pub const RESTRICTIONS: &str = "restrictions";
    pub const RECORD_ID: &str = "record_id";
    pub const CLIENT_ID: &str = "client_id";
    pub const PRODUCT_ID: &str = "product_id";
    pub const ADDED_DATE: &str = "added_date";
    pub const PRODUCT: &str = "product";
    pub const NAME: &str = "name";
}

/// Trait for types that can be stored as items.
///
/// `from_item(&m.to_item())` must equal `m` for every valid value.
pub trait Model: Clone + Send + Sync + 'static {
    /// Primary key of the item this value maps to.
    fn key(&self) -> String;

    fn to_item(&self) -> Item;

    /// Fails with `MalformedItem` when an attribute is missing or mistyped.
    fn from_item(item: &Item) -> Result<Self>;
}

/// Timestamp stamped on new restrictions.
pub(crate) fn now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
