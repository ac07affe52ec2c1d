use serde::{Deserialize, Serialize};

use super::{attr, now, Model};
use crate::error::Result;
use crate::item::{string_attr, AttributeValue, Item};

/// A flat blacklist entry: one item per `(record, client, product)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub record_id: String,
    pub client_id: String,
    pub product_id: String,
    pub added_date: String,
}

impl Entry {
    /// A new entry stamped with the current time.
    pub fn new(
        record_id: impl Into<String>,
        client_id: impl Into<String>,
        product_id: impl Into<String>,
    ) -> Self {
        Self {
            record_id: record_id.into(),
            client_id: client_id.into(),
            product_id: product_id.into(),
            added_date: now(),
        }
    }

    /// Id of the entry for these business identifiers.
    pub fn derive_id(record_id: &str, client_id: &str, product_id: &str) -> String {
        format!("{}:{}:{}", record_id, client_id, product_id)
    }

    pub fn id(&self) -> String {
        Self::derive_id(&self.record_id, &self.client_id, &self.product_id)
    }
}

impl Model for Entry {
    fn key(&self) -> String {
        self.id()
    }

    fn to_item(&self) -> Item {
        let mut item = Item::new();
        item.insert(attr::ID.to_string(), AttributeValue::S(self.id()));
        item.insert(
            attr::RECORD_ID.to_string(),
            AttributeValue::S(self.record_id.clone()),
        );
        item.insert(
            attr::CLIENT_ID.to_string(),
            AttributeValue::S(self.client_id.clone()),
        );
        item.insert(
            attr::PRODUCT_ID.to_string(),
            AttributeValue::S(self.product_id.clone()),
        );
        item.insert(
            attr::ADDED_DATE.to_string(),
            AttributeValue::S(self.added_date.clone()),
        );
        item
    }

    fn from_item(item: &Item) -> Result<Self> {
        Ok(Self {
            record_id: string_attr(item, attr::RECORD_ID)?,
            client_id: string_attr(item, attr::CLIENT_ID)?,
            product_id: string_attr(item, attr::PRODUCT_ID)?,
            added_date: string_attr(item, attr::ADDED_DATE)?,
        })
    }
}
