use std::collections::btree_map::{self, BTreeMap};
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{attr, now, Model};
use crate::error::{BlacklistError, Result};
use crate::item::{list_attr, map_attr, string_attr, AttributeValue, Item};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
}

impl Product {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Uniqueness key of a restriction inside one record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RestrictionKey {
    pub client_id: String,
    pub product_id: String,
}

impl RestrictionKey {
    pub fn new(client_id: impl Into<String>, product_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            product_id: product_id.into(),
        }
    }
}

/// A client's restriction on one product. `added_date` never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Restriction {
    pub client_id: String,
    pub added_date: String,
    pub product: Product,
}

impl Restriction {
    pub fn key(&self) -> RestrictionKey {
        RestrictionKey::new(&self.client_id, &self.product.id)
    }

    fn to_attribute(&self) -> AttributeValue {
        let mut product = HashMap::new();
        product.insert(attr::ID.to_string(), AttributeValue::S(self.product.id.clone()));
        product.insert(
            attr::NAME.to_string(),
            AttributeValue::S(self.product.name.clone()),
        );

        let mut restriction = HashMap::new();
        restriction.insert(
            attr::CLIENT_ID.to_string(),
            AttributeValue::S(self.client_id.clone()),
        );
        restriction.insert(
            attr::ADDED_DATE.to_string(),
            AttributeValue::S(self.added_date.clone()),
        );
        restriction.insert(attr::PRODUCT.to_string(), AttributeValue::M(product));
        AttributeValue::M(restriction)
    }

    fn from_attribute(value: &AttributeValue) -> Result<Self> {
        let restriction = value
            .as_m()
            .ok_or_else(|| BlacklistError::mistyped(attr::RESTRICTIONS, "L of M"))?;
        let product = map_attr(restriction, attr::PRODUCT)?;
        Ok(Self {
            client_id: string_attr(restriction, attr::CLIENT_ID)?,
            added_date: string_attr(restriction, attr::ADDED_DATE)?,
            product: Product {
                id: string_attr(product, attr::ID)?,
                name: string_attr(product, attr::NAME)?,
            },
        })
    }
}

/// A blacklist record: an id and its restrictions.
///
/// Restrictions are held in key order, which is also the order they
/// serialize in, so mapping is deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    id: String,
    restrictions: BTreeMap<RestrictionKey, Restriction>,
}

impl Record {
    /// An empty record. Never stored as-is by the repository.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            restrictions: BTreeMap::new(),
        }
    }

    /// Build a record from existing restrictions, keeping their dates.
    pub fn with_restrictions(
        id: impl Into<String>,
        restrictions: impl IntoIterator<Item = Restriction>,
    ) -> Result<Self> {
        let mut record = Self::new(id);
        for restriction in restrictions {
            record.insert(restriction)?;
        }
        Ok(record)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn restrictions(&self) -> impl Iterator<Item = &Restriction> {
        self.restrictions.values()
    }

    pub fn restriction(&self, client_id: &str, product_id: &str) -> Option<&Restriction> {
        self.restrictions
            .get(&RestrictionKey::new(client_id, product_id))
    }

    pub fn contains(&self, client_id: &str, product_id: &str) -> bool {
        self.restriction(client_id, product_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.restrictions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.restrictions.is_empty()
    }

    /// Add a new restriction stamped with the current time.
    pub fn add_restriction(&mut self, client_id: &str, product: Product) -> Result<&Restriction> {
        let restriction = Restriction {
            client_id: client_id.to_string(),
            added_date: now(),
            product,
        };
        let key = restriction.key();
        self.insert(restriction)?;
        Ok(&self.restrictions[&key])
    }

    /// Remove a restriction, returning it.
    pub fn remove_restriction(&mut self, client_id: &str, product_id: &str) -> Result<Restriction> {
        self.restrictions
            .remove(&RestrictionKey::new(client_id, product_id))
            .ok_or_else(|| BlacklistError::RestrictionNotFound {
                client_id: client_id.to_string(),
                product_id: product_id.to_string(),
            })
    }

    fn insert(&mut self, restriction: Restriction) -> Result<()> {
        match self.restrictions.entry(restriction.key()) {
            btree_map::Entry::Occupied(entry) => Err(BlacklistError::DuplicateRestriction {
                client_id: entry.key().client_id.clone(),
                product_id: entry.key().product_id.clone(),
            }),
            btree_map::Entry::Vacant(entry) => {
                entry.insert(restriction);
                Ok(())
            }
        }
    }
}

impl Model for Record {
    fn key(&self) -> String {
        self.id.clone()
    }

    fn to_item(&self) -> Item {
        let restrictions = self
            .restrictions
            .values()
            .map(Restriction::to_attribute)
            .collect();

        let mut item = Item::new();
        item.insert(attr::ID.to_string(), AttributeValue::S(self.id.clone()));
        item.insert(attr::RESTRICTIONS.to_string(), AttributeValue::L(restrictions));
        item
    }

    fn from_item(item: &Item) -> Result<Self> {
        let id = string_attr(item, attr::ID)?;
        let restrictions = list_attr(item, attr::RESTRICTIONS)?
            .iter()
            .map(Restriction::from_attribute)
            .collect::<Result<Vec<_>>>()?;
        Self::with_restrictions(id, restrictions)
            .map_err(|e| BlacklistError::MalformedItem(e.to_string()))
    }
}
