//! Items: the store's generic attribute-map representation of one record.
//!
//! Mirrors the DynamoDB attribute model closely enough that the in-memory
//! store and the DynamoDB store can share the same mapper and filter code.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{BlacklistError, Result};

/// One stored item: attribute name to value.
pub type Item = HashMap<String, AttributeValue>;

/// Primary key attribute of every item.
pub const ID: &str = "id";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    S(String),
    /// Numbers travel as their decimal string form, as in DynamoDB.
    N(String),
    Bool(bool),
    Null,
    L(Vec<AttributeValue>),
    M(HashMap<String, AttributeValue>),
}

impl AttributeValue {
    pub fn as_s(&self) -> Option<&str> {
        match self {
            AttributeValue::S(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_n(&self) -> Option<f64> {
        match self {
            AttributeValue::N(n) => n.parse().ok(),
            _ => None,
        }
    }

    pub fn as_l(&self) -> Option<&[AttributeValue]> {
        match self {
            AttributeValue::L(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_m(&self) -> Option<&HashMap<String, AttributeValue>> {
        match self {
            AttributeValue::M(m) => Some(m),
            _ => None,
        }
    }

    /// Number value from anything displayable.
    pub fn number(n: impl ToString) -> Self {
        AttributeValue::N(n.to_string())
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::S(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::S(s)
    }
}

/// Required string attribute.
pub fn string_attr(item: &HashMap<String, AttributeValue>, name: &str) -> Result<String> {
    item.get(name)
        .ok_or_else(|| BlacklistError::missing(name))?
        .as_s()
        .map(str::to_string)
        .ok_or_else(|| BlacklistError::mistyped(name, "S"))
}

/// Required list attribute.
pub fn list_attr<'a>(
    item: &'a HashMap<String, AttributeValue>,
    name: &str,
) -> Result<&'a [AttributeValue]> {
    item.get(name)
        .ok_or_else(|| BlacklistError::missing(name))?
        .as_l()
        .ok_or_else(|| BlacklistError::mistyped(name, "L"))
}

/// Required map attribute.
pub fn map_attr<'a>(
    item: &'a HashMap<String, AttributeValue>,
    name: &str,
) -> Result<&'a HashMap<String, AttributeValue>> {
    item.get(name)
        .ok_or_else(|| BlacklistError::missing(name))?
        .as_m()
        .ok_or_else(|| BlacklistError::mistyped(name, "M"))
}

/// Primary key of an item.
pub fn item_id(item: &Item) -> Result<String> {
    string_attr(item, ID)
}
