//! Wire-level item representation exchanged with the backing store.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One stored record: a mapping from attribute name to tagged native value.
pub type Item = HashMap<String, AttributeValue>;

/// Tagged native value. Variant names follow the store's wire tags, so an
/// `AttributeValue` serializes to the familiar `{"S": "..."}` / `{"N": "..."}`
/// JSON shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    S(String),
    N(String),
    B(Vec<u8>),
    #[serde(rename = "BOOL")]
    Bool(bool),
    #[serde(rename = "NULL")]
    Null(bool),
    L(Vec<AttributeValue>),
    M(HashMap<String, AttributeValue>),
}

impl AttributeValue {
    pub fn string(s: impl Into<String>) -> Self {
        AttributeValue::S(s.into())
    }

    /// Numbers are carried as decimal strings to avoid float round-trip loss.
    pub fn number(n: impl Into<String>) -> Self {
        AttributeValue::N(n.into())
    }

    /// Get the string value if this is an S type
    pub fn as_string(&self) -> Option<&str> {
        match self {
            AttributeValue::S(s) => Some(s),
            _ => None,
        }
    }

    /// Get the number string if this is an N type
    pub fn as_number(&self) -> Option<&str> {
        match self {
            AttributeValue::N(n) => Some(n),
            _ => None,
        }
    }

    /// The wire tag of this value, used in diagnostics.
    pub fn tag(&self) -> &'static str {
        match self {
            AttributeValue::S(_) => "S",
            AttributeValue::N(_) => "N",
            AttributeValue::B(_) => "B",
            AttributeValue::Bool(_) => "BOOL",
            AttributeValue::Null(_) => "NULL",
            AttributeValue::L(_) => "L",
            AttributeValue::M(_) => "M",
        }
    }
}
