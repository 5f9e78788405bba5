//! The wire `Table` node: array part, mixed-key dictionary, string-keyed
//! dictionary and metatable, emitted as four separate sub-collections so
//! the loader can rebuild both the keys vector and the key→index map.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::value::Value;

/// One `(Key, Value)` pair in the mixed-key dictionary part of a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyValue {
    /// The entry's key.
    #[serde(rename = "Key")]
    pub key: Value,
    /// The entry's value.
    #[serde(rename = "Value")]
    pub value: Value,
}

/// A table's on-the-wire representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// The table's metatable, or `Value::nil()` if it has none.
    #[serde(rename = "Metatable")]
    pub metatable: Value,
    /// The array part, indexed `1..=len`.
    #[serde(rename = "Array")]
    pub array: Vec<Value>,
    /// Non-string keys (and non-array-index keys), in iteration order.
    #[serde(rename = "Dict")]
    pub dict: Vec<KeyValue>,
    /// String keys, in iteration order. An order-preserving map so that
    /// re-dumping the same table twice yields a byte-identical document.
    #[serde(rename = "Strdict")]
    pub strdict: IndexMap<String, Value>,
}

impl Table {
    /// An empty table with no metatable.
    pub fn empty() -> Self {
        Self {
            metatable: Value::nil(),
            array: Vec::new(),
            dict: Vec::new(),
            strdict: IndexMap::new(),
        }
    }
}
