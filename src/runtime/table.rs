//! The live `Table`: array part, mixed-key dict, string-keyed dict and an
//! optional metatable.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

use super::value::Value;

/// The shared, mutable body of a table.
#[derive(Debug, Default)]
pub struct TableData {
    /// The table's metatable, if any.
    pub metatable: Option<Table>,
    /// The array part, logically indexed from 1.
    pub array: Vec<Value>,
    /// Non-string keys, in insertion order.
    pub dict: Vec<(Value, Value)>,
    /// String keys, in insertion order.
    pub strdict: IndexMap<Rc<str>, Value>,
}

/// A table: a shared, mutable aggregate. Two `Table` handles that wrap
/// the same `Rc` are the same table, matching Lua's reference semantics.
#[derive(Debug, Clone)]
pub struct Table(pub Rc<RefCell<TableData>>);

impl Table {
    /// A fresh, empty table with no metatable.
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(TableData::default())))
    }

    /// The stable address used as this table's dump identity.
    pub fn address(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }
}

impl Default for Table {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
