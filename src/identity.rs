//! The Identity Table: assigns every reachable heap object a stable,
//! human-readable handle and collapses aliasing.
//!
//! See `dumper` for how handles are minted during a traversal and `loader`
//! for how they are turned back into shared pointers.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The handle used in place of an in-memory address throughout a
/// document. The empty string denotes "no reference"; the string `"nil"`
/// denotes an explicitly-nil pointer.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle(String);

/// The distinguished handle for an explicitly-nil pointer.
pub const NIL_HANDLE: &str = "nil";

/// The distinguished handle for "no reference" (an absent/optional edge).
pub const EMPTY_HANDLE: &str = "";

impl Handle {
    /// The handle for an explicitly-nil pointer.
    pub fn nil() -> Self {
        Self(NIL_HANDLE.to_string())
    }

    /// The handle for "no reference".
    pub fn empty() -> Self {
        Self(EMPTY_HANDLE.to_string())
    }

    /// True if this is the nil handle.
    pub fn is_nil(&self) -> bool {
        self.0 == NIL_HANDLE
    }

    /// True if this is the empty ("no reference") handle.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Borrows the handle as a plain string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl From<String> for Handle {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Handle {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for Handle {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Assigns each reachable heap object a unique handle on first sight and
/// returns the same handle on subsequent sight.
///
/// `intern` cannot fail: naming collisions are resolved by appending
/// `-1`, `-2`, … to the hint, which is what keeps a dump of the same
/// graph, in the same traversal order, byte-identical across runs.
#[derive(Debug, Default)]
pub struct IdentityTable {
    /// Object address -> handle already assigned to it.
    by_address: HashMap<usize, Handle>,
    /// Hint -> how many times that exact hint has been interned so far,
    /// so the next collision can be suffixed `-{n}`.
    hint_uses: HashMap<String, u32>,
}

impl IdentityTable {
    /// Creates an empty identity table. One of these is created per dump
    /// and discarded at the end.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns (or returns the existing) handle for `address` using
    /// `hint` as the human-readable basis for a first assignment.
    ///
    /// `address` is `None` for a null pointer, which always maps to the
    /// distinguished `"nil"` handle regardless of hint.
    pub fn intern(&mut self, address: Option<usize>, hint: &str) -> Handle {
        let Some(address) = address else {
            return Handle::nil();
        };

        if let Some(existing) = self.by_address.get(&address) {
            return existing.clone();
        }

        let handle = self.mint(hint);
        self.by_address.insert(address, handle.clone());
        handle
    }

    /// Returns the handle already assigned to `address`, if any, without
    /// minting a new one. Used by the dumper to detect "already has a
    /// node in the document" (cycle cut) independent of interning.
    pub fn get(&self, address: usize) -> Option<&Handle> {
        self.by_address.get(&address)
    }

    fn mint(&mut self, hint: &str) -> Handle {
        let uses = self.hint_uses.entry(hint.to_string()).or_insert(0);
        let handle = if *uses == 0 {
            Handle::from(hint)
        } else {
            Handle::from(format!("{hint}-{uses}"))
        };
        *uses += 1;
        handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_address_returns_same_handle() {
        let mut table = IdentityTable::new();
        let a = table.intern(Some(0x1000), "mainThread");
        let b = table.intern(Some(0x1000), "mainThread");
        assert_eq!(a, b);
    }

    #[test]
    fn null_address_is_the_nil_handle() {
        let mut table = IdentityTable::new();
        let h = table.intern(None, "whatever");
        assert!(h.is_nil());
    }

    #[test]
    fn distinct_addresses_get_distinct_handles() {
        let mut table = IdentityTable::new();
        let a = table.intern(Some(1), "t");
        let b = table.intern(Some(2), "t");
        assert_ne!(a, b);
        assert_eq!(a.as_str(), "t");
        assert_eq!(b.as_str(), "t-1");
    }

    #[test]
    fn first_use_of_a_hint_is_the_hint_itself() {
        let mut table = IdentityTable::new();
        let h = table.intern(Some(1), "mainThread.env.[3].key");
        assert_eq!(h.as_str(), "mainThread.env.[3].key");
    }
}
