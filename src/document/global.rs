//! The wire `Global` node: process-wide state shared across all Threads.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::value::Value;
use crate::identity::Handle;

/// Global is a singleton within a dump — the walker asserts at most one
/// Global handle is ever interned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Global {
    /// The interpreter's main (root) thread.
    #[serde(rename = "MainThread")]
    pub main_thread: Handle,
    /// The thread that was executing at dump time.
    #[serde(rename = "CurrentThread")]
    pub current_thread: Handle,
    /// The weak registry table (used for userdata/finalizer bookkeeping).
    #[serde(rename = "Registry")]
    pub registry: Handle,
    /// The global environment table (`_G`).
    #[serde(rename = "Global")]
    pub global: Handle,
    /// Per-type metatables, keyed by type name, in registration order.
    #[serde(rename = "BuiltinMts")]
    pub builtin_mts: IndexMap<String, Value>,
    /// The interpreter's GC generation counter at dump time.
    #[serde(rename = "Gccount")]
    pub gccount: i32,
}
