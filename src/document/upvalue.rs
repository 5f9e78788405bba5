//! The wire `Upvalue` node: a box over a register slot or a detached value.

use serde::{Deserialize, Serialize};

use super::value::Value;
use crate::identity::Handle;

/// An open upvalue carries `reg`/`index` and no meaningful `value`; a
/// closed upvalue carries `value` and the nil handle for `reg`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Upvalue {
    /// Next upvalue in this thread's open-upvalue chain, or nil.
    #[serde(rename = "Next")]
    pub next: Handle,
    /// The register window this upvalue is open over, or nil if closed.
    #[serde(rename = "Reg")]
    pub reg: Handle,
    /// Index into `reg`'s array, meaningful only while open.
    #[serde(rename = "Index")]
    pub index: i32,
    /// The detached value, meaningful only once closed.
    #[serde(rename = "Value")]
    pub value: Value,
    /// Whether this upvalue has been closed (detached from its register window).
    #[serde(rename = "Closed")]
    pub closed: bool,
}
