//! The wire `CallFrameStack` node: a Thread's fixed-capacity frame array.

use serde::{Deserialize, Serialize};

use crate::identity::Handle;

/// A call-frame stack, emitted truncated: trailing frames whose closure
/// is null are dropped from `array`, with `len` preserving the original
/// capacity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallFrameStack {
    /// Handles into the CallFrames bucket, one per occupied slot.
    #[serde(rename = "Array")]
    pub array: Vec<Handle>,
    /// The original capacity of the frame array (`array.len() <= len`).
    #[serde(rename = "Len")]
    pub len: usize,
    /// The index of the next free frame slot.
    #[serde(rename = "Sp")]
    pub sp: i32,
}
