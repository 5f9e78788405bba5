//! The wire `CallFrame` node: one activation record.

use serde::{Deserialize, Serialize};

use crate::identity::Handle;

/// One activation record. `parent` is a weak alias resolved by the
/// Fix-Up pass after load — see `crate::fixup`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallFrame {
    /// This frame's position in its Thread's call-frame stack array.
    #[serde(rename = "Idx")]
    pub idx: i32,
    /// The closure being executed in this frame.
    #[serde(rename = "Fn")]
    pub fn_: Handle,
    /// The calling frame, or the nil handle for the outermost frame.
    #[serde(rename = "Parent")]
    pub parent: Handle,
    /// Program counter (instruction index into the closure's prototype).
    #[serde(rename = "Pc")]
    pub pc: i32,
    /// Base offset of this frame's register window.
    #[serde(rename = "Base")]
    pub base: i32,
    /// Offset of this frame's local variables within the register window.
    #[serde(rename = "LocalBase")]
    pub local_base: i32,
    /// Offset at which return values are written.
    #[serde(rename = "ReturnBase")]
    pub return_base: i32,
    /// Number of arguments passed to this call.
    #[serde(rename = "NArgs")]
    pub n_args: i32,
    /// Number of return values expected (-1 for all).
    #[serde(rename = "NRet")]
    pub n_ret: i32,
    /// Whether this frame was entered via a tail call.
    #[serde(rename = "TailCall")]
    pub tail_call: i32,
}
