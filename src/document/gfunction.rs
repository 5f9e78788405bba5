//! The wire `GFunction` node: optional symbolic debug info for a native
//! callback. Emitted only when a `NativeCallbackCodec` opts in — see
//! `crate::codec`.

use serde::{Deserialize, Serialize};

/// Symbolic location of a host-native callback, for tracebacks only. The
/// core never uses this to resolve the callback itself; that is always
/// the codec's job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GFunction {
    /// The callback's symbolic name.
    #[serde(rename = "Name")]
    pub name: String,
    /// The host source file the callback is defined in.
    #[serde(rename = "File")]
    pub file: String,
    /// The host source line the callback is defined at.
    #[serde(rename = "Line")]
    pub line: i32,
}
