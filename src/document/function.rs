//! The wire `Function` node: either a host-native or an interpreted closure.

use serde::{Deserialize, Serialize};

use crate::identity::Handle;

/// A closure. When `is_g` is true this is a host-native callback and
/// `g_function` names it (via the Codec Seam); otherwise `proto` binds
/// the interpreted byte-code body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    /// True for a host-native callback, false for an interpreted closure.
    #[serde(rename = "IsG")]
    pub is_g: bool,
    /// This closure's environment table.
    #[serde(rename = "Env")]
    pub env: Handle,
    /// The byte-code prototype, meaningful only when `is_g` is false.
    #[serde(rename = "Proto")]
    pub proto: Handle,
    /// The native callback identity, meaningful only when `is_g` is true.
    /// Opaque to the core — assigned and resolved entirely by the
    /// user-supplied `NativeCallbackCodec`.
    #[serde(rename = "GFunction")]
    pub g_function: Handle,
    /// This closure's upvalues, in declaration order.
    #[serde(rename = "Upvalues")]
    pub upvalues: Vec<Handle>,
}
