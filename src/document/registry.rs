//! The wire `Registry` node: a Thread's flat register window.

use serde::{Deserialize, Serialize};

use super::value::Value;

/// A register window, emitted truncated: trailing `Nil` slots are
/// dropped from `array`, with `len` preserving the original capacity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registry {
    /// The non-trailing-Nil prefix of the register array.
    #[serde(rename = "Array")]
    pub array: Vec<Value>,
    /// The original capacity of the register array (`array.len() <= len`).
    #[serde(rename = "Len")]
    pub len: usize,
    /// The index of the first free register.
    #[serde(rename = "Top")]
    pub top: usize,
}
