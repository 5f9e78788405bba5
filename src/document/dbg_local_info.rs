//! The wire `DbgLocalInfo` node: a local variable's debug record.

use serde::{Deserialize, Serialize};

/// One local variable's name and the program-counter range it is live for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbgLocalInfo {
    /// The variable's source-level name.
    #[serde(rename = "Name")]
    pub name: String,
    /// First instruction at which the variable is live.
    #[serde(rename = "StartPc")]
    pub start_pc: i32,
    /// First instruction after which the variable is no longer live.
    #[serde(rename = "EndPc")]
    pub end_pc: i32,
}
