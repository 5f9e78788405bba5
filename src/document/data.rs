//! The top-level document: one bucket per node kind, keyed by handle.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::call_frame::CallFrame;
use super::call_frame_stack::CallFrameStack;
use super::function::Function;
use super::function_proto::FunctionProto;
use super::gfunction::GFunction;
use super::global::Global;
use super::registry::Registry;
use super::state::State;
use super::table::Table;
use super::upvalue::Upvalue;
use super::user_data::UserData;
use crate::document::dbg_local_info::DbgLocalInfo;
use crate::identity::Handle;

/// A bucket keyed by handle. Backed by an order-preserving map so that
/// snapshotting the same graph twice, in the same traversal order,
/// produces a byte-identical document.
pub type Bucket<T> = IndexMap<Handle, T>;

/// The complete snapshot document: the interpreter's entire reachable
/// object graph, bucketed by node kind and keyed by handle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Data {
    /// The (singleton) Global bucket. A map for wire-format consistency
    /// with the other buckets even though it holds at most one entry.
    #[serde(rename = "G")]
    pub g: Bucket<Global>,
    /// Threads.
    #[serde(rename = "States")]
    pub states: Bucket<State>,
    /// Tables.
    #[serde(rename = "Tables")]
    pub tables: Bucket<Table>,
    /// Opaque host user data.
    #[serde(rename = "UserData")]
    pub user_data: Bucket<UserData>,
    /// Call frames.
    #[serde(rename = "CallFrames")]
    pub call_frames: Bucket<CallFrame>,
    /// Call-frame stacks.
    #[serde(rename = "CallFrameStacks")]
    pub call_frame_stacks: Bucket<CallFrameStack>,
    /// Register windows.
    #[serde(rename = "Registries")]
    pub registries: Bucket<Registry>,
    /// Closures (native and interpreted).
    #[serde(rename = "Functions")]
    pub functions: Bucket<Function>,
    /// Symbolic debug info for native callbacks. Optional: empty unless a
    /// `NativeCallbackCodec` opts in.
    #[serde(rename = "GFunctions", skip_serializing_if = "Bucket::is_empty", default)]
    pub g_functions: Bucket<GFunction>,
    /// Byte-code prototypes.
    #[serde(rename = "FunctionProtos")]
    pub function_protos: Bucket<FunctionProto>,
    /// Local-variable debug records.
    #[serde(rename = "DbgLocalInfos")]
    pub dbg_local_infos: Bucket<DbgLocalInfo>,
    /// Upvalues.
    #[serde(rename = "Upvalues")]
    pub upvalues: Bucket<Upvalue>,
}

impl Data {
    /// An empty document, with every bucket initialized.
    pub fn new() -> Self {
        Self::default()
    }
}
