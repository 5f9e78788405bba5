//! The wire schema: the canonical, serde-driven document shape that a
//! dump produces and a load consumes.
//!
//! Every node type here mirrors a bucket in [`data::Data`] and uses
//! `#[serde(rename = "...")]` throughout so the emitted JSON keeps the
//! PascalCase field names of the schema this crate's document format is
//! compatible with. None of these types know how to walk a live object
//! graph — that is `crate::dumper` and `crate::loader`'s job.

mod call_frame;
mod call_frame_stack;
mod data;
mod dbg_local_info;
mod function;
mod function_proto;
mod gfunction;
mod global;
mod registry;
mod state;
mod table;
mod upvalue;
mod user_data;
mod value;

pub use call_frame::CallFrame;
pub use call_frame_stack::CallFrameStack;
pub use data::{Bucket, Data};
pub use dbg_local_info::DbgLocalInfo;
pub use function::Function;
pub use function_proto::{DbgCall, FunctionProto};
pub use gfunction::GFunction;
pub use global::Global;
pub use registry::Registry;
pub use state::{Options, State};
pub use table::{KeyValue, Table};
pub use upvalue::Upvalue;
pub use user_data::UserData;
pub use value::{Value, ValueType};
