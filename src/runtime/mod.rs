//! A minimal, concrete interpreter object graph.
//!
//! This module has no opcode dispatcher, no parser and no standard
//! library — it exists solely to give [`crate::dumper`], [`crate::loader`]
//! and [`crate::fixup`] a real, cyclic, aliased graph to walk in tests
//! and in downstream embedders' own test suites. A production embedder
//! is expected to supply its own equivalent types; this module is the
//! reference shape those types should match.
//!
//! Every node with its own identity in the wire document (see
//! `crate::document`) is represented here as a cheap `Clone` wrapper
//! around an `Rc` — `Rc<RefCell<..>>` where the node is mutated after
//! construction, bare `Rc<..>` where it is write-once. Per the
//! concurrency model this crate assumes, nothing here is `Send`/`Sync`;
//! a multi-threaded embedder is expected to wrap its own equivalents in
//! `Arc<Mutex<..>>` instead.

mod closure;
mod frame;
mod global;
mod prototype;
mod registry;
mod table;
mod thread;
mod upvalue;
mod user_data;
mod value;

pub use closure::{Closure, ClosureData, NativeCallback};
pub use frame::{CallFrameStack, CallFrameStackData, Frame, FrameData};
pub use global::{Global, GlobalData};
pub use prototype::{DbgCall, LocalVarInfo, LocalVarInfoData, Prototype, PrototypeData};
pub use registry::{Registry, RegistryData};
pub use table::{Table, TableData};
pub use thread::{Options, Thread, ThreadData};
pub use upvalue::{Upvalue, UpvalueData};
pub use user_data::{UserData, UserDataData};
pub use value::Value;
