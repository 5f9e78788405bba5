//! # lua-snapshot
//!
//! A live-state snapshot and restore engine for a byte-code interpreter of
//! a dynamically-typed scripting language: tables, closures, coroutines,
//! upvalues, call frames and a global registry.
//!
//! The engine serializes a running interpreter's entire in-memory object
//! graph — cyclic, aliased, and mixing interpreted artifacts with
//! host-language artifacts — into a plain, diff-friendly document (see
//! [`document`]), and rehydrates an equivalent, resumable interpreter from
//! that document.
//!
//! ## Architecture
//!
//! - [`identity`] — the Identity Table: assigns every reachable heap
//!   object a stable, human-readable handle and collapses aliasing.
//! - [`dumper`] — the Graph Walker: a cycle-safe depth-first traversal
//!   that serializes a live graph into a [`document::Data`].
//! - [`document`] — the wire schema the dumper emits and the loader reads.
//! - [`loader`] — the two-phase loader: allocate shells, then fill them.
//! - [`fixup`] — re-seats call-frame aliases onto their canonical
//!   in-array object after a Thread's stack is loaded.
//! - [`codec`] — the Codec Seam: user-supplied hooks for opaque host user
//!   data and native callback resolution.
//! - [`runtime`] — a minimal, concrete interpreter object graph used to
//!   exercise the engine in this crate's own tests; a production
//!   embedder supplies its own equivalent types.
//!
//! ## Example
//!
//! ```
//! use lua_snapshot::codec::{DumpOptions, LoadOptions, NativeCallbackCodec, UserDataCodec};
//! use lua_snapshot::document::UserData as WireUserData;
//! use lua_snapshot::error::SnapshotResult;
//! use lua_snapshot::identity::Handle;
//! use lua_snapshot::runtime as rt;
//! use lua_snapshot::{dump, load};
//!
//! struct NoCodecs;
//!
//! impl UserDataCodec for NoCodecs {
//!     fn dump(&self, value: &rt::UserData) -> SnapshotResult<WireUserData> {
//!         Ok(WireUserData { type_tag: value.0.type_tag.clone(), data: Vec::new() })
//!     }
//!     fn load(&self, _thread: &rt::Thread, node: &WireUserData) -> SnapshotResult<rt::UserData> {
//!         Ok(rt::UserData::new(node.type_tag.clone(), ()))
//!     }
//! }
//!
//! impl NativeCallbackCodec for NoCodecs {
//!     fn dump(&self, _callback: &dyn rt::NativeCallback) -> SnapshotResult<Handle> {
//!         unimplemented!("no native callbacks in this example")
//!     }
//!     fn load(&self, _handle: &Handle) -> SnapshotResult<std::rc::Rc<dyn rt::NativeCallback>> {
//!         unimplemented!("no native callbacks in this example")
//!     }
//! }
//!
//! # fn example() -> SnapshotResult<()> {
//! let g = rt::Global::new();
//! let main = rt::Thread::new(g.clone(), None, rt::Table::new(), rt::Options::default());
//! g.set_main_thread(main.clone());
//!
//! let codecs = NoCodecs;
//! let doc = dump(&main, &codecs, &codecs, DumpOptions::default())?;
//! let restored = load(&doc, &codecs, &codecs, LoadOptions::default())?;
//! assert!(restored.0.borrow().g.current_thread().is_some());
//! # Ok(())
//! # }
//! ```

#![warn(rustdoc::missing_crate_level_docs)]

/// User-supplied marshaling hooks for opaque user data and native callbacks.
pub mod codec;
/// The wire schema: the document a dump produces and a load consumes.
pub mod document;
/// The Graph Walker: cycle-safe traversal that serializes a live graph.
pub mod dumper;
/// The error taxonomy used by the dumper, loader and fix-up pass.
pub mod error;
/// The Fix-Up pass: re-seats call-frame aliases after a Thread loads.
pub mod fixup;
/// The Identity Table: stable handles for heap objects, collapsing aliasing.
pub mod identity;
/// The two-phase loader: document -> live, cyclic object graph.
pub mod loader;
/// A minimal, concrete interpreter object graph used by this crate's tests.
pub mod runtime;

pub use codec::{DumpOptions, LoadOptions, NativeCallbackCodec, UserDataCodec};
pub use document::Data;
pub use dumper::dump;
pub use error::{SnapshotError, SnapshotResult};
pub use identity::{Handle, IdentityTable};
pub use loader::load;
