//! The Codec Seam: the two user-supplied marshaling hooks the core
//! delegates to for everything it cannot itself understand — opaque host
//! user data, and native (host-language) callbacks.
//!
//! Neither trait is implemented by this crate. An embedder supplies an
//! implementation that knows its own host-value representation; the
//! dumper and loader call through `&dyn` trait objects so neither one
//! needs to be generic over the embedder's concrete types.

use crate::document::{GFunction, UserData as WireUserData};
use crate::error::SnapshotResult;
use crate::identity::Handle;
use crate::runtime;

/// Marshals opaque host user data in and out of the wire `UserData` node.
///
/// `dump`/`load` are the only places a `runtime::UserData`'s `payload`
/// is ever inspected; the core otherwise moves it around by `Rc` alone.
pub trait UserDataCodec {
    /// Produces the wire node for a live piece of user data.
    fn dump(&self, value: &runtime::UserData) -> SnapshotResult<WireUserData>;

    /// Reconstructs a live piece of user data from its wire node. `thread`
    /// is the Thread the userdata is being attached under, for codecs
    /// that need host context (e.g. a connection pool handle) to
    /// rehydrate correctly.
    fn load(&self, thread: &runtime::Thread, node: &WireUserData) -> SnapshotResult<runtime::UserData>;
}

/// Marshals host-native callbacks in and out of the document.
///
/// Native callbacks have no portable representation: the core can at
/// best carry a handle that the embedder's own registry resolves back
/// to a concrete function pointer or closure. `load` MUST fail rather
/// than silently substitute a no-op when a handle has no mapping —
/// otherwise a loaded Thread that calls a missing native function would
/// silently do nothing instead of erroring, breaking resumability.
pub trait NativeCallbackCodec {
    /// Assigns (or reuses) the handle under which `callback` should be
    /// referenced from a `Function.GFunction` field. Callbacks that
    /// compare equal as host values should receive the same handle, so
    /// that aliasing across closures surfaces in the document exactly as
    /// it does for tables and other pointer kinds.
    fn dump(&self, callback: &dyn runtime::NativeCallback) -> SnapshotResult<Handle>;

    /// Resolves a handle, previously returned by `dump`, back to a live
    /// callback. Returns a codec-failure error if the handle is unknown.
    fn load(&self, handle: &Handle) -> SnapshotResult<std::rc::Rc<dyn runtime::NativeCallback>>;

    /// Optionally describes a callback's symbolic origin for the
    /// `GFunctions` debug bucket. The default implementation declines,
    /// which keeps the bucket empty and out of the document entirely:
    /// this bucket is debug-only metadata, never load-bearing for a
    /// correct restore.
    fn describe(&self, _handle: &Handle) -> Option<GFunction> {
        None
    }
}

/// Options controlling a dump.
#[derive(Debug, Clone, Copy, Default)]
pub struct DumpOptions {
    /// When set, an unrecognized `Value` tag is a hard
    /// [`crate::error::SnapshotError::UnsupportedValueType`] instead of
    /// being silently coerced to `Nil`. Mirrors the `strict-value-tags`
    /// feature flag so callers can opt in per-call rather than at
    /// compile time.
    pub strict_value_tags: bool,
}

/// Options controlling a load.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Attached to every rehydrated Thread's `Options.IncludeGoStackTrace`
    /// unless the document already specifies it; lets a host force
    /// stack-trace capture on for threads dumped by an older build.
    pub force_host_stack_trace: Option<bool>,
    /// When set, an unrecognized `Value` tag is a hard
    /// [`crate::error::SnapshotError::UnsupportedValueType`] instead of
    /// being silently coerced to `Nil`. This is the load-side half of the
    /// legacy-safety-valve described on [`DumpOptions::strict_value_tags`]:
    /// a dump can only ever emit a tag this crate's own closed `Value`
    /// enum recognizes, so an unrecognized tag can only arise when
    /// loading a document produced by a different, more permissive
    /// writer.
    pub strict_value_tags: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopUserDataCodec;

    impl UserDataCodec for NoopUserDataCodec {
        fn dump(&self, value: &runtime::UserData) -> SnapshotResult<WireUserData> {
            Ok(WireUserData {
                type_tag: value.0.type_tag.clone(),
                data: Vec::new(),
            })
        }

        fn load(
            &self,
            _thread: &runtime::Thread,
            node: &WireUserData,
        ) -> SnapshotResult<runtime::UserData> {
            Ok(runtime::UserData::new(node.type_tag.clone(), ()))
        }
    }

    #[test]
    fn default_describe_declines() {
        struct NoCallbacks;
        impl NativeCallbackCodec for NoCallbacks {
            fn dump(&self, _callback: &dyn runtime::NativeCallback) -> SnapshotResult<Handle> {
                unimplemented!()
            }
            fn load(
                &self,
                _handle: &Handle,
            ) -> SnapshotResult<std::rc::Rc<dyn runtime::NativeCallback>> {
                unimplemented!()
            }
        }
        assert!(NoCallbacks.describe(&Handle::from("g-1")).is_none());
    }

    #[test]
    fn user_data_codec_round_trips_through_trait_object() {
        let codec: &dyn UserDataCodec = &NoopUserDataCodec;
        let value = runtime::UserData::new("host.Connection", 7i32);
        let node = codec.dump(&value).unwrap();
        assert_eq!(node.type_tag, "host.Connection");
    }
}
