//! Shared scaffolding for the integration tests: a minimal pair of codecs
//! and a couple of graph-building helpers, built on top of
//! `lua_snapshot::runtime` the way an embedder would build on top of its
//! own concrete interpreter types.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use lua_snapshot::codec::{NativeCallbackCodec, UserDataCodec};
use lua_snapshot::document::UserData as WireUserData;
use lua_snapshot::error::{SnapshotError, SnapshotResult};
use lua_snapshot::identity::Handle;
use lua_snapshot::runtime as rt;

/// A codec that accepts opaque user data round-tripped purely as its type
/// tag (no payload bytes) and refuses every native callback. Good enough
/// for graphs that never reach either bucket, and for asserting the
/// fail-fast behavior on native callbacks when they do.
#[derive(Debug, Default)]
pub struct NoCodecs;

impl UserDataCodec for NoCodecs {
    fn dump(&self, value: &rt::UserData) -> SnapshotResult<WireUserData> {
        Ok(WireUserData {
            type_tag: value.0.type_tag.clone(),
            data: Vec::new(),
        })
    }

    fn load(&self, _thread: &rt::Thread, node: &WireUserData) -> SnapshotResult<rt::UserData> {
        Ok(rt::UserData::new(node.type_tag.clone(), ()))
    }
}

impl NativeCallbackCodec for NoCodecs {
    fn dump(&self, _callback: &dyn rt::NativeCallback) -> SnapshotResult<Handle> {
        Err(SnapshotError::codec_failure(
            "dump_native_callback: this test harness has no native callbacks registered",
            "",
        ))
    }

    fn load(&self, handle: &Handle) -> SnapshotResult<Rc<dyn rt::NativeCallback>> {
        Err(SnapshotError::codec_failure(
            format!("no native callback registered for handle {handle}"),
            "",
        ))
    }
}

/// A named, no-op native callback, for tests that need a concrete
/// `rt::NativeCallback` to hang a symbolic name off of.
#[derive(Debug)]
pub struct Named(pub &'static str);

impl rt::NativeCallback for Named {}

fn addr_of(callback: &dyn rt::NativeCallback) -> usize {
    callback as *const dyn rt::NativeCallback as *const () as usize
}

/// A codec that resolves native callbacks by symbolic name, the strategy
/// the design notes call out as typical: `dump` looks up which
/// registered callback this address belongs to, `load` looks the name
/// back up in the same registry. Mirrors how a real embedder would key
/// its standard-library functions.
#[derive(Debug, Default)]
pub struct SymbolCodec {
    registry: HashMap<&'static str, Rc<dyn rt::NativeCallback>>,
    dumped: RefCell<HashMap<usize, Handle>>,
}

impl SymbolCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &'static str, callback: Rc<dyn rt::NativeCallback>) {
        self.registry.insert(name, callback);
    }
}

impl UserDataCodec for SymbolCodec {
    fn dump(&self, value: &rt::UserData) -> SnapshotResult<WireUserData> {
        Ok(WireUserData {
            type_tag: value.0.type_tag.clone(),
            data: Vec::new(),
        })
    }

    fn load(&self, _thread: &rt::Thread, node: &WireUserData) -> SnapshotResult<rt::UserData> {
        Ok(rt::UserData::new(node.type_tag.clone(), ()))
    }
}

impl NativeCallbackCodec for SymbolCodec {
    fn dump(&self, callback: &dyn rt::NativeCallback) -> SnapshotResult<Handle> {
        let addr = addr_of(callback);
        if let Some(h) = self.dumped.borrow().get(&addr) {
            return Ok(h.clone());
        }
        for (name, registered) in &self.registry {
            if addr_of(registered.as_ref()) == addr {
                let h = Handle::from(*name);
                self.dumped.borrow_mut().insert(addr, h.clone());
                return Ok(h);
            }
        }
        Err(SnapshotError::codec_failure(
            "dump_native_callback: callback not found in the symbol registry",
            "",
        ))
    }

    fn load(&self, handle: &Handle) -> SnapshotResult<Rc<dyn rt::NativeCallback>> {
        self.registry
            .get(handle.as_str())
            .cloned()
            .ok_or_else(|| {
                SnapshotError::codec_failure(
                    format!("no native callback registered under {handle}"),
                    "",
                )
            })
    }
}

/// A fresh Global with a main Thread bound as both main and current.
pub fn fresh_thread(call_stack_size: i32, registry_size: i32) -> (rt::Global, rt::Thread) {
    let g = rt::Global::new();
    let options = rt::Options {
        call_stack_size,
        registry_size,
        skip_open_libs: false,
        include_go_stack_trace: false,
    };
    let main = rt::Thread::new(g.clone(), None, rt::Table::new(), options);
    g.set_main_thread(main.clone());
    (g, main)
}

/// Assigns `table[key] = value` as a string key, matching how a dumped
/// Lua table keeps its string-keyed entries in the `Strdict` sub-collection.
pub fn set_str(table: &rt::Table, key: &str, value: rt::Value) {
    table
        .0
        .borrow_mut()
        .strdict
        .insert(Rc::from(key), value);
}

/// Looks up a string key in a table's string-keyed part.
pub fn get_str(table: &rt::Table, key: &str) -> Option<rt::Value> {
    table.0.borrow().strdict.get(key).cloned()
}

/// A trivial prototype with no constants and no nested prototypes, for
/// tests that only care about a closure's identity and upvalues, not its
/// byte-code.
pub fn trivial_prototype(source_name: &str) -> rt::Prototype {
    rt::Prototype(Rc::new(rt::PrototypeData {
        source_name: source_name.to_string(),
        line_defined: 1,
        last_line_defined: 1,
        num_upvalues: 1,
        num_parameters: 0,
        is_vararg: 0,
        num_used_registers: 2,
        code: vec![0x0001_0203],
        constants: Vec::new(),
        prototypes: Vec::new(),
        dbg_source_positions: vec![1],
        dbg_upvalues: vec!["x".to_string()],
        string_constants: Vec::new(),
        dbg_calls: Vec::new(),
        dbg_locals: Vec::new(),
    }))
}
