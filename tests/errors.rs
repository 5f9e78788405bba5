//! The error taxonomy end to end: a dangling handle must surface as a
//! `MissingHandle` naming the right bucket and path, and a native
//! callback with no codec mapping must fail the load rather than
//! silently loading as a no-op.

mod support;

use lua_snapshot::codec::{DumpOptions, LoadOptions};
use lua_snapshot::document::{Value as WireValue, ValueType};
use lua_snapshot::error::SnapshotError;
use lua_snapshot::runtime as rt;
use lua_snapshot::{dump, load, Handle};
use support::{fresh_thread, set_str, NoCodecs, Named, SymbolCodec};

/// A handle referenced from a table's string-keyed part but absent from
/// the `Tables` bucket must fail the load with `MissingHandle`, naming
/// the offending bucket and a path rooted at the field that reached it.
#[test]
fn dangling_table_handle_fails_with_missing_handle() {
    let (g, main) = fresh_thread(4, 4);
    set_str(&g.0.global, "s", rt::Value::Str(std::rc::Rc::from("hi")));

    let codecs = NoCodecs;
    let mut doc = dump(&main, &codecs, &codecs, DumpOptions::default()).unwrap();

    let global_table_handle = doc.g.values().next().unwrap().global.clone();
    let global_table = doc.tables.get_mut(&global_table_handle).unwrap();
    let ghost = Handle::from("table-does-not-exist");
    global_table
        .strdict
        .insert("ghost".to_string(), WireValue::pointer(ValueType::Table, ghost.clone()));

    let err = load(&doc, &codecs, &codecs, LoadOptions::default()).unwrap_err();
    match err {
        SnapshotError::MissingHandle { bucket, handle, path } => {
            assert_eq!(bucket, "Tables");
            assert_eq!(handle, ghost);
            assert!(path.contains("ghost"), "path {path} should mention the ghost field");
        }
        other => panic!("expected MissingHandle, got {other:?}"),
    }
}

/// Dumping a native closure whose callback the codec does not recognize
/// must fail fast rather than emit some placeholder handle.
#[test]
fn dumping_an_unregistered_native_closure_fails_fast() {
    let (_g, main) = fresh_thread(4, 4);
    let env = main.0.borrow().env.clone();
    let callback: std::rc::Rc<dyn rt::NativeCallback> = std::rc::Rc::new(Named("mystery"));
    let closure = rt::Closure::native(env.clone(), callback);
    set_str(&env, "f", rt::Value::Closure(closure));

    let codecs = NoCodecs;
    let err = dump(&main, &codecs, &codecs, DumpOptions::default()).unwrap_err();
    assert_eq!(err.category(), "codec-failure");
}

/// A document dumped with one registry of native callbacks must fail to
/// load against a codec that does not recognize the handle it dumped
/// under — e.g. a host that restarted without re-registering a library
/// function. Loading must error, not silently substitute a no-op
/// callback that would make the loaded closure do nothing when called.
#[test]
fn loading_a_native_closure_with_no_matching_registration_fails_fast() {
    let (_g, main) = fresh_thread(4, 4);
    let env = main.0.borrow().env.clone();

    let mut dump_codec = SymbolCodec::new();
    let callback: std::rc::Rc<dyn rt::NativeCallback> = std::rc::Rc::new(Named("lib.print"));
    dump_codec.register("lib.print", callback.clone());
    let closure = rt::Closure::native(env.clone(), callback);
    set_str(&env, "print", rt::Value::Closure(closure));

    let doc = dump(&main, &dump_codec, &dump_codec, DumpOptions::default()).unwrap();

    // A fresh codec with an empty registry: simulates a host that hasn't
    // re-registered its native library yet.
    let empty_codec = SymbolCodec::new();
    let err = load(&doc, &empty_codec, &empty_codec, LoadOptions::default()).unwrap_err();
    match err {
        SnapshotError::CodecFailure { reason, .. } => {
            assert!(reason.contains("lib.print"), "reason should name the handle: {reason}");
        }
        other => panic!("expected CodecFailure, got {other:?}"),
    }
}
