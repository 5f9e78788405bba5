//! End-to-end dump/load scenarios over simple, non-closure graphs:
//! scalar assignment, string keys, cyclic tables and truncated registries.

mod support;

use lua_snapshot::codec::{DumpOptions, LoadOptions};
use lua_snapshot::runtime as rt;
use lua_snapshot::{dump, load};
use support::{fresh_thread, get_str, set_str, NoCodecs};

/// `pVar = 123`; dump; load; `_G["pVar"]` is still `123`.
#[test]
fn fresh_state_one_assignment_round_trips() {
    let (g, main) = fresh_thread(8, 8);
    set_str(&g.0.global, "pVar", rt::Value::Number(123.0));

    let codecs = NoCodecs;
    let doc = dump(&main, &codecs, &codecs, DumpOptions::default()).unwrap();
    let restored = load(&doc, &codecs, &codecs, LoadOptions::default()).unwrap();

    let global = restored.0.borrow().g.0.global.clone();
    assert_eq!(get_str(&global, "pVar"), Some(rt::Value::Number(123.0)));
}

/// `s = "hello"`; dump; load; inspect the loaded `_G`.
#[test]
fn string_key_in_global_environment_round_trips() {
    let (g, main) = fresh_thread(8, 8);
    set_str(
        &g.0.global,
        "s",
        rt::Value::Str(std::rc::Rc::from("hello")),
    );

    let codecs = NoCodecs;
    let doc = dump(&main, &codecs, &codecs, DumpOptions::default()).unwrap();
    let restored = load(&doc, &codecs, &codecs, LoadOptions::default()).unwrap();

    let global = restored.0.borrow().g.0.global.clone();
    match get_str(&global, "s") {
        Some(rt::Value::Str(s)) => assert_eq!(&*s, "hello"),
        other => panic!("expected a string value, got {other:?}"),
    }
}

/// `t = {}; t.self = t`. The document must contain exactly
/// one node for `t`, and after load `t.self` is identity-equal to `t`.
#[test]
fn cyclic_table_round_trips_as_a_single_node() {
    let (g, main) = fresh_thread(8, 8);
    let t = rt::Table::new();
    set_str(&t, "self", rt::Value::Table(t.clone()));
    set_str(&g.0.global, "t", rt::Value::Table(t.clone()));

    let codecs = NoCodecs;
    let doc = dump(&main, &codecs, &codecs, DumpOptions::default()).unwrap();

    // Exactly one Table node was emitted for `t`: the cycle through
    // `t.self` was cut by the pre-insert-then-fill shell, not unrolled
    // into a second node with a `-1` suffix.
    let t_handle = lua_snapshot::Handle::from("global.table.[t]");
    assert!(doc.tables.contains_key(&t_handle));
    assert!(!doc.tables.contains_key(&lua_snapshot::Handle::from("global.table.[t]-1")));

    let restored = load(&doc, &codecs, &codecs, LoadOptions::default()).unwrap();
    let global = restored.0.borrow().g.0.global.clone();
    let loaded_t = match get_str(&global, "t") {
        Some(rt::Value::Table(table)) => table,
        other => panic!("expected a table value, got {other:?}"),
    };
    let loaded_self = match get_str(&loaded_t, "self") {
        Some(rt::Value::Table(table)) => table,
        other => panic!("expected a table value, got {other:?}"),
    };
    assert_eq!(loaded_t, loaded_self, "t.self must alias t itself");
}

/// A Registry with `Len=128` and only the first 2 slots
/// occupied. The document truncates the trailing Nils; load restores the
/// full capacity.
#[test]
fn truncated_registry_round_trips_to_full_capacity() {
    let (_g, main) = fresh_thread(8, 128);
    {
        let thread = main.0.borrow();
        let mut reg = thread.reg.0.borrow_mut();
        reg.slots[0] = rt::Value::Number(1.0);
        reg.slots[1] = rt::Value::Number(2.0);
        reg.top = 2;
    }

    let codecs = NoCodecs;
    let doc = dump(&main, &codecs, &codecs, DumpOptions::default()).unwrap();

    let state = doc.states.get(&lua_snapshot::Handle::from("mainThread")).unwrap();
    let reg_node = doc.registries.get(&state.reg).unwrap();
    assert!(reg_node.array.len() <= 2);
    assert_eq!(reg_node.len, 128);

    let restored = load(&doc, &codecs, &codecs, LoadOptions::default()).unwrap();
    let slots_len = restored.0.borrow().reg.0.borrow().slots.len();
    assert_eq!(slots_len, 128);
    assert_eq!(
        restored.0.borrow().reg.0.borrow().slots[0],
        rt::Value::Number(1.0)
    );
}

/// Handle closure: every handle referenced anywhere in the document
/// resolves to a node present in its matching bucket.
#[test]
fn every_referenced_handle_resolves_in_its_bucket() {
    let (g, main) = fresh_thread(4, 4);
    let t = rt::Table::new();
    set_str(&t, "self", rt::Value::Table(t.clone()));
    set_str(&g.0.global, "t", rt::Value::Table(t));

    let codecs = NoCodecs;
    let doc = dump(&main, &codecs, &codecs, DumpOptions::default()).unwrap();

    for (_, table) in &doc.tables {
        if let Some(h) = table.metatable.as_handle() {
            assert!(doc.tables.contains_key(h), "dangling metatable handle {h}");
        }
        for v in &table.array {
            assert_handle_resolves(&doc, v);
        }
        for kv in &table.dict {
            assert_handle_resolves(&doc, &kv.key);
            assert_handle_resolves(&doc, &kv.value);
        }
        for v in table.strdict.values() {
            assert_handle_resolves(&doc, v);
        }
    }
}

fn assert_handle_resolves(doc: &lua_snapshot::Data, v: &lua_snapshot::document::Value) {
    use lua_snapshot::document::ValueType;
    let Some(h) = v.as_handle() else { return };
    if h.is_nil() || h.is_empty() {
        return;
    }
    let Some(kind) = ValueType::from_tag(v.type_) else {
        panic!("unrecognized value tag {}", v.type_)
    };
    let present = match kind {
        ValueType::Table => doc.tables.contains_key(h),
        ValueType::Function => doc.functions.contains_key(h),
        ValueType::UserData => doc.user_data.contains_key(h),
        ValueType::Thread => doc.states.contains_key(h),
        _ => true,
    };
    assert!(present, "handle {h} ({kind:?}) not present in its bucket");
}
