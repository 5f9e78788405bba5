//! Tests that hinge on shared identity surviving a dump/load cycle:
//! an open upvalue over a live register, a closure aliased from two
//! tables, and a call frame reached both standalone and through its
//! Thread's stack array.

mod support;

use std::rc::Rc;

use lua_snapshot::codec::{DumpOptions, LoadOptions};
use lua_snapshot::runtime as rt;
use lua_snapshot::{dump, load};
use support::{fresh_thread, get_str, set_str, trivial_prototype, Named, NoCodecs, SymbolCodec};

/// A closure that closes over a live register through an
/// open `Upvalue`. After a round trip the loaded closure's upvalue must
/// still be open, over a register window of the right size, at the
/// right index, and carrying whatever value was written into that slot
/// before the dump — which is exactly what "semantic resumability"
/// requires of the register the interpreter would resume execution from.
#[test]
fn closure_with_open_upvalue_preserves_the_live_register() {
    let (_g, main) = fresh_thread(4, 4);

    let reg = rt::Registry::with_capacity(2);
    reg.0.borrow_mut().slots[0] = rt::Value::Number(1.0);
    let upvalue = rt::Upvalue::open(reg.clone(), 0);
    let proto = trivial_prototype("f");
    let env = main.0.borrow().env.clone();
    let closure = rt::Closure::interpreted(env.clone(), proto);
    closure.0.borrow_mut().upvalues.push(upvalue);

    // Two calls to `f` each do `x = x + 1`, simulated directly on the
    // register this runtime has no byte-code loop to execute.
    reg.0.borrow_mut().slots[0] = rt::Value::Number(2.0);
    reg.0.borrow_mut().slots[0] = rt::Value::Number(3.0);

    set_str(&env, "f", rt::Value::Closure(closure));

    let codecs = NoCodecs;
    let doc = dump(&main, &codecs, &codecs, DumpOptions::default()).unwrap();
    let restored = load(&doc, &codecs, &codecs, LoadOptions::default()).unwrap();

    let restored_env = restored.0.borrow().env.clone();
    let restored_closure = match get_str(&restored_env, "f") {
        Some(rt::Value::Closure(c)) => c,
        other => panic!("expected a closure, got {other:?}"),
    };
    let uv = restored_closure.0.borrow().upvalues[0].clone();
    let uv_data = uv.0.borrow();
    assert!(!uv_data.closed, "upvalue must still be open after load");
    let reg = uv_data.reg.clone().expect("open upvalue has a register");
    assert_eq!(reg.0.borrow().slots[uv_data.index as usize], rt::Value::Number(3.0));

    // A third call: increment once more through the *loaded* upvalue.
    let idx = uv_data.index as usize;
    drop(uv_data);
    {
        let mut slots = reg.0.borrow_mut();
        slots.slots[idx] = rt::Value::Number(4.0);
    }
    assert_eq!(reg.0.borrow().slots[idx], rt::Value::Number(4.0));
}

/// `function g() return 1 end; a = {f=g}; b = {f=g}`. Both
/// tables' `f` fields must share one handle in the document, and must be
/// identity-equal once loaded.
#[test]
fn aliased_native_closure_across_two_tables_round_trips_as_one_node() {
    let (_g, main) = fresh_thread(4, 4);
    let env = main.0.borrow().env.clone();

    let mut codec = SymbolCodec::new();
    let callback: Rc<dyn rt::NativeCallback> = Rc::new(Named("g"));
    codec.register("g", callback.clone());
    let shared = rt::Closure::native(env.clone(), callback);

    let a = rt::Table::new();
    let b = rt::Table::new();
    set_str(&a, "f", rt::Value::Closure(shared.clone()));
    set_str(&b, "f", rt::Value::Closure(shared));
    set_str(&env, "a", rt::Value::Table(a));
    set_str(&env, "b", rt::Value::Table(b));

    let doc = dump(&main, &codec, &codec, DumpOptions::default()).unwrap();

    let a_wire = doc.tables.get(&lua_snapshot::Handle::from("mainThread.env.[a]")).unwrap();
    let b_wire = doc.tables.get(&lua_snapshot::Handle::from("mainThread.env.[b]")).unwrap();
    let a_f = a_wire.strdict.get("f").unwrap().as_handle().unwrap();
    let b_f = b_wire.strdict.get("f").unwrap().as_handle().unwrap();
    assert_eq!(a_f, b_f, "a.f and b.f must share one Function handle");

    let restored = load(&doc, &codec, &codec, LoadOptions::default()).unwrap();
    let restored_env = restored.0.borrow().env.clone();
    let ra = match get_str(&restored_env, "a") {
        Some(rt::Value::Table(t)) => t,
        other => panic!("expected a table, got {other:?}"),
    };
    let rb = match get_str(&restored_env, "b") {
        Some(rt::Value::Table(t)) => t,
        other => panic!("expected a table, got {other:?}"),
    };
    let fa = match get_str(&ra, "f") {
        Some(rt::Value::Closure(c)) => c,
        other => panic!("expected a closure, got {other:?}"),
    };
    let fb = match get_str(&rb, "f") {
        Some(rt::Value::Closure(c)) => c,
        other => panic!("expected a closure, got {other:?}"),
    };
    assert_eq!(fa, fb, "loaded a.f and b.f must be identity-equal");
}

/// Frame aliasing: after load, a Thread's `current_frame` and every
/// `frame.parent` must alias an element *inside* that Thread's
/// Call-Frame Stack array, not a free-standing copy duplicated during
/// phase B. This is what `crate::fixup` exists to guarantee.
#[test]
fn current_frame_and_parent_alias_the_stack_array_after_load() {
    let (_g, main) = fresh_thread(4, 4);
    let env = main.0.borrow().env.clone();
    let proto = trivial_prototype("caller");
    let closure = rt::Closure::interpreted(env, proto);

    let parent_frame = rt::Frame(Rc::new(std::cell::RefCell::new(rt::FrameData {
        idx: 0,
        closure: closure.clone(),
        parent: None,
        pc: 0,
        base: 0,
        local_base: 0,
        return_base: 0,
        n_args: 0,
        n_ret: 0,
        tail_call: 0,
    })));
    let child_frame = rt::Frame(Rc::new(std::cell::RefCell::new(rt::FrameData {
        idx: 1,
        closure,
        parent: Some(parent_frame.clone()),
        pc: 3,
        base: 2,
        local_base: 2,
        return_base: 0,
        n_args: 0,
        n_ret: 1,
        tail_call: 0,
    })));

    {
        let thread = main.0.borrow();
        let mut stack = thread.stack.0.borrow_mut();
        stack.frames[0] = Some(parent_frame.clone());
        stack.frames[1] = Some(child_frame.clone());
        stack.sp = 2;
    }
    main.0.borrow_mut().current_frame = Some(child_frame.clone());

    let codecs = NoCodecs;
    let doc = dump(&main, &codecs, &codecs, DumpOptions::default()).unwrap();
    let restored = load(&doc, &codecs, &codecs, LoadOptions::default()).unwrap();

    let thread = restored.0.borrow();
    let current = thread.current_frame.clone().expect("current frame set");
    let stack_child = thread.stack.0.borrow().frames[1]
        .clone()
        .expect("child frame on the stack");
    assert_eq!(current, stack_child, "current_frame must alias stack[1]");

    let stack_parent = thread.stack.0.borrow().frames[0]
        .clone()
        .expect("parent frame on the stack");
    let child_parent = stack_child.0.borrow().parent.clone().expect("child has a parent");
    assert_eq!(
        child_parent, stack_parent,
        "child.parent must alias stack[0], not a free-standing copy"
    );
}
