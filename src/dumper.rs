//! The Graph Walker: a cycle-safe depth-first traversal that serializes a
//! live interpreter's reachable object graph into a [`crate::document::Data`].
//!
//! Every kind follows the same six-step pattern: resolve the object's
//! address, intern a handle for it, short-circuit if
//! that handle already has a node (this is what cuts cycles), insert an
//! empty shell so a re-entrant descent finds it instead of looping, fill
//! the shell by recursively dumping its edges, then return the handle.

use indexmap::IndexMap;

use crate::codec::{DumpOptions, NativeCallbackCodec, UserDataCodec};
use crate::document::{
    CallFrame, CallFrameStack, Data, DbgCall, DbgLocalInfo, Function, FunctionProto, Global,
    KeyValue, Options as WireOptions, Registry, State, Table, Upvalue, Value, ValueType,
};
use crate::error::SnapshotResult;
use crate::identity::{Handle, IdentityTable};
use crate::runtime as rt;

/// Dumps the reachable graph rooted at `root` into a fresh document.
///
/// `root` is conventionally the interpreter's main thread. The traversal
/// is a deterministic depth-first walk from this one root, so two dumps
/// of an unchanged graph are byte-identical once serialized.
pub fn dump(
    root: &rt::Thread,
    user_codec: &dyn UserDataCodec,
    callback_codec: &dyn NativeCallbackCodec,
    options: DumpOptions,
) -> SnapshotResult<Data> {
    let mut dumper = Dumper {
        identity: IdentityTable::new(),
        data: Data::new(),
        options,
        user_codec,
        callback_codec,
    };
    dumper.dump_thread(root, "mainThread")?;
    Ok(dumper.data)
}

struct Dumper<'a> {
    identity: IdentityTable,
    data: Data,
    /// Reserved for a future strict-tag check; this crate's own `rt::Value`
    /// is a closed enum, so every dump already matches a recognized kind
    /// and the flag has nothing to act on yet.
    #[allow(dead_code)]
    options: DumpOptions,
    user_codec: &'a dyn UserDataCodec,
    callback_codec: &'a dyn NativeCallbackCodec,
}

/// Trailing-Nil (resp. trailing-unused) slots are dropped from emitted
/// arrays; this returns how much of `values` to keep.
fn truncated_len(values: &[rt::Value]) -> usize {
    values
        .iter()
        .rposition(|v| !v.is_nil())
        .map(|i| i + 1)
        .unwrap_or(0)
}

fn truncated_frame_len(frames: &[Option<rt::Frame>]) -> usize {
    frames
        .iter()
        .rposition(|f| f.is_some())
        .map(|i| i + 1)
        .unwrap_or(0)
}

impl<'a> Dumper<'a> {
    /// If `addr` already has a handle, this is a revisit: log it and
    /// return the existing handle so the caller can short-circuit. Cycles
    /// are cut here, not by checking bucket membership, because the
    /// handle is always interned before its shell is inserted.
    fn visited(&self, addr: usize, hint: &str) -> Option<Handle> {
        let h = self.identity.get(addr)?.clone();
        log::debug!("dumper: cycle cut at {hint}, already interned as {h}");
        Some(h)
    }

    fn dump_value(&mut self, v: &rt::Value, hint: &str) -> SnapshotResult<Value> {
        Ok(match v {
            rt::Value::Nil => Value::nil(),
            rt::Value::Bool(b) => Value::from_bool(*b),
            rt::Value::Number(n) => Value::from_number(*n),
            rt::Value::Str(s) => Value::from_string(s.to_string()),
            rt::Value::Table(t) => Value::pointer(ValueType::Table, self.dump_table(t, hint)?),
            rt::Value::Closure(c) => {
                Value::pointer(ValueType::Function, self.dump_closure(c, hint)?)
            }
            rt::Value::Thread(t) => Value::pointer(ValueType::Thread, self.dump_thread(t, hint)?),
            rt::Value::UserData(u) => {
                Value::pointer(ValueType::UserData, self.dump_user_data(u, hint)?)
            }
        })
    }

    fn dump_table(&mut self, t: &rt::Table, hint: &str) -> SnapshotResult<Handle> {
        let addr = t.address();
        if let Some(h) = self.visited(addr, hint) {
            return Ok(h);
        }
        let h = self.identity.intern(Some(addr), hint);
        self.data.tables.insert(h.clone(), Table::empty());

        let data = t.0.borrow();
        let metatable = match data.metatable.as_ref() {
            Some(mt) => Value::pointer(ValueType::Table, self.dump_table(mt, &format!("{hint}.metatable"))?),
            None => Value::nil(),
        };
        let mut array = Vec::with_capacity(data.array.len());
        for (i, v) in data.array.iter().enumerate() {
            array.push(self.dump_value(v, &format!("{hint}.[{}]", i + 1))?);
        }
        let mut dict = Vec::with_capacity(data.dict.len());
        for (i, (k, v)) in data.dict.iter().enumerate() {
            let key = self.dump_value(k, &format!("{hint}.dict.[{i}].key"))?;
            let value = self.dump_value(v, &format!("{hint}.dict.[{i}].value"))?;
            dict.push(KeyValue { key, value });
        }
        let mut strdict = IndexMap::new();
        for (k, v) in data.strdict.iter() {
            let value = self.dump_value(v, &format!("{hint}.[{k}]"))?;
            strdict.insert(k.to_string(), value);
        }
        drop(data);

        let node = self.data.tables.get_mut(&h).expect("shell was just inserted");
        node.metatable = metatable;
        node.array = array;
        node.dict = dict;
        node.strdict = strdict;
        Ok(h)
    }

    fn dump_registry(&mut self, r: &rt::Registry, hint: &str) -> SnapshotResult<Handle> {
        let addr = r.address();
        if let Some(h) = self.visited(addr, hint) {
            return Ok(h);
        }
        let h = self.identity.intern(Some(addr), hint);
        self.data.registries.insert(
            h.clone(),
            Registry {
                array: Vec::new(),
                len: 0,
                top: 0,
            },
        );

        let data = r.0.borrow();
        let full_len = data.slots.len();
        let keep = truncated_len(&data.slots);
        let mut array = Vec::with_capacity(keep);
        for (i, v) in data.slots[..keep].iter().enumerate() {
            array.push(self.dump_value(v, &format!("{hint}.[{i}]"))?);
        }
        let top = data.top;
        drop(data);

        let node = self
            .data
            .registries
            .get_mut(&h)
            .expect("shell was just inserted");
        node.array = array;
        node.len = full_len;
        node.top = top;
        Ok(h)
    }

    fn dump_call_frame(&mut self, f: &rt::Frame, hint: &str) -> SnapshotResult<Handle> {
        let addr = f.address();
        if let Some(h) = self.visited(addr, hint) {
            return Ok(h);
        }
        let h = self.identity.intern(Some(addr), hint);
        self.data.call_frames.insert(
            h.clone(),
            CallFrame {
                idx: 0,
                fn_: Handle::empty(),
                parent: Handle::nil(),
                pc: 0,
                base: 0,
                local_base: 0,
                return_base: 0,
                n_args: 0,
                n_ret: 0,
                tail_call: 0,
            },
        );

        let data = f.0.borrow();
        let idx = data.idx;
        let fn_ = self.dump_closure(&data.closure, &format!("{hint}.fn"))?;
        let parent = self.dump_call_frame_opt(data.parent.as_ref(), &format!("{hint}.parent"))?;
        let (pc, base, local_base, return_base, n_args, n_ret, tail_call) = (
            data.pc,
            data.base,
            data.local_base,
            data.return_base,
            data.n_args,
            data.n_ret,
            data.tail_call,
        );
        drop(data);

        let node = self
            .data
            .call_frames
            .get_mut(&h)
            .expect("shell was just inserted");
        node.idx = idx;
        node.fn_ = fn_;
        node.parent = parent;
        node.pc = pc;
        node.base = base;
        node.local_base = local_base;
        node.return_base = return_base;
        node.n_args = n_args;
        node.n_ret = n_ret;
        node.tail_call = tail_call;
        Ok(h)
    }

    fn dump_call_frame_opt(
        &mut self,
        f: Option<&rt::Frame>,
        hint: &str,
    ) -> SnapshotResult<Handle> {
        match f {
            Some(f) => self.dump_call_frame(f, hint),
            None => Ok(Handle::nil()),
        }
    }

    fn dump_call_frame_stack(
        &mut self,
        s: &rt::CallFrameStack,
        hint: &str,
    ) -> SnapshotResult<Handle> {
        let addr = s.address();
        if let Some(h) = self.visited(addr, hint) {
            return Ok(h);
        }
        let h = self.identity.intern(Some(addr), hint);
        self.data.call_frame_stacks.insert(
            h.clone(),
            CallFrameStack {
                array: Vec::new(),
                len: 0,
                sp: 0,
            },
        );

        let data = s.0.borrow();
        let full_len = data.frames.len();
        let keep = truncated_frame_len(&data.frames);
        let mut array = Vec::with_capacity(keep);
        for (i, f) in data.frames[..keep].iter().enumerate() {
            array.push(self.dump_call_frame_opt(f.as_ref(), &format!("{hint}.array.[{i}]"))?);
        }
        let sp = data.sp;
        drop(data);

        let node = self
            .data
            .call_frame_stacks
            .get_mut(&h)
            .expect("shell was just inserted");
        node.array = array;
        node.len = full_len;
        node.sp = sp;
        Ok(h)
    }

    fn dump_upvalue(&mut self, u: &rt::Upvalue, hint: &str) -> SnapshotResult<Handle> {
        let addr = u.address();
        if let Some(h) = self.visited(addr, hint) {
            return Ok(h);
        }
        let h = self.identity.intern(Some(addr), hint);
        self.data.upvalues.insert(
            h.clone(),
            Upvalue {
                next: Handle::nil(),
                reg: Handle::nil(),
                index: 0,
                value: Value::nil(),
                closed: false,
            },
        );

        let data = u.0.borrow();
        let next = self.dump_upvalue_opt(data.next.as_ref(), &format!("{hint}.next"))?;
        let (reg, index, value, closed) = if data.closed {
            let value = self.dump_value(&data.value, &format!("{hint}.value"))?;
            (Handle::nil(), data.index, value, true)
        } else {
            let reg = data
                .reg
                .as_ref()
                .expect("an open upvalue always has a register window");
            let reg_h = self.dump_registry(reg, &format!("{hint}.reg"))?;
            (reg_h, data.index, Value::nil(), false)
        };
        drop(data);

        let node = self
            .data
            .upvalues
            .get_mut(&h)
            .expect("shell was just inserted");
        node.next = next;
        node.reg = reg;
        node.index = index;
        node.value = value;
        node.closed = closed;
        Ok(h)
    }

    fn dump_upvalue_opt(&mut self, u: Option<&rt::Upvalue>, hint: &str) -> SnapshotResult<Handle> {
        match u {
            Some(u) => self.dump_upvalue(u, hint),
            None => Ok(Handle::nil()),
        }
    }

    fn dump_closure(&mut self, c: &rt::Closure, hint: &str) -> SnapshotResult<Handle> {
        let addr = c.address();
        if let Some(h) = self.visited(addr, hint) {
            return Ok(h);
        }
        let h = self.identity.intern(Some(addr), hint);
        self.data.functions.insert(
            h.clone(),
            Function {
                is_g: false,
                env: Handle::nil(),
                proto: Handle::nil(),
                g_function: Handle::nil(),
                upvalues: Vec::new(),
            },
        );

        let data = c.0.borrow();
        let is_g = data.is_g;
        let env = self.dump_table(&data.env, &format!("{hint}.env"))?;
        let proto = match &data.proto {
            Some(p) => self.dump_function_proto(p, &format!("{hint}.proto"))?,
            None => Handle::nil(),
        };
        let g_function = match &data.native {
            Some(native) => {
                let handle = self.callback_codec.dump(&**native)?;
                if let Some(desc) = self.callback_codec.describe(&handle) {
                    self.data.g_functions.entry(handle.clone()).or_insert(desc);
                }
                handle
            }
            None => Handle::nil(),
        };
        let mut upvalues = Vec::with_capacity(data.upvalues.len());
        for (i, uv) in data.upvalues.iter().enumerate() {
            upvalues.push(self.dump_upvalue(uv, &format!("{hint}.upvalues.[{i}]"))?);
        }
        drop(data);

        let node = self
            .data
            .functions
            .get_mut(&h)
            .expect("shell was just inserted");
        node.is_g = is_g;
        node.env = env;
        node.proto = proto;
        node.g_function = g_function;
        node.upvalues = upvalues;
        Ok(h)
    }

    /// Prototypes form an acyclic DAG — a nested prototype never refers
    /// back to an ancestor — so there is no cycle to cut and no need for
    /// a fill-after-insert shell; the node is built fully and inserted
    /// once built, deduplicated purely so a prototype shared by several
    /// closures is only emitted once.
    fn dump_function_proto(&mut self, p: &rt::Prototype, hint: &str) -> SnapshotResult<Handle> {
        let addr = p.address();
        if let Some(h) = self.visited(addr, hint) {
            return Ok(h);
        }
        let h = self.identity.intern(Some(addr), hint);

        let data = &p.0;
        let mut constants = Vec::with_capacity(data.constants.len());
        for (i, v) in data.constants.iter().enumerate() {
            constants.push(self.dump_value(v, &format!("{hint}.constants.[{i}]"))?);
        }
        let mut function_prototypes = Vec::with_capacity(data.prototypes.len());
        for (i, np) in data.prototypes.iter().enumerate() {
            function_prototypes
                .push(self.dump_function_proto(np, &format!("{hint}.prototypes.[{i}]"))?);
        }
        let mut dbg_locals = Vec::with_capacity(data.dbg_locals.len());
        for (i, lv) in data.dbg_locals.iter().enumerate() {
            dbg_locals.push(self.dump_dbg_local_info(lv, &format!("{hint}.dbgLocals.[{i}]"))?);
        }
        let dbg_calls = data
            .dbg_calls
            .iter()
            .map(|c| DbgCall {
                pc: c.pc,
                name: c.name.clone(),
            })
            .collect();

        self.data.function_protos.insert(
            h.clone(),
            FunctionProto {
                source_name: data.source_name.clone(),
                line_defined: data.line_defined,
                last_line_defined: data.last_line_defined,
                num_upvalues: data.num_upvalues,
                num_parameters: data.num_parameters,
                is_vararg: data.is_vararg,
                num_used_registers: data.num_used_registers,
                code: data.code.clone(),
                constants,
                function_prototypes,
                dbg_source_positions: data.dbg_source_positions.clone(),
                dbg_upvalues: data.dbg_upvalues.clone(),
                string_constants: data.string_constants.clone(),
                dbg_calls,
                dbg_locals,
            },
        );
        Ok(h)
    }

    fn dump_dbg_local_info(
        &mut self,
        lv: &rt::LocalVarInfo,
        hint: &str,
    ) -> SnapshotResult<Handle> {
        let addr = lv.address();
        if let Some(h) = self.visited(addr, hint) {
            return Ok(h);
        }
        let h = self.identity.intern(Some(addr), hint);
        self.data.dbg_local_infos.insert(
            h.clone(),
            DbgLocalInfo {
                name: lv.0.name.clone(),
                start_pc: lv.0.start_pc,
                end_pc: lv.0.end_pc,
            },
        );
        Ok(h)
    }

    fn dump_user_data(&mut self, u: &rt::UserData, hint: &str) -> SnapshotResult<Handle> {
        let addr = u.address();
        if let Some(h) = self.visited(addr, hint) {
            return Ok(h);
        }
        let h = self.identity.intern(Some(addr), hint);
        let node = self.user_codec.dump(u)?;
        self.data.user_data.insert(h.clone(), node);
        Ok(h)
    }

    fn dump_thread(&mut self, t: &rt::Thread, hint: &str) -> SnapshotResult<Handle> {
        let addr = t.address();
        if let Some(h) = self.visited(addr, hint) {
            return Ok(h);
        }
        let h = self.identity.intern(Some(addr), hint);
        self.data.states.insert(
            h.clone(),
            State {
                g: Handle::nil(),
                parent: Handle::nil(),
                env: Handle::nil(),
                options: WireOptions {
                    call_stack_size: 0,
                    registry_size: 0,
                    skip_open_libs: false,
                    include_go_stack_trace: false,
                },
                dead: false,
                stop: 0,
                reg: Handle::nil(),
                stack: Handle::nil(),
                current_frame: Handle::nil(),
                wrapped: false,
                uv_cache: Handle::nil(),
                has_error_func: false,
            },
        );

        let data = t.0.borrow();
        let g = self.dump_global(&data.g)?;
        let parent = self.dump_thread_opt(data.parent.as_ref(), &format!("{hint}.parent"))?;
        let env = self.dump_table(&data.env, &format!("{hint}.env"))?;
        let options = WireOptions {
            call_stack_size: data.options.call_stack_size,
            registry_size: data.options.registry_size,
            skip_open_libs: data.options.skip_open_libs,
            include_go_stack_trace: data.options.include_go_stack_trace,
        };
        let dead = data.dead;
        let stop = data.stop;
        let reg = self.dump_registry(&data.reg, &format!("{hint}.reg"))?;
        let stack = self.dump_call_frame_stack(&data.stack, &format!("{hint}.stack"))?;
        let current_frame =
            self.dump_call_frame_opt(data.current_frame.as_ref(), &format!("{hint}.currentFrame"))?;
        let wrapped = data.wrapped;
        let uv_cache = self.dump_upvalue_opt(data.uv_cache.as_ref(), &format!("{hint}.uvcache"))?;
        let has_error_func = data.has_error_func;
        drop(data);

        let node = self.data.states.get_mut(&h).expect("shell was just inserted");
        node.g = g;
        node.parent = parent;
        node.env = env;
        node.options = options;
        node.dead = dead;
        node.stop = stop;
        node.reg = reg;
        node.stack = stack;
        node.current_frame = current_frame;
        node.wrapped = wrapped;
        node.uv_cache = uv_cache;
        node.has_error_func = has_error_func;
        Ok(h)
    }

    fn dump_thread_opt(&mut self, t: Option<&rt::Thread>, hint: &str) -> SnapshotResult<Handle> {
        match t {
            Some(t) => self.dump_thread(t, hint),
            None => Ok(Handle::nil()),
        }
    }

    /// Global is a singleton within a dump: once one handle has been
    /// interned for it, every other reachable `rt::Global` must be the
    /// same address, or the graph is malformed.
    fn dump_global(&mut self, g: &rt::Global) -> SnapshotResult<Handle> {
        let addr = g.address();
        if let Some(h) = self.visited(addr, "global") {
            return Ok(h);
        }
        if !self.data.g.is_empty() {
            return Err(crate::error::SnapshotError::structural(
                "more than one Global reached during a single dump",
                "global",
            ));
        }
        let h = self.identity.intern(Some(addr), "global");
        self.data.g.insert(
            h.clone(),
            Global {
                main_thread: Handle::nil(),
                current_thread: Handle::nil(),
                registry: Handle::empty(),
                global: Handle::empty(),
                builtin_mts: IndexMap::new(),
                gccount: 0,
            },
        );

        let main_thread =
            self.dump_thread_opt(g.0.main_thread.borrow().as_ref(), "mainThread")?;
        let current_thread =
            self.dump_thread_opt(g.0.current_thread.borrow().as_ref(), "currentThread")?;
        let registry = self.dump_table(&g.0.registry, "registry")?;
        let global = self.dump_table(&g.0.global, "global.table")?;
        let mut builtin_mts = IndexMap::new();
        for (k, v) in g.0.builtin_mts.borrow().iter() {
            let value = self.dump_value(v, &format!("global.builtinMts.[{k}]"))?;
            builtin_mts.insert(k.clone(), value);
        }
        let gccount = g.0.gccount.get();

        let node = self.data.g.get_mut(&h).expect("shell was just inserted");
        node.main_thread = main_thread;
        node.current_thread = current_thread;
        node.registry = registry;
        node.global = global;
        node.builtin_mts = builtin_mts;
        node.gccount = gccount;
        Ok(h)
    }
}
