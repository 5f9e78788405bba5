//! The two-phase loader: turns a [`crate::document::Data`] document back
//! into a live, cyclic object graph rooted at a [`crate::runtime::Thread`].
//!
//! Phase A (`build_shells`) allocates one empty, placeholder-filled live
//! object per handle in every cyclic bucket, so that phase B can resolve
//! a forward or back reference to an object that does not have its real
//! contents yet — it gets the shared `Rc` regardless, and fills it in
//! once its own turn comes up. Phase B (the `fill_*` methods, driven from
//! `resolve_*`) then walks the document depth-first starting at
//! `Global.current_thread`, replacing each shell's body wholesale via
//! `*shell.0.borrow_mut() = real_data` once every handle it depends on
//! has itself been resolved (possibly also still mid-fill, for a cycle).
//!
//! Acyclic kinds (FunctionProto, DbgLocalInfo, UserData) need no shell:
//! they are built once, memoized by handle, and never touched again.
//!
//! Every Call Frame is loaded twice, deliberately: once as a free-standing
//! shell reached through a `parent`/`current_frame` handle, and again, by
//! value, as a Call-Frame Stack array element. `crate::fixup` reconciles
//! the two after a Thread's stack and current frame are both filled.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::codec::{LoadOptions, NativeCallbackCodec, UserDataCodec};
use crate::document::{Data, Value as WireValue, ValueType};
use crate::error::{SnapshotError, SnapshotResult};
use crate::fixup;
use crate::identity::Handle;
use crate::runtime as rt;

/// Loads `data` into a fresh, live object graph and returns the Thread
/// that was executing at dump time (`Global.current_thread`).
pub fn load(
    data: &Data,
    user_codec: &dyn UserDataCodec,
    callback_codec: &dyn NativeCallbackCodec,
    options: LoadOptions,
) -> SnapshotResult<rt::Thread> {
    let mut loader = Loader::new(data, user_codec, callback_codec, options);
    loader.build_shells()?;

    let g_handle = loader.global_handle.clone().expect("set by build_shells");
    let current_handle = data
        .g
        .get(&g_handle)
        .expect("validated by build_shells")
        .current_thread
        .clone();
    if current_handle.is_nil() || current_handle.is_empty() {
        return Err(SnapshotError::structural(
            "Global.current_thread is absent; nothing to resume",
            "g.currentThread",
        ));
    }
    let current_thread = loader
        .threads
        .get(&current_handle)
        .cloned()
        .ok_or_else(|| {
            SnapshotError::missing_handle("States", current_handle.clone(), "g.currentThread")
        })?;
    loader.context_thread = Some(current_thread.clone());

    let global = loader.global.clone().expect("built by build_shells");
    global.set_current_thread(current_thread.clone());

    loader.fill_thread(&current_handle, "g.currentThread")?;
    loader.finish_global(&g_handle)?;

    Ok(current_thread)
}

/// A throwaway callback used only as a shell's placeholder `Closure`
/// before the real closure (native or interpreted) replaces it. Never
/// observed past phase A: every Frame shell's `closure` field is
/// overwritten before `load` returns.
#[derive(Debug)]
struct ShellCallback;

impl rt::NativeCallback for ShellCallback {}

fn shell_closure() -> rt::Closure {
    rt::Closure::native(rt::Table::new(), Rc::new(ShellCallback))
}

struct Loader<'a> {
    data: &'a Data,
    user_codec: &'a dyn UserDataCodec,
    callback_codec: &'a dyn NativeCallbackCodec,
    options: LoadOptions,

    tables: HashMap<Handle, rt::Table>,
    registries: HashMap<Handle, rt::Registry>,
    upvalues: HashMap<Handle, rt::Upvalue>,
    closures: HashMap<Handle, rt::Closure>,
    call_frames: HashMap<Handle, rt::Frame>,
    call_frame_stacks: HashMap<Handle, rt::CallFrameStack>,
    threads: HashMap<Handle, rt::Thread>,

    filled_tables: HashSet<Handle>,
    filled_registries: HashSet<Handle>,
    filled_upvalues: HashSet<Handle>,
    filled_closures: HashSet<Handle>,
    filled_call_frames: HashSet<Handle>,
    filled_call_frame_stacks: HashSet<Handle>,
    filled_threads: HashSet<Handle>,

    prototypes: HashMap<Handle, rt::Prototype>,
    dbg_locals: HashMap<Handle, rt::LocalVarInfo>,
    resolved_user_data: HashMap<Handle, rt::UserData>,

    /// Per Call-Frame Stack handle, a map from a standalone frame's
    /// address to the in-array frame it was duplicated into while that
    /// stack was filled. Consumed by `crate::fixup` once a Thread's stack
    /// and current frame are both loaded.
    canonical_frames: HashMap<Handle, HashMap<usize, rt::Frame>>,

    global: Option<rt::Global>,
    global_handle: Option<Handle>,

    /// The Thread passed to `UserDataCodec::load` for every piece of user
    /// data resolved during this load, regardless of where in the graph
    /// it is reached from. Set once, to `Global.current_thread`, before
    /// phase B begins.
    context_thread: Option<rt::Thread>,
}

impl<'a> Loader<'a> {
    fn new(
        data: &'a Data,
        user_codec: &'a dyn UserDataCodec,
        callback_codec: &'a dyn NativeCallbackCodec,
        options: LoadOptions,
    ) -> Self {
        Self {
            data,
            user_codec,
            callback_codec,
            options,
            tables: HashMap::new(),
            registries: HashMap::new(),
            upvalues: HashMap::new(),
            closures: HashMap::new(),
            call_frames: HashMap::new(),
            call_frame_stacks: HashMap::new(),
            threads: HashMap::new(),
            filled_tables: HashSet::new(),
            filled_registries: HashSet::new(),
            filled_upvalues: HashSet::new(),
            filled_closures: HashSet::new(),
            filled_call_frames: HashSet::new(),
            filled_call_frame_stacks: HashSet::new(),
            filled_threads: HashSet::new(),
            prototypes: HashMap::new(),
            dbg_locals: HashMap::new(),
            resolved_user_data: HashMap::new(),
            canonical_frames: HashMap::new(),
            global: None,
            global_handle: None,
            context_thread: None,
        }
    }

    /// Phase A: allocates one empty shell per handle, in dependency order
    /// (tables before the Global that embeds two of them; Global before
    /// the Threads that point back at it).
    fn build_shells(&mut self) -> SnapshotResult<()> {
        let data = self.data;

        for handle in data.tables.keys() {
            self.tables.insert(handle.clone(), rt::Table::new());
        }
        for handle in data.registries.keys() {
            self.registries
                .insert(handle.clone(), rt::Registry::with_capacity(0));
        }
        for handle in data.upvalues.keys() {
            self.upvalues.insert(
                handle.clone(),
                rt::Upvalue::open(rt::Registry::with_capacity(0), 0),
            );
        }
        for handle in data.functions.keys() {
            self.closures
                .insert(handle.clone(), shell_closure());
        }
        for handle in data.call_frames.keys() {
            self.call_frames.insert(
                handle.clone(),
                rt::Frame(Rc::new(RefCell::new(rt::FrameData {
                    idx: 0,
                    closure: shell_closure(),
                    parent: None,
                    pc: 0,
                    base: 0,
                    local_base: 0,
                    return_base: 0,
                    n_args: 0,
                    n_ret: 0,
                    tail_call: 0,
                }))),
            );
        }
        for handle in data.call_frame_stacks.keys() {
            self.call_frame_stacks
                .insert(handle.clone(), rt::CallFrameStack::with_capacity(0));
        }

        if data.g.len() > 1 {
            return Err(SnapshotError::structural(
                "document has more than one Global",
                "g",
            ));
        }
        let (g_handle, g_node) = data
            .g
            .iter()
            .next()
            .ok_or_else(|| SnapshotError::structural("document has no Global", "g"))?;
        let registry = self.tables.get(&g_node.registry).cloned().ok_or_else(|| {
            SnapshotError::missing_handle("Tables", g_node.registry.clone(), "g.registry")
        })?;
        let global_table = self.tables.get(&g_node.global).cloned().ok_or_else(|| {
            SnapshotError::missing_handle("Tables", g_node.global.clone(), "g.global")
        })?;
        let global = rt::Global(Rc::new(rt::GlobalData {
            main_thread: RefCell::new(None),
            current_thread: RefCell::new(None),
            registry,
            global: global_table,
            builtin_mts: RefCell::new(IndexMap::new()),
            gccount: Cell::new(0),
        }));
        self.global = Some(global.clone());
        self.global_handle = Some(g_handle.clone());

        for handle in data.states.keys() {
            self.threads
                .insert(handle.clone(), rt::Thread::shell(global.clone()));
        }

        Ok(())
    }

    // ---- Value ----------------------------------------------------

    fn load_value(&mut self, v: &WireValue, path: &str) -> SnapshotResult<rt::Value> {
        let Some(kind) = ValueType::from_tag(v.type_) else {
            if self.options.strict_value_tags {
                return Err(SnapshotError::unsupported_value_type(
                    v.type_ as i64,
                    path.to_string(),
                ));
            }
            log::warn!(
                "loader: unrecognized value tag {} at {path}, coercing to Nil",
                v.type_
            );
            return Ok(rt::Value::Nil);
        };
        match kind {
            ValueType::Nil => Ok(rt::Value::Nil),
            ValueType::Bool => Ok(rt::Value::Bool(v.bool)),
            ValueType::Number => Ok(rt::Value::Number(v.number)),
            ValueType::String => {
                let s = v.string.as_deref().ok_or_else(|| {
                    SnapshotError::structural(
                        "String-tagged value has no String payload",
                        path.to_string(),
                    )
                })?;
                Ok(rt::Value::Str(Rc::from(s)))
            }
            ValueType::Table => {
                let h = self.pointer_handle(v, path)?;
                Ok(rt::Value::Table(self.resolve_table(&h, path)?))
            }
            ValueType::Function => {
                let h = self.pointer_handle(v, path)?;
                Ok(rt::Value::Closure(self.resolve_closure(&h, path)?))
            }
            ValueType::UserData => {
                let h = self.pointer_handle(v, path)?;
                Ok(rt::Value::UserData(self.resolve_user_data(&h, path)?))
            }
            ValueType::Thread => {
                let h = self.pointer_handle(v, path)?;
                Ok(rt::Value::Thread(self.resolve_thread(&h, path)?))
            }
        }
    }

    fn pointer_handle(&self, v: &WireValue, path: &str) -> SnapshotResult<Handle> {
        v.as_handle()
            .cloned()
            .ok_or_else(|| SnapshotError::structural("pointer-kind value has no Ptr", path.to_string()))
    }

    // ---- Table ------------------------------------------------------

    fn resolve_table(&mut self, handle: &Handle, path: &str) -> SnapshotResult<rt::Table> {
        let table = self
            .tables
            .get(handle)
            .cloned()
            .ok_or_else(|| SnapshotError::missing_handle("Tables", handle.clone(), path.to_string()))?;
        self.fill_table(handle, path)?;
        Ok(table)
    }

    fn fill_table(&mut self, handle: &Handle, path: &str) -> SnapshotResult<()> {
        if !self.filled_tables.insert(handle.clone()) {
            return Ok(());
        }
        let data = self.data;
        let node = data
            .tables
            .get(handle)
            .ok_or_else(|| SnapshotError::missing_handle("Tables", handle.clone(), path.to_string()))?;

        let metatable = if node.metatable.is_nil() {
            None
        } else {
            let h = self.pointer_handle(&node.metatable, &format!("{path}.metatable"))?;
            Some(self.resolve_table(&h, &format!("{path}.metatable"))?)
        };

        let mut array = Vec::with_capacity(node.array.len());
        for (i, v) in node.array.iter().enumerate() {
            array.push(self.load_value(v, &format!("{path}.[{}]", i + 1))?);
        }

        let mut dict = Vec::with_capacity(node.dict.len());
        for (i, kv) in node.dict.iter().enumerate() {
            let key = self.load_value(&kv.key, &format!("{path}.dict.[{i}].key"))?;
            let value = self.load_value(&kv.value, &format!("{path}.dict.[{i}].value"))?;
            dict.push((key, value));
        }

        let mut strdict = IndexMap::new();
        for (k, v) in node.strdict.iter() {
            let value = self.load_value(v, &format!("{path}.[{k}]"))?;
            strdict.insert(Rc::from(k.as_str()), value);
        }

        let table = self.tables.get(handle).expect("allocated in phase A").clone();
        *table.0.borrow_mut() = rt::TableData {
            metatable,
            array,
            dict,
            strdict,
        };
        Ok(())
    }

    // ---- Registry -----------------------------------------------------

    fn resolve_registry(&mut self, handle: &Handle, path: &str) -> SnapshotResult<rt::Registry> {
        let registry = self.registries.get(handle).cloned().ok_or_else(|| {
            SnapshotError::missing_handle("Registries", handle.clone(), path.to_string())
        })?;
        self.fill_registry(handle, path)?;
        Ok(registry)
    }

    fn fill_registry(&mut self, handle: &Handle, path: &str) -> SnapshotResult<()> {
        if !self.filled_registries.insert(handle.clone()) {
            return Ok(());
        }
        let data = self.data;
        let node = data.registries.get(handle).ok_or_else(|| {
            SnapshotError::missing_handle("Registries", handle.clone(), path.to_string())
        })?;
        let len = node.len;
        let top = node.top;
        let mut slots = Vec::with_capacity(len);
        for (i, v) in node.array.iter().enumerate() {
            slots.push(self.load_value(v, &format!("{path}.[{i}]"))?);
        }
        while slots.len() < len {
            slots.push(rt::Value::Nil);
        }
        let registry = self.registries.get(handle).expect("allocated in phase A").clone();
        *registry.0.borrow_mut() = rt::RegistryData { slots, top };
        Ok(())
    }

    // ---- Upvalue -----------------------------------------------------

    fn resolve_upvalue_opt(
        &mut self,
        handle: &Handle,
        path: &str,
    ) -> SnapshotResult<Option<rt::Upvalue>> {
        if handle.is_nil() || handle.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.resolve_upvalue(handle, path)?))
    }

    fn resolve_upvalue(&mut self, handle: &Handle, path: &str) -> SnapshotResult<rt::Upvalue> {
        let uv = self
            .upvalues
            .get(handle)
            .cloned()
            .ok_or_else(|| SnapshotError::missing_handle("Upvalues", handle.clone(), path.to_string()))?;
        self.fill_upvalue(handle, path)?;
        Ok(uv)
    }

    fn fill_upvalue(&mut self, handle: &Handle, path: &str) -> SnapshotResult<()> {
        if !self.filled_upvalues.insert(handle.clone()) {
            return Ok(());
        }
        let data = self.data;
        let node = data
            .upvalues
            .get(handle)
            .ok_or_else(|| SnapshotError::missing_handle("Upvalues", handle.clone(), path.to_string()))?;

        let next = self.resolve_upvalue_opt(&node.next, &format!("{path}.next"))?;
        let index = node.index;
        let closed = node.closed;
        let (reg, value) = if closed {
            (None, self.load_value(&node.value, &format!("{path}.value"))?)
        } else {
            if node.reg.is_nil() || node.reg.is_empty() {
                return Err(SnapshotError::structural(
                    "open upvalue has no register window",
                    path.to_string(),
                ));
            }
            let reg = self.resolve_registry(&node.reg, &format!("{path}.reg"))?;
            (Some(reg), rt::Value::Nil)
        };

        let uv = self.upvalues.get(handle).expect("allocated in phase A").clone();
        *uv.0.borrow_mut() = rt::UpvalueData {
            next,
            reg,
            index,
            value,
            closed,
        };
        Ok(())
    }

    // ---- Closure (Function) ------------------------------------------

    fn resolve_closure(&mut self, handle: &Handle, path: &str) -> SnapshotResult<rt::Closure> {
        let closure = self.closures.get(handle).cloned().ok_or_else(|| {
            SnapshotError::missing_handle("Functions", handle.clone(), path.to_string())
        })?;
        self.fill_closure(handle, path)?;
        Ok(closure)
    }

    fn fill_closure(&mut self, handle: &Handle, path: &str) -> SnapshotResult<()> {
        if !self.filled_closures.insert(handle.clone()) {
            return Ok(());
        }
        let data = self.data;
        let node = data.functions.get(handle).ok_or_else(|| {
            SnapshotError::missing_handle("Functions", handle.clone(), path.to_string())
        })?;

        let is_g = node.is_g;
        let env = self.resolve_table(&node.env, &format!("{path}.env"))?;

        let (proto, native) = if is_g {
            let callback = self
                .callback_codec
                .load(&node.g_function)
                .map_err(|e| e.with_path_prefix(path))?;
            (None, Some(callback))
        } else {
            if node.proto.is_nil() || node.proto.is_empty() {
                return Err(SnapshotError::structural(
                    "interpreted closure has no prototype",
                    path.to_string(),
                ));
            }
            let proto = self.resolve_function_proto(&node.proto, &format!("{path}.proto"))?;
            (Some(proto), None)
        };

        let mut upvalues = Vec::with_capacity(node.upvalues.len());
        for (i, h) in node.upvalues.iter().enumerate() {
            upvalues.push(self.resolve_upvalue(h, &format!("{path}.upvalues.[{i}]"))?);
        }

        let closure = self.closures.get(handle).expect("allocated in phase A").clone();
        *closure.0.borrow_mut() = rt::ClosureData {
            is_g,
            env,
            proto,
            native,
            upvalues,
        };
        Ok(())
    }

    // ---- FunctionProto / DbgLocalInfo (acyclic, memoized) -----------

    fn resolve_function_proto(&mut self, handle: &Handle, path: &str) -> SnapshotResult<rt::Prototype> {
        if let Some(p) = self.prototypes.get(handle) {
            return Ok(p.clone());
        }
        let data = self.data;
        let node = data.function_protos.get(handle).ok_or_else(|| {
            SnapshotError::missing_handle("FunctionProtos", handle.clone(), path.to_string())
        })?;

        let mut constants = Vec::with_capacity(node.constants.len());
        for (i, v) in node.constants.iter().enumerate() {
            constants.push(self.load_value(v, &format!("{path}.constants.[{i}]"))?);
        }
        let mut prototypes = Vec::with_capacity(node.function_prototypes.len());
        for (i, h) in node.function_prototypes.iter().enumerate() {
            prototypes
                .push(self.resolve_function_proto(h, &format!("{path}.prototypes.[{i}]"))?);
        }
        let mut dbg_locals = Vec::with_capacity(node.dbg_locals.len());
        for (i, h) in node.dbg_locals.iter().enumerate() {
            dbg_locals.push(self.resolve_dbg_local_info(h, &format!("{path}.dbgLocals.[{i}]"))?);
        }
        let dbg_calls = node
            .dbg_calls
            .iter()
            .map(|c| rt::DbgCall {
                pc: c.pc,
                name: c.name.clone(),
            })
            .collect();

        let proto = rt::Prototype(Rc::new(rt::PrototypeData {
            source_name: node.source_name.clone(),
            line_defined: node.line_defined,
            last_line_defined: node.last_line_defined,
            num_upvalues: node.num_upvalues,
            num_parameters: node.num_parameters,
            is_vararg: node.is_vararg,
            num_used_registers: node.num_used_registers,
            code: node.code.clone(),
            constants,
            prototypes,
            dbg_source_positions: node.dbg_source_positions.clone(),
            dbg_upvalues: node.dbg_upvalues.clone(),
            string_constants: node.string_constants.clone(),
            dbg_calls,
            dbg_locals,
        }));
        self.prototypes.insert(handle.clone(), proto.clone());
        Ok(proto)
    }

    fn resolve_dbg_local_info(
        &mut self,
        handle: &Handle,
        path: &str,
    ) -> SnapshotResult<rt::LocalVarInfo> {
        if let Some(lv) = self.dbg_locals.get(handle) {
            return Ok(lv.clone());
        }
        let data = self.data;
        let node = data.dbg_local_infos.get(handle).ok_or_else(|| {
            SnapshotError::missing_handle("DbgLocalInfos", handle.clone(), path.to_string())
        })?;
        let lv = rt::LocalVarInfo(Rc::new(rt::LocalVarInfoData {
            name: node.name.clone(),
            start_pc: node.start_pc,
            end_pc: node.end_pc,
        }));
        self.dbg_locals.insert(handle.clone(), lv.clone());
        Ok(lv)
    }

    // ---- UserData (acyclic, memoized, codec-delegated) --------------

    fn resolve_user_data(&mut self, handle: &Handle, path: &str) -> SnapshotResult<rt::UserData> {
        if let Some(u) = self.resolved_user_data.get(handle) {
            return Ok(u.clone());
        }
        let data = self.data;
        let node = data.user_data.get(handle).ok_or_else(|| {
            SnapshotError::missing_handle("UserData", handle.clone(), path.to_string())
        })?;
        let thread = self
            .context_thread
            .clone()
            .expect("context thread is set before phase B begins");
        let ud = self
            .user_codec
            .load(&thread, node)
            .map_err(|e| e.with_path_prefix(path))?;
        self.resolved_user_data.insert(handle.clone(), ud.clone());
        Ok(ud)
    }

    // ---- CallFrame / CallFrameStack -----------------------------------

    fn resolve_call_frame_opt(
        &mut self,
        handle: &Handle,
        path: &str,
    ) -> SnapshotResult<Option<rt::Frame>> {
        if handle.is_nil() || handle.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.resolve_call_frame(handle, path)?))
    }

    fn resolve_call_frame(&mut self, handle: &Handle, path: &str) -> SnapshotResult<rt::Frame> {
        let frame = self.call_frames.get(handle).cloned().ok_or_else(|| {
            SnapshotError::missing_handle("CallFrames", handle.clone(), path.to_string())
        })?;
        self.fill_call_frame(handle, path)?;
        Ok(frame)
    }

    fn fill_call_frame(&mut self, handle: &Handle, path: &str) -> SnapshotResult<()> {
        if !self.filled_call_frames.insert(handle.clone()) {
            return Ok(());
        }
        let data = self.data;
        let node = data.call_frames.get(handle).ok_or_else(|| {
            SnapshotError::missing_handle("CallFrames", handle.clone(), path.to_string())
        })?;

        let closure = self.resolve_closure(&node.fn_, &format!("{path}.fn"))?;
        let parent = self.resolve_call_frame_opt(&node.parent, &format!("{path}.parent"))?;
        let (idx, pc, base, local_base, return_base, n_args, n_ret, tail_call) = (
            node.idx,
            node.pc,
            node.base,
            node.local_base,
            node.return_base,
            node.n_args,
            node.n_ret,
            node.tail_call,
        );

        let frame = self.call_frames.get(handle).expect("allocated in phase A").clone();
        *frame.0.borrow_mut() = rt::FrameData {
            idx,
            closure,
            parent,
            pc,
            base,
            local_base,
            return_base,
            n_args,
            n_ret,
            tail_call,
        };
        Ok(())
    }

    fn resolve_call_frame_stack(
        &mut self,
        handle: &Handle,
        path: &str,
    ) -> SnapshotResult<rt::CallFrameStack> {
        let stack = self.call_frame_stacks.get(handle).cloned().ok_or_else(|| {
            SnapshotError::missing_handle("CallFrameStacks", handle.clone(), path.to_string())
        })?;
        self.fill_call_frame_stack(handle, path)?;
        Ok(stack)
    }

    /// Fills a Call-Frame Stack, duplicating each occupied slot's frame
    /// (already resolved as a free-standing shell) into a fresh, canonical
    /// in-array `Frame`. The duplication is deliberate — see this module's
    /// doc comment — and is reconciled by `crate::fixup` once the owning
    /// Thread's stack and current frame are both filled.
    fn fill_call_frame_stack(&mut self, handle: &Handle, path: &str) -> SnapshotResult<()> {
        if !self.filled_call_frame_stacks.insert(handle.clone()) {
            return Ok(());
        }
        let data = self.data;
        let node = data.call_frame_stacks.get(handle).ok_or_else(|| {
            SnapshotError::missing_handle("CallFrameStacks", handle.clone(), path.to_string())
        })?;

        let mut frames = Vec::with_capacity(node.len);
        let mut canonical = HashMap::new();
        for (i, h) in node.array.iter().enumerate() {
            if h.is_nil() || h.is_empty() {
                frames.push(None);
                continue;
            }
            self.resolve_call_frame(h, &format!("{path}.array.[{i}]"))?;
            let standalone = self.call_frames.get(h).expect("resolved above").clone();
            let in_array = rt::Frame(Rc::new(RefCell::new(standalone.0.borrow().clone())));
            canonical.insert(standalone.address(), in_array.clone());
            frames.push(Some(in_array));
        }
        while frames.len() < node.len {
            frames.push(None);
        }
        let sp = node.sp;

        let stack = self
            .call_frame_stacks
            .get(handle)
            .expect("allocated in phase A")
            .clone();
        *stack.0.borrow_mut() = rt::CallFrameStackData { frames, sp };
        self.canonical_frames.insert(handle.clone(), canonical);
        Ok(())
    }

    // ---- Thread / Global ----------------------------------------------

    fn resolve_thread_opt(
        &mut self,
        handle: &Handle,
        path: &str,
    ) -> SnapshotResult<Option<rt::Thread>> {
        if handle.is_nil() || handle.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.resolve_thread(handle, path)?))
    }

    fn resolve_thread(&mut self, handle: &Handle, path: &str) -> SnapshotResult<rt::Thread> {
        let thread = self.threads.get(handle).cloned().ok_or_else(|| {
            SnapshotError::missing_handle("States", handle.clone(), path.to_string())
        })?;
        self.fill_thread(handle, path)?;
        Ok(thread)
    }

    fn fill_thread(&mut self, handle: &Handle, path: &str) -> SnapshotResult<()> {
        if !self.filled_threads.insert(handle.clone()) {
            return Ok(());
        }
        let data = self.data;
        let node = data
            .states
            .get(handle)
            .ok_or_else(|| SnapshotError::missing_handle("States", handle.clone(), path.to_string()))?;

        // `g` is the singleton Global already built in phase A; every
        // Thread in a document shares it, so resolving by handle here is
        // just a consistency check, not a fresh construction.
        let g_handle = self.global_handle.clone().expect("set by build_shells");
        if node.g != g_handle {
            return Err(SnapshotError::structural(
                "Thread.G does not reference the document's singleton Global",
                format!("{path}.g"),
            ));
        }
        let g = self.global.clone().expect("built by build_shells");

        let parent = self.resolve_thread_opt(&node.parent, &format!("{path}.parent"))?;
        let env = self.resolve_table(&node.env, &format!("{path}.env"))?;
        let options = rt::Options {
            call_stack_size: node.options.call_stack_size,
            registry_size: node.options.registry_size,
            skip_open_libs: node.options.skip_open_libs,
            include_go_stack_trace: self
                .options
                .force_host_stack_trace
                .unwrap_or(node.options.include_go_stack_trace),
        };
        let dead = node.dead;
        let stop = node.stop;
        let reg = self.resolve_registry(&node.reg, &format!("{path}.reg"))?;
        let stack_handle = node.stack.clone();
        let stack = self.resolve_call_frame_stack(&stack_handle, &format!("{path}.stack"))?;
        let mut current_frame =
            self.resolve_call_frame_opt(&node.current_frame, &format!("{path}.currentFrame"))?;
        let wrapped = node.wrapped;
        let uv_cache = self.resolve_upvalue_opt(&node.uv_cache, &format!("{path}.uvcache"))?;
        let has_error_func = node.has_error_func;

        let empty = HashMap::new();
        let canonical = self.canonical_frames.get(&stack_handle).unwrap_or(&empty);
        fixup::reseat(canonical, &mut current_frame, &stack);

        let thread = self.threads.get(handle).expect("allocated in phase A").clone();
        *thread.0.borrow_mut() = rt::ThreadData {
            g,
            parent,
            env,
            options,
            dead,
            stop,
            reg,
            stack,
            current_frame,
            wrapped,
            uv_cache,
            has_error_func,
        };
        Ok(())
    }

    /// Fills the remaining Global fields once the current thread (and
    /// everything it reaches) has been loaded: the main thread, the
    /// registry/global tables (already shared with their shells, but not
    /// necessarily filled if nothing else reached them), the builtin
    /// metatables and the GC generation counter.
    fn finish_global(&mut self, handle: &Handle) -> SnapshotResult<()> {
        let data = self.data;
        let node = data
            .g
            .get(handle)
            .ok_or_else(|| SnapshotError::missing_handle("G", handle.clone(), "g".to_string()))?;
        let main_thread_h = node.main_thread.clone();
        let registry_h = node.registry.clone();
        let global_h = node.global.clone();
        let gccount = node.gccount;
        let builtin_mts_src: Vec<(String, WireValue)> = node
            .builtin_mts
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let main_thread = self.resolve_thread_opt(&main_thread_h, "g.mainThread")?;
        self.resolve_table(&registry_h, "g.registry")?;
        self.resolve_table(&global_h, "g.global")?;

        let mut builtin_mts = IndexMap::new();
        for (k, v) in builtin_mts_src {
            let value = self.load_value(&v, &format!("g.builtinMts.[{k}]"))?;
            builtin_mts.insert(k, value);
        }

        let g = self.global.clone().expect("built by build_shells");
        *g.0.main_thread.borrow_mut() = main_thread;
        *g.0.builtin_mts.borrow_mut() = builtin_mts;
        g.0.gccount.set(gccount);
        Ok(())
    }
}

impl fmt::Debug for Loader<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Loader")
            .field("tables", &self.tables.len())
            .field("registries", &self.registries.len())
            .field("upvalues", &self.upvalues.len())
            .field("closures", &self.closures.len())
            .field("call_frames", &self.call_frames.len())
            .field("call_frame_stacks", &self.call_frame_stacks.len())
            .field("threads", &self.threads.len())
            .finish()
    }
}
