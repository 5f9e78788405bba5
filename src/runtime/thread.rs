//! The live `Thread` ("State" in the wire vocabulary): one cooperative
//! execution context.

use std::cell::RefCell;
use std::rc::Rc;

use super::frame::{CallFrameStack, Frame};
use super::global::Global;
use super::registry::Registry;
use super::table::Table;
use super::upvalue::Upvalue;

/// Interpreter construction options, carried on each Thread so a loaded
/// Thread is configured identically to the one that was dumped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Capacity reserved for the call-frame stack.
    pub call_stack_size: i32,
    /// Capacity reserved for the register window.
    pub registry_size: i32,
    /// Whether the standard library was skipped at construction.
    pub skip_open_libs: bool,
    /// Whether host stack traces are attached to propagated errors.
    pub include_go_stack_trace: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            call_stack_size: 256,
            registry_size: 256,
            skip_open_libs: false,
            include_go_stack_trace: false,
        }
    }
}

/// The shared body of a Thread.
///
/// Unlike most other live-graph nodes, a Thread participates in a genuine
/// cycle with `Global` (`global.main_thread` / `global.current_thread`
/// point back at a Thread, whose own `g` field points at that same
/// Global) and, through its environment table, potentially with anything
/// else reachable from `_G`. The whole struct is therefore kept behind
/// one `RefCell`, matching every other cyclic node in this module
/// (`Table`, `Closure`, …): the loader allocates an empty shell up front
/// and replaces the struct wholesale once every field is resolved.
#[derive(Debug)]
pub struct ThreadData {
    /// The shared Global this thread belongs to.
    pub g: Global,
    /// The thread that spawned this one, or `None` for the root.
    pub parent: Option<Thread>,
    /// This thread's environment table.
    pub env: Table,
    /// Construction options.
    pub options: Options,
    /// Whether the thread has already terminated.
    pub dead: bool,
    /// A cooperative stop flag, checked between instructions.
    pub stop: i32,
    /// The register window.
    pub reg: Registry,
    /// The call-frame stack.
    pub stack: CallFrameStack,
    /// The frame currently executing, if any.
    pub current_frame: Option<Frame>,
    /// Whether this thread wraps another host-level call.
    pub wrapped: bool,
    /// Head of this thread's open-upvalue cache chain.
    pub uv_cache: Option<Upvalue>,
    /// Whether an error handler function is currently installed.
    pub has_error_func: bool,
}

impl ThreadData {
    /// An empty placeholder with no meaningful field values, used only as
    /// the loader's phase-A shell body before phase B replaces it wholesale.
    pub fn shell(g: Global) -> Self {
        Self {
            reg: Registry::with_capacity(0),
            stack: CallFrameStack::with_capacity(0),
            g,
            parent: None,
            env: Table::new(),
            options: Options::default(),
            dead: false,
            stop: 0,
            current_frame: None,
            wrapped: false,
            uv_cache: None,
            has_error_func: false,
        }
    }
}

/// A cooperative execution context. `Thread` plays the role Lua calls
/// `lua_State` and this schema calls `State`.
#[derive(Debug, Clone)]
pub struct Thread(pub Rc<RefCell<ThreadData>>);

impl Thread {
    /// Spawns a new thread under `g`, with `parent` set if this thread
    /// was created by another (running) thread.
    pub fn new(g: Global, parent: Option<Thread>, env: Table, options: Options) -> Self {
        Self(Rc::new(RefCell::new(ThreadData {
            reg: Registry::with_capacity(options.registry_size.max(0) as usize),
            stack: CallFrameStack::with_capacity(options.call_stack_size.max(0) as usize),
            g,
            parent,
            env,
            options,
            dead: false,
            stop: 0,
            current_frame: None,
            wrapped: false,
            uv_cache: None,
            has_error_func: false,
        })))
    }

    /// An empty shell, to be filled in later by replacing its body wholesale.
    pub fn shell(g: Global) -> Self {
        Self(Rc::new(RefCell::new(ThreadData::shell(g))))
    }

    /// The stable address used as this thread's dump identity.
    pub fn address(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }
}

impl PartialEq for Thread {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
