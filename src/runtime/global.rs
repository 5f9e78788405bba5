//! The live `Global`: process-wide state shared across every Thread.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use indexmap::IndexMap;

use super::table::Table;
use super::thread::Thread;
use super::value::Value;

/// The shared body of a Global. `main_thread`/`current_thread` are set
/// after construction (a Thread needs a Global to exist before it can
/// exist itself), hence the interior mutability.
#[derive(Debug)]
pub struct GlobalData {
    /// The interpreter's main (root) thread.
    pub main_thread: RefCell<Option<Thread>>,
    /// The thread that is (or, at dump time, was) executing.
    pub current_thread: RefCell<Option<Thread>>,
    /// The weak registry table.
    pub registry: Table,
    /// The global environment table (`_G`).
    pub global: Table,
    /// Per-type metatables, keyed by type name, in registration order.
    pub builtin_mts: RefCell<IndexMap<String, Value>>,
    /// The interpreter's GC generation counter.
    pub gccount: Cell<i32>,
}

/// Process-wide interpreter state, shared by every Thread spawned under it.
#[derive(Debug, Clone)]
pub struct Global(pub Rc<GlobalData>);

impl Global {
    /// Constructs a Global with a fresh registry and `_G` table and no
    /// thread bound yet. Call `set_main_thread` once the root Thread
    /// exists.
    pub fn new() -> Self {
        Self(Rc::new(GlobalData {
            main_thread: RefCell::new(None),
            current_thread: RefCell::new(None),
            registry: Table::new(),
            global: Table::new(),
            builtin_mts: RefCell::new(IndexMap::new()),
            gccount: Cell::new(0),
        }))
    }

    /// Binds the root thread. Also sets it as the current thread.
    pub fn set_main_thread(&self, thread: Thread) {
        *self.0.current_thread.borrow_mut() = Some(thread.clone());
        *self.0.main_thread.borrow_mut() = Some(thread);
    }

    /// The thread that was executing at dump time.
    pub fn current_thread(&self) -> Option<Thread> {
        self.0.current_thread.borrow().clone()
    }

    /// Records which thread is now executing.
    pub fn set_current_thread(&self, thread: Thread) {
        *self.0.current_thread.borrow_mut() = Some(thread);
    }

    /// The stable address used as this Global's dump identity.
    pub fn address(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }
}

impl Default for Global {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Global {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
