//! The live `CallFrame` and `CallFrameStack`: one Thread's activation
//! records.

use std::cell::RefCell;
use std::rc::Rc;

use super::closure::Closure;

/// The shared body of one activation record.
///
/// `Clone`, unlike most other `*Data` bodies in this module: the loader
/// deliberately materializes a frame twice (see `crate::fixup`) and needs
/// to duplicate a filled `FrameData` wholesale to do so.
#[derive(Debug, Clone)]
pub struct FrameData {
    /// This frame's position in its Thread's call-frame stack array.
    pub idx: i32,
    /// The closure being executed in this frame.
    pub closure: Closure,
    /// The calling frame, or `None` for the outermost frame.
    ///
    /// While a Thread is freshly loaded this may be a free-standing shell
    /// rather than the `CallFrameStack` entry at `idx - 1`; the fix-up
    /// pass (`crate::fixup`) rewrites it to alias the stack entry.
    pub parent: Option<Frame>,
    /// Program counter (instruction index into the closure's prototype).
    pub pc: i32,
    /// Base offset of this frame's register window.
    pub base: i32,
    /// Offset of this frame's local variables within the register window.
    pub local_base: i32,
    /// Offset at which return values are written.
    pub return_base: i32,
    /// Number of arguments passed to this call.
    pub n_args: i32,
    /// Number of return values expected (-1 for all).
    pub n_ret: i32,
    /// Whether this frame was entered via a tail call.
    pub tail_call: i32,
}

/// One activation record.
#[derive(Debug, Clone)]
pub struct Frame(pub Rc<RefCell<FrameData>>);

impl Frame {
    /// The stable address used as this frame's dump identity.
    pub fn address(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }
}

impl PartialEq for Frame {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// The shared body of a Thread's frame array.
#[derive(Debug)]
pub struct CallFrameStackData {
    /// Frame slots, at full capacity (unlike the wire form).
    pub frames: Vec<Option<Frame>>,
    /// The index of the next free frame slot.
    pub sp: i32,
}

/// A Thread's fixed-capacity call-frame stack.
#[derive(Debug, Clone)]
pub struct CallFrameStack(pub Rc<RefCell<CallFrameStackData>>);

impl CallFrameStack {
    /// An empty call-frame stack with the given capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self(Rc::new(RefCell::new(CallFrameStackData {
            frames: std::iter::repeat_with(|| None).take(capacity).collect(),
            sp: 0,
        })))
    }

    /// The stable address used as this stack's dump identity.
    pub fn address(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }
}

impl PartialEq for CallFrameStack {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
