//! The live `Closure`: either a host-native callback or an interpreted
//! function bound to a prototype and a set of upvalues.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::prototype::Prototype;
use super::table::Table;
use super::upvalue::Upvalue;

/// A host-native callback, opaque to the core. Resolving `Rc<dyn
/// NativeCallback>` back into a concrete host function after a load is
/// entirely the job of a `crate::codec::NativeCallbackCodec` — the core
/// only ever moves the trait object around by reference.
pub trait NativeCallback: fmt::Debug {}

/// The shared body of a closure.
#[derive(Debug)]
pub struct ClosureData {
    /// True for a host-native callback, false for an interpreted closure.
    pub is_g: bool,
    /// This closure's environment table.
    pub env: Table,
    /// The byte-code prototype, set only when `is_g` is false.
    pub proto: Option<Prototype>,
    /// The native callback, set only when `is_g` is true.
    pub native: Option<Rc<dyn NativeCallback>>,
    /// This closure's upvalues, in declaration order.
    pub upvalues: Vec<Upvalue>,
}

/// A closure: an interpreted function paired with its upvalues, or a
/// host-native callback paired with its environment.
#[derive(Debug, Clone)]
pub struct Closure(pub Rc<RefCell<ClosureData>>);

impl Closure {
    /// Wraps an interpreted prototype as a fresh closure with no bound
    /// upvalues yet.
    pub fn interpreted(env: Table, proto: Prototype) -> Self {
        Self(Rc::new(RefCell::new(ClosureData {
            is_g: false,
            env,
            proto: Some(proto),
            native: None,
            upvalues: Vec::new(),
        })))
    }

    /// Wraps a host-native callback as a closure.
    pub fn native(env: Table, callback: Rc<dyn NativeCallback>) -> Self {
        Self(Rc::new(RefCell::new(ClosureData {
            is_g: true,
            env,
            proto: None,
            native: Some(callback),
            upvalues: Vec::new(),
        })))
    }

    /// The stable address used as this closure's dump identity.
    pub fn address(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }
}

impl PartialEq for Closure {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
