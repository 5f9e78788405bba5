//! The live `Upvalue`: a box over a register slot or a detached value.

use std::cell::RefCell;
use std::rc::Rc;

use super::registry::Registry;
use super::value::Value;

/// The shared body of an upvalue.
#[derive(Debug)]
pub struct UpvalueData {
    /// Next upvalue in the owning thread's open-upvalue chain.
    pub next: Option<Upvalue>,
    /// The register window this upvalue is open over, or `None` if closed.
    pub reg: Option<Registry>,
    /// Index into `reg`'s slots, meaningful only while open.
    pub index: i32,
    /// The detached value, meaningful only once closed.
    pub value: Value,
    /// Whether this upvalue has been closed.
    pub closed: bool,
}

/// An upvalue: a captured variable, shared between the closures that
/// close over it.
#[derive(Debug, Clone)]
pub struct Upvalue(pub Rc<RefCell<UpvalueData>>);

impl Upvalue {
    /// An open upvalue over `reg[index]`.
    pub fn open(reg: Registry, index: i32) -> Self {
        Self(Rc::new(RefCell::new(UpvalueData {
            next: None,
            reg: Some(reg),
            index,
            value: Value::Nil,
            closed: false,
        })))
    }

    /// Detaches this upvalue from its register window, latching its
    /// current value.
    pub fn close(&self, value: Value) {
        let mut data = self.0.borrow_mut();
        data.reg = None;
        data.value = value;
        data.closed = true;
    }

    /// The stable address used as this upvalue's dump identity.
    pub fn address(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }
}

impl PartialEq for Upvalue {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
