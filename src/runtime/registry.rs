//! The live `Registry`: a Thread's flat register window.

use std::cell::RefCell;
use std::rc::Rc;

use super::value::Value;

/// The shared body of a register window.
#[derive(Debug)]
pub struct RegistryData {
    /// The register slots, at full capacity (unlike the wire form, which
    /// truncates the trailing-Nil tail).
    pub slots: Vec<Value>,
    /// The index of the first free register.
    pub top: usize,
}

/// A Thread's register window.
#[derive(Debug, Clone)]
pub struct Registry(pub Rc<RefCell<RegistryData>>);

impl Registry {
    /// A register window of the given capacity, all slots `Nil`.
    pub fn with_capacity(capacity: usize) -> Self {
        Self(Rc::new(RefCell::new(RegistryData {
            slots: vec![Value::Nil; capacity],
            top: 0,
        })))
    }

    /// The stable address used as this registry's dump identity.
    pub fn address(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }
}

impl PartialEq for Registry {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
