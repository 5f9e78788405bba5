//! The live `Prototype`: an immutable compiled function body, plus the
//! debug records hung off it.

use std::rc::Rc;

use super::value::Value;

/// One `(Pc, Name)` debug call-site annotation.
#[derive(Debug, Clone)]
pub struct DbgCall {
    /// The byte-code offset of the call instruction.
    pub pc: i32,
    /// The symbolic name recorded for that call.
    pub name: String,
}

/// The body of a local variable's debug record. Given its own identity
/// (an `Rc`, not inlined) because the wire schema keeps `DbgLocalInfos`
/// as its own bucket, addressable by handle.
#[derive(Debug, Clone)]
pub struct LocalVarInfoData {
    /// The variable's source-level name.
    pub name: String,
    /// First instruction at which the variable is live.
    pub start_pc: i32,
    /// First instruction after which the variable is no longer live.
    pub end_pc: i32,
}

/// A local variable's debug record.
#[derive(Debug, Clone)]
pub struct LocalVarInfo(pub Rc<LocalVarInfoData>);

impl LocalVarInfo {
    /// The stable address used as this record's dump identity.
    pub fn address(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }
}

impl PartialEq for LocalVarInfo {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// The body of an immutable compiled function.
#[derive(Debug)]
pub struct PrototypeData {
    /// The source file or chunk name this prototype was compiled from.
    pub source_name: String,
    /// First line of the source range this prototype covers.
    pub line_defined: i32,
    /// Last line of the source range this prototype covers.
    pub last_line_defined: i32,
    /// Number of upvalues this prototype's closures capture.
    pub num_upvalues: u8,
    /// Number of declared parameters.
    pub num_parameters: u8,
    /// Whether this prototype accepts variadic arguments.
    pub is_vararg: u8,
    /// Number of registers a closure of this prototype uses.
    pub num_used_registers: u8,
    /// The opaque instruction stream. Never decoded by this crate.
    pub code: Vec<u32>,
    /// Constants referenced by the instruction stream.
    pub constants: Vec<Value>,
    /// Nested prototypes (closures defined within this one).
    pub prototypes: Vec<Prototype>,
    /// Per-instruction source line numbers, parallel to `code`.
    pub dbg_source_positions: Vec<i32>,
    /// Upvalue names, for debug/traceback purposes.
    pub dbg_upvalues: Vec<String>,
    /// String constants kept separately for debug printing.
    pub string_constants: Vec<String>,
    /// Call-site debug annotations.
    pub dbg_calls: Vec<DbgCall>,
    /// Local-variable debug records.
    pub dbg_locals: Vec<LocalVarInfo>,
}

/// An immutable byte-code artifact, shared by every closure compiled
/// from the same source function.
#[derive(Debug, Clone)]
pub struct Prototype(pub Rc<PrototypeData>);

impl Prototype {
    /// The stable address used as this prototype's dump identity.
    pub fn address(&self) -> usize {
        Rc::as_ptr(&self.0) as usize
    }
}

impl PartialEq for Prototype {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
