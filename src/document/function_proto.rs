//! The wire `FunctionProto` node: an immutable compiled function body.

use serde::{Deserialize, Serialize};

use super::value::Value;
use crate::identity::Handle;

/// A single `(Pc, Name)` debug call-site annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbgCall {
    /// The byte-code offset of the call instruction.
    #[serde(rename = "Pc")]
    pub pc: i32,
    /// The symbolic name recorded for that call, for tracebacks.
    #[serde(rename = "Name")]
    pub name: String,
}

/// An immutable byte-code artifact. Never executed by this crate — the
/// instruction stream is carried opaquely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionProto {
    /// The source file or chunk name this prototype was compiled from.
    #[serde(rename = "SourceName")]
    pub source_name: String,
    /// First line of the source range this prototype covers.
    #[serde(rename = "LineDefined")]
    pub line_defined: i32,
    /// Last line of the source range this prototype covers.
    #[serde(rename = "LastLineDefined")]
    pub last_line_defined: i32,
    /// Number of upvalues this prototype's closures capture.
    #[serde(rename = "NumUpvalues")]
    pub num_upvalues: u8,
    /// Number of declared parameters.
    #[serde(rename = "NumParameters")]
    pub num_parameters: u8,
    /// Whether this prototype accepts variadic arguments.
    #[serde(rename = "IsVarArg")]
    pub is_vararg: u8,
    /// Number of registers a closure of this prototype uses.
    #[serde(rename = "NumUsedRegisters")]
    pub num_used_registers: u8,
    /// The opaque instruction stream.
    #[serde(rename = "Code")]
    pub code: Vec<u32>,
    /// Constants referenced by the instruction stream.
    #[serde(rename = "Constants")]
    pub constants: Vec<Value>,
    /// Nested prototypes (closures defined within this one), by handle.
    #[serde(rename = "FunctionPrototypes")]
    pub function_prototypes: Vec<Handle>,
    /// Per-instruction source line numbers, parallel to `code`.
    #[serde(rename = "DbgSourcePositions")]
    pub dbg_source_positions: Vec<i32>,
    /// Upvalue names, for debug/traceback purposes.
    #[serde(rename = "DbgUpvalues")]
    pub dbg_upvalues: Vec<String>,
    /// String constants kept separately for debug printing.
    #[serde(rename = "StringConstants")]
    pub string_constants: Vec<String>,
    /// Call-site debug annotations.
    #[serde(rename = "DbgCalls")]
    pub dbg_calls: Vec<DbgCall>,
    /// Local-variable debug info, by handle into DbgLocalInfos.
    #[serde(rename = "DbgLocals")]
    pub dbg_locals: Vec<Handle>,
}
