//! The wire `State` node: one Thread (cooperative execution context).

use serde::{Deserialize, Serialize};

use crate::identity::Handle;

/// Interpreter construction options carried through a dump so a loaded
/// Thread is configured identically to the one that was dumped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Options {
    /// Capacity reserved for the call-frame stack.
    #[serde(rename = "CallStackSize")]
    pub call_stack_size: i32,
    /// Capacity reserved for the register window.
    #[serde(rename = "RegistrySize")]
    pub registry_size: i32,
    /// Whether the standard library was skipped at construction.
    #[serde(rename = "SkipOpenLibs")]
    pub skip_open_libs: bool,
    /// Whether host stack traces are attached to propagated errors.
    #[serde(rename = "IncludeGoStackTrace")]
    pub include_go_stack_trace: bool,
}

/// A Thread ("State" in the wire vocabulary this schema was distilled
/// from): one cooperative execution context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// The shared Global this thread belongs to.
    #[serde(rename = "G")]
    pub g: Handle,
    /// The thread that spawned this one, or the nil handle for the root.
    #[serde(rename = "Parent")]
    pub parent: Handle,
    /// This thread's environment table.
    #[serde(rename = "Env")]
    pub env: Handle,
    /// Construction options.
    #[serde(rename = "Options")]
    pub options: Options,
    /// Whether the thread has already terminated.
    #[serde(rename = "Dead")]
    pub dead: bool,
    /// A cooperative stop flag, checked between instructions.
    #[serde(rename = "Stop")]
    pub stop: i32,
    /// The register window (by handle, into the Registries bucket).
    #[serde(rename = "Reg")]
    pub reg: Handle,
    /// The call-frame stack (by handle, into the CallFrameStacks bucket).
    #[serde(rename = "Stack")]
    pub stack: Handle,
    /// The frame that was executing at dump time, or the nil handle.
    #[serde(rename = "CurrentFrame")]
    pub current_frame: Handle,
    /// Whether this thread wraps another host-level call.
    #[serde(rename = "Wrapped")]
    pub wrapped: bool,
    /// Head of this thread's open-upvalue cache chain.
    #[serde(rename = "UVCache")]
    pub uv_cache: Handle,
    /// Whether an error handler function is currently installed.
    #[serde(rename = "HasErrorFunc")]
    pub has_error_func: bool,
}
