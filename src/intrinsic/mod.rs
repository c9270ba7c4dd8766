//! Lowering of `CallIndirect*` / `TailCallIndirect*` intrinsics.
//!
//! - `classify`: name-based recognition and calling-convention selection
//! - `emit`: the `ldarg..; [tail.] calli; ret` sequence
//! - `assemble`: sealing, body construction and hand-off to the module

mod assemble;
mod classify;
mod emit;

pub use assemble::{assemble_intrinsic, lower_intrinsic};
pub use classify::{
    CALL_INDIRECT_PREFIX, CallingConvention, IntrinsicKind, TAIL_CALL_INDIRECT_PREFIX, classify,
    convention_of,
};
pub use emit::{emit_indirect_call, stack_adjustment};

use crate::module::MethodId;

/// Signature of a declaration as supplied by symbol resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSignature {
    pub method: MethodId,
    /// Defining declaration of a partial method, if this is its implementation
    pub partial_definition: Option<MethodId>,
    pub name: String,
    pub parameter_count: u16,
    pub returns_void: bool,
}

impl FunctionSignature {
    pub fn new(
        method: MethodId,
        name: impl Into<String>,
        parameter_count: u16,
        returns_void: bool,
    ) -> Self {
        Self {
            method,
            partial_definition: None,
            name: name.into(),
            parameter_count,
            returns_void,
        }
    }

    pub fn with_partial_definition(mut self, definition: MethodId) -> Self {
        self.partial_definition = Some(definition);
        self
    }

    /// The method the finished body is stored under.
    pub fn owner(&self) -> MethodId {
        self.partial_definition.unwrap_or(self.method)
    }

    pub fn kind(&self) -> IntrinsicKind {
        classify(&self.name)
    }
}
