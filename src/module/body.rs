//! Finished method bodies as handed to the module writer.

use serde::Serialize;

use super::SignatureSlot;
use crate::il::SealedIL;
use crate::intrinsic::CallingConvention;

/// Identity of a method definition (its MethodDef row).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct MethodId(u32);

impl MethodId {
    pub fn new(row: u32) -> Self {
        MethodId(row)
    }

    pub fn row(self) -> u32 {
        self.0
    }
}

/// Debug identity of a body: method ordinal within the generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DebugId {
    pub ordinal: i32,
    pub generation: u32,
}

impl DebugId {
    /// Ordinal used for methods that are not tracked for edit-and-continue.
    pub const UNDEFINED_ORDINAL: i32 = -1;

    pub fn untracked(generation: u32) -> Self {
        Self {
            ordinal: Self::UNDEFINED_ORDINAL,
            generation,
        }
    }
}

/// A local variable slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalDefinition {
    pub name: String,
    pub slot: u16,
    /// IL offset where the variable becomes valid
    pub scope_start: u32,
    /// IL offset where the variable becomes invalid
    pub scope_end: u32,
}

/// Maps an IL offset to a source location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SequencePoint {
    pub offset: u32,
    pub line: u32,
    pub column: u16,
}

/// Lexical scope of a group of locals, as IL offsets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalScope {
    pub start_offset: u32,
    pub end_offset: u32,
    /// Slots of the locals declared in this scope
    pub locals: Vec<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExceptionHandlerRegion {
    pub try_offset: u32,
    pub try_length: u32,
    pub handler_offset: u32,
    pub handler_length: u32,
}

/// The finished, serializable representation of one method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MethodBody {
    pub il_bits: Vec<u8>,
    pub max_stack: u16,
    pub parent: MethodId,
    pub method_id: DebugId,
    pub locals: Vec<LocalDefinition>,
    pub sequence_points: Vec<SequencePoint>,
    pub exception_handlers: Vec<ExceptionHandlerRegion>,
    pub local_scopes: Vec<LocalScope>,
    pub has_dynamic_locals: bool,
    pub state_machine_type_name: Option<String>,
    /// StandAloneSig row used by the body's `calli`, if any
    pub standalone_signature: Option<SignatureSlot>,
    pub calling_convention: CallingConvention,
}

impl MethodBody {
    /// Body of an indirect-call intrinsic: no locals, handlers or debug info.
    pub fn intrinsic(
        sealed: SealedIL,
        parent: MethodId,
        generation: u32,
        slot: SignatureSlot,
        calling_convention: CallingConvention,
    ) -> Self {
        Self {
            il_bits: sealed.bytes,
            max_stack: sealed.max_stack,
            parent,
            method_id: DebugId::untracked(generation),
            locals: Vec::new(),
            sequence_points: Vec::new(),
            exception_handlers: Vec::new(),
            local_scopes: Vec::new(),
            has_dynamic_locals: false,
            state_machine_type_name: None,
            standalone_signature: Some(slot),
            calling_convention,
        }
    }

    pub fn code_size(&self) -> usize {
        self.il_bits.len()
    }
}
