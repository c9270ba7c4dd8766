//! Instruction buffer for building a single method body.
//!
//! The builder appends encoded instructions and tracks the evaluation stack
//! depth as it goes. `seal` consumes the builder and hands back the finished
//! code; nothing can be appended afterwards and the scratch state is dropped
//! with the builder.

use super::opcode::Instruction;
use super::token::MetadataToken;
use crate::config::OptimizationLevel;

/// A `calli` emitted into the buffer together with the stack adjustment
/// the caller attributed to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSite {
    pub offset: usize,
    pub token: MetadataToken,
    pub stack_adjustment: i32,
}

/// Sealed code: immutable bytes plus the stack bound computed while emitting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedIL {
    pub bytes: Vec<u8>,
    pub max_stack: u16,
    pub call_sites: Vec<CallSite>,
}

/// Append-only CIL buffer.
pub struct ILBuilder {
    optimization: OptimizationLevel,
    code: Vec<u8>,
    /// Instructions in emission order (scratch; dropped on seal)
    instructions: Vec<Instruction>,
    call_sites: Vec<CallSite>,
    stack: i32,
    max_stack: i32,
}

impl ILBuilder {
    pub fn new(optimization: OptimizationLevel) -> Self {
        Self {
            optimization,
            code: Vec::new(),
            instructions: Vec::new(),
            call_sites: Vec::new(),
            stack: 0,
            max_stack: 0,
        }
    }

    pub fn optimization(&self) -> OptimizationLevel {
        self.optimization
    }

    /// Current code offset.
    pub fn offset(&self) -> usize {
        self.code.len()
    }

    /// Current evaluation stack depth.
    pub fn stack_depth(&self) -> i32 {
        self.stack
    }

    pub fn max_stack(&self) -> i32 {
        self.max_stack
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Push argument `index` in the shortest encoding.
    pub fn emit_load_argument(&mut self, index: u16) {
        self.emit(Instruction::LdArg(index), 1);
    }

    /// Emit the `tail.` prefix. It does not touch the stack.
    pub fn emit_tail_prefix(&mut self) {
        self.emit(Instruction::Tail, 0);
    }

    /// Emit `calli token` whose net effect on the stack is `stack_adjustment`.
    pub fn emit_calli(&mut self, stack_adjustment: i32, token: MetadataToken) {
        self.call_sites.push(CallSite {
            offset: self.code.len(),
            token,
            stack_adjustment,
        });
        self.emit(Instruction::Calli(token), stack_adjustment);
    }

    /// Emit `ret`. A value-returning `ret` consumes the top of the stack.
    pub fn emit_ret(&mut self, is_void: bool) {
        self.emit(Instruction::Ret, if is_void { 0 } else { -1 });
    }

    fn emit(&mut self, insn: Instruction, stack_delta: i32) {
        log::trace!("IL_{:04x}: {} (stack {:+})", self.code.len(), insn, stack_delta);
        insn.encode(&mut self.code);
        self.instructions.push(insn);
        self.adjust_stack(stack_delta);
    }

    fn adjust_stack(&mut self, delta: i32) {
        self.stack += delta;
        assert!(
            self.stack >= 0,
            "evaluation stack underflow ({} after {:+})",
            self.stack,
            delta
        );
        self.max_stack = self.max_stack.max(self.stack);
    }

    /// Freeze the buffer.
    pub fn seal(self) -> SealedIL {
        let max_stack = u16::try_from(self.max_stack)
            .unwrap_or_else(|_| panic!("max stack {} exceeds the method header limit", self.max_stack));
        SealedIL {
            bytes: self.code,
            max_stack,
            call_sites: self.call_sites,
        }
    }
}
