//! Emission of the indirect-call thunk.

use super::FunctionSignature;
use super::classify::{CallingConvention, convention_of};
use crate::error::LowerError;
use crate::il::ILBuilder;
use crate::module::{ModuleBuilder, SignatureSlot};

/// Net stack effect of the `calli`: the result (if any) is pushed, every
/// argument is popped.
pub fn stack_adjustment(parameter_count: u16, returns_void: bool) -> i32 {
    let pushed = if returns_void { 0 } else { 1 };
    pushed - parameter_count as i32
}

/// Emit `ldarg 0..n; [tail.] calli <sig>; ret` for `signature`.
///
/// The StandAloneSig row is taken from `module` right before the call is
/// emitted. Returns the row and the calling convention it describes.
pub fn emit_indirect_call(
    builder: &mut ILBuilder,
    module: &ModuleBuilder,
    signature: &FunctionSignature,
    is_tail: bool,
) -> Result<(SignatureSlot, CallingConvention), LowerError> {
    for index in 0..signature.parameter_count {
        builder.emit_load_argument(index);
    }

    let adjustment = stack_adjustment(signature.parameter_count, signature.returns_void);

    if is_tail {
        builder.emit_tail_prefix();
    }

    let slot = module.allocate_signature_slot()?;
    builder.emit_calli(adjustment, slot.token());
    builder.emit_ret(signature.returns_void);

    Ok((slot, convention_of(&signature.name)))
}
