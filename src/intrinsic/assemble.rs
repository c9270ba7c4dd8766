//! Assembly of complete intrinsic method bodies.

use super::FunctionSignature;
use super::classify::{CALL_INDIRECT_PREFIX, CallingConvention, classify, convention_of};
use super::emit::emit_indirect_call;
use crate::config::{LowerConfig, OptimizationLevel};
use crate::error::LowerError;
use crate::il::{ILBuilder, verify_sealed};
use crate::module::{MethodBody, ModuleBuilder, SignatureSlot, StandAloneSignature};

/// Lower one intrinsic method and store its body in `module`.
///
/// The caller must already have classified the method as an intrinsic.
///
/// # Panics
///
/// Panics if `signature` does not name an indirect-call intrinsic.
pub fn assemble_intrinsic(
    module: &ModuleBuilder,
    config: &LowerConfig,
    signature: &FunctionSignature,
) -> Result<MethodBody, LowerError> {
    if config.optimization == OptimizationLevel::Debug {
        log::warn!(
            "`{}`: intrinsics are always lowered without debug instrumentation",
            signature.name
        );
    }
    let kind = classify(&signature.name);
    assert!(kind.is_intrinsic(), "`{}` is not an intrinsic", signature.name);

    let mut builder = ILBuilder::new(OptimizationLevel::Release);

    let (slot, convention) = emit_indirect_call(&mut builder, module, signature, kind.is_tail())?;
    let body = finish_body(module, config, signature, builder, slot, convention)?;
    log::debug!(
        "lowered `{}`: {:?}, convention {}, sig {}, maxstack {}, {} bytes",
        signature.name,
        kind,
        convention.name(),
        slot.get(),
        body.max_stack,
        body.code_size()
    );
    Ok(body)
}

/// Seal `builder`, record the signature row it references and store the body.
///
/// The row is recorded before verification so the module's StandAloneSig rows
/// stay contiguous even when a body is rejected.
fn finish_body(
    module: &ModuleBuilder,
    config: &LowerConfig,
    signature: &FunctionSignature,
    builder: ILBuilder,
    slot: SignatureSlot,
    convention: CallingConvention,
) -> Result<MethodBody, LowerError> {
    let sealed = builder.seal();

    module.record_signature(StandAloneSignature {
        slot,
        calling_convention: convention,
        parameter_count: signature.parameter_count,
        returns_void: signature.returns_void,
    });

    if config.verify {
        verify_sealed(&sealed).map_err(|source| LowerError::Verify {
            name: signature.name.clone(),
            source,
        })?;
    }

    let owner = signature.owner();
    let body = MethodBody::intrinsic(sealed, owner, module.generation(), slot, convention);
    module.set_method_body(owner, body.clone());
    Ok(body)
}

/// Classify `signature` and lower it if it is an intrinsic.
///
/// Returns `Ok(None)` without touching `module` for ordinary methods.
pub fn lower_intrinsic(
    module: &ModuleBuilder,
    config: &LowerConfig,
    signature: &FunctionSignature,
) -> Result<Option<MethodBody>, LowerError> {
    if !classify(&signature.name).is_intrinsic() {
        return Ok(None);
    }
    if convention_of(&signature.name) == CallingConvention::Default
        && !signature.name.ends_with(CALL_INDIRECT_PREFIX)
    {
        // TODO: report unknown convention suffixes once name validation
        // upstream can produce diagnostics for intrinsic declarations.
        log::debug!(
            "`{}` has no recognized convention suffix; using default",
            signature.name
        );
    }
    assemble_intrinsic(module, config, signature).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::{DebugId, MethodId};

    fn config() -> LowerConfig {
        LowerConfig {
            verify: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_assemble_stdcall() {
        let module = ModuleBuilder::new(4);
        let signature = FunctionSignature::new(MethodId::new(7), "CallIndirectStdCall", 2, false);
        let body = assemble_intrinsic(&module, &config(), &signature).unwrap();

        assert_eq!(
            body.il_bits,
            vec![0x02, 0x03, 0x29, 0x01, 0x00, 0x00, 0x11, 0x2A]
        );
        assert_eq!(body.max_stack, 2);
        assert_eq!(body.parent, MethodId::new(7));
        assert_eq!(body.method_id, DebugId { ordinal: -1, generation: 4 });
        assert_eq!(body.calling_convention, CallingConvention::Standard);
        assert_eq!(body.standalone_signature.map(|s| s.get()), Some(1));
        assert!(body.locals.is_empty());
        assert!(body.exception_handlers.is_empty());
        assert!(body.sequence_points.is_empty());
        assert!(body.local_scopes.is_empty());
        assert!(!body.has_dynamic_locals);
        assert_eq!(body.state_machine_type_name, None);

        assert_eq!(module.method_body(MethodId::new(7)), Some(body));
    }

    #[test]
    fn test_signature_row_recorded() {
        let module = ModuleBuilder::new(0);
        let signature = FunctionSignature::new(MethodId::new(1), "TailCallIndirectHasThis", 3, true);
        assemble_intrinsic(&module, &config(), &signature).unwrap();

        let signatures = module.standalone_signatures();
        assert_eq!(signatures.len(), 1);
        assert_eq!(signatures[0].calling_convention, CallingConvention::HasThis);
        assert_eq!(signatures[0].parameter_count, 3);
        assert!(signatures[0].returns_void);
    }

    #[test]
    fn test_partial_definition_owns_body() {
        let module = ModuleBuilder::new(0);
        let signature = FunctionSignature::new(MethodId::new(9), "CallIndirect", 1, true)
            .with_partial_definition(MethodId::new(3));
        let body = assemble_intrinsic(&module, &config(), &signature).unwrap();

        assert_eq!(body.parent, MethodId::new(3));
        assert!(module.method_body(MethodId::new(3)).is_some());
        assert!(module.method_body(MethodId::new(9)).is_none());
    }

    #[test]
    fn test_debug_level_still_lowers_release_code() {
        let module = ModuleBuilder::new(0);
        let config = LowerConfig {
            optimization: OptimizationLevel::Debug,
            ..config()
        };
        let signature = FunctionSignature::new(MethodId::new(1), "CallIndirect", 0, true);
        let body = assemble_intrinsic(&module, &config, &signature).unwrap();
        assert_eq!(body.il_bits, vec![0x29, 0x01, 0x00, 0x00, 0x11, 0x2A]);
        assert!(body.locals.is_empty());
    }

    #[test]
    fn test_lower_skips_ordinary_methods() {
        let module = ModuleBuilder::new(0);
        let signature = FunctionSignature::new(MethodId::new(1), "Foo", 2, false);
        assert_eq!(lower_intrinsic(&module, &config(), &signature), Ok(None));
        assert_eq!(module.allocated_signature_count(), 0);
        assert_eq!(module.body_count(), 0);
    }

    #[test]
    fn test_rejected_body_keeps_signature_rows_contiguous() {
        let module = ModuleBuilder::new(0);
        let signature = FunctionSignature::new(MethodId::new(2), "CallIndirect", 1, true);

        // missing `ret`
        let slot = module.allocate_signature_slot().unwrap();
        let mut builder = ILBuilder::new(OptimizationLevel::Release);
        builder.emit_load_argument(0);
        builder.emit_calli(-1, slot.token());
        let result = finish_body(&module, &config(), &signature, builder, slot, CallingConvention::Default);
        assert!(matches!(result, Err(LowerError::Verify { .. })));
        assert_eq!(module.body_count(), 0);

        let next = FunctionSignature::new(MethodId::new(3), "CallIndirect", 0, true);
        assemble_intrinsic(&module, &config(), &next).unwrap();

        let rows: Vec<u32> = module
            .standalone_signatures()
            .iter()
            .map(|sig| sig.slot.get())
            .collect();
        assert_eq!(rows, vec![1, 2]);
        assert_eq!(module.allocated_signature_count(), 2);
    }

    #[test]
    fn test_exhaustion_leaves_no_body() {
        let module = ModuleBuilder::with_first_signature_row(0, crate::il::token::MAX_ROW + 1);
        let signature = FunctionSignature::new(MethodId::new(1), "CallIndirect", 0, true);
        let result = lower_intrinsic(&module, &config(), &signature);
        assert!(matches!(result, Err(LowerError::SignatureTableExhausted { .. })));
        assert_eq!(module.body_count(), 0);
        assert!(module.standalone_signatures().is_empty());
    }
}
