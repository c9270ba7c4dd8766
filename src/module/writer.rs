//! Method body headers (ECMA-335 II.25.4).
//!
//! Binary format:
//! - Tiny: one byte, `(code_size << 2) | 0x2`, for code under 64 bytes,
//!   max stack of at most 8, no locals and no exception handlers
//! - Fat: 12 bytes, 4-byte aligned: flags+size (u16), max stack (u16),
//!   code size (u32), local signature token (u32)
//!
//! Extra data sections (exception clauses) are not written; intrinsic
//! bodies never have them.

use super::MethodBody;
use crate::il::MetadataToken;

const TINY_FORMAT: u8 = 0x02;
const FAT_FORMAT: u16 = 0x0003;
const INIT_LOCALS: u16 = 0x0010;
/// Fat header size in 4-byte units, stored in the top nibble of the flags
const FAT_HEADER_DWORDS: u16 = 3;

const TINY_MAX_CODE_SIZE: usize = 64;
const TINY_MAX_STACK: u16 = 8;

/// Whether a body qualifies for the one-byte header.
pub fn fits_tiny_header(body: &MethodBody) -> bool {
    body.code_size() < TINY_MAX_CODE_SIZE
        && body.max_stack <= TINY_MAX_STACK
        && body.locals.is_empty()
        && body.exception_handlers.is_empty()
}

/// Append header and code to `out`. Fat bodies are aligned to 4 bytes first.
/// Returns the offset at which the header starts.
pub fn write_method_body(
    out: &mut Vec<u8>,
    body: &MethodBody,
    local_signature: Option<MetadataToken>,
) -> usize {
    debug_assert!(
        body.exception_handlers.is_empty(),
        "exception handler sections are not supported"
    );

    if fits_tiny_header(body) {
        let start = out.len();
        out.push(((body.code_size() as u8) << 2) | TINY_FORMAT);
        out.extend_from_slice(&body.il_bits);
        return start;
    }

    while out.len() % 4 != 0 {
        out.push(0);
    }
    let start = out.len();

    let mut flags = FAT_FORMAT | (FAT_HEADER_DWORDS << 12);
    if !body.locals.is_empty() {
        flags |= INIT_LOCALS;
    }
    out.extend_from_slice(&flags.to_le_bytes());
    out.extend_from_slice(&body.max_stack.to_le_bytes());
    out.extend_from_slice(&(body.code_size() as u32).to_le_bytes());
    let local_signature = local_signature.map_or(0, MetadataToken::raw);
    out.extend_from_slice(&local_signature.to_le_bytes());
    out.extend_from_slice(&body.il_bits);
    start
}

/// Serialize a single body with its header.
pub fn encode_method_body(body: &MethodBody) -> Vec<u8> {
    let mut buf = Vec::new();
    write_method_body(&mut buf, body, None);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LowerConfig;
    use crate::intrinsic::{FunctionSignature, assemble_intrinsic};
    use crate::module::{LocalDefinition, MethodId, ModuleBuilder};

    fn body(parameter_count: u16) -> MethodBody {
        let module = ModuleBuilder::new(0);
        let signature =
            FunctionSignature::new(MethodId::new(1), "CallIndirect", parameter_count, false);
        assemble_intrinsic(&module, &LowerConfig::default(), &signature).unwrap()
    }

    #[test]
    fn test_tiny_header() {
        let body = body(1);
        let bytes = encode_method_body(&body);
        // ldarg.0; calli; ret => 7 bytes of code
        assert_eq!(bytes[0], (7 << 2) | 0x02);
        assert_eq!(&bytes[1..], body.il_bits.as_slice());
    }

    #[test]
    fn test_fat_header_for_deep_stack() {
        let body = body(9);
        assert!(!fits_tiny_header(&body));
        let bytes = encode_method_body(&body);
        assert_eq!(u16::from_le_bytes([bytes[0], bytes[1]]), 0x3003);
        assert_eq!(u16::from_le_bytes([bytes[2], bytes[3]]), 9);
        assert_eq!(
            u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            body.code_size() as u32
        );
        assert_eq!(&bytes[8..12], &[0, 0, 0, 0]);
        assert_eq!(&bytes[12..], body.il_bits.as_slice());
    }

    #[test]
    fn test_fat_header_is_aligned() {
        let body = body(9);
        let mut out = vec![0xAA];
        let start = write_method_body(&mut out, &body, None);
        assert_eq!(start, 4);
        assert_eq!(&out[1..4], &[0, 0, 0]);
    }

    #[test]
    fn test_locals_force_fat_header() {
        let mut body = body(0);
        body.locals.push(LocalDefinition {
            name: "tmp".to_string(),
            slot: 0,
            scope_start: 0,
            scope_end: body.code_size() as u32,
        });
        let token = MetadataToken::standalone_signature(2);
        let mut out = Vec::new();
        write_method_body(&mut out, &body, Some(token));
        assert_eq!(u16::from_le_bytes([out[0], out[1]]), 0x3013);
        assert_eq!(u32::from_le_bytes([out[8], out[9], out[10], out[11]]), 0x1100_0002);
    }
}
