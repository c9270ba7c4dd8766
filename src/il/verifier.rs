//! Verifier for emitted intrinsic bodies.
//!
//! Re-decodes the sealed bytes and simulates the evaluation stack:
//! - No underflow, and the declared max stack is never exceeded
//! - `tail.` is immediately followed by `calli`, which is followed by `ret`
//! - Every `calli` matches a recorded call site
//! - The body ends with `ret` and leaves the stack balanced

use super::builder::{CallSite, SealedIL};
use super::opcode::{DecodeError, Instruction, decode_all};
use super::token::MetadataToken;
use thiserror::Error;

/// Verification error types
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("empty method body")]
    EmptyBody,
    #[error("stack underflow at IL_{offset:04x}: requires {required}, only {actual} on stack")]
    StackUnderflow {
        offset: usize,
        required: i32,
        actual: i32,
    },
    #[error("stack height {height} at IL_{offset:04x} exceeds max stack {max}")]
    MaxStackExceeded { offset: usize, height: i32, max: u16 },
    #[error("calli at IL_{offset:04x} references unknown call site {token}")]
    UnknownCallSite { offset: usize, token: MetadataToken },
    #[error("tail. prefix at IL_{offset:04x} is not followed by calli and ret")]
    MisplacedTailPrefix { offset: usize },
    #[error("ret at IL_{offset:04x} with {height} values on the stack")]
    UnbalancedReturn { offset: usize, height: i32 },
    #[error("instruction after ret at IL_{offset:04x}")]
    CodeAfterReturn { offset: usize },
    #[error("method body does not end with ret")]
    MissingReturn,
}

/// Verify a sealed buffer.
pub fn verify_sealed(sealed: &SealedIL) -> Result<(), VerifyError> {
    verify(&sealed.bytes, sealed.max_stack, &sealed.call_sites)
}

/// Verify raw code against its declared max stack and call-site table.
pub fn verify(code: &[u8], max_stack: u16, call_sites: &[CallSite]) -> Result<(), VerifyError> {
    let insns = decode_all(code)?;
    if insns.is_empty() {
        return Err(VerifyError::EmptyBody);
    }

    let mut height: i32 = 0;
    let mut returned = false;

    for (i, &(offset, insn)) in insns.iter().enumerate() {
        if returned {
            return Err(VerifyError::CodeAfterReturn { offset });
        }

        let delta = match insn {
            Instruction::Calli(token) => {
                let site = call_sites
                    .iter()
                    .find(|site| site.offset == offset && site.token == token)
                    .ok_or(VerifyError::UnknownCallSite { offset, token })?;
                site.stack_adjustment
            }
            Instruction::Ret => {
                // ret pops the return value if there is one; nothing else may remain
                if height > 1 {
                    return Err(VerifyError::UnbalancedReturn { offset, height });
                }
                returned = true;
                -height
            }
            Instruction::Tail => {
                let well_formed = matches!(
                    (insns.get(i + 1), insns.get(i + 2)),
                    (Some((_, Instruction::Calli(_))), Some((_, Instruction::Ret)))
                );
                if !well_formed {
                    return Err(VerifyError::MisplacedTailPrefix { offset });
                }
                0
            }
            other => other.stack_effect().unwrap_or(0),
        };

        if height + delta < 0 {
            return Err(VerifyError::StackUnderflow {
                offset,
                required: -delta,
                actual: height,
            });
        }
        height += delta;

        if height > max_stack as i32 {
            return Err(VerifyError::MaxStackExceeded {
                offset,
                height,
                max: max_stack,
            });
        }
    }

    if !returned {
        return Err(VerifyError::MissingReturn);
    }
    Ok(())
}
