//! CIL instructions used by the intrinsic bodies and their binary encoding.
//!
//! Only the subset of ECMA-335 Partition III needed for indirect-call
//! thunks is modelled: argument loads, the `tail.` prefix, `calli` and `ret`.

use super::token::MetadataToken;
use thiserror::Error;

// Opcode bytes
const OP_LDARG_0: u8 = 0x02;
const OP_LDARG_1: u8 = 0x03;
const OP_LDARG_2: u8 = 0x04;
const OP_LDARG_3: u8 = 0x05;
const OP_LDARG_S: u8 = 0x0E;
const OP_CALLI: u8 = 0x29;
const OP_RET: u8 = 0x2A;
const OP_PREFIX_FE: u8 = 0xFE;
// Second byte of two-byte opcodes
const OP_FE_LDARG: u8 = 0x09;
const OP_FE_TAIL: u8 = 0x14;

/// A single decoded instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// Push argument `n`. Encoded in the shortest available form.
    LdArg(u16),
    /// `tail.` prefix; must be followed by a call and then `ret`.
    Tail,
    /// Indirect call through a function pointer described by a standalone signature.
    Calli(MetadataToken),
    Ret,
}

/// Error decoding a CIL byte stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("invalid opcode {opcode:#04x} at offset {offset}")]
    InvalidOpcode { offset: usize, opcode: u16 },
    #[error("unexpected end of code at offset {offset}")]
    UnexpectedEnd { offset: usize },
}

impl Instruction {
    pub fn name(&self) -> &'static str {
        match self {
            Instruction::LdArg(0) => "ldarg.0",
            Instruction::LdArg(1) => "ldarg.1",
            Instruction::LdArg(2) => "ldarg.2",
            Instruction::LdArg(3) => "ldarg.3",
            Instruction::LdArg(n) if *n <= u8::MAX as u16 => "ldarg.s",
            Instruction::LdArg(_) => "ldarg",
            Instruction::Tail => "tail.",
            Instruction::Calli(_) => "calli",
            Instruction::Ret => "ret",
        }
    }

    /// Fixed stack effect, or `None` when it depends on the call site.
    pub fn stack_effect(&self) -> Option<i32> {
        match self {
            Instruction::LdArg(_) => Some(1),
            Instruction::Tail => Some(0),
            Instruction::Calli(_) | Instruction::Ret => None,
        }
    }

    /// Number of bytes the instruction occupies.
    pub fn encoded_len(&self) -> usize {
        match self {
            Instruction::LdArg(0..=3) => 1,
            Instruction::LdArg(n) if *n <= u8::MAX as u16 => 2,
            Instruction::LdArg(_) => 4,
            Instruction::Tail => 2,
            Instruction::Calli(_) => 5,
            Instruction::Ret => 1,
        }
    }

    pub fn encode(&self, out: &mut Vec<u8>) {
        match *self {
            Instruction::LdArg(0) => out.push(OP_LDARG_0),
            Instruction::LdArg(1) => out.push(OP_LDARG_1),
            Instruction::LdArg(2) => out.push(OP_LDARG_2),
            Instruction::LdArg(3) => out.push(OP_LDARG_3),
            Instruction::LdArg(n) if n <= u8::MAX as u16 => {
                out.push(OP_LDARG_S);
                out.push(n as u8);
            }
            Instruction::LdArg(n) => {
                out.push(OP_PREFIX_FE);
                out.push(OP_FE_LDARG);
                out.extend_from_slice(&n.to_le_bytes());
            }
            Instruction::Tail => {
                out.push(OP_PREFIX_FE);
                out.push(OP_FE_TAIL);
            }
            Instruction::Calli(token) => {
                out.push(OP_CALLI);
                out.extend_from_slice(&token.raw().to_le_bytes());
            }
            Instruction::Ret => out.push(OP_RET),
        }
    }

    /// Decode the instruction starting at `offset`.
    pub fn decode(code: &[u8], offset: usize) -> Result<Instruction, DecodeError> {
        let opcode = read_u8(code, offset)?;
        let insn = match opcode {
            OP_LDARG_0..=OP_LDARG_3 => Instruction::LdArg((opcode - OP_LDARG_0) as u16),
            OP_LDARG_S => Instruction::LdArg(read_u8(code, offset + 1)? as u16),
            OP_CALLI => Instruction::Calli(MetadataToken::from_raw(read_u32(code, offset + 1)?)),
            OP_RET => Instruction::Ret,
            OP_PREFIX_FE => match read_u8(code, offset + 1)? {
                OP_FE_LDARG => Instruction::LdArg(read_u16(code, offset + 2)?),
                OP_FE_TAIL => Instruction::Tail,
                second => {
                    return Err(DecodeError::InvalidOpcode {
                        offset,
                        opcode: u16::from_be_bytes([OP_PREFIX_FE, second]),
                    });
                }
            },
            _ => {
                return Err(DecodeError::InvalidOpcode {
                    offset,
                    opcode: opcode as u16,
                });
            }
        };
        Ok(insn)
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Instruction::LdArg(n) if *n > 3 => write!(f, "{} {}", self.name(), n),
            Instruction::Calli(token) => write!(f, "calli {}", token),
            _ => f.write_str(self.name()),
        }
    }
}

/// Decode a whole method body into `(offset, instruction)` pairs.
pub fn decode_all(code: &[u8]) -> Result<Vec<(usize, Instruction)>, DecodeError> {
    let mut out = Vec::new();
    let mut offset = 0;
    while offset < code.len() {
        let insn = Instruction::decode(code, offset)?;
        out.push((offset, insn));
        offset += encoded_len_at(code, offset, &insn);
    }
    Ok(out)
}

// `ldarg.s 2` decodes to `LdArg(2)` but occupies two bytes, so the length
// has to come from the opcode that was actually read.
fn encoded_len_at(code: &[u8], offset: usize, insn: &Instruction) -> usize {
    match (code[offset], insn) {
        (OP_LDARG_S, _) => 2,
        (OP_PREFIX_FE, Instruction::LdArg(_)) => 4,
        _ => insn.encoded_len(),
    }
}

fn read_u8(code: &[u8], offset: usize) -> Result<u8, DecodeError> {
    code.get(offset)
        .copied()
        .ok_or(DecodeError::UnexpectedEnd { offset })
}

fn read_u16(code: &[u8], offset: usize) -> Result<u16, DecodeError> {
    let bytes = code
        .get(offset..offset + 2)
        .ok_or(DecodeError::UnexpectedEnd { offset })?;
    Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
}

fn read_u32(code: &[u8], offset: usize) -> Result<u32, DecodeError> {
    let bytes = code
        .get(offset..offset + 4)
        .ok_or(DecodeError::UnexpectedEnd { offset })?;
    Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}
