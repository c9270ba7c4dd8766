mod builder;
pub mod disasm;
mod opcode;
pub mod token;
mod verifier;

pub use builder::{CallSite, ILBuilder, SealedIL};
pub use disasm::{Disassembler, format_bodies};
pub use opcode::{DecodeError, Instruction, decode_all};
pub use token::{MetadataToken, TableIndex};
pub use verifier::{VerifyError, verify, verify_sealed};
