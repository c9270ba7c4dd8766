//! Human-readable listings of lowered method bodies.

use super::opcode::decode_all;
use crate::module::{MethodBody, StandAloneSignature};

/// Disassembler for intrinsic method bodies.
pub struct Disassembler<'a> {
    bodies: &'a [MethodBody],
    signatures: &'a [StandAloneSignature],
    output: String,
}

impl<'a> Disassembler<'a> {
    pub fn new(bodies: &'a [MethodBody]) -> Self {
        Self {
            bodies,
            signatures: &[],
            output: String::new(),
        }
    }

    /// Also print the StandAloneSig rows the bodies reference.
    pub fn with_signatures(mut self, signatures: &'a [StandAloneSignature]) -> Self {
        self.signatures = signatures;
        self
    }

    pub fn disassemble(&mut self) -> &str {
        if !self.signatures.is_empty() {
            self.output.push_str("== StandAloneSig ==\n");
            for sig in self.signatures {
                self.output.push_str(&format!(
                    "  [{:04}] {} (header {:#04x}, params: {}, returns: {})\n",
                    sig.slot.get(),
                    sig.calling_convention.name(),
                    sig.calling_convention.header_byte(),
                    sig.parameter_count,
                    if sig.returns_void { "void" } else { "value" },
                ));
            }
            self.output.push('\n');
        }

        for body in self.bodies {
            self.disassemble_body(body);
            self.output.push('\n');
        }

        &self.output
    }

    fn disassemble_body(&mut self, body: &MethodBody) {
        self.output.push_str(&format!(
            "== Method[{}] (maxstack: {}, callconv: {}",
            body.parent.row(),
            body.max_stack,
            body.calling_convention.name(),
        ));
        if let Some(slot) = body.standalone_signature {
            self.output.push_str(&format!(", sig: {}", slot.get()));
        }
        self.output.push_str(") ==\n");

        match decode_all(&body.il_bits) {
            Ok(insns) => {
                for (offset, insn) in insns {
                    self.output.push_str(&format!("IL_{:04x}: {}\n", offset, insn));
                }
            }
            Err(e) => {
                self.output.push_str(&format!("  <undecodable: {}>\n", e));
            }
        }
    }
}

/// Format method bodies as a disassembly listing.
pub fn format_bodies(bodies: &[MethodBody]) -> String {
    let mut disassembler = Disassembler::new(bodies);
    disassembler.disassemble().to_string()
}
