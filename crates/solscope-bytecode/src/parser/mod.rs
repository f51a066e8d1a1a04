use std::fmt;

use solscope_core::{utils::strip_0x, Error, Result};

use crate::opcode::{opcode_name, push_width};

/// Decoded instruction from bytecode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub opcode: u8,
    pub data: Vec<u8>,
    pub pos: usize,
}

impl Instruction {
    /// Mnemonic, or `UNKNOWN` for unassigned bytes (e.g. CBOR metadata).
    pub fn name(&self) -> &'static str {
        opcode_name(self.opcode).unwrap_or("UNKNOWN")
    }

    /// True when the push operand ran past the end of the code.
    pub fn is_truncated(&self) -> bool {
        self.data.len() < push_width(self.opcode)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}    {:02x}  {}", self.pos, self.opcode, self.name())?;
        if !self.data.is_empty() {
            write!(f, " 0x{}", hex::encode(&self.data))?;
        }
        Ok(())
    }
}

/// Decodes raw bytecode into a list of instructions.
pub fn parse_instructions(code: &[u8]) -> Vec<Instruction> {
    let mut instructions = Vec::new();
    let mut i = 0;
    while i < code.len() {
        let opcode = code[i];
        let mut data = Vec::new();
        let pos = i;
        let n = push_width(opcode);
        if n > 0 {
            let end = core::cmp::min(i + 1 + n, code.len());
            data.extend_from_slice(&code[i + 1..end]);
            i += 1 + n;
        } else {
            i += 1;
        }
        instructions.push(Instruction { opcode, data, pos });
    }
    instructions
}

/// Decodes a hex string (with or without `0x`) into instructions.
pub fn disassemble(bytecode_hex: &str) -> Result<Vec<Instruction>> {
    let bytes = hex::decode(strip_0x(bytecode_hex.trim()))
        .map_err(|e| Error::DecodeError(format!("bytecode hexadecimal inválido: {}", e)))?;
    Ok(parse_instructions(&bytes))
}

/// Renders one instruction per line, the listing printed by `decode_binary`.
pub fn format_instructions(instructions: &[Instruction]) -> String {
    let mut out = String::new();
    for ins in instructions {
        out.push_str(&ins.to_string());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncated_push_is_kept() {
        let insts = parse_instructions(&[0x60, 0x80, 0x61, 0x01]);
        assert_eq!(insts.len(), 2);
        assert_eq!(insts[1].pos, 2);
        assert!(insts[1].is_truncated());
    }

    #[test]
    fn listing_format() {
        let insts = disassemble("0x6080604052").unwrap();
        let listing = format_instructions(&insts);
        assert_eq!(
            listing,
            "0000    60  PUSH1 0x80\n0002    60  PUSH1 0x40\n0004    52  MSTORE\n"
        );
    }
}
