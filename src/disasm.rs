//! Disassembler for 8080 instruction streams.
//!
//! Converts raw bytes back to readable assembly, one instruction per
//! line with its address and raw bytes alongside.

use crate::cpu::decode::{self, Instruction};

/// Format a decoded instruction as assembly text.
pub fn format_instruction(instr: &Instruction) -> String {
    match *instr {
        Instruction::Mov { dst, src } => format!("MOV {},{}", dst.name(), src.name()),
        Instruction::Hlt => "HLT".to_string(),
        Instruction::Mvi { dst, value } => format!("MVI {},{:#04x}", dst.name(), value),
        Instruction::Lxi { pair, value } => format!("LXI {},{:#06x}", pair.name(), value),
        Instruction::Lda { addr } => format!("LDA {:#06x}", addr),
        Instruction::Sta { addr } => format!("STA {:#06x}", addr),
    }
}

/// Disassemble a byte stream into an addressed listing.
///
/// Unrecognized bytes are listed as `???` and consumed one at a time,
/// the same way the step driver skips them.
pub fn disassemble(bytes: &[u8]) -> String {
    let mut output = String::new();
    let mut addr = 0usize;

    while addr < bytes.len() {
        let opcode = bytes[addr];
        let size = 1 + decode::operand_count(opcode) as usize;
        let arg1 = bytes.get(addr + 1).copied().unwrap_or(0);
        let arg2 = bytes.get(addr + 2).copied().unwrap_or(0);

        let text = match decode::decode(opcode, arg1, arg2) {
            Some(instr) => format_instruction(&instr),
            None => format!("??? ; {:#04x}", opcode),
        };

        let end = (addr + size).min(bytes.len());
        let raw: Vec<String> = bytes[addr..end].iter().map(|b| format!("{:02x}", b)).collect();
        output.push_str(&format!("{:04x}: {:<8}  {}\n", addr, raw.join(" "), text));

        addr += size;
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::registers::{Register, RegisterPair};

    #[test]
    fn test_format_instructions() {
        assert_eq!(
            format_instruction(&Instruction::Mov { dst: Register::B, src: Register::C }),
            "MOV B,C"
        );
        assert_eq!(format_instruction(&Instruction::Hlt), "HLT");
        assert_eq!(
            format_instruction(&Instruction::Mvi { dst: Register::A, value: 0x7b }),
            "MVI A,0x7b"
        );
        assert_eq!(
            format_instruction(&Instruction::Lxi { pair: RegisterPair::Sp, value: 0xfffe }),
            "LXI SP,0xfffe"
        );
        assert_eq!(
            format_instruction(&Instruction::Lda { addr: 0x1234 }),
            "LDA 0x1234"
        );
    }

    #[test]
    fn test_disassemble_stream() {
        // MVI A,0x7b / STA 0x0010 / HLT
        let listing = disassemble(&[0x3e, 0x7b, 0x32, 0x10, 0x00, 0x76]);
        let lines: Vec<&str> = listing.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("0000:"));
        assert!(lines[0].contains("MVI A,0x7b"));
        assert!(lines[1].starts_with("0002:"));
        assert!(lines[1].contains("STA 0x0010"));
        assert!(lines[2].starts_with("0005:"));
        assert!(lines[2].contains("HLT"));
    }

    #[test]
    fn test_disassemble_unknown_bytes() {
        let listing = disassemble(&[0xff, 0x76]);
        let lines: Vec<&str> = listing.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("???"));
        assert!(lines[0].contains("0xff"));
        assert!(lines[1].contains("HLT"));
    }
}
