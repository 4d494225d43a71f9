//! Instruction decoder for the 8080.
//!
//! The opcode byte is classified against fixed bit-field patterns,
//! checked in priority order; the first matching pattern wins. Operand
//! bytes follow the opcode in the instruction stream, low byte first.
//!
//! Decoding is total but not exhaustive: the many 8080 encodings outside
//! the implemented set (arithmetic, stack, branches, I/O) classify as
//! `None` and execute as no-ops.

use crate::cpu::registers::{Register, RegisterPair};
use serde::{Serialize, Deserialize};

// Operand bit fields within the opcode byte.
const DST_MASK: u8 = 0b0011_1000; // 3-bit destination register
const SRC_MASK: u8 = 0b0000_0111; // 3-bit source register
const PAIR_MASK: u8 = 0b0011_0000; // 2-bit register pair

// Single-encoding opcodes.
const HLT: u8 = 0x76;
const LDA: u8 = 0x3a;
const STA: u8 = 0x32;

/// A decoded 8080 instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    /// Register move: dst := src. `M` on either side goes through
    /// memory at H:L.
    Mov { dst: Register, src: Register },

    /// Halt. Occupies the M,M encoding of the move pattern.
    Hlt,

    /// Immediate load: dst := value.
    Mvi { dst: Register, value: u8 },

    /// Register-pair immediate load; pair bits 11 load the stack
    /// pointer directly.
    Lxi { pair: RegisterPair, value: u16 },

    /// Direct load: A := memory[addr].
    Lda { addr: u16 },

    /// Direct store: memory[addr] := A.
    Sta { addr: u16 },
}

/// Decode one instruction from its opcode and operand bytes.
///
/// Total over all 256 opcode values; encodings outside the implemented
/// set return `None`.
pub fn decode(opcode: u8, arg1: u8, arg2: u8) -> Option<Instruction> {
    // MOV d,s   01DDDSSS
    if opcode & 0b1100_0000 == 0b0100_0000 {
        if opcode == HLT {
            return Some(Instruction::Hlt);
        }
        let dst = (opcode & DST_MASK) >> 3;
        let src = opcode & SRC_MASK;
        return Some(Instruction::Mov {
            dst: Register::from_index(dst),
            src: Register::from_index(src),
        });
    }

    // MVI d,#8   00DDD110 db
    if opcode & 0b1100_0111 == 0b0000_0110 {
        let dst = (opcode & DST_MASK) >> 3;
        return Some(Instruction::Mvi {
            dst: Register::from_index(dst),
            value: arg1,
        });
    }

    // LXI rp,#16   00RP0001 lb hb
    if opcode & 0b1100_1111 == 0b0000_0001 {
        let pair = (opcode & PAIR_MASK) >> 4;
        return Some(Instruction::Lxi {
            pair: RegisterPair::from_bits(pair),
            value: word(arg1, arg2),
        });
    }

    // LDA a16   00111010 lb hb
    if opcode == LDA {
        return Some(Instruction::Lda { addr: word(arg1, arg2) });
    }

    // STA a16   00110010 lb hb
    if opcode == STA {
        return Some(Instruction::Sta { addr: word(arg1, arg2) });
    }

    None
}

/// Number of operand bytes following the opcode, classified by the same
/// patterns and priority as `decode`. Unrecognized opcodes take no
/// operands.
pub fn operand_count(opcode: u8) -> u16 {
    if opcode & 0b1100_0000 == 0b0100_0000 {
        0
    } else if opcode & 0b1100_0111 == 0b0000_0110 {
        1
    } else if opcode & 0b1100_1111 == 0b0000_0001 {
        2
    } else if opcode == LDA || opcode == STA {
        2
    } else {
        0
    }
}

fn word(low: u8, high: u8) -> u16 {
    (high as u16) << 8 | low as u16
}

impl Instruction {
    /// Total encoded size in bytes, opcode included.
    pub fn size(&self) -> u16 {
        match self {
            Instruction::Mov { .. } | Instruction::Hlt => 1,
            Instruction::Mvi { .. } => 2,
            Instruction::Lxi { .. } | Instruction::Lda { .. } | Instruction::Sta { .. } => 3,
        }
    }

    /// Encode back to instruction-stream bytes.
    pub fn encode(&self) -> Vec<u8> {
        match *self {
            Instruction::Mov { dst, src } => {
                vec![0b0100_0000 | dst.index() << 3 | src.index()]
            }
            Instruction::Hlt => vec![HLT],
            Instruction::Mvi { dst, value } => {
                vec![0b0000_0110 | dst.index() << 3, value]
            }
            Instruction::Lxi { pair, value } => {
                vec![0b0000_0001 | pair.bits() << 4, value as u8, (value >> 8) as u8]
            }
            Instruction::Lda { addr } => vec![LDA, addr as u8, (addr >> 8) as u8],
            Instruction::Sta { addr } => vec![STA, addr as u8, (addr >> 8) as u8],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_mov() {
        assert_eq!(
            decode(0x41, 0, 0),
            Some(Instruction::Mov { dst: Register::B, src: Register::C })
        );
        assert_eq!(
            decode(0x78, 0, 0),
            Some(Instruction::Mov { dst: Register::A, src: Register::B })
        );
        // M operands are ordinary move encodings
        assert_eq!(
            decode(0x77, 0, 0),
            Some(Instruction::Mov { dst: Register::M, src: Register::A })
        );
    }

    #[test]
    fn test_decode_hlt() {
        // The M,M move encoding is HLT
        assert_eq!(decode(0x76, 0, 0), Some(Instruction::Hlt));
    }

    #[test]
    fn test_decode_mvi() {
        assert_eq!(
            decode(0x06, 0x12, 0),
            Some(Instruction::Mvi { dst: Register::B, value: 0x12 })
        );
        assert_eq!(
            decode(0x3e, 0x7b, 0),
            Some(Instruction::Mvi { dst: Register::A, value: 0x7b })
        );
        assert_eq!(
            decode(0x36, 0xab, 0),
            Some(Instruction::Mvi { dst: Register::M, value: 0xab })
        );
    }

    #[test]
    fn test_decode_lxi() {
        assert_eq!(
            decode(0x01, 0xcd, 0xab),
            Some(Instruction::Lxi { pair: RegisterPair::Bc, value: 0xabcd })
        );
        assert_eq!(
            decode(0x11, 0x22, 0x11),
            Some(Instruction::Lxi { pair: RegisterPair::De, value: 0x1122 })
        );
        assert_eq!(
            decode(0x21, 0x34, 0x12),
            Some(Instruction::Lxi { pair: RegisterPair::Hl, value: 0x1234 })
        );
        assert_eq!(
            decode(0x31, 0xfe, 0xff),
            Some(Instruction::Lxi { pair: RegisterPair::Sp, value: 0xfffe })
        );
    }

    #[test]
    fn test_decode_direct_load_store() {
        assert_eq!(decode(0x3a, 0x34, 0x12), Some(Instruction::Lda { addr: 0x1234 }));
        assert_eq!(decode(0x32, 0x00, 0x00), Some(Instruction::Sta { addr: 0x0000 }));
    }

    #[test]
    fn test_decode_unrecognized() {
        for opcode in [0x00, 0x80, 0xc3, 0xff] {
            assert_eq!(decode(opcode, 0x12, 0x34), None, "opcode {:#04x}", opcode);
        }
    }

    #[test]
    fn test_decodable_opcode_census() {
        // 64 move encodings (HLT included), 8 immediate loads, 4 pair
        // loads, LDA and STA.
        let decodable = (0..=255u8)
            .filter(|op| decode(*op, 0, 0).is_some())
            .count();
        assert_eq!(decodable, 64 + 8 + 4 + 2);
    }

    #[test]
    fn test_operand_count() {
        assert_eq!(operand_count(0x41), 0); // MOV
        assert_eq!(operand_count(0x76), 0); // HLT
        assert_eq!(operand_count(0x3e), 1); // MVI
        assert_eq!(operand_count(0x31), 2); // LXI
        assert_eq!(operand_count(0x3a), 2); // LDA
        assert_eq!(operand_count(0x32), 2); // STA
        assert_eq!(operand_count(0xff), 0); // unrecognized
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let test_cases = [
            Instruction::Mov { dst: Register::B, src: Register::A },
            Instruction::Hlt,
            Instruction::Mvi { dst: Register::M, value: 0x55 },
            Instruction::Lxi { pair: RegisterPair::Sp, value: 0xfffe },
            Instruction::Lda { addr: 0xbeef },
            Instruction::Sta { addr: 0x0001 },
        ];

        for instr in test_cases {
            let bytes = instr.encode();
            assert_eq!(bytes.len() as u16, instr.size());

            let arg1 = bytes.get(1).copied().unwrap_or(0);
            let arg2 = bytes.get(2).copied().unwrap_or(0);
            assert_eq!(decode(bytes[0], arg1, arg2), Some(instr));
        }
    }
}
