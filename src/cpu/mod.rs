//! CPU emulation for the Intel 8080.
//!
//! This module implements the machine core:
//! - 64 KiB of byte-addressed memory
//! - the register file: B, C, D, E, H, L, A slots plus the M memory
//!   pseudo-register, with 16-bit PC and SP
//! - the bit-field instruction decoder and execution engine, with a thin
//!   fetch/step driver on top

pub mod memory;
pub mod registers;
pub mod decode;
pub mod execute;

pub use memory::{Memory, MemoryError, MEMORY_SIZE};
pub use registers::{Register, RegisterPair, Registers, REGISTER_NAMES, register_index, register_name};
pub use decode::Instruction;
pub use execute::{Cpu, CpuError, CpuState};
