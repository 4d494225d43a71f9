//! Execution engine for the 8080 core.
//!
//! `execute_instruction` applies a single instruction, given as explicit
//! bytes, to the machine state. The fetch/step driver layered on top
//! reads the instruction stream from emulated memory; the engine itself
//! never touches the program counter.

use crate::cpu::{Memory, Registers};
use crate::cpu::decode::{self, Instruction};
use crate::cpu::memory::MemoryError;
use crate::cpu::registers::Register;
use serde::{Serialize, Deserialize};
use thiserror::Error;

/// Machine execution state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpuState {
    /// Executing instructions.
    Running,
    /// Latched by HLT; cleared by reset.
    Halted,
}

/// The 8080 machine: register file, memory and run state.
#[derive(Clone, Serialize, Deserialize)]
pub struct Cpu {
    /// CPU registers.
    pub regs: Registers,
    /// Main memory.
    pub mem: Memory,
    /// Current execution state.
    pub state: CpuState,
    /// Instructions retired by the step driver.
    pub cycles: u64,
    /// Last instruction retired by the step driver (for debugging).
    last_instr: Option<Instruction>,
}

impl Cpu {
    /// Create a new machine with zeroed state.
    pub fn new() -> Self {
        Self {
            regs: Registers::new(),
            mem: Memory::new(),
            state: CpuState::Running,
            cycles: 0,
            last_instr: None,
        }
    }

    /// Reset the machine: zero both pointers, every register and every
    /// memory cell, clear the halt latch and the cycle count.
    pub fn reset(&mut self) {
        self.regs.reset();
        self.mem.clear();
        self.state = CpuState::Running;
        self.cycles = 0;
        self.last_instr = None;
    }

    /// Load a program image at address 0.
    pub fn load_program(&mut self, image: &[u8]) -> Result<(), MemoryError> {
        self.mem.load(0, image)
    }

    /// Execute one instruction given as explicit bytes.
    ///
    /// This is the raw engine: it does not fetch and does not advance
    /// the program counter. It accepts all 256 opcode values; opcodes
    /// outside the implemented encodings change nothing.
    pub fn execute_instruction(&mut self, opcode: u8, arg1: u8, arg2: u8) {
        if let Some(instr) = decode::decode(opcode, arg1, arg2) {
            self.apply(instr);
        }
    }

    /// Fetch, decode and execute the instruction at the program counter.
    ///
    /// The program counter advances past the full instruction (opcode
    /// plus operand bytes, wrapping at the top of memory) before the
    /// effect is applied. Returns the decoded instruction, or `None`
    /// when the fetched byte is not an implemented encoding; such bytes
    /// are consumed as one-byte no-ops so execution keeps moving.
    pub fn step(&mut self) -> Result<Option<Instruction>, CpuError> {
        if self.state != CpuState::Running {
            return Err(CpuError::NotRunning(self.state));
        }

        // Fetch
        let pc = self.regs.pc;
        let opcode = self.mem.read(pc);
        let arg1 = self.mem.read(pc.wrapping_add(1));
        let arg2 = self.mem.read(pc.wrapping_add(2));
        self.regs.advance_pc(1 + decode::operand_count(opcode));

        // Decode and execute
        let decoded = decode::decode(opcode, arg1, arg2);
        if let Some(instr) = decoded {
            self.apply(instr);
        }

        self.cycles += 1;
        self.last_instr = decoded;

        Ok(decoded)
    }

    /// Run until the machine halts.
    ///
    /// Returns the number of instructions executed. Without a HLT in
    /// reach of the program counter this never returns; callers that
    /// cannot guarantee one should use `run_limited`.
    pub fn run(&mut self) -> Result<u64, CpuError> {
        let start_cycles = self.cycles;

        while self.state == CpuState::Running {
            self.step()?;
        }

        Ok(self.cycles - start_cycles)
    }

    /// Run for at most `max_cycles` instructions.
    pub fn run_limited(&mut self, max_cycles: u64) -> Result<u64, CpuError> {
        let start_cycles = self.cycles;
        let limit = self.cycles + max_cycles;

        while self.state == CpuState::Running && self.cycles < limit {
            self.step()?;
        }

        Ok(self.cycles - start_cycles)
    }

    /// Apply a decoded instruction to the machine state.
    fn apply(&mut self, instr: Instruction) {
        match instr {
            Instruction::Mov { dst, src } => {
                let value = self.read_operand(src);
                self.write_operand(dst, value);
            }

            Instruction::Hlt => {
                self.state = CpuState::Halted;
            }

            Instruction::Mvi { dst, value } => {
                self.write_operand(dst, value);
            }

            Instruction::Lxi { pair, value } => {
                // SP is routed to the 16-bit register inside set_pair;
                // slot resolution only ever sees BC, DE and HL.
                self.regs.set_pair(pair, value);
            }

            Instruction::Lda { addr } => {
                let value = self.mem.read(addr);
                self.regs.set(Register::A, value);
            }

            Instruction::Sta { addr } => {
                self.mem.write(addr, self.regs.get(Register::A));
            }
        }
    }

    /// Read a register operand. `M` names the memory byte at H:L, not a
    /// register slot.
    fn read_operand(&self, reg: Register) -> u8 {
        match reg {
            Register::M => self.mem.read(self.regs.hl()),
            _ => self.regs.get(reg),
        }
    }

    /// Write a register operand, with the same `M` redirection.
    fn write_operand(&mut self, reg: Register, value: u8) {
        match reg {
            Register::M => self.mem.write(self.regs.hl(), value),
            _ => self.regs.set(reg, value),
        }
    }

    /// The instruction most recently retired by the step driver.
    pub fn last_instruction(&self) -> Option<Instruction> {
        self.last_instr
    }

    /// Check if the machine has halted.
    pub fn is_halted(&self) -> bool {
        self.state == CpuState::Halted
    }

    /// Check if the machine is running.
    pub fn is_running(&self) -> bool {
        self.state == CpuState::Running
    }
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Cpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cpu")
            .field("state", &self.state)
            .field("cycles", &self.cycles)
            .field("regs", &self.regs)
            .finish()
    }
}

/// Errors that can occur in the step driver.
#[derive(Debug, Clone, Error)]
pub enum CpuError {
    #[error("CPU not running: {0:?}")]
    NotRunning(CpuState),
}
