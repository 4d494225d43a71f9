//! Machine-state snapshots.
//!
//! The whole machine (registers, memory, run state) serializes to JSON,
//! so a run can be captured to disk, inspected, and loaded back into an
//! emulator later.

use std::path::Path;
use thiserror::Error;
use crate::cpu::Cpu;

/// Save the machine state to a JSON file.
pub fn save_snapshot<P: AsRef<Path>>(path: P, cpu: &Cpu) -> Result<(), SnapshotError> {
    let json = serde_json::to_string_pretty(cpu)
        .map_err(|e| SnapshotError::Encoding(e.to_string()))?;

    std::fs::write(path.as_ref(), json)
        .map_err(|e| SnapshotError::IoError(e.to_string()))
}

/// Load a machine state from a JSON file.
pub fn load_snapshot<P: AsRef<Path>>(path: P) -> Result<Cpu, SnapshotError> {
    let json = std::fs::read_to_string(path.as_ref())
        .map_err(|e| SnapshotError::IoError(e.to_string()))?;

    serde_json::from_str(&json)
        .map_err(|e| SnapshotError::Encoding(e.to_string()))
}

/// Errors that can occur during snapshot operations.
#[derive(Debug, Clone, Error)]
pub enum SnapshotError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("encoding error: {0}")]
    Encoding(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cpu::CpuState;

    #[test]
    fn test_snapshot_json_roundtrip() {
        let mut cpu = Cpu::new();
        cpu.execute_instruction(0x3e, 123, 0);     // MVI A,123
        cpu.execute_instruction(0x31, 0xfe, 0xff); // LXI SP,0xfffe
        cpu.execute_instruction(0x32, 0x10, 0x00); // STA 0x0010
        cpu.execute_instruction(0x76, 0, 0);       // HLT

        let json = serde_json::to_string(&cpu).unwrap();
        let restored: Cpu = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.regs, cpu.regs);
        assert_eq!(restored.mem, cpu.mem);
        assert_eq!(restored.state, CpuState::Halted);
    }
}
