//! ROM file format for 8080 programs.
//!
//! ROM images are plain text:
//! - Whitespace-separated hex byte tokens, one instruction per line by
//!   convention
//! - Lines starting with `;` are comments; `;` also starts a trailing
//!   comment
//! - Blank lines are ignored

use std::io::Write;
use std::path::Path;
use thiserror::Error;
use crate::cpu::decode;

/// A loaded ROM file.
#[derive(Debug, Clone)]
pub struct RomFile {
    /// The program bytes, in instruction-stream order.
    pub bytes: Vec<u8>,
    /// Original source lines (for listings and debugging).
    pub source_lines: Vec<String>,
}

impl RomFile {
    /// Create a new empty ROM.
    pub fn new() -> Self {
        Self {
            bytes: Vec::new(),
            source_lines: Vec::new(),
        }
    }

    /// Add one instruction's bytes.
    pub fn push(&mut self, bytes: &[u8], source: &str) {
        self.bytes.extend_from_slice(bytes);
        self.source_lines.push(source.to_string());
    }

    /// Get the number of program bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl Default for RomFile {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse ROM text.
pub fn parse_rom(source: &str) -> Result<RomFile, RomError> {
    let mut rom = RomFile::new();

    for (line_num, line) in source.lines().enumerate() {
        let trimmed = line.trim();

        // Skip empty lines and comments
        if trimmed.is_empty() || trimmed.starts_with(';') {
            continue;
        }

        let payload = match trimmed.split_once(';') {
            Some((code, _)) => code.trim(),
            None => trimmed,
        };
        if payload.is_empty() {
            continue;
        }

        let mut bytes = Vec::new();
        for token in payload.split_whitespace() {
            let byte = u8::from_str_radix(token, 16).map_err(|_| RomError::ParseError {
                line: line_num + 1,
                message: format!("invalid hex byte {:?}", token),
            })?;
            bytes.push(byte);
        }

        rom.push(&bytes, trimmed);
    }

    Ok(rom)
}

/// Load a ROM file from disk.
pub fn load_rom<P: AsRef<Path>>(path: P) -> Result<RomFile, RomError> {
    let text = std::fs::read_to_string(path.as_ref())
        .map_err(|e| RomError::IoError(e.to_string()))?;
    parse_rom(&text)
}

/// Render a ROM back to text, one instruction per line with its address
/// as a trailing comment.
pub fn format_rom(rom: &RomFile) -> String {
    let mut output = String::new();
    output.push_str("; 8080 ROM image\n");
    output.push_str(&format!("; {} bytes\n\n", rom.bytes.len()));

    let mut addr = 0usize;
    while addr < rom.bytes.len() {
        let opcode = rom.bytes[addr];
        let size = (1 + decode::operand_count(opcode) as usize).min(rom.bytes.len() - addr);

        let hex: Vec<String> = rom.bytes[addr..addr + size]
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect();
        output.push_str(&format!("{:<8} ; {:04x}\n", hex.join(" "), addr));

        addr += size;
    }

    output
}

/// Save a ROM file to disk.
pub fn save_rom<P: AsRef<Path>>(path: P, rom: &RomFile) -> Result<(), RomError> {
    let mut file = std::fs::File::create(path.as_ref())
        .map_err(|e| RomError::IoError(e.to_string()))?;

    file.write_all(format_rom(rom).as_bytes())
        .map_err(|e| RomError::IoError(e.to_string()))
}

/// Errors that can occur during ROM operations.
#[derive(Debug, Clone, Error)]
pub enum RomError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("parse error on line {line}: {message}")]
    ParseError { line: usize, message: String },
}
