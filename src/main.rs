//! 8080 Emulator - CLI Entry Point
//!
//! Commands:
//! - `i8080-emu run <program>` - Run a ROM or raw binary until halt
//! - `i8080-emu monitor` - Interactive monitor
//! - `i8080-emu disasm <program>` - Disassemble a program
//! - `i8080-emu test` - Built-in self-test

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "i8080-emu")]
#[command(version = "0.1.0")]
#[command(about = "An emulator of the Intel 8080 instruction set")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program until it halts
    Run {
        /// Path to the ROM (hex text) or raw binary to execute
        program: String,
        /// Maximum number of instructions to execute (default: 10000)
        #[arg(short, long, default_value = "10000")]
        max_cycles: u64,
        /// Show a trace of each executed instruction
        #[arg(short, long)]
        trace: bool,
        /// Write the final machine state to a JSON snapshot
        #[arg(long)]
        state_out: Option<String>,
    },
    /// Interactive monitor: type instruction bytes, inspect state
    Monitor,
    /// Disassemble a program to readable text
    Disasm {
        /// Path to the ROM or raw binary
        program: String,
    },
    /// Run the built-in self-test
    Test,
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run { program, max_cycles, trace, state_out }) => {
            run_program(&program, max_cycles, trace, state_out.as_deref());
        }
        Some(Commands::Monitor) => {
            monitor();
        }
        Some(Commands::Disasm { program }) => {
            disassemble_file(&program);
        }
        Some(Commands::Test) => {
            run_self_test();
        }
        None => {
            println!("8080 Emulator v0.1.0");
            println!("An Intel 8080 instruction set emulator");
            println!();
            println!("Use --help for available commands");
            println!();
            demo();
        }
    }
}

/// Load program bytes from a hex-text ROM (by extension) or a raw
/// binary file.
fn load_program_bytes(path: &str) -> Vec<u8> {
    use i8080::load_rom;

    if path.ends_with(".rom") || path.ends_with(".hex") {
        match load_rom(path) {
            Ok(rom) => {
                println!("📂 Loaded {} bytes", rom.len());
                rom.bytes
            }
            Err(e) => {
                eprintln!("❌ Failed to load ROM: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        match std::fs::read(path) {
            Ok(bytes) => {
                println!("📂 Loaded {} bytes", bytes.len());
                bytes
            }
            Err(e) => {
                eprintln!("❌ Failed to read file: {}", e);
                std::process::exit(1);
            }
        }
    }
}

fn run_program(path: &str, max_cycles: u64, trace: bool, state_out: Option<&str>) {
    use i8080::{Cpu, disasm, save_snapshot};

    println!("🔧 Running: {}", path);

    let bytes = load_program_bytes(path);
    if bytes.is_empty() {
        eprintln!("❌ No instructions to execute");
        std::process::exit(1);
    }

    let mut cpu = Cpu::new();
    if let Err(e) = cpu.load_program(&bytes) {
        eprintln!("❌ Failed to load program: {}", e);
        std::process::exit(1);
    }

    println!();
    println!("━━━ Execution ━━━");

    let mut cycles = 0u64;
    while cpu.is_running() && cycles < max_cycles {
        let pc = cpu.regs.pc;

        match cpu.step() {
            Ok(decoded) => {
                if trace {
                    let text = match decoded {
                        Some(instr) => disasm::format_instruction(&instr),
                        None => "???".to_string(),
                    };
                    println!("{:04x}: {}", pc, text);
                }
                cycles += 1;
            }
            Err(e) => {
                eprintln!("❌ CPU error at PC={:04x}: {}", pc, e);
                std::process::exit(1);
            }
        }
    }

    println!();
    println!("━━━ Result ━━━");
    println!("Cycles: {}", cycles);
    println!("State: {:?}", cpu.state);
    print_registers(&cpu);

    if cycles >= max_cycles {
        println!();
        println!("⚠️  Reached max cycles limit ({}). Use --max-cycles to increase.", max_cycles);
    }

    if let Some(path) = state_out {
        match save_snapshot(path, &cpu) {
            Ok(()) => println!("✓ State written to {}", path),
            Err(e) => {
                eprintln!("❌ Failed to write snapshot: {}", e);
                std::process::exit(1);
            }
        }
    }
}

/// Interactive monitor. Lines of hex byte tokens are executed as single
/// instructions; short commands inspect and manage the machine.
fn monitor() {
    use std::io::{self, BufRead, Write};
    use i8080::{Cpu, disasm, load_snapshot, save_snapshot};
    use i8080::cpu::decode;
    use i8080::cpu::register_index;

    println!("8080 monitor. Type instruction bytes in hex (e.g. `3e 7b`).");
    println!("Commands: r [NAME] | m <addr> <len> | save <file> | load <file> | z | q");

    let mut cpu = Cpu::new();
    let stdin = io::stdin();

    loop {
        print!("> ");
        let _ = io::stdout().flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) | Err(_) => break, // EOF
            Ok(_) => {}
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.as_slice() {
            [] => {}
            ["q"] => break,
            ["z"] => {
                cpu.reset();
                println!("✓ Machine reset");
            }
            ["r"] => print_registers(&cpu),
            ["r", name] => {
                let looked_up = name.chars().next().and_then(register_index);
                match looked_up {
                    Some(index) => println!(
                        "{} = {:02x}",
                        name.to_uppercase(),
                        cpu.regs.gpr[index as usize]
                    ),
                    None => println!("❌ Unknown register {:?}", name),
                }
            }
            ["m", addr, len] => {
                let addr = u16::from_str_radix(addr.trim_start_matches("0x"), 16);
                let len = len.parse::<usize>();
                match (addr, len) {
                    (Ok(addr), Ok(len)) => print_memory(&cpu, addr, len),
                    _ => println!("❌ Usage: m <hex addr> <len>"),
                }
            }
            ["save", path] => match save_snapshot(path, &cpu) {
                Ok(()) => println!("✓ State written to {}", path),
                Err(e) => println!("❌ Failed to write snapshot: {}", e),
            },
            ["load", path] => match load_snapshot(path) {
                Ok(loaded) => {
                    cpu = loaded;
                    println!("✓ State loaded from {}", path);
                }
                Err(e) => println!("❌ Failed to load snapshot: {}", e),
            },
            byte_tokens => {
                let mut bytes = Vec::new();
                let mut ok = true;
                for token in byte_tokens {
                    match u8::from_str_radix(token, 16) {
                        Ok(byte) => bytes.push(byte),
                        Err(_) => {
                            println!("❌ Invalid hex byte {:?}", token);
                            ok = false;
                            break;
                        }
                    }
                }
                if !ok {
                    continue;
                }

                let opcode = bytes[0];
                let arg1 = bytes.get(1).copied().unwrap_or(0);
                let arg2 = bytes.get(2).copied().unwrap_or(0);
                cpu.execute_instruction(opcode, arg1, arg2);

                match decode::decode(opcode, arg1, arg2) {
                    Some(instr) => println!("✓ {}", disasm::format_instruction(&instr)),
                    None => println!("✓ (unrecognized opcode, no effect)"),
                }
            }
        }
    }
}

fn disassemble_file(path: &str) {
    use i8080::disasm;

    println!("📖 Disassembling: {}", path);
    println!();

    let bytes = load_program_bytes(path);
    print!("{}", disasm::disassemble(&bytes));
}

fn print_registers(cpu: &i8080::Cpu) {
    use i8080::cpu::REGISTER_NAMES;

    println!("PC = {:04x}", cpu.regs.pc);
    println!("SP = {:04x}", cpu.regs.sp);
    for (name, index) in REGISTER_NAMES {
        println!("{}  = {:02x}", name, cpu.regs.gpr[index as usize]);
    }
}

fn print_memory(cpu: &i8080::Cpu, start: u16, count: usize) {
    for (addr, value) in cpu.mem.dump(start, count) {
        println!("{:04x} = {:02x}", addr, value);
    }
}

fn demo() {
    use i8080::Cpu;

    println!("━━━ Demo ━━━");
    println!();

    let mut cpu = Cpu::new();
    cpu.execute_instruction(0x3e, 123, 0);     // MVI A,123
    cpu.execute_instruction(0x32, 0x00, 0x00); // STA 0x0000

    println!("After MVI A,123 and STA 0x0000:");
    print_registers(&cpu);
    print_memory(&cpu, 0x0000, 4);
}

fn run_self_test() {
    use i8080::{Cpu, Instruction, Register, RegisterPair};

    println!("━━━ 8080 Emulator Self-Test ━━━");
    println!();

    let mut passed = 0;
    let mut failed = 0;

    // Test 1: register move
    print!("Register move... ");
    let mut cpu = Cpu::new();
    cpu.execute_instruction(0x06, 0x42, 0); // MVI B,0x42
    cpu.execute_instruction(0x48, 0, 0);    // MOV C,B
    if cpu.regs.gpr[1] == 0x42 {
        println!("✓");
        passed += 1;
    } else {
        println!("✗");
        failed += 1;
    }

    // Test 2: stack pointer immediate
    print!("Stack pointer immediate load... ");
    let mut cpu = Cpu::new();
    cpu.execute_instruction(0x31, 0xfe, 0xff);
    if cpu.regs.sp == 0xfffe {
        println!("✓");
        passed += 1;
    } else {
        println!("✗ (got {:04x}, expected fffe)", cpu.regs.sp);
        failed += 1;
    }

    // Test 3: direct store/load roundtrip
    print!("Direct store/load roundtrip... ");
    let mut cpu = Cpu::new();
    cpu.execute_instruction(0x3e, 123, 0);
    cpu.execute_instruction(0x32, 0x00, 0x00);
    cpu.execute_instruction(0x3a, 0x00, 0x00);
    if cpu.regs.gpr[7] == 123 && cpu.mem.read(0) == 123 {
        println!("✓");
        passed += 1;
    } else {
        println!("✗");
        failed += 1;
    }

    // Test 4: memory pseudo-register redirection
    print!("M redirection through H:L... ");
    let mut cpu = Cpu::new();
    cpu.execute_instruction(0x21, 0x34, 0x12); // LXI H,0x1234
    cpu.execute_instruction(0x36, 0xab, 0);    // MVI M,0xab
    if cpu.mem.read(0x1234) == 0xab {
        println!("✓");
        passed += 1;
    } else {
        println!("✗");
        failed += 1;
    }

    // Test 5: unrecognized opcode is a no-op
    print!("Unrecognized opcode no-op... ");
    let mut cpu = Cpu::new();
    cpu.execute_instruction(0xff, 0x12, 0x34);
    if cpu.regs == i8080::Registers::new() {
        println!("✓");
        passed += 1;
    } else {
        println!("✗");
        failed += 1;
    }

    // Test 6: program runs to halt
    print!("Fetch loop runs to halt... ");
    let mut cpu = Cpu::new();
    let program: Vec<u8> = [
        Instruction::Lxi { pair: RegisterPair::Sp, value: 0xfffe },
        Instruction::Mvi { dst: Register::A, value: 0x07 },
        Instruction::Sta { addr: 0x0100 },
        Instruction::Hlt,
    ]
    .iter()
    .flat_map(|i| i.encode())
    .collect();
    cpu.load_program(&program).unwrap();
    let result = cpu.run();
    if result.is_ok() && cpu.is_halted() && cpu.mem.read(0x0100) == 0x07 {
        println!("✓");
        passed += 1;
    } else {
        println!("✗");
        failed += 1;
    }

    println!();
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Results: {} passed, {} failed", passed, failed);

    if failed == 0 {
        println!("✓ All tests passed!");
    } else {
        std::process::exit(1);
    }
}
