//! Command-line driver for the RV32IM instruction set simulator.
//!
//! Usage:
//!
//! ```text
//! iss <EXECUTABLE> <TEXT_START> <STACK_BASE> <STACK_SIZE> [-o OUTPUT] [-m MEM_FILE]
//! iss firmware.elf 0x100000 0x80000000 0x1000 -o iss.log
//! ```

use clap::Parser;

use rv32im_iss::driver::Driver;
use rv32im_iss::elf_utils::{load_elf, load_hex_file};
use rv32im_iss::memory::Memory;

/// Parse a hexadecimal CLI argument, with or without a `0x`/`0X` prefix.
/// Always base-16: the CLI's positional arguments are specified as hex
/// (spec section 6), never decimal, so an all-decimal-digit string like
/// `1000` must still be read as `0x1000`.
fn hex_u32(s: &str) -> Result<u32, String> {
    let digits = s.trim_start_matches("0x").trim_start_matches("0X");
    u32::from_str_radix(digits, 16).map_err(|e| format!("{s:?} is not a valid hexadecimal value: {e}"))
}

/// RV32IM instruction set simulator: emulates a RISC-V executable and
/// emits a deterministic execution trace for RTL verification.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the RISC-V executable (ELF, with a mandatory .text section)
    executable: String,

    /// Program counter reset vector (hex, `_start` address)
    #[arg(value_parser = hex_u32)]
    text_start: u32,

    /// Base address of the stack region (hex)
    #[arg(value_parser = hex_u32)]
    stack_base: u32,

    /// Size in bytes of the stack region (hex); x2 is initialised to
    /// stack_base + stack_size
    #[arg(value_parser = hex_u32)]
    stack_size: u32,

    /// Path to write the execution trace
    #[arg(short, long, default_value = "iss.log")]
    output: String,

    /// Optional preloaded data memory image: one 32-bit hex word per line,
    /// stored little-endian starting at address 0
    #[arg(short, long)]
    mem_file: Option<String>,
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut mem = Memory::new();

    if let Some(mem_file) = &args.mem_file {
        load_hex_file(mem_file, &mut mem)?;
    }

    let image = load_elf(&args.executable, args.text_start, &mut mem)?;

    let mut driver = Driver::new(mem, args.text_start, image.text_size, args.stack_base, args.stack_size);
    driver.run()?;
    driver.write_trace(&args.output)?;

    Ok(())
}

fn main() {
    let args = Args::parse();
    if let Err(err) = run(args) {
        eprintln!("iss: {err}");
        std::process::exit(1);
    }
}
