//! Driver
//!
//! Owns the fetch/decode/execute loop, the program counter, and the trace
//! buffer. Everything else (register file, memory, decoder, disassembler,
//! executor) is a pure leaf the driver wires together; this is the only
//! component that decides when to stop and what a trace line looks like.

use std::fs;
use std::io;

use thiserror::Error;

use crate::decode::decode;
use crate::disasm::disassemble;
use crate::exec::execute;
use crate::memory::Memory;
use crate::registers::Registers;
use crate::utils::hex8;

/// Canonical NOP encoding, `addi x0,x0,0`. Executed (PC advances) but never
/// traced.
const NOP_ENCODING: u32 = 0x0000_0013;

/// Safety valve: the driver stops unconditionally after this many retired
/// instructions, regardless of architectural state.
pub const INSTRUCTION_CAP: u32 = 1_000_000;

#[derive(Error, Debug)]
pub enum DriverError {
    #[error("misaligned program counter 0x{pc:08x} at fetch time")]
    MisalignedPc { pc: u32 },

    #[error("could not write trace to {path}: {source}")]
    WriteTrace { path: String, #[source] source: io::Error },
}

/// One RV32IM hart: register file, memory, program counter, and the
/// accumulated trace of retired instructions.
pub struct Driver {
    pub regs: Registers,
    pub mem: Memory,
    pc: u32,
    text_start: u32,
    text_size: u32,
    trace_lines: Vec<String>,
}

impl Driver {
    /// Build a driver with memory already populated by the image loader.
    /// `stack_base + stack_size` becomes the initial value of `x2` (the
    /// stack pointer); the program counter starts at `text_start`.
    pub fn new(mem: Memory, text_start: u32, text_size: u32, stack_base: u32, stack_size: u32) -> Self {
        let mut regs = Registers::new();
        regs.write(2, stack_base.wrapping_add(stack_size));
        Driver { regs, mem, pc: text_start, text_start, text_size, trace_lines: Vec::new() }
    }

    pub fn pc(&self) -> u32 {
        self.pc
    }

    /// Run the fetch/decode/execute loop to completion. Returns `Ok(())` on
    /// any non-fatal termination condition (leaving the text section, a
    /// zero/all-ones fetch, a terminating store, `ecall`/`ebreak`, or the
    /// instruction cap); returns `Err` only on the fatal conditions listed
    /// in the simulator's error design (misaligned PC).
    pub fn run(&mut self) -> Result<(), DriverError> {
        for _ in 0..INSTRUCTION_CAP {
            if self.pc < self.text_start || self.pc >= self.text_start.wrapping_add(self.text_size) {
                break;
            }
            if self.pc % 4 != 0 {
                return Err(DriverError::MisalignedPc { pc: self.pc });
            }

            let word = self.mem.read_word(self.pc);
            if word == 0x0000_0000 || word == 0xffff_ffff {
                break;
            }
            if word == NOP_ENCODING {
                self.pc = self.pc.wrapping_add(4);
                continue;
            }

            let decoded = decode(word);
            let pc_before = self.pc;
            let outcome = execute(&decoded, pc_before, &mut self.regs, &mut self.mem);
            let disasm = disassemble(&decoded, word);

            let mut line = format!("{};{};{};", hex8(pc_before), hex8(word), disasm);
            line.push_str(&outcome.effects.join(";"));
            self.trace_lines.push(line);

            self.pc = outcome.next_pc;
            if !outcome.should_continue {
                break;
            }
        }
        Ok(())
    }

    /// The accumulated trace, one line per retired non-NOP instruction,
    /// joined with `\n` and no trailing newline.
    pub fn trace_text(&self) -> String {
        self.trace_lines.join("\n")
    }

    pub fn trace_lines(&self) -> &[String] {
        &self.trace_lines
    }

    /// Write the trace to `path`, fully buffered, in a single write.
    pub fn write_trace(&self, path: &str) -> Result<(), DriverError> {
        fs::write(path, self.trace_text())
            .map_err(|source| DriverError::WriteTrace { path: path.to_string(), source })
    }
}
