//! Executor
//!
//! Applies one decoded instruction to the register file, memory and
//! program counter, and returns the ordered list of architecturally
//! visible side effects for the trace (unprivileged spec chapters 2
//! and "M" extension). The executor never touches trace formatting
//! beyond producing these effect tokens; the driver owns the rest of
//! the trace line.

use crate::decode::Decoded;
use crate::memory::Memory;
use crate::registers::Registers;
use crate::utils::{as_signed, as_unsigned, hex8};

/// Address whose store terminates the simulation (see driver/CLI docs).
pub const TERMINATION_ADDR: u32 = 0x1000_0000;

pub struct StepOutcome {
    pub next_pc: u32,
    pub effects: Vec<String>,
    /// `false` means the driver should stop after this instruction.
    pub should_continue: bool,
}

fn reg_write_effect(regs: &Registers, rd: u8) -> String {
    format!("x{rd}={}", hex8(regs.read(rd)))
}

fn sext_byte(value: u8) -> u32 {
    as_unsigned(i32::from(value as i8))
}

fn sext_half(value: u16) -> u32 {
    as_unsigned(i32::from(value as i16))
}

fn mul_div_values(regs: &Registers, rs1: u8, rs2: u8) -> (u32, u32) {
    (regs.read(rs1), regs.read(rs2))
}

fn div_signed(dividend: i32, divisor: i32) -> i32 {
    if divisor == 0 {
        -1
    } else if dividend == i32::MIN && divisor == -1 {
        i32::MIN
    } else {
        dividend.wrapping_div(divisor)
    }
}

fn rem_signed(dividend: i32, divisor: i32) -> i32 {
    if divisor == 0 {
        dividend
    } else if dividend == i32::MIN && divisor == -1 {
        0
    } else {
        dividend.wrapping_rem(divisor)
    }
}

fn div_unsigned(dividend: u32, divisor: u32) -> u32 {
    if divisor == 0 {
        0xffff_ffff
    } else {
        dividend / divisor
    }
}

fn rem_unsigned(dividend: u32, divisor: u32) -> u32 {
    if divisor == 0 {
        dividend
    } else {
        dividend % divisor
    }
}

/// Execute one decoded instruction. `pc` is the program counter of the
/// instruction being executed (not yet advanced).
pub fn execute(decoded: &Decoded, pc: u32, regs: &mut Registers, mem: &mut Memory) -> StepOutcome {
    let mut effects = Vec::new();

    match *decoded {
        Decoded::Lui { rd, imm } => {
            regs.write(rd, imm);
            effects.push(reg_write_effect(regs, rd));
            StepOutcome { next_pc: pc.wrapping_add(4), effects, should_continue: true }
        }

        Decoded::Auipc { rd, imm } => {
            let value = pc.wrapping_add(imm);
            regs.write(rd, value);
            effects.push(reg_write_effect(regs, rd));
            StepOutcome { next_pc: pc.wrapping_add(4), effects, should_continue: true }
        }

        Decoded::Jal { rd, imm } => {
            let link = pc.wrapping_add(4);
            let target = pc.wrapping_add(imm);
            regs.write(rd, link);
            effects.push(reg_write_effect(regs, rd));
            effects.push(format!("pc={}", hex8(target)));
            StepOutcome { next_pc: target, effects, should_continue: true }
        }

        Decoded::Jalr { rd, rs1, imm } => {
            let link = pc.wrapping_add(4);
            let base = regs.read(rs1);
            let target = base.wrapping_add(imm) & !1u32;
            regs.write(rd, link);
            effects.push(reg_write_effect(regs, rd));
            effects.push(format!("pc={}", hex8(target)));
            StepOutcome { next_pc: target, effects, should_continue: true }
        }

        Decoded::Branch { funct3, rs1, rs2, imm } => {
            let a = regs.read(rs1);
            let b = regs.read(rs2);
            let taken = match funct3 {
                0 => a == b,
                1 => a != b,
                4 => as_signed(a) < as_signed(b),
                5 => as_signed(a) >= as_signed(b),
                6 => a < b,
                7 => a >= b,
                _ => unreachable!("decoder only produces valid branch funct3"),
            };
            let next_pc = if taken {
                effects.push("taken=true".to_string());
                let target = pc.wrapping_add(imm);
                effects.push(format!("pc={}", hex8(target)));
                target
            } else {
                effects.push("taken=false".to_string());
                pc.wrapping_add(4)
            };
            StepOutcome { next_pc, effects, should_continue: true }
        }

        Decoded::Load { funct3, rs1, rd, imm } => {
            let ea = regs.read(rs1).wrapping_add(imm);
            let value = match funct3 {
                0 => sext_byte(mem.read_byte(ea)),
                1 => sext_half(mem.read_half(ea)),
                2 => mem.read_word(ea),
                4 => u32::from(mem.read_byte(ea)),
                5 => u32::from(mem.read_half(ea)),
                _ => unreachable!("decoder only produces valid load funct3"),
            };
            regs.write(rd, value);
            effects.push(reg_write_effect(regs, rd));
            StepOutcome { next_pc: pc.wrapping_add(4), effects, should_continue: true }
        }

        Decoded::Store { funct3, rs1, rs2, imm } => {
            let ea = regs.read(rs1).wrapping_add(imm);
            let value = regs.read(rs2);
            let stored = match funct3 {
                0 => {
                    mem.write_byte(ea, value as u8);
                    value & 0xff
                }
                1 => {
                    mem.write_half(ea, value as u16);
                    value & 0xffff
                }
                2 => {
                    mem.write_word(ea, value);
                    value
                }
                _ => unreachable!("decoder only produces valid store funct3"),
            };
            effects.push(format!("mem[{}]={}", hex8(ea), hex8(stored)));
            let should_continue = ea != TERMINATION_ADDR;
            StepOutcome { next_pc: pc.wrapping_add(4), effects, should_continue }
        }

        Decoded::AluImm { funct3, funct7, rs1, rd, imm } => {
            let a = regs.read(rs1);
            let shamt = imm & 0x1f;
            let value = match funct3 {
                0 => a.wrapping_add(imm),
                1 => a << shamt,
                2 => u32::from(as_signed(a) < as_signed(imm)),
                3 => u32::from(a < imm),
                4 => a ^ imm,
                5 => {
                    if funct7 == 0x20 {
                        as_unsigned(as_signed(a) >> shamt)
                    } else {
                        a >> shamt
                    }
                }
                6 => a | imm,
                7 => a & imm,
                _ => unreachable!("decoder only produces valid alu-imm funct3"),
            };
            regs.write(rd, value);
            effects.push(reg_write_effect(regs, rd));
            StepOutcome { next_pc: pc.wrapping_add(4), effects, should_continue: true }
        }

        Decoded::AluReg { funct3, funct7, rs1, rs2, rd } => {
            let (a, b) = mul_div_values(regs, rs1, rs2);
            let shamt = b & 0x1f;
            let value = match (funct3, funct7) {
                (0, 0) => a.wrapping_add(b),
                (0, 0x20) => a.wrapping_sub(b),
                (0, 1) => a.wrapping_mul(b),
                (1, 0) => a << shamt,
                (1, 1) => {
                    let product = i64::from(as_signed(a)).wrapping_mul(i64::from(as_signed(b)));
                    (product >> 32) as u32
                }
                (2, 0) => u32::from(as_signed(a) < as_signed(b)),
                (2, 1) => {
                    let product = i64::from(as_signed(a)).wrapping_mul(i64::from(b));
                    (product >> 32) as u32
                }
                (3, 0) => u32::from(a < b),
                (3, 1) => {
                    let product = u64::from(a).wrapping_mul(u64::from(b));
                    (product >> 32) as u32
                }
                (4, 0) => a ^ b,
                (4, 1) => as_unsigned(div_signed(as_signed(a), as_signed(b))),
                (5, 0) => a >> shamt,
                (5, 0x20) => as_unsigned(as_signed(a) >> shamt),
                (5, 1) => div_unsigned(a, b),
                (6, 0) => a | b,
                (6, 1) => as_unsigned(rem_signed(as_signed(a), as_signed(b))),
                (7, 0) => a & b,
                (7, 1) => rem_unsigned(a, b),
                _ => unreachable!("decoder only produces valid alu-reg combinations"),
            };
            regs.write(rd, value);
            effects.push(reg_write_effect(regs, rd));
            StepOutcome { next_pc: pc.wrapping_add(4), effects, should_continue: true }
        }

        Decoded::Fence => StepOutcome { next_pc: pc.wrapping_add(4), effects, should_continue: true },

        Decoded::Ecall => {
            effects.push("ecall".to_string());
            StepOutcome { next_pc: pc.wrapping_add(4), effects, should_continue: false }
        }

        Decoded::Ebreak => {
            effects.push("ebreak".to_string());
            StepOutcome { next_pc: pc.wrapping_add(4), effects, should_continue: false }
        }

        Decoded::Unknown => StepOutcome { next_pc: pc.wrapping_add(4), effects, should_continue: true },
    }
}
