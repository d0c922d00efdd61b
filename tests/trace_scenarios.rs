//! End-to-end trace scenarios, assembled as raw instruction words and
//! checked against the exact trace text the simulator must produce. These
//! exercise the full driver: fetch, decode, execute, disassemble, and the
//! line-format contract, not any single component in isolation.

use rv32im_iss::driver::Driver;
use rv32im_iss::memory::Memory;

fn program(words: &[(u32, u32)]) -> Memory {
    let mut mem = Memory::new();
    for (addr, word) in words {
        mem.write_word(*addr, *word);
    }
    mem
}

#[test]
fn jalr_clears_least_significant_bit_of_target() {
    // addi x5, x0, 0x101
    // jalr x1, x5, 0
    let mem = program(&[
        (0x100000, 0x1010_0293),
        (0x100004, 0x0002_80E7),
    ]);
    let mut driver = Driver::new(mem, 0x100000, 8, 0, 0);
    driver.run().unwrap();

    assert_eq!(driver.pc(), 0x100);
    assert_eq!(driver.regs.read(1), 0x100008);
    assert_eq!(driver.trace_lines().len(), 2);
    assert!(driver.trace_lines()[1].ends_with("x1=0x00100008;pc=0x00000100"));
}

#[test]
fn signed_division_corner_case_end_to_end() {
    // lui x1, 0x80000  -> x1 = 0x80000000
    // addi x2, x0, -1  -> x2 = 0xFFFFFFFF
    // div x3, x1, x2
    // rem x4, x1, x2
    // ebreak
    let mem = program(&[
        (0x100000, 0x8000_00B7),
        (0x100004, 0xFFF0_0113),
        (0x100008, 0x0220_C1B3),
        (0x10000C, 0x0220_E233),
        (0x100010, 0x0010_0073),
    ]);
    let mut driver = Driver::new(mem, 0x100000, 20, 0, 0);
    driver.run().unwrap();

    assert_eq!(driver.regs.read(3), 0x8000_0000);
    assert_eq!(driver.regs.read(4), 0);
    assert!(driver.trace_lines().last().unwrap().ends_with("ebreak"));
}

#[test]
fn srai_preserves_sign_srli_does_not_end_to_end() {
    // lui x1, 0xFFFFF   -> x1 = 0xFFFFF000
    // ori x1, x1, 0xF0  -> x1 = 0xFFFFFFF0
    // srai x2, x1, 4
    // srli x3, x1, 4
    let mem = program(&[
        (0x100000, 0xFFFFF0B7),
        (0x100004, 0x0F00_E093),
        (0x100008, 0x4040_D113),
        (0x10000C, 0x0040_D193),
    ]);
    let mut driver = Driver::new(mem, 0x100000, 16, 0, 0);
    driver.run().unwrap();

    assert_eq!(driver.regs.read(1), 0xFFFF_FFF0);
    assert_eq!(driver.regs.read(2), 0xFFFF_FFFF);
    assert_eq!(driver.regs.read(3), 0x0FFF_FFFF);
}

#[test]
fn store_to_termination_address_ends_trace_with_mem_token() {
    // lui x5, 0x10000    -> x5 = 0x10000000
    // addi x6, x0, 0x42
    // sw x6, 0(x5)       -> terminates
    // addi x7, x0, 0x99  -> never reached
    let mem = program(&[
        (0x100000, 0x1000_02B7),
        (0x100004, 0x0420_0313),
        (0x100008, 0x0062_A023),
        (0x10000C, 0x0990_0393),
    ]);
    let mut driver = Driver::new(mem, 0x100000, 16, 0, 0);
    driver.run().unwrap();

    let lines = driver.trace_lines();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[2], "0x00100008;0x0062A023;sw x6,0x0(x5);mem[0x10000000]=0x00000042");
}

#[test]
fn unknown_encoding_is_disassembled_and_skipped_without_effects() {
    // Reserved opcode 0x7F (not implemented in RV32IM), followed by ecall.
    let mem = program(&[(0x100000, 0x0000_007F), (0x100004, 0x0000_0073)]);
    let mut driver = Driver::new(mem, 0x100000, 8, 0, 0);
    driver.run().unwrap();

    let lines = driver.trace_lines();
    assert_eq!(lines[0], "0x00100000;0x0000007F;unknown(0x0000007F);");
    assert!(lines[1].ends_with("ecall"));
}

#[test]
fn full_trace_is_deterministic_across_runs() {
    let build = || {
        program(&[
            (0x100000, 0x1000_02B7),
            (0x100004, 0x0420_0313),
            (0x100008, 0x0062_A023),
        ])
    };

    let mut first = Driver::new(build(), 0x100000, 12, 0, 0);
    first.run().unwrap();
    let mut second = Driver::new(build(), 0x100000, 12, 0, 0);
    second.run().unwrap();

    assert_eq!(first.trace_text(), second.trace_text());
}
