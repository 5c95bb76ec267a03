//! End-to-end scenarios that exercise the loader, executor and disassembler
//! together through hand-encoded BOF files, the way the teacher's
//! `test/cpu.rs` drives the CPU through hand-assembled instruction streams
//! rather than a real assembler.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use stackvm::{disasm, exec, loader, VmError};

const SYS_FUNC: u32 = 12;

fn encode_comp(rt: u32, ot: i32, rs: u32, os: i32, func: u32) -> u32 {
    (rt << 23) | ((ot as u32 & 0xff) << 15) | (rs << 12) | ((os as u32 & 0xff) << 4) | func
}

fn encode_other_comp(reg: u32, offset: i32, arg: u32, func: u32) -> u32 {
    (1 << 26) | (reg << 23) | ((offset as u32 & 0x7) << 20) | ((arg & 0xffff) << 4) | func
}

fn encode_syscall(reg: u32, offset: i32, syscall_code: u32) -> u32 {
    encode_other_comp(reg, offset, syscall_code, SYS_FUNC)
}

fn encode_immed(opcode: u32, reg: u32, offset: i32, immed: u32) -> u32 {
    (opcode << 26) | (reg << 23) | ((offset as u32 & 0x7f) << 16) | (immed & 0xffff)
}

struct Bof {
    text_start: i32,
    text_length: i32,
    data_start: i32,
    data_length: i32,
    stack_bottom: i32,
    instrs: Vec<u32>,
    data: Vec<i32>,
}

fn write_bof(name: &str, bof: &Bof) -> PathBuf {
    let path = std::env::temp_dir().join(format!("stackvm_integration_{name}.bof"));
    let mut f = fs::File::create(&path).unwrap();
    f.write_all(b"BOF1").unwrap();
    for field in [bof.text_start, bof.text_length, bof.data_start, bof.data_length, bof.stack_bottom] {
        f.write_all(&field.to_le_bytes()).unwrap();
    }
    for w in &bof.instrs {
        f.write_all(&w.to_le_bytes()).unwrap();
    }
    for w in &bof.data {
        f.write_all(&w.to_le_bytes()).unwrap();
    }
    path
}

fn run_to_exit(path: &Path) -> Result<i32, VmError> {
    let mut machine = loader::load(path)?;
    loop {
        match exec::step(&mut machine)? {
            exec::StepOutcome::Continue => {}
            exec::StepOutcome::Exit(code) => return Ok(code),
        }
    }
}

#[test]
fn hello_then_exit() {
    let greeting = i32::from_le_bytes([b'H', b'i', 0, 0]);
    let bof = Bof {
        text_start: 0,
        text_length: 2,
        data_start: 2,
        data_length: 1,
        stack_bottom: 10,
        instrs: vec![
            encode_syscall(0 /* $gp */, 0, 1 /* PrintStr */),
            encode_syscall(0, 0, 0 /* Exit */),
        ],
        data: vec![greeting],
    };
    let path = write_bof("hello", &bof);

    let mut machine = loader::load(&path).unwrap();
    match exec::step(&mut machine).unwrap() {
        exec::StepOutcome::Continue => {}
        exec::StepOutcome::Exit(_) => panic!("exited before printing"),
    }
    // PrintStr reports the byte count it wrote at the top of the stack.
    assert_eq!(machine.memory.word(machine.gpr[1]).unwrap(), 2);

    match exec::step(&mut machine).unwrap() {
        exec::StepOutcome::Exit(code) => assert_eq!(code, 0),
        exec::StepOutcome::Continue => panic!("expected exit"),
    }
    fs::remove_file(&path).ok();
}

#[test]
fn arithmetic_add_doubles_the_stack_top() {
    let bof = Bof {
        text_start: 0,
        text_length: 3,
        data_start: 3,
        data_length: 0,
        stack_bottom: 10,
        instrs: vec![
            encode_other_comp(1 /* $sp */, 0, 5, 0 /* LIT */),
            encode_comp(1, 0, 1, 0, 1 /* ADD */),
            encode_syscall(0, 0, 0 /* Exit */),
        ],
        data: vec![],
    };
    let path = write_bof("arith", &bof);
    let mut machine = loader::load(&path).unwrap();

    exec::step(&mut machine).unwrap(); // LIT
    exec::step(&mut machine).unwrap(); // ADD
    assert_eq!(machine.memory.word(machine.gpr[1]).unwrap(), 10);

    match exec::step(&mut machine).unwrap() {
        exec::StepOutcome::Exit(code) => assert_eq!(code, 0),
        exec::StepOutcome::Continue => panic!("expected exit"),
    }
    fs::remove_file(&path).ok();
}

#[test]
fn equal_branch_skips_the_following_instruction() {
    let bof = Bof {
        text_start: 0,
        text_length: 5,
        data_start: 5,
        data_length: 0,
        stack_bottom: 10,
        instrs: vec![
            encode_other_comp(1 /* $sp */, 0, 7, 0 /* LIT */),
            encode_other_comp(0 /* $gp */, 0, 7, 0 /* LIT */),
            encode_immed(6 /* BEQ */, 0 /* $gp */, 0, 2),
            // Exit's `offset` is only 3 bits wide (see DESIGN.md), so the
            // codes here must fit -4..=3.
            encode_syscall(0, 1, 0 /* Exit 1, should be skipped */),
            encode_syscall(0, -2, 0 /* Exit -2, should run */),
        ],
        data: vec![],
    };
    let path = write_bof("branch", &bof);
    assert_eq!(run_to_exit(&path).unwrap(), -2);
    fs::remove_file(&path).ok();
}

#[test]
fn division_by_zero_is_fatal() {
    let bof = Bof {
        text_start: 0,
        text_length: 1,
        data_start: 1,
        data_length: 1,
        stack_bottom: 10,
        instrs: vec![encode_other_comp(0 /* $gp */, 0, 0, 4 /* DIV */)],
        data: vec![0],
    };
    let path = write_bof("divzero", &bof);
    assert!(matches!(run_to_exit(&path), Err(VmError::DivisionByZero)));
    fs::remove_file(&path).ok();
}

#[test]
fn invariant_violation_on_overlapping_globals_and_stack_mentions_stack() {
    // data_start (10) >= stack_bottom (5): GP must be strictly below SP.
    let bof = Bof {
        text_start: 0,
        text_length: 1,
        data_start: 10,
        data_length: 0,
        stack_bottom: 5,
        instrs: vec![0 /* NOP */],
        data: vec![],
    };
    let path = write_bof("invariant", &bof);
    let err = run_to_exit(&path).unwrap_err();
    assert!(matches!(err, VmError::InvariantGpBeforeSp { .. }));
    assert!(err.to_string().contains("stack"));
    fs::remove_file(&path).ok();
}

#[test]
fn listing_mode_disassembles_every_instruction() {
    let bof = Bof {
        text_start: 0,
        text_length: 3,
        data_start: 3,
        data_length: 0,
        stack_bottom: 10,
        instrs: vec![
            encode_other_comp(1, 0, 5, 0 /* LIT */),
            encode_comp(1, 0, 1, 0, 1 /* ADD */),
            encode_syscall(0, 0, 0 /* Exit */),
        ],
        data: vec![],
    };
    let path = write_bof("listing", &bof);
    let machine = loader::load(&path).unwrap();
    let n = loader::text_length(&path).unwrap();

    let lines: Vec<String> = (0..n)
        .map(|addr| disasm::disassemble_word(machine.memory.instr_word(addr as i32).unwrap()))
        .collect();

    assert_eq!(lines, vec!["LIT $sp,0,5", "ADD $sp,0,$sp,0", "EXIT 0"]);
    fs::remove_file(&path).ok();
}
