//! The byte-exact trace/printer format: the executed-instruction line
//! followed by a compact state dump, plus the `-p` listing-mode header.
//!
//! This is a distinct protocol from the crate's `log`/`env_logger`
//! diagnostics (see `main.rs`): trace output goes to stdout and is part of
//! the observable behavior the test suite checks byte-for-byte, while
//! `debug!`/`trace!` calls are for developers running with `RUST_LOG` set.

use crate::machine::Machine;
use crate::registers::{FP, GP, REGISTER_NAMES, SP};

const WRAP_WIDTH: usize = 59;

/// Push `token` onto the last line of `lines`, wrapping onto a new line once
/// the accumulated width would exceed [`WRAP_WIDTH`].
fn push_wrapped(lines: &mut Vec<String>, width: &mut usize, token: &str) {
    if *width > 0 && *width + token.len() > WRAP_WIDTH {
        lines.push(String::new());
        *width = 0;
    }
    lines.last_mut().unwrap().push_str(token);
    *width += token.len();
}

/// Render the inclusive window `[start, end]` as a compact, wrapped listing.
/// Callers pass `end = SP - 1` for the global-data window `[GP, SP)`, and
/// `end = FP` for the active-frame window `[SP, FP]` — except when `SP == FP`,
/// the legal empty-frame case, which the caller must special-case rather than
/// pass through here (a closed `[SP, SP]` range would still print one cell).
fn compact_view(m: &Machine, start: i32, end_inclusive: i32) -> String {
    if start > end_inclusive {
        return String::new();
    }
    let mut lines = vec![String::new()];
    let mut width = 0usize;
    let mut addr = start;
    while addr <= end_inclusive {
        let value = m.memory.word(addr).unwrap_or(0);
        if value != 0 {
            push_wrapped(&mut lines, &mut width, &format!("{addr}: {value}\t"));
            addr += 1;
            continue;
        }
        let run_start = addr;
        let mut run_len = 0i32;
        while addr <= end_inclusive && m.memory.word(addr).unwrap_or(0) == 0 {
            run_len += 1;
            addr += 1;
        }
        if run_len == 1 {
            push_wrapped(&mut lines, &mut width, &format!("{run_start}: 0\t"));
        } else {
            push_wrapped(&mut lines, &mut width, &format!("{run_start}: 0\t{:>11}\t", "..."));
        }
    }
    lines.join("\n")
}

fn gpr_rows(m: &Machine) -> String {
    let row1: Vec<String> =
        (0..5).map(|i| format!("GPR[{}]: {}", REGISTER_NAMES[i], m.gpr[i])).collect();
    let row2: Vec<String> =
        (5..8).map(|i| format!("GPR[{}]: {}", REGISTER_NAMES[i], m.gpr[i])).collect();
    format!("{}\n{}", row1.join("\t"), row2.join("\t"))
}

fn state_dump(m: &Machine) -> String {
    let mut pc_line = format!("PC: {}", m.pc);
    if m.hi != 0 || m.lo != 0 {
        pc_line.push_str(&format!("\tHI: {}\tLO: {}", m.hi, m.lo));
    }

    let globals = compact_view(m, m.gpr[GP], m.gpr[SP] - 1);
    // SP == FP is the legal empty-frame case: the closed range [SP, FP]
    // would otherwise still cover the single cell at SP.
    let frame = if m.gpr[SP] == m.gpr[FP] {
        String::new()
    } else {
        compact_view(m, m.gpr[SP], m.gpr[FP])
    };

    format!("{}\n{}\n{}\n{}", pc_line, gpr_rows(m), globals, frame)
}

/// Print the executed-instruction line and state dump for `instr_addr`,
/// whose disassembly is `instr_text`.
pub fn print_trace(m: &Machine, instr_addr: i32, instr_text: &str) {
    println!("==>      {instr_addr:8}: {instr_text}");
    println!("{}", state_dump(m));
}

/// Print the `-p` listing header.
pub fn print_listing_header() {
    println!("Addr  Instruction");
}

/// Print the compact global-data view `[GP, SP)`, used by listing mode.
pub fn print_globals(m: &Machine) {
    println!("{}", compact_view(m, m.gpr[GP], m.gpr[SP] - 1));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn machine() -> Machine {
        let mut m = Machine::new();
        m.gpr[GP] = 0;
        m.gpr[SP] = 4;
        m.gpr[FP] = 4;
        m
    }

    #[test]
    fn empty_frame_prints_nothing() {
        // SP == FP, the exact state the loader starts every machine in.
        let m = machine();
        assert_eq!(m.gpr[SP], m.gpr[FP]);
        let dump = state_dump(&m);
        assert_eq!(dump.split('\n').last(), Some(""));
    }

    #[test]
    fn single_zero_cell_prints_the_cell() {
        let mut m = machine();
        m.gpr[SP] = 1;
        assert_eq!(compact_view(&m, 0, 0), "0: 0\t");
    }

    #[test]
    fn run_of_zeros_collapses_to_ellipsis() {
        let mut m = machine();
        m.memory.set_word(3, 7).unwrap();
        // cells 0,1,2 are zero (a run of length 3), cell 3 is nonzero
        let view = compact_view(&m, 0, 3);
        assert!(view.contains("0: 0\t"));
        assert!(view.contains("..."));
        assert!(view.contains("3: 7\t"));
    }

    #[test]
    fn nonzero_run_has_no_ellipsis() {
        let mut m = machine();
        m.memory.set_word(0, 1).unwrap();
        m.memory.set_word(1, 2).unwrap();
        let view = compact_view(&m, 0, 1);
        assert!(!view.contains("..."));
    }
}
