//! The single error type every fallible operation in the machine returns.
//!
//! Every variant is fatal (see the propagation policy in the spec): the only
//! thing that ever happens to a `VmError` is that it gets printed to stderr
//! and the process exits. Nothing in the executor or loader catches one.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VmError {
    #[error("failed to open BOF file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("invalid BOF magic value {0:?}")]
    BadMagic([u8; 4]),

    #[error("truncated BOF file: expected {expected} more bytes, found {found}")]
    Truncated { expected: usize, found: usize },

    #[error("BOF header describes data region [{start}, {end}) which overlaps the text region")]
    TextDataOverlap { start: i32, end: i32 },

    #[error("BOF header address {0} is outside memory [0, {1})")]
    AddressOutOfRange(i64, usize),

    #[error("invariant violated: GPR[gp] ({gp}) must be >= 0")]
    InvariantGpNegative { gp: i32 },

    #[error("invariant violated: GPR[gp] ({gp}) must be < GPR[sp] ({sp}); stack and globals overlap")]
    InvariantGpBeforeSp { gp: i32, sp: i32 },

    #[error("invariant violated: GPR[sp] ({sp}) must be <= GPR[fp] ({fp}); stack grows downward")]
    InvariantSpBeforeFp { sp: i32, fp: i32 },

    #[error("invariant violated: GPR[fp] ({fp}) must be < memory size ({size})")]
    InvariantFpInBounds { fp: i32, size: usize },

    #[error("invariant violated: PC ({pc}) must be within [0, {size})")]
    InvariantPcInBounds { pc: i32, size: usize },

    #[error("unknown opcode {0}")]
    UnknownOpcode(u32),

    #[error("unknown computational function code {0}")]
    UnknownCompFunc(u32),

    #[error("unknown other-computational function code {0}")]
    UnknownOtherCompFunc(u32),

    #[error("unknown syscall code {0}")]
    UnknownSyscall(u32),

    #[error("shift amount {0} is out of range [0, 31]")]
    ShiftOutOfRange(u32),

    #[error("Division by 0 encountered")]
    DivisionByZero,

    #[error("memory address {0} is out of range [0, {1})")]
    MemoryOutOfRange(i64, usize),

    #[error("{0}")]
    Usage(String),
}

/// Prints `err` to stderr and terminates the process with a nonzero status.
///
/// This is the only place in the crate that calls `std::process::exit` on
/// failure; everything else propagates a `Result` with `?`.
pub fn fatal(err: &VmError) -> ! {
    eprintln!("vm: {err}");
    std::process::exit(1)
}
