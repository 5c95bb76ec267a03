//! General-purpose register indices and their symbolic aliases.
//!
//! All eight registers are ordinary storage cells; the aliases below exist
//! purely by convention, the same way the teacher's MIPS core treats `$sp`,
//! `$fp` and `$ra` as plain indices into the same register file.

/// Number of general-purpose registers.
pub const NUM_REGISTERS: usize = 8;

/// Global-data base register.
pub const GP: usize = 0;
/// Stack top (lowest used stack address).
pub const SP: usize = 1;
/// Stack bottom (highest used stack address).
pub const FP: usize = 2;
/// Return address.
pub const RA: usize = 7;

/// Display names for `GPR[0..8]`, used by the tracer and the disassembler.
pub const REGISTER_NAMES: [&str; NUM_REGISTERS] =
    ["$gp", "$sp", "$fp", "$r3", "$r4", "$r5", "$r6", "$ra"];
