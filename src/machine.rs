//! Machine state: memory, the eight general-purpose registers, the special
//! registers `PC`/`HI`/`LO`, and the tracing flag.
//!
//! This is the `Machine` aggregate the design notes call for: memory,
//! registers and the tracing flag packaged into one value passed by owning
//! reference to the executor, rather than free-floating statics, so tests
//! can instantiate more than one machine per process.

use crate::error::VmError;
use crate::memory::{Memory, MEMORY_SIZE};
use crate::registers::{FP, GP, NUM_REGISTERS, SP};

pub struct Machine {
    pub memory: Memory,
    pub gpr: [i32; NUM_REGISTERS],
    pub pc: i32,
    pub hi: i32,
    pub lo: i32,
    pub tracing: bool,
}

impl Machine {
    /// An all-zero machine; the loader populates it from a BOF header.
    pub fn new() -> Self {
        Self {
            memory: Memory::new(),
            gpr: [0; NUM_REGISTERS],
            pc: 0,
            hi: 0,
            lo: 0,
            tracing: true,
        }
    }

    /// Verify the five state invariants that must hold before every fetch.
    pub fn check_invariants(&self) -> Result<(), VmError> {
        let gp = self.gpr[GP];
        let sp = self.gpr[SP];
        let fp = self.gpr[FP];

        if gp < 0 {
            return Err(VmError::InvariantGpNegative { gp });
        }
        if gp >= sp {
            return Err(VmError::InvariantGpBeforeSp { gp, sp });
        }
        if sp > fp {
            return Err(VmError::InvariantSpBeforeFp { sp, fp });
        }
        if fp as i64 >= MEMORY_SIZE as i64 {
            return Err(VmError::InvariantFpInBounds { fp, size: MEMORY_SIZE });
        }
        if self.pc < 0 || self.pc as i64 >= MEMORY_SIZE as i64 {
            return Err(VmError::InvariantPcInBounds { pc: self.pc, size: MEMORY_SIZE });
        }
        Ok(())
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}
