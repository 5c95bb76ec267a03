//! The six system calls, dispatched by the executor when it decodes
//! `opcode = 1, func = SYS`.
//!
//! Syscalls talk to stdin/stdout directly; they are deliberately kept apart
//! from the `log`/`env_logger` diagnostics used elsewhere in the crate,
//! since their output is part of the byte-exact protocol the test suite
//! checks, not an internal diagnostic.

use std::io::{self, Read, Write};

use crate::bits::form_offset;
use crate::decode::Syscall;
use crate::error::VmError;
use crate::machine::Machine;
use crate::registers::SP;

/// What the fetch-execute loop should do after a syscall runs.
pub enum SyscallOutcome {
    Continue,
    Exit(i32),
}

fn effective_address(m: &Machine, reg: u32, offset: i32) -> i32 {
    m.gpr[reg as usize] + form_offset(offset)
}

pub fn execute(
    m: &mut Machine,
    syscall: Syscall,
    reg: u32,
    offset: i32,
    instr_addr: i32,
    instr_text: &str,
) -> Result<SyscallOutcome, VmError> {
    match syscall {
        // `offset` is already sign-extended by the decoder.
        Syscall::Exit => Ok(SyscallOutcome::Exit(offset)),

        Syscall::PrintStr => {
            let ea = effective_address(m, reg, offset);
            let bytes = m.memory.read_cstr(ea)?;
            let mut stdout = io::stdout();
            stdout.write_all(&bytes).map_err(|source| VmError::Io {
                path: "<stdout>".to_string(),
                source,
            })?;
            stdout.flush().ok();
            m.memory.set_word(m.gpr[SP], bytes.len() as i32)?;
            Ok(SyscallOutcome::Continue)
        }

        Syscall::PrintChar => {
            let ea = effective_address(m, reg, offset);
            let byte = m.memory.low_byte(ea)?;
            let mut stdout = io::stdout();
            stdout
                .write_all(&[byte])
                .map_err(|source| VmError::Io { path: "<stdout>".to_string(), source })?;
            stdout.flush().ok();
            m.memory.set_word(m.gpr[SP], byte as i32)?;
            Ok(SyscallOutcome::Continue)
        }

        Syscall::ReadChar => {
            let ea = effective_address(m, reg, offset);
            let mut buf = [0u8; 1];
            let value = match io::stdin().read(&mut buf) {
                Ok(0) => -1,
                Ok(_) => buf[0] as i32,
                Err(e) => return Err(VmError::Io { path: "<stdin>".to_string(), source: e }),
            };
            m.memory.set_word(ea, value)?;
            Ok(SyscallOutcome::Continue)
        }

        Syscall::StartTracing => {
            m.tracing = true;
            Ok(SyscallOutcome::Continue)
        }

        Syscall::StopTracing => {
            // The trace line for this instruction must still be printed,
            // since by the time the normal post-instruction check runs,
            // `tracing` has already flipped off.
            if m.tracing {
                crate::trace::print_trace(m, instr_addr, instr_text);
            }
            m.tracing = false;
            Ok(SyscallOutcome::Continue)
        }
    }
}
