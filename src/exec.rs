//! The fetch-execute cycle and the per-opcode state transitions.
//!
//! Each instruction is decoded once (see `decode.rs`) into a tagged enum,
//! then dispatched here by a flat match — the nested-switch-over-opcode of
//! the source ISA collapses into pattern matching, per the design notes.

use crate::bits::{form_address, form_offset, sign_extend16, zero_extend16};
use crate::decode::{self, CompFunc, ImmedOp, Instruction, JumpOp, OtherCompFunc};
use crate::disasm;
use crate::error::VmError;
use crate::machine::Machine;
use crate::registers::{RA, SP};
use crate::syscall::{self, SyscallOutcome};
use crate::trace;

/// What the caller should do after one instruction has run.
pub enum StepOutcome {
    Continue,
    Exit(i32),
}

fn top_of_stack(m: &Machine) -> Result<i32, VmError> {
    m.memory.word(m.gpr[SP])
}

fn exec_computational(m: &mut Machine, func: CompFunc, rt: u32, ot: i32, rs: u32, os: i32) -> Result<(), VmError> {
    let dest = m.gpr[rt as usize] + form_offset(ot);
    let src = m.gpr[rs as usize] + form_offset(os);
    match func {
        CompFunc::Nop => {}
        CompFunc::Add => {
            let v = top_of_stack(m)? + m.memory.word(src)?;
            m.memory.set_word(dest, v)?;
        }
        CompFunc::Sub => {
            let v = top_of_stack(m)? - m.memory.word(src)?;
            m.memory.set_word(dest, v)?;
        }
        CompFunc::Cpw => {
            let v = m.memory.word(src)?;
            m.memory.set_word(dest, v)?;
        }
        CompFunc::And => {
            let v = (m.memory.uword(m.gpr[SP])?) & m.memory.uword(src)?;
            m.memory.set_uword(dest, v)?;
        }
        CompFunc::Bor => {
            let v = m.memory.uword(m.gpr[SP])? | m.memory.uword(src)?;
            m.memory.set_uword(dest, v)?;
        }
        CompFunc::Nor => {
            let v = !(m.memory.uword(m.gpr[SP])? | m.memory.uword(src)?);
            m.memory.set_uword(dest, v)?;
        }
        CompFunc::Xor => {
            let v = m.memory.uword(m.gpr[SP])? ^ m.memory.uword(src)?;
            m.memory.set_uword(dest, v)?;
        }
        CompFunc::Lwr => {
            m.gpr[rt as usize] = m.memory.word(src)?;
        }
        CompFunc::Swr => {
            m.memory.set_word(dest, m.gpr[rs as usize])?;
        }
        CompFunc::Sca => {
            m.memory.set_word(dest, m.gpr[rs as usize] + form_offset(os))?;
        }
        CompFunc::Lwi => {
            let inner = m.memory.word(src)?;
            let v = m.memory.word(inner)?;
            m.memory.set_word(dest, v)?;
        }
        CompFunc::Neg => {
            let v = -m.memory.word(src)?;
            m.memory.set_word(dest, v)?;
        }
    }
    Ok(())
}

fn exec_other_computational(
    m: &mut Machine,
    func: OtherCompFunc,
    reg: u32,
    offset: i32,
    arg: u32,
) -> Result<(), VmError> {
    let ea = m.gpr[reg as usize] + form_offset(offset);
    match func {
        OtherCompFunc::Lit => {
            m.memory.set_word(ea, sign_extend16(arg))?;
        }
        OtherCompFunc::Ari => {
            m.gpr[reg as usize] += sign_extend16(arg);
        }
        OtherCompFunc::Sri => {
            m.gpr[reg as usize] -= sign_extend16(arg);
        }
        OtherCompFunc::Mul => {
            let a = top_of_stack(m)? as i64;
            let b = m.memory.word(ea)? as i64;
            let product = a * b;
            m.lo = product as i32;
            m.hi = (product >> 32) as i32;
        }
        OtherCompFunc::Div => {
            let a = top_of_stack(m)?;
            let b = m.memory.word(ea)?;
            if b == 0 {
                return Err(VmError::DivisionByZero);
            }
            m.lo = a.wrapping_div(b);
            m.hi = a.wrapping_rem(b);
        }
        OtherCompFunc::Cfhi => {
            m.memory.set_word(ea, m.hi)?;
        }
        OtherCompFunc::Cflo => {
            m.memory.set_word(ea, m.lo)?;
        }
        OtherCompFunc::Sll => {
            let tos = m.memory.uword(m.gpr[SP])?;
            m.memory.set_uword(ea, tos << arg)?;
        }
        OtherCompFunc::Srl => {
            let tos = m.memory.uword(m.gpr[SP])?;
            m.memory.set_uword(ea, tos >> arg)?;
        }
        OtherCompFunc::Jmp => {
            m.pc = m.memory.uword(ea)? as i32;
        }
        OtherCompFunc::Csi => {
            m.gpr[RA] = m.pc;
            m.pc = m.memory.word(ea)?;
        }
        OtherCompFunc::Jrel => {
            m.pc = (m.pc - 1) + sign_extend16(arg);
        }
    }
    Ok(())
}

fn exec_immediate(m: &mut Machine, op: ImmedOp, reg: u32, offset: i32, immed: u32) -> Result<(), VmError> {
    let ea = m.gpr[reg as usize] + form_offset(offset);
    match op {
        ImmedOp::Addi => {
            let v = m.memory.word(ea)? + sign_extend16(immed);
            m.memory.set_word(ea, v)?;
        }
        ImmedOp::Andi => {
            let v = m.memory.uword(ea)? & zero_extend16(immed);
            m.memory.set_uword(ea, v)?;
        }
        ImmedOp::Bori => {
            let v = m.memory.uword(ea)? | zero_extend16(immed);
            m.memory.set_uword(ea, v)?;
        }
        ImmedOp::Xori => {
            let v = m.memory.uword(ea)? ^ zero_extend16(immed);
            m.memory.set_uword(ea, v)?;
        }
        ImmedOp::Beq => {
            if top_of_stack(m)? == m.memory.word(ea)? {
                m.pc = (m.pc - 1) + sign_extend16(immed);
            }
        }
        ImmedOp::Bne => {
            if top_of_stack(m)? != m.memory.word(ea)? {
                m.pc = (m.pc - 1) + sign_extend16(immed);
            }
        }
        ImmedOp::Bgez => {
            if m.memory.word(ea)? >= 0 {
                m.pc = (m.pc - 1) + sign_extend16(immed);
            }
        }
        ImmedOp::Bgtz => {
            if m.memory.word(ea)? > 0 {
                m.pc = (m.pc - 1) + sign_extend16(immed);
            }
        }
        ImmedOp::Blez => {
            if m.memory.word(ea)? <= 0 {
                m.pc = (m.pc - 1) + sign_extend16(immed);
            }
        }
        ImmedOp::Bltz => {
            if m.memory.word(ea)? < 0 {
                m.pc = (m.pc - 1) + sign_extend16(immed);
            }
        }
    }
    Ok(())
}

fn exec_jump(m: &mut Machine, op: JumpOp, addr: u32) {
    match op {
        JumpOp::Jmpa => {
            m.pc = form_address(m.pc - 1, addr);
        }
        JumpOp::Call => {
            m.gpr[RA] = m.pc;
            m.pc = form_address(m.pc - 1, addr);
        }
        JumpOp::Rtn => {
            m.pc = m.gpr[RA];
        }
    }
}

/// Fetch, decode and execute one instruction, then print a trace line if
/// tracing is on.
pub fn step(m: &mut Machine) -> Result<StepOutcome, VmError> {
    m.check_invariants()?;

    let instr_addr = m.pc;
    let word = m.memory.instr_word(instr_addr)?;
    m.pc += 1;

    let instr = decode::decode(word)?;
    let text = disasm::format_instruction(&instr);
    log::trace!("{instr_addr}: {text}");

    let mut already_traced = false;
    let outcome = match instr {
        Instruction::Computational { func, rt, ot, rs, os } => {
            exec_computational(m, func, rt, ot, rs, os)?;
            StepOutcome::Continue
        }
        Instruction::OtherComputational { func, reg, offset, arg } => {
            exec_other_computational(m, func, reg, offset, arg)?;
            StepOutcome::Continue
        }
        Instruction::Syscall { syscall, reg, offset } => {
            already_traced = matches!(syscall, decode::Syscall::StopTracing);
            match syscall::execute(m, syscall, reg, offset, instr_addr, &text)? {
                SyscallOutcome::Continue => StepOutcome::Continue,
                SyscallOutcome::Exit(code) => StepOutcome::Exit(code),
            }
        }
        Instruction::Immediate { op, reg, offset, immed } => {
            exec_immediate(m, op, reg, offset, immed)?;
            StepOutcome::Continue
        }
        Instruction::Jump { op, addr } => {
            exec_jump(m, op, addr);
            StepOutcome::Continue
        }
    };

    if m.tracing && !already_traced {
        trace::print_trace(m, instr_addr, &text);
    }

    Ok(outcome)
}
