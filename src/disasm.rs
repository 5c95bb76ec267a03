//! Formats a decoded instruction as assembly text for the tracer's executed
//! line and the `-p` listing.
//!
//! A word that fails to decode renders as `ILLEGAL` rather than propagating
//! an error: the disassembler is a read-only view used by diagnostics and
//! the listing mode, and must stay total so tools built on top of it (this
//! crate's own tests included) never panic on garbage input.

use crate::bits::sign_extend16;
use crate::decode::{self, CompFunc, ImmedOp, Instruction, JumpOp, OtherCompFunc, Syscall};
use crate::registers::REGISTER_NAMES;

fn reg(n: u32) -> &'static str {
    REGISTER_NAMES[n as usize]
}

fn comp_mnemonic(func: CompFunc) -> &'static str {
    match func {
        CompFunc::Nop => "NOP",
        CompFunc::Add => "ADD",
        CompFunc::Sub => "SUB",
        CompFunc::Cpw => "CPW",
        CompFunc::And => "AND",
        CompFunc::Bor => "BOR",
        CompFunc::Nor => "NOR",
        CompFunc::Xor => "XOR",
        CompFunc::Lwr => "LWR",
        CompFunc::Swr => "SWR",
        CompFunc::Sca => "SCA",
        CompFunc::Lwi => "LWI",
        CompFunc::Neg => "NEG",
    }
}

fn other_comp_mnemonic(func: OtherCompFunc) -> &'static str {
    match func {
        OtherCompFunc::Lit => "LIT",
        OtherCompFunc::Ari => "ARI",
        OtherCompFunc::Sri => "SRI",
        OtherCompFunc::Mul => "MUL",
        OtherCompFunc::Div => "DIV",
        OtherCompFunc::Cfhi => "CFHI",
        OtherCompFunc::Cflo => "CFLO",
        OtherCompFunc::Sll => "SLL",
        OtherCompFunc::Srl => "SRL",
        OtherCompFunc::Jmp => "JMP",
        OtherCompFunc::Csi => "CSI",
        OtherCompFunc::Jrel => "JREL",
    }
}

fn syscall_mnemonic(sys: Syscall) -> &'static str {
    match sys {
        Syscall::Exit => "EXIT",
        Syscall::PrintStr => "PSTR",
        Syscall::PrintChar => "PCH",
        Syscall::ReadChar => "RCH",
        Syscall::StartTracing => "TRON",
        Syscall::StopTracing => "TROFF",
    }
}

fn immed_mnemonic(op: ImmedOp) -> &'static str {
    match op {
        ImmedOp::Addi => "ADDI",
        ImmedOp::Andi => "ANDI",
        ImmedOp::Bori => "BORI",
        ImmedOp::Xori => "XORI",
        ImmedOp::Beq => "BEQ",
        ImmedOp::Bgez => "BGEZ",
        ImmedOp::Bgtz => "BGTZ",
        ImmedOp::Blez => "BLEZ",
        ImmedOp::Bltz => "BLTZ",
        ImmedOp::Bne => "BNE",
    }
}

fn jump_mnemonic(op: JumpOp) -> &'static str {
    match op {
        JumpOp::Jmpa => "JMPA",
        JumpOp::Call => "CALL",
        JumpOp::Rtn => "RTN",
    }
}

/// Render a decoded instruction as `MNEMONIC operand,operand,...`.
pub fn format_instruction(instr: &Instruction) -> String {
    match *instr {
        Instruction::Computational { func, rt, ot, rs, os } => match func {
            CompFunc::Nop => "NOP".to_string(),
            CompFunc::Lwr => format!("LWR {},{},{}", reg(rt), reg(rs), os),
            CompFunc::Swr => format!("SWR {},{},{}", reg(rt), ot, reg(rs)),
            _ => format!("{} {},{},{},{}", comp_mnemonic(func), reg(rt), ot, reg(rs), os),
        },
        Instruction::OtherComputational { func, reg: r, offset, arg } => match func {
            OtherCompFunc::Ari | OtherCompFunc::Sri => {
                format!("{} {},{}", other_comp_mnemonic(func), reg(r), sign_extend16(arg))
            }
            OtherCompFunc::Jrel => format!("JREL {}", sign_extend16(arg)),
            OtherCompFunc::Sll | OtherCompFunc::Srl => {
                format!("{} {},{},{}", other_comp_mnemonic(func), reg(r), offset, arg)
            }
            OtherCompFunc::Mul | OtherCompFunc::Div | OtherCompFunc::Cfhi | OtherCompFunc::Cflo
            | OtherCompFunc::Jmp | OtherCompFunc::Csi => {
                format!("{} {},{}", other_comp_mnemonic(func), reg(r), offset)
            }
            OtherCompFunc::Lit => format!("LIT {},{},{}", reg(r), offset, arg),
        },
        Instruction::Syscall { syscall, reg: r, offset } => match syscall {
            Syscall::Exit => format!("EXIT {}", offset),
            Syscall::PrintStr | Syscall::PrintChar | Syscall::ReadChar => {
                format!("{} {},{}", syscall_mnemonic(syscall), reg(r), offset)
            }
            Syscall::StartTracing | Syscall::StopTracing => syscall_mnemonic(syscall).to_string(),
        },
        Instruction::Immediate { op, reg: r, offset, immed } => {
            format!("{} {},{},{}", immed_mnemonic(op), reg(r), offset, sign_extend16(immed))
        }
        Instruction::Jump { op, addr } => format!("{} {}", jump_mnemonic(op), addr),
    }
}

/// Disassemble a raw instruction word, falling back to `ILLEGAL` if it does
/// not decode.
pub fn disassemble_word(word: u32) -> String {
    match decode::decode(word) {
        Ok(instr) => format_instruction(&instr),
        Err(_) => "ILLEGAL".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn illegal_word_does_not_panic() {
        assert_eq!(disassemble_word(63u32 << 26), "ILLEGAL");
    }

    #[test]
    fn formats_lit() {
        let instr = Instruction::OtherComputational {
            func: OtherCompFunc::Lit,
            reg: 1,
            offset: 0,
            arg: 72,
        };
        assert_eq!(format_instruction(&instr), "LIT $sp,0,72");
    }

    #[test]
    fn formats_exit() {
        let instr = Instruction::Syscall { syscall: Syscall::Exit, reg: 0, offset: 0 };
        assert_eq!(format_instruction(&instr), "EXIT 0");
    }

    #[test]
    fn formats_add() {
        let instr = Instruction::Computational {
            func: CompFunc::Add,
            rt: 1,
            ot: 0,
            rs: 4,
            os: 0,
        };
        assert_eq!(format_instruction(&instr), "ADD $sp,0,$r4,0");
    }
}
