//! The command-line launcher: opens a BOF and chooses between listing mode
//! (`-p`) and execute mode.
//!
//! Mirrors the teacher's `env_logger` setup (a custom line format, filters
//! seeded from `RUST_LOG`), minus the windowing/graphics module filters
//! this crate has no use for.

use std::io::Write as _;
use std::path::Path;

use log::LevelFilter;

use stackvm::{disasm, error, exec, loader, trace, VmError};

fn main() {
    env_logger::Builder::new()
        .format(|f, record| writeln!(f, "{}: {}", record.level(), record.args()))
        .filter(None, LevelFilter::Warn)
        .parse_env("RUST_LOG")
        .init();

    match run(&std::env::args().skip(1).collect::<Vec<_>>()) {
        Ok(code) => std::process::exit(code),
        Err(e) => error::fatal(&e),
    }
}

fn run(args: &[String]) -> Result<i32, VmError> {
    let listing = args.iter().any(|a| a == "-p");
    let filename = args
        .iter()
        .find(|a| a.as_str() != "-p")
        .ok_or_else(|| VmError::Usage("usage: vm [-p] <file.bof>".to_string()))?;
    let path = Path::new(filename);

    if listing {
        run_listing(path)?;
        Ok(0)
    } else {
        run_execute(path)
    }
}

fn run_listing(path: &Path) -> Result<(), VmError> {
    let machine = loader::load(path)?;
    let n = loader::text_length(path)?;

    trace::print_listing_header();
    for addr in 0..n {
        let word = machine.memory.instr_word(addr as i32)?;
        println!("{:8}: {}", addr, disasm::disassemble_word(word));
    }
    trace::print_globals(&machine);
    Ok(())
}

fn run_execute(path: &Path) -> Result<i32, VmError> {
    let mut machine = loader::load(path)?;
    loop {
        match exec::step(&mut machine)? {
            exec::StepOutcome::Continue => {}
            exec::StepOutcome::Exit(code) => return Ok(code),
        }
    }
}
