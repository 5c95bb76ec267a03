//! Reads a binary object file (BOF): a fixed header followed by a run of
//! instruction words and a run of data words, and populates a fresh
//! [`Machine`] from it.
//!
//! Grounded on the teacher's `Exe::load`: a zero-copy `#[repr(C)]` header
//! parsed with `bytemuck`, with the same shape of checks (magic, region
//! bounds) adapted to this format's two payload regions instead of one.

use std::fs;
use std::path::Path;

use bytemuck::{AnyBitPattern, Zeroable};

use crate::error::VmError;
use crate::machine::Machine;
use crate::memory::MEMORY_SIZE;
use crate::registers::{FP, GP, SP};

const MAGIC: [u8; 4] = *b"BOF1";

#[repr(C)]
#[derive(Clone, Copy)]
struct Header {
    magic: [u8; 4],
    text_start: i32,
    text_length: i32,
    data_start: i32,
    data_length: i32,
    stack_bottom: i32,
}

unsafe impl Zeroable for Header {}
unsafe impl AnyBitPattern for Header {}

const HEADER_SIZE: usize = std::mem::size_of::<Header>();

fn check_region(start: i32, length: i32) -> Result<(std::ops::Range<usize>, usize), VmError> {
    if start < 0 || start as i64 >= MEMORY_SIZE as i64 {
        return Err(VmError::AddressOutOfRange(start as i64, MEMORY_SIZE));
    }
    if length < 0 {
        return Err(VmError::AddressOutOfRange(length as i64, MEMORY_SIZE));
    }
    let end = start as i64 + length as i64;
    if end > MEMORY_SIZE as i64 {
        return Err(VmError::AddressOutOfRange(end, MEMORY_SIZE));
    }
    Ok((start as usize..end as usize, length as usize))
}

/// Read `path`, validate its header and payload, and return a freshly
/// populated machine.
pub fn load(path: &Path) -> Result<Machine, VmError> {
    let bytes = fs::read(path).map_err(|source| VmError::Io {
        path: path.display().to_string(),
        source,
    })?;

    if bytes.len() < HEADER_SIZE {
        return Err(VmError::Truncated { expected: HEADER_SIZE, found: bytes.len() });
    }

    let header: Header = *bytemuck::from_bytes(&bytes[..HEADER_SIZE]);
    if header.magic != MAGIC {
        return Err(VmError::BadMagic(header.magic));
    }

    let (text_range, text_len) = check_region(header.text_start, header.text_length)?;
    let (data_range, data_len) = check_region(header.data_start, header.data_length)?;

    if header.stack_bottom < 0 || header.stack_bottom as i64 >= MEMORY_SIZE as i64 {
        return Err(VmError::AddressOutOfRange(header.stack_bottom as i64, MEMORY_SIZE));
    }

    if data_range.start < text_range.end && text_range.start < data_range.end {
        return Err(VmError::TextDataOverlap {
            start: data_range.start as i32,
            end: data_range.end as i32,
        });
    }

    let text_bytes_len = text_len * 4;
    let data_bytes_len = data_len * 4;
    let payload_start = HEADER_SIZE;
    let expected_total = payload_start + text_bytes_len + data_bytes_len;
    if bytes.len() < expected_total {
        return Err(VmError::Truncated { expected: expected_total, found: bytes.len() });
    }

    let text_bytes = &bytes[payload_start..payload_start + text_bytes_len];
    let data_bytes = &bytes[payload_start + text_bytes_len..expected_total];

    let instrs: Vec<u32> = text_bytes
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    let data: Vec<i32> = data_bytes
        .chunks_exact(4)
        .map(|c| i32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();

    let mut machine = Machine::new();
    machine.memory.load_instrs(header.text_start, &instrs)?;
    machine.memory.load_data(header.data_start, &data)?;

    machine.pc = header.text_start;
    machine.gpr[GP] = header.data_start;
    machine.gpr[SP] = header.stack_bottom;
    machine.gpr[FP] = header.stack_bottom;
    machine.hi = 0;
    machine.lo = 0;

    log::debug!(
        "loaded {} instruction(s), {} data word(s), pc={}, sp=fp={}",
        text_len,
        data_len,
        machine.pc,
        machine.gpr[SP]
    );

    Ok(machine)
}

/// The instruction count of the text region, for `-p` listing mode.
pub fn text_length(path: &Path) -> Result<usize, VmError> {
    let bytes = fs::read(path).map_err(|source| VmError::Io {
        path: path.display().to_string(),
        source,
    })?;
    if bytes.len() < HEADER_SIZE {
        return Err(VmError::Truncated { expected: HEADER_SIZE, found: bytes.len() });
    }
    let header: Header = *bytemuck::from_bytes(&bytes[..HEADER_SIZE]);
    Ok(header.text_length.max(0) as usize)
}
