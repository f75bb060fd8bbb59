//! Versioned bytecode container (`.mrb` files).
//!
//! # Layout
//!
//! ```text
//! ┌────────┬────────────┬──────────────────────────────┐
//! │ "EMBC" │ version u16│ bincode payload: Vec<CodeUnit>│
//! │ 4 bytes│ LE         │                              │
//! └────────┴────────────┴──────────────────────────────┘
//! ```
//!
//! The first unit of the payload is the top-level program. Decoded units are
//! validated so every pool index and local slot they reference is in range;
//! the interpreter may rely on that for units read from disk.

use bincode::Options;
use std::io::{self, Read, Write};
use std::sync::Arc;
use thiserror::Error;

use crate::{CodeUnit, EntryKind, Instr};

/// File magic of a bytecode container.
pub const BYTECODE_MAGIC: [u8; 4] = *b"EMBC";

/// Current container format version. Bump on any change to [`CodeUnit`] or [`Instr`].
pub const BYTECODE_VERSION: u16 = 1;

/// Upper bound on a decoded payload, so a corrupt length prefix cannot
/// trigger a huge allocation.
const MAX_PAYLOAD_BYTES: u64 = 64 * 1024 * 1024;

/// Errors produced while reading or writing a bytecode container.
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("not a bytecode container (bad magic)")]
    BadMagic,
    #[error("bytecode version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u16, found: u16 },
    #[error("truncated bytecode container")]
    Truncated,
    #[error("corrupt bytecode payload: {0}")]
    Corrupt(String),
    #[error("bytecode container holds no units")]
    Empty,
}

fn payload_options() -> impl Options {
    bincode::DefaultOptions::new().with_limit(MAX_PAYLOAD_BYTES)
}

/// Write `units` as a container. The first unit is the top-level program.
pub fn write_container<W: Write>(
    writer: &mut W,
    units: &[Arc<CodeUnit>],
) -> Result<(), ContainerError> {
    if units.is_empty() {
        return Err(ContainerError::Empty);
    }
    writer.write_all(&BYTECODE_MAGIC)?;
    writer.write_all(&BYTECODE_VERSION.to_le_bytes())?;
    payload_options()
        .serialize_into(&mut *writer, units)
        .map_err(|e| ContainerError::Corrupt(e.to_string()))?;
    writer.flush()?;
    Ok(())
}

/// Read a container, returning its units (top-level program first).
pub fn read_container<R: Read>(reader: &mut R) -> Result<Vec<CodeUnit>, ContainerError> {
    let mut magic = [0u8; 4];
    read_header_bytes(reader, &mut magic)?;
    if magic != BYTECODE_MAGIC {
        return Err(ContainerError::BadMagic);
    }

    let mut version = [0u8; 2];
    read_header_bytes(reader, &mut version)?;
    let found = u16::from_le_bytes(version);
    if found != BYTECODE_VERSION {
        return Err(ContainerError::VersionMismatch {
            expected: BYTECODE_VERSION,
            found,
        });
    }

    let units: Vec<CodeUnit> =
        payload_options()
            .deserialize_from(reader)
            .map_err(|e| match *e {
                bincode::ErrorKind::Io(ref io) if io.kind() == io::ErrorKind::UnexpectedEof => {
                    ContainerError::Truncated
                }
                _ => ContainerError::Corrupt(e.to_string()),
            })?;

    if units.is_empty() {
        return Err(ContainerError::Empty);
    }
    for unit in &units {
        validate(unit).map_err(ContainerError::Corrupt)?;
    }
    Ok(units)
}

fn read_header_bytes<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<(), ContainerError> {
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            ContainerError::Truncated
        } else {
            ContainerError::Io(e)
        }
    })
}

/// Check every operand of `unit` (and its children) against its pools.
/// Nested units are method bodies and must be callables.
fn validate(unit: &CodeUnit) -> Result<(), String> {
    if unit.argc > unit.nlocals {
        return Err(format!(
            "unit declares {} parameters but only {} locals",
            unit.argc, unit.nlocals
        ));
    }
    let strings = unit.strings.len();
    let symbols = unit.symbols.len();
    let children = unit.children.len();
    let in_range = |idx: usize, len: usize| idx < len;

    for (pc, instr) in unit.code.iter().enumerate() {
        let ok = match *instr {
            Instr::LoadStr(idx) => in_range(idx as usize, strings),
            Instr::GetGlobal(sym) | Instr::SetGlobal(sym) | Instr::Send { sym, .. } => {
                in_range(sym as usize, symbols)
            }
            Instr::Def { sym, child } => {
                in_range(sym as usize, symbols) && in_range(child as usize, children)
            }
            Instr::GetLocal(slot) | Instr::SetLocal(slot) => slot < unit.nlocals,
            _ => true,
        };
        if !ok {
            return Err(format!("operand out of range at pc {pc}: {instr}"));
        }
    }
    unit.children.iter().enumerate().try_for_each(|(idx, child)| {
        if child.entry != EntryKind::Callable {
            return Err(format!("child {idx} is not a callable unit"));
        }
        validate(child)
    })
}
