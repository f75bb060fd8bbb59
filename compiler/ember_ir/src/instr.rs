//! Stack-machine instruction set.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single VM instruction.
///
/// Operands index into the owning [`CodeUnit`](crate::CodeUnit)'s pools:
/// `LoadStr` into `strings`, `GetGlobal`/`SetGlobal`/`Send`/`Def` into
/// `symbols`, `Def::child` into `children`, and local slots into the frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instr {
    /// Push `nil`.
    LoadNil,
    /// Push a boolean.
    LoadBool(bool),
    /// Push an integer.
    LoadInt(i64),
    /// Push a string from the string pool.
    LoadStr(u32),
    /// Push the value of a global variable (`nil` when unset).
    GetGlobal(u32),
    /// Pop a value into a global variable.
    SetGlobal(u32),
    /// Push a local slot.
    GetLocal(u16),
    /// Pop a value into a local slot.
    SetLocal(u16),
    /// Pop `n` values and push them as a new array.
    MakeArray(u16),
    /// Pop two values and push their sum (integers, strings, arrays).
    Add,
    /// Pop a value and an array, append the value, push the array.
    Shovel,
    /// Discard the top of stack.
    Pop,
    /// Pop `argc` arguments and call the method named by `sym`.
    Send { sym: u32, argc: u16 },
    /// Define method `sym` with body `children[child]`.
    Def { sym: u32, child: u16 },
    /// Pop the return value and leave the current unit.
    Return,
    /// Implicit end of a top-level program.
    Stop,
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instr::LoadNil => write!(f, "LOADNIL"),
            Instr::LoadBool(b) => write!(f, "LOADBOOL {b}"),
            Instr::LoadInt(n) => write!(f, "LOADI {n}"),
            Instr::LoadStr(idx) => write!(f, "STRING S{idx}"),
            Instr::GetGlobal(sym) => write!(f, "GETGV :{sym}"),
            Instr::SetGlobal(sym) => write!(f, "SETGV :{sym}"),
            Instr::GetLocal(slot) => write!(f, "GETLOCAL R{slot}"),
            Instr::SetLocal(slot) => write!(f, "SETLOCAL R{slot}"),
            Instr::MakeArray(n) => write!(f, "ARRAY {n}"),
            Instr::Add => write!(f, "ADD"),
            Instr::Shovel => write!(f, "SHOVEL"),
            Instr::Pop => write!(f, "POP"),
            Instr::Send { sym, argc } => write!(f, "SEND :{sym} {argc}"),
            Instr::Def { sym, child } => write!(f, "DEF :{sym} I{child}"),
            Instr::Return => write!(f, "RETURN"),
            Instr::Stop => write!(f, "STOP"),
        }
    }
}
