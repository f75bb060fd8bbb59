//! Ember IR - compiled code representation shared by the compiler, the VM
//! and the module loader.
//!
//! # Overview
//!
//! ```text
//! source ──► ember_compile ──► CodeUnit ──► CodeTable (per VM)
//!                                 │
//!                                 └──► container (.mrb) ──► CodeUnit
//! ```
//!
//! A [`CodeUnit`] is the unit of compiled code: an instruction sequence with
//! its string and symbol pools and any nested units (method bodies). Units
//! carry an explicit [`EntryKind`] so the interpreter knows whether the
//! trailing `Stop` ends the whole program or just returns to the caller.

mod container;
mod instr;
mod table;
mod unit;

pub use container::{
    read_container, write_container, ContainerError, BYTECODE_MAGIC, BYTECODE_VERSION,
};
pub use instr::Instr;
pub use table::CodeTable;
pub use unit::{CodeUnit, EntryKind};
