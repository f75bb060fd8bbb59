//! Compiled code units.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::sync::Arc;

use crate::Instr;

/// How a unit expects to be entered, which decides what a trailing `Stop` means.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    /// Outermost program: `Stop` halts the VM.
    Script,
    /// Invoked like a method: `Stop` loads `nil` and returns normally.
    Callable,
}

/// A compiled unit of code.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CodeUnit {
    /// File the unit is attributed to, for backtraces.
    pub filename: Option<String>,
    /// Entry protocol of this unit.
    pub entry: EntryKind,
    /// Number of declared parameters.
    pub argc: u16,
    /// Number of local slots, parameters included.
    pub nlocals: u16,
    /// Instruction sequence.
    pub code: Vec<Instr>,
    /// String literal pool.
    pub strings: Vec<String>,
    /// Symbol pool (global, method names).
    pub symbols: Vec<String>,
    /// Nested units (method bodies).
    pub children: Vec<Arc<CodeUnit>>,
}

impl CodeUnit {
    /// Create an empty unit with the given entry kind.
    pub fn new(entry: EntryKind) -> Self {
        CodeUnit {
            filename: None,
            entry,
            argc: 0,
            nlocals: 0,
            code: Vec::new(),
            strings: Vec::new(),
            symbols: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Whether the last instruction is the implicit program terminator.
    pub fn ends_with_stop(&self) -> bool {
        self.code.last() == Some(&Instr::Stop)
    }

    /// Retag a top-level program so it can be invoked as a nested callable.
    ///
    /// The instruction sequence is left untouched; the interpreter reads the
    /// tag to decide how to treat the trailing `Stop`.
    #[must_use]
    pub fn into_callable(mut self) -> Self {
        self.entry = EntryKind::Callable;
        self
    }

    /// Attribute this unit and every nested unit to `filename`.
    pub fn set_filename_recursive(&mut self, filename: &str) {
        self.filename = Some(filename.to_owned());
        for child in &mut self.children {
            Arc::make_mut(child).set_filename_recursive(filename);
        }
    }

    /// Total number of units in this tree, including `self`.
    pub fn unit_count(&self) -> usize {
        1 + self.children.iter().map(|c| c.unit_count()).sum::<usize>()
    }

    #[inline]
    pub fn symbol(&self, idx: u32) -> Option<&str> {
        self.symbols.get(idx as usize).map(String::as_str)
    }

    #[inline]
    pub fn string(&self, idx: u32) -> Option<&str> {
        self.strings.get(idx as usize).map(String::as_str)
    }

    /// Human-readable listing of this unit and its children.
    pub fn disassemble(&self) -> String {
        let mut out = String::new();
        self.disassemble_into(&mut out, 0);
        out
    }

    fn disassemble_into(&self, out: &mut String, id: usize) {
        let _ = writeln!(
            out,
            "unit I{id} {:?} file={} argc={} nlocals={} ilen={}",
            self.entry,
            self.filename.as_deref().unwrap_or("-"),
            self.argc,
            self.nlocals,
            self.code.len(),
        );
        for (pc, instr) in self.code.iter().enumerate() {
            let _ = writeln!(out, "  {pc:03} {instr}");
        }
        for (idx, child) in self.children.iter().enumerate() {
            child.disassemble_into(out, id * 10 + idx + 1);
        }
    }
}
