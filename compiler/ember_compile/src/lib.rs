//! Ember Compile - turns Ember source text into [`CodeUnit`]s.
//!
//! The compiler is deliberately small: a `logos` lexer feeding a single-pass
//! recursive-descent compiler that emits stack-machine bytecode directly.
//! It knows nothing about the VM; callers decide where the produced unit
//! lives and whether it runs.
//!
//! [`CodeUnit`]: ember_ir::CodeUnit

mod compiler;
pub mod lexer;

use thiserror::Error;

pub use compiler::{compile, MAX_NESTING};

/// Options for one compilation.
#[derive(Clone, Debug, Default)]
pub struct CompileContext {
    /// File name attributed to the produced units and used in diagnostics.
    pub filename: Option<String>,
    /// Compile only; the caller must not execute the result.
    pub no_exec: bool,
}

impl CompileContext {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    #[must_use]
    pub fn no_exec(mut self) -> Self {
        self.no_exec = true;
        self
    }
}

/// A compile diagnostic, positioned at a 1-based line and column.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{}:{}:{}: {}", .filename.as_deref().unwrap_or("(string)"), .line, .column, .message)]
pub struct CompileError {
    pub filename: Option<String>,
    pub line: u32,
    pub column: u32,
    pub message: String,
}
