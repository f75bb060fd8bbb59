//! Ember VM - executes [`CodeUnit`]s.
//!
//! A [`Vm`] owns everything a running program can observe: globals, defined
//! methods, native functions, the table of loaded code units and the GC
//! arena of protected values. Nothing is process-global, so several VMs
//! (including throwaway sub-instances used for isolated compilation) can
//! coexist.
//!
//! Errors are ordinary `Result<_, Exception>` values. A Ruby-level `raise`
//! becomes an `Err` that unwinds through the interpreter and any native
//! callers with `?`.
//!
//! [`CodeUnit`]: ember_ir::CodeUnit

mod exception;
mod interpreter;
mod natives;
pub mod print_handler;
mod value;
mod vm;

pub use exception::{Exception, ExceptionKind};
pub use print_handler::{
    buffer_handler, silent_handler, stdout_handler, PrintHandlerImpl, SharedPrintHandler,
};
pub use ember_stack::ensure_sufficient_stack;
pub use value::{Proc, Value};
pub use vm::{LoadOutcome, NativeFn, Vm, DEFAULT_MAX_DEPTH};
