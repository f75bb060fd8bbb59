//! Exception constructors for every loader failure.
//!
//! Kept in one place so the messages scripts see stay consistent.

use std::path::Path;

use ember_ir::ContainerError;
use ember_vm::{Exception, Value};

/// No search-path candidate exists for `name`.
#[cold]
pub(crate) fn cannot_load_such_file(name: &str) -> Exception {
    Exception::load_error(format!("cannot load such file -- {name}"))
}

/// A resolved file could not be opened.
#[cold]
pub(crate) fn cannot_load(path: &Path) -> Exception {
    Exception::load_error(format!("can't load {}", path.display()))
}

#[cold]
pub(crate) fn invalid_filepath(path: &Path) -> Exception {
    Exception::load_error(format!("Filepath '{}' is invalid.", path.display()))
}

#[cold]
pub(crate) fn invalid_extension(path: &Path) -> Exception {
    Exception::load_error(format!(
        "Filepath '{}' is invalid extension.",
        path.display()
    ))
}

/// A loader global (`$:`, `$"`, `$"_`) holds something other than an array.
#[cold]
pub(crate) fn invalid_global(name: &str) -> Exception {
    Exception::runtime_error(format!("invalid {name}"))
}

#[cold]
pub(crate) fn not_a_string(value: &Value) -> Exception {
    Exception::type_error(format!(
        "can't convert {} into String",
        value.class_name()
    ))
}

#[cold]
pub(crate) fn wrong_arity(given: usize) -> Exception {
    Exception::argument_error(format!(
        "wrong number of arguments (given {given}, expected 1)"
    ))
}

/// The bytecode container is corrupt or from another format version.
#[cold]
pub(crate) fn bytecode_format(path: &Path, err: &ContainerError) -> Exception {
    Exception::script_error(format!("{}: {err}", path.display()))
}

/// The dynamic loader failed; its diagnostic is passed through verbatim.
#[cold]
pub(crate) fn native_failure(err: &impl std::fmt::Display) -> Exception {
    Exception::runtime_error(err.to_string())
}
