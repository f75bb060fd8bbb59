//! Loading `.rb` source files.
//!
//! Source is compiled inside a throwaway [`Vm::isolated`] sub-instance so
//! the caller's code table never sees compiler artifacts. The units the
//! compilation added are taken straight out of the sub-instance and run in
//! the caller's VM; nothing touches the disk between the two steps.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use ember_compile::CompileContext;
use ember_ir::CodeUnit;
use ember_vm::{Exception, Vm};

use crate::{bytecode, errors};

/// Compile and run the source file at `path`.
#[tracing::instrument(level = "debug", skip(vm, path), fields(path = %path.display()))]
pub fn load_source_file(vm: &mut Vm, path: &Path) -> Result<(), Exception> {
    let units = compile_isolated(vm, path)?;
    bytecode::execute_units(vm, units, &path.display().to_string())
}

/// Compile `path` without executing it, returning the units the
/// compilation produced. Compile errors surface as `SyntaxError`s naming
/// `path`.
pub(crate) fn compile_isolated(vm: &Vm, path: &Path) -> Result<Vec<CodeUnit>, Exception> {
    File::open(path).map_err(|_| errors::cannot_load(path))?;

    let mut sub = vm.isolated();
    let baseline = sub.code().len();
    let ctx = CompileContext::new()
        .with_filename(path.display().to_string())
        .no_exec();
    sub.load_file_cxt(path, &ctx)?;

    let units: Vec<CodeUnit> = sub
        .code_mut()
        .drain_from(baseline)
        .into_iter()
        .map(Arc::unwrap_or_clone)
        .collect();
    tracing::debug!(units = units.len(), "compiled in sub-instance");
    Ok(units)
}
