//! The `run` command: execute a program with the loader installed.

use std::path::Path;

use ember_compile::CompileContext;
use ember_load::LoaderConfig;
use ember_vm::{Exception, SharedPrintHandler, Vm};

/// Run the source file at `path` as the main program.
pub fn run_file(
    path: &Path,
    config: &LoaderConfig,
    print: SharedPrintHandler,
) -> Result<(), Exception> {
    let mut vm = Vm::with_print_handler(print);
    ember_load::init_with(&mut vm, config);
    vm.load_file_cxt(path, &CompileContext::new())?;
    Ok(())
}
