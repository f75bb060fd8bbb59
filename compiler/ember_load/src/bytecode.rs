//! Running compiled units: precompiled `.mrb` files and freshly compiled
//! source alike end up in [`execute_units`].

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;

use ember_ir::{read_container, CodeUnit};
use ember_vm::{Exception, Proc, Value, Vm};

use crate::errors;

/// Load a bytecode container from `path` and run it, attributing its code
/// to `display_path` in backtraces.
#[tracing::instrument(level = "debug", skip(vm, path), fields(path = %path.display()))]
pub fn load_bytecode_file(vm: &mut Vm, path: &Path, display_path: &str) -> Result<(), Exception> {
    let file = File::open(path).map_err(|_| errors::cannot_load(path))?;
    let units = read_container(&mut BufReader::new(file))
        .map_err(|err| errors::bytecode_format(path, &err))?;
    tracing::debug!(units = units.len(), "container read");
    execute_units(vm, units, display_path)
}

/// Append `units` to the code table and invoke each one, in order, as a
/// callable with `main` as the receiver.
///
/// The units are retagged as callables, so their trailing `Stop` returns
/// to the caller instead of halting the VM. Everything created here is
/// protected in an arena scope that ends when the last unit returns.
pub(crate) fn execute_units(
    vm: &mut Vm,
    units: Vec<CodeUnit>,
    display_path: &str,
) -> Result<(), Exception> {
    vm.with_arena(|vm| {
        for mut unit in units {
            unit.set_filename_recursive(display_path);
            let unit = Arc::new(unit.into_callable());
            vm.code_mut().push(Arc::clone(&unit));

            let proc = Rc::new(Proc::new(unit));
            vm.protect(Value::Proc(Rc::clone(&proc)));
            let receiver = vm.top_self();
            vm.call_proc(&proc, receiver, &[])?;
        }
        Ok(())
    })
}
