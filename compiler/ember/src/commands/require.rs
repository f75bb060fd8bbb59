//! The `require` command: require one module into an empty program.

use ember_load::LoaderConfig;
use ember_vm::{Exception, SharedPrintHandler, Vm};

/// Require `name` in a fresh VM. Returns the resolved paths that ended up
/// in `$"`, in load order.
pub fn require_command(
    name: &str,
    config: &LoaderConfig,
    print: SharedPrintHandler,
) -> Result<Vec<String>, Exception> {
    let mut vm = Vm::with_print_handler(print);
    ember_load::init_with(&mut vm, config);
    ember_load::require(&mut vm, name)?;

    let loaded = match vm.get_global(ember_load::config::LOADED_GLOBAL) {
        ember_vm::Value::Array(items) => items
            .borrow()
            .iter()
            .filter_map(|v| v.as_str().map(str::to_owned))
            .collect(),
        _ => Vec::new(),
    };
    Ok(loaded)
}
