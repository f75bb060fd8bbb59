//! Ember Load - `load` and `require` for the Ember VM.
//!
//! Turns a module name into a file on the search path (`$:`), decides how
//! to load it from its extension and runs its top-level code in the VM's
//! global scope:
//!
//! - `.rb` source is compiled in an isolated sub-instance and handed over
//!   in memory.
//! - `.mrb` precompiled bytecode is read from its versioned container.
//! - Native libraries (`.so`, `.dylib`, `.dll`) are opened and their
//!   `ember_extension_init` entry point is called with the VM.
//!
//! `require` records each resolved path in `$"` and loads it at most once;
//! `load` always re-executes.
//!
//! All loader state lives in the VM that was passed to [`init`]: the search
//! path and both registries are ordinary global arrays, so scripts can
//! inspect and modify them.

mod api;
mod bytecode;
pub mod compile;
pub mod config;
mod dispatch;
mod errors;
mod native;
mod registry;
mod resolve;
mod source;

use std::path::PathBuf;

use ember_vm::{Value, Vm};

pub use api::{load, require};
pub use bytecode::load_bytecode_file;
pub use compile::compile_file;
pub use config::LoaderConfig;
pub use dispatch::{load_file, FileKind};
pub use native::{load_native_file, NativeExtensions, NativeInitFn};
pub use resolve::{extension_candidates, resolve};
pub use source::load_source_file;

/// Per-VM settings the natives need at call time.
#[derive(Debug, Default)]
pub(crate) struct LoaderState {
    /// Directory that stands in for `.` when a name starts with a dot.
    pub current_dir: Option<PathBuf>,
}

/// Install the loader into `vm` using the environment for the search path.
pub fn init(vm: &mut Vm) {
    init_with(vm, &LoaderConfig::from_env());
}

/// Install the loader into `vm`: define the `load` and `require` natives,
/// seed `$:` from `config` and reset `$"` and `$"_` to empty arrays.
#[tracing::instrument(level = "debug", skip_all)]
pub fn init_with(vm: &mut Vm, config: &LoaderConfig) {
    let search_path: Vec<Value> = config
        .initial_search_path()
        .into_iter()
        .map(|dir| Value::str(dir.to_string_lossy()))
        .collect();
    tracing::debug!(entries = search_path.len(), "initial search path");

    vm.set_global(config::LOAD_PATH_GLOBAL, Value::array(search_path));
    vm.set_global(config::LOADED_GLOBAL, Value::array(Vec::new()));
    vm.set_global(config::LOADING_GLOBAL, Value::array(Vec::new()));
    vm.insert_data(LoaderState {
        current_dir: config.current_dir.clone(),
    });
    vm.insert_data(NativeExtensions::default());

    vm.define_native("load", api::f_load);
    vm.define_native("require", api::f_require);
}
