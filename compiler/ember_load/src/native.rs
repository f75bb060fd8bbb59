//! Native extensions.
//!
//! A native extension is a shared library exporting
//!
//! ```text
//! #[no_mangle]
//! pub unsafe extern "C" fn ember_extension_init(vm: *mut ember_vm::Vm)
//! ```
//!
//! which registers its natives into the VM it is handed. The library must
//! be built against the same `ember_vm` and compiler as the host, since
//! `Vm` has no stable layout.
//!
//! Libraries are opened with global symbol visibility and never unloaded.

use std::path::{Path, PathBuf};

use ember_vm::{Exception, Vm};

use crate::config::NATIVE_INIT_SYMBOL;
use crate::errors;

/// Signature of the `ember_extension_init` entry point.
pub type NativeInitFn = unsafe extern "C" fn(*mut Vm);

/// Native libraries loaded into a VM, in load order.
#[derive(Debug, Default)]
pub struct NativeExtensions {
    loaded: Vec<PathBuf>,
}

impl NativeExtensions {
    pub fn loaded(&self) -> &[PathBuf] {
        &self.loaded
    }
}

/// Open the library at `path` and run its initializer against `vm`.
///
/// Open and symbol failures raise `RuntimeError` with the dynamic loader's
/// message.
#[tracing::instrument(level = "debug", skip(vm, path), fields(path = %path.display()))]
pub fn load_native_file(vm: &mut Vm, path: &Path) -> Result<(), Exception> {
    let init = open_and_resolve(path)?;
    call_init(init, vm);

    if let Some(registry) = vm.data_mut::<NativeExtensions>() {
        registry.loaded.push(path.to_path_buf());
    } else {
        vm.insert_data(NativeExtensions {
            loaded: vec![path.to_path_buf()],
        });
    }
    tracing::debug!("extension initialised");
    Ok(())
}

/// Open `path` and look up the entry point. The library handle is leaked so
/// the returned function pointer stays valid.
#[allow(unsafe_code)]
fn open_and_resolve(path: &Path) -> Result<NativeInitFn, Exception> {
    // SAFETY: loading a library runs its initialisers; native extensions are
    // trusted with full host capability.
    let library = unsafe { open_library(path) }.map_err(|err| errors::native_failure(&err))?;
    // SAFETY: the symbol is declared with the `NativeInitFn` signature by
    // every extension.
    let init: NativeInitFn = unsafe {
        *library
            .get::<NativeInitFn>(NATIVE_INIT_SYMBOL.as_bytes())
            .map_err(|err| errors::native_failure(&err))?
    };
    std::mem::forget(library);
    Ok(init)
}

#[allow(unsafe_code)]
fn call_init(init: NativeInitFn, vm: &mut Vm) {
    // SAFETY: `init` comes from a library that stays mapped for the rest of
    // the process, and the extension contract gives it exclusive use of
    // `vm` for the duration of the call.
    unsafe { init(vm as *mut Vm) }
}

#[cfg(unix)]
#[allow(unsafe_code)]
unsafe fn open_library(path: &Path) -> Result<libloading::Library, libloading::Error> {
    use libloading::os::unix::{Library, RTLD_GLOBAL, RTLD_LAZY};
    Library::open(Some(path), RTLD_LAZY | RTLD_GLOBAL).map(Into::into)
}

#[cfg(windows)]
#[allow(unsafe_code)]
unsafe fn open_library(path: &Path) -> Result<libloading::Library, libloading::Error> {
    libloading::Library::new(path)
}
