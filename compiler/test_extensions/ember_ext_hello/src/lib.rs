//! A native extension for the loader's integration tests.
//!
//! Initialisation defines `hello_native` and counts its own runs in
//! `$native_inits`.

use ember_vm::{Exception, Value, Vm};

fn hello_native(_vm: &mut Vm, _args: &[Value]) -> Result<Value, Exception> {
    Ok(Value::str("from native"))
}

/// # Safety
///
/// `vm` must point to a live VM that nothing else uses during the call.
#[no_mangle]
#[allow(unsafe_code, improper_ctypes_definitions)]
pub unsafe extern "C" fn ember_extension_init(vm: *mut Vm) {
    // SAFETY: the loader hands over its VM exclusively for this call.
    let Some(vm) = (unsafe { vm.as_mut() }) else {
        return;
    };
    let runs = match vm.get_global("$native_inits") {
        Value::Int(n) => n + 1,
        _ => 1,
    };
    vm.set_global("$native_inits", Value::Int(runs));
    vm.define_native("hello_native", hello_native);
}
