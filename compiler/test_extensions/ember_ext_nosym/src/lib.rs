//! A well-formed shared library that lacks `ember_extension_init`.

#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn ember_ext_nosym_marker() -> i32 {
    7
}
