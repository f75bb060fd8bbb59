//! Loaded and loading registries (`$"` and `$"_`).
//!
//! Both are plain global arrays of path strings. Entries are only ever
//! appended. A path that started loading and failed stays in `$"_`, so a
//! later `require` of it is a no-op; `load` ignores both registries.

use std::cell::RefCell;
use std::rc::Rc;

use ember_vm::{Exception, Value, Vm};

use crate::config::{LOADED_GLOBAL, LOADING_GLOBAL};
use crate::errors;

fn registry(vm: &Vm, global: &str) -> Result<Rc<RefCell<Vec<Value>>>, Exception> {
    match vm.get_global(global) {
        Value::Array(entries) => Ok(entries),
        _ => Err(errors::invalid_global(global)),
    }
}

fn contains(entries: &RefCell<Vec<Value>>, path: &str) -> bool {
    entries.borrow().iter().any(|e| e.as_str() == Some(path))
}

/// Whether `path` has finished loading or is loading right now.
///
/// Comparison is exact; resolution has already canonicalized `path`.
pub(crate) fn already_loaded(vm: &Vm, path: &str) -> Result<bool, Exception> {
    let found = contains(&*registry(vm, LOADED_GLOBAL)?, path)
        || contains(&*registry(vm, LOADING_GLOBAL)?, path);
    tracing::trace!(path, found, "registry lookup");
    Ok(found)
}

pub(crate) fn mark_loading(vm: &Vm, path: &str) -> Result<(), Exception> {
    registry(vm, LOADING_GLOBAL)?
        .borrow_mut()
        .push(Value::str(path));
    Ok(())
}

pub(crate) fn mark_loaded(vm: &Vm, path: &str) -> Result<(), Exception> {
    registry(vm, LOADED_GLOBAL)?
        .borrow_mut()
        .push(Value::str(path));
    Ok(())
}
