//! `load` and `require`.

use ember_vm::{Exception, Value, Vm};

use crate::{dispatch, errors, registry, resolve};

/// Resolve `name` and run it, whether or not it ran before.
#[tracing::instrument(level = "debug", skip(vm))]
pub fn load(vm: &mut Vm, name: &str) -> Result<bool, Exception> {
    let path = resolve::resolve(vm, name)?;
    dispatch::load_file(vm, &path)?;
    Ok(true)
}

/// Resolve `name` and run it unless that path was already loaded or is
/// being loaded. Returns whether the file ran.
#[tracing::instrument(level = "debug", skip(vm))]
pub fn require(vm: &mut Vm, name: &str) -> Result<bool, Exception> {
    let path = resolve::resolve(vm, name)?;
    let key = path.to_string_lossy();
    if registry::already_loaded(vm, &key)? {
        tracing::debug!(path = %key, "already loaded");
        return Ok(false);
    }
    registry::mark_loading(vm, &key)?;
    dispatch::load_file(vm, &path)?;
    registry::mark_loaded(vm, &key)?;
    Ok(true)
}

/// The single String argument of `load`/`require`.
fn name_argument(args: &[Value]) -> Result<&str, Exception> {
    match args {
        [value] => value.as_str().ok_or_else(|| errors::not_a_string(value)),
        _ => Err(errors::wrong_arity(args.len())),
    }
}

pub(crate) fn f_load(vm: &mut Vm, args: &[Value]) -> Result<Value, Exception> {
    let name = name_argument(args)?;
    load(vm, name).map(Value::Bool)
}

pub(crate) fn f_require(vm: &mut Vm, args: &[Value]) -> Result<Value, Exception> {
    let name = name_argument(args)?;
    require(vm, name).map(Value::Bool)
}
