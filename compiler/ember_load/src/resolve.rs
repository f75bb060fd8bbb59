//! Module name to file path resolution.
//!
//! ## Name forms
//!
//! - Absolute: `/opt/lib/m.rb` is used as-is when it can be opened.
//! - Dot-relative: `./m`, `../lib/m` search only the current directory.
//! - Bare: `m`, `net/http` search every `$:` entry in order.
//!
//! A name whose last path segment contains a `.` already has an extension
//! and is tried as written. Otherwise `.rb`, `.mrb` and the native suffix
//! are tried, in that order, inside each directory before moving on to the
//! next one. The first candidate that canonicalizes to a readable regular
//! file wins.
//!
//! Nothing is cached: `$:` is read afresh for every call and the winning
//! file is opened again by whichever loader handles it.

use std::fs::File;
use std::path::{is_separator, Path, PathBuf};

use ember_vm::{Exception, Value, Vm};

use crate::config::{BYTECODE_EXT, LOAD_PATH_GLOBAL, NATIVE_EXT, SOURCE_EXT};
use crate::{errors, LoaderState};

/// Suffixes to try for `name`, in order.
pub fn extension_candidates(name: &str) -> &'static [&'static str] {
    static WITH_EXTENSION: [&str; 1] = [""];
    static BARE: [&str; 3] = [SOURCE_EXT, BYTECODE_EXT, NATIVE_EXT];
    if has_extension(name) {
        &WITH_EXTENSION
    } else {
        &BARE
    }
}

/// Whether the last path segment of `name` contains a `.`.
fn has_extension(name: &str) -> bool {
    name.rsplit(is_separator)
        .next()
        .is_some_and(|segment| segment.contains('.'))
}

/// Every `(directory, suffix)` candidate in search order.
pub(crate) fn generate_candidates<'a>(
    name: &'a str,
    dirs: &'a [String],
) -> impl Iterator<Item = PathBuf> + 'a {
    let suffixes = extension_candidates(name);
    dirs.iter().flat_map(move |dir| {
        suffixes
            .iter()
            .map(move |suffix| PathBuf::from(format!("{dir}/{name}{suffix}")))
    })
}

/// Resolve `name` to an existing file, or fail with
/// `LoadError: cannot load such file -- name`.
#[tracing::instrument(level = "debug", skip(vm))]
pub fn resolve(vm: &Vm, name: &str) -> Result<PathBuf, Exception> {
    if name.starts_with(is_separator) {
        let path = Path::new(name);
        return if is_loadable(path) {
            Ok(path.to_path_buf())
        } else {
            Err(errors::cannot_load_such_file(name))
        };
    }

    let dirs = if name.starts_with('.') {
        vec![current_dir(vm)]
    } else {
        search_path(vm)?
    };

    for candidate in generate_candidates(name, &dirs) {
        let Ok(canonical) = std::fs::canonicalize(&candidate) else {
            continue;
        };
        if is_loadable(&canonical) {
            tracing::debug!(path = %canonical.display(), "resolved");
            return Ok(canonical);
        }
    }
    tracing::debug!(dirs = dirs.len(), "no candidate matched");
    Err(errors::cannot_load_such_file(name))
}

/// A regular file that can be opened for reading.
fn is_loadable(path: &Path) -> bool {
    path.is_file() && File::open(path).is_ok()
}

fn current_dir(vm: &Vm) -> String {
    vm.data::<LoaderState>()
        .and_then(|state| state.current_dir.as_ref())
        .map_or_else(|| ".".to_owned(), |dir| dir.to_string_lossy().into_owned())
}

/// Snapshot of `$:` as directory strings. Empty entries are skipped.
fn search_path(vm: &Vm) -> Result<Vec<String>, Exception> {
    let Value::Array(entries) = vm.get_global(LOAD_PATH_GLOBAL) else {
        return Err(errors::invalid_global(LOAD_PATH_GLOBAL));
    };
    let entries = entries.borrow();
    let mut dirs = Vec::with_capacity(entries.len());
    for entry in entries.iter() {
        match entry.as_str() {
            Some("") => {}
            Some(dir) => dirs.push(dir.to_owned()),
            None => return Err(errors::not_a_string(entry)),
        }
    }
    Ok(dirs)
}
