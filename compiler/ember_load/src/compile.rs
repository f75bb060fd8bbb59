//! Ahead-of-time compilation of `.rb` files into `.mrb` containers.

use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ember_ir::write_container;
use ember_vm::{silent_handler, Exception, Vm};
use tempfile::NamedTempFile;

use crate::config::BYTECODE_EXT;
use crate::source;

/// Default output path for `src`: the same path with `.mrb` in place of its
/// extension.
pub fn default_output(src: &Path) -> PathBuf {
    src.with_extension(BYTECODE_EXT.trim_start_matches('.'))
}

/// Compile `src` and write the container to `out`.
///
/// The container is written to a temporary file next to `out` and renamed
/// into place, so readers never observe a partial file.
#[tracing::instrument(level = "debug", skip_all, fields(src = %src.display(), out = %out.display()))]
pub fn compile_file(src: &Path, out: &Path) -> Result<(), Exception> {
    let host = Vm::with_print_handler(silent_handler());
    let units: Vec<_> = source::compile_isolated(&host, src)?
        .into_iter()
        .map(Arc::new)
        .collect();

    let dir = match out.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let write_error = |err: &dyn std::fmt::Display| {
        Exception::runtime_error(format!("cannot write {}: {err}", out.display()))
    };

    let tmp = NamedTempFile::new_in(dir).map_err(|e| write_error(&e))?;
    {
        let mut writer = BufWriter::new(tmp.as_file());
        write_container(&mut writer, &units).map_err(|e| write_error(&e))?;
    }
    tmp.persist(out).map_err(|e| write_error(&e.error))?;
    tracing::debug!(units = units.len(), "container written");
    Ok(())
}
