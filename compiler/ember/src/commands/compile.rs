//! The `compile` command: write a precompiled `.mrb` container.

use std::path::{Path, PathBuf};

use ember_load::compile::{compile_file, default_output};
use ember_vm::Exception;

/// Compile `src` to `out` (default: `src` with a `.mrb` extension) and
/// return the path written.
pub fn compile_command(src: &Path, out: Option<&Path>) -> Result<PathBuf, Exception> {
    let out = out.map_or_else(|| default_output(src), Path::to_path_buf);
    compile_file(src, &out)?;
    Ok(out)
}
