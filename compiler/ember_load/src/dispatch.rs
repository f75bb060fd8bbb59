//! Extension-based routing of a resolved file to its loader.

use std::path::Path;

use ember_vm::{Exception, Vm};

use crate::config::{BYTECODE_EXT, NATIVE_EXT, SOURCE_EXT};
use crate::{bytecode, errors, native, source};

/// What kind of file a resolved path holds, judged by its extension.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FileKind {
    Bytecode,
    Source,
    Native,
}

impl FileKind {
    /// Classify `path` by the text after the last `.` of its file name.
    ///
    /// No extension and unknown extensions both fail with `LoadError`.
    pub fn from_path(path: &Path) -> Result<FileKind, Exception> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| errors::invalid_filepath(path))?;
        let dot = file_name
            .rfind('.')
            .ok_or_else(|| errors::invalid_filepath(path))?;
        match &file_name[dot..] {
            ext if ext == BYTECODE_EXT => Ok(FileKind::Bytecode),
            ext if ext == SOURCE_EXT => Ok(FileKind::Source),
            ext if ext == NATIVE_EXT => Ok(FileKind::Native),
            _ => Err(errors::invalid_extension(path)),
        }
    }
}

/// Load the file at `path` with the loader its extension selects.
#[tracing::instrument(level = "debug", skip(vm, path), fields(path = %path.display()))]
pub fn load_file(vm: &mut Vm, path: &Path) -> Result<(), Exception> {
    let kind = FileKind::from_path(path)?;
    tracing::debug!(?kind, "dispatch");
    match kind {
        FileKind::Bytecode => {
            bytecode::load_bytecode_file(vm, path, &path.display().to_string())
        }
        FileKind::Source => source::load_source_file(vm, path),
        FileKind::Native => native::load_native_file(vm, path),
    }
}
