//! Loader configuration and fixed names.

use std::ffi::OsString;
use std::path::PathBuf;

/// Extension of source files.
pub const SOURCE_EXT: &str = ".rb";
/// Extension of precompiled bytecode containers.
pub const BYTECODE_EXT: &str = ".mrb";
/// Extension of native extensions on this platform.
pub const NATIVE_EXT: &str = std::env::consts::DLL_SUFFIX;

/// Symbol every native extension exports.
pub const NATIVE_INIT_SYMBOL: &str = "ember_extension_init";

/// Environment variable holding the initial search path.
pub const SEARCH_PATH_ENV: &str = "EMBERLIB";

/// Search path (`$:`).
pub const LOAD_PATH_GLOBAL: &str = "$:";
/// Paths that finished loading (`$"`).
pub const LOADED_GLOBAL: &str = "$\"";
/// Paths currently being loaded (`$"_`).
pub const LOADING_GLOBAL: &str = "$\"_";

/// How to seed the loader when it is installed into a VM.
#[derive(Clone, Debug)]
pub struct LoaderConfig {
    /// Variable consulted by [`LoaderConfig::from_env`].
    pub env_var: String,
    /// Initial `$:` entries, in search order.
    pub search_path: Vec<PathBuf>,
    /// Directory used for `.`-prefixed names; the process working
    /// directory when unset.
    pub current_dir: Option<PathBuf>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        LoaderConfig {
            env_var: SEARCH_PATH_ENV.to_owned(),
            search_path: Vec::new(),
            current_dir: None,
        }
    }
}

impl LoaderConfig {
    /// Read the search path from `EMBERLIB`.
    pub fn from_env() -> Self {
        Self::default().with_env()
    }

    /// Replace the search path with the contents of `self.env_var`, if set.
    #[must_use]
    pub fn with_env(mut self) -> Self {
        if let Some(value) = std::env::var_os(&self.env_var) {
            self.search_path = split_search_path(&value);
        }
        self
    }

    #[must_use]
    pub fn with_search_path<I, P>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.search_path = dirs.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn initial_search_path(&self) -> Vec<PathBuf> {
        self.search_path.clone()
    }
}

/// Split a search-path variable on the platform delimiter (`:` on POSIX,
/// `;` on Windows), dropping empty entries.
pub fn split_search_path(value: &OsString) -> Vec<PathBuf> {
    std::env::split_paths(value)
        .filter(|p| !p.as_os_str().is_empty())
        .collect()
}
