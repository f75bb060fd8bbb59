//! Command handlers for the `ember` CLI.

mod compile;
mod require;
mod run;

pub use compile::compile_command;
pub use require::require_command;
pub use run::run_file;
