//! Ruby-level exceptions.

use std::fmt;

use thiserror::Error;

/// Exception classes known to the VM.
///
/// The hierarchy mirrors Ruby's: `LoadError` and `SyntaxError` are
/// `ScriptError`s, `NoMethodError` is a `NameError`. Everything else
/// descends directly from `StandardError`, which is not modelled.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ExceptionKind {
    ScriptError,
    LoadError,
    SyntaxError,
    TypeError,
    ArgumentError,
    NameError,
    NoMethodError,
    RuntimeError,
}

impl ExceptionKind {
    pub fn name(self) -> &'static str {
        match self {
            ExceptionKind::ScriptError => "ScriptError",
            ExceptionKind::LoadError => "LoadError",
            ExceptionKind::SyntaxError => "SyntaxError",
            ExceptionKind::TypeError => "TypeError",
            ExceptionKind::ArgumentError => "ArgumentError",
            ExceptionKind::NameError => "NameError",
            ExceptionKind::NoMethodError => "NoMethodError",
            ExceptionKind::RuntimeError => "RuntimeError",
        }
    }

    pub fn superclass(self) -> Option<ExceptionKind> {
        match self {
            ExceptionKind::LoadError | ExceptionKind::SyntaxError => {
                Some(ExceptionKind::ScriptError)
            }
            ExceptionKind::NoMethodError => Some(ExceptionKind::NameError),
            _ => None,
        }
    }
}

impl fmt::Display for ExceptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A raised exception travelling up the Rust call stack.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{message} ({kind})")]
pub struct Exception {
    pub kind: ExceptionKind,
    pub message: String,
    /// Innermost frame first.
    pub backtrace: Vec<String>,
}

impl Exception {
    #[cold]
    pub fn new(kind: ExceptionKind, message: impl Into<String>) -> Self {
        Exception {
            kind,
            message: message.into(),
            backtrace: Vec::new(),
        }
    }

    #[cold]
    pub fn load_error(message: impl Into<String>) -> Self {
        Self::new(ExceptionKind::LoadError, message)
    }

    #[cold]
    pub fn script_error(message: impl Into<String>) -> Self {
        Self::new(ExceptionKind::ScriptError, message)
    }

    #[cold]
    pub fn syntax_error(message: impl Into<String>) -> Self {
        Self::new(ExceptionKind::SyntaxError, message)
    }

    #[cold]
    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ExceptionKind::TypeError, message)
    }

    #[cold]
    pub fn argument_error(message: impl Into<String>) -> Self {
        Self::new(ExceptionKind::ArgumentError, message)
    }

    #[cold]
    pub fn no_method_error(message: impl Into<String>) -> Self {
        Self::new(ExceptionKind::NoMethodError, message)
    }

    #[cold]
    pub fn runtime_error(message: impl Into<String>) -> Self {
        Self::new(ExceptionKind::RuntimeError, message)
    }

    /// `rescue kind` semantics: true for `kind` itself or any ancestor.
    pub fn is_a(&self, kind: ExceptionKind) -> bool {
        let mut current = Some(self.kind);
        while let Some(k) = current {
            if k == kind {
                return true;
            }
            current = k.superclass();
        }
        false
    }

    pub(crate) fn push_frame(&mut self, frame: String) {
        self.backtrace.push(frame);
    }

    /// Multi-line report in the style of an uncaught exception.
    pub fn report(&self) -> String {
        let mut out = self.to_string();
        for frame in &self.backtrace {
            out.push_str("\n\tfrom ");
            out.push_str(frame);
        }
        out
    }
}
