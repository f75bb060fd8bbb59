//! The VM instance: globals, methods, natives, code table and GC arena.

use std::any::{Any, TypeId};
use std::path::Path;
use std::sync::Arc;

use ember_compile::CompileContext;
use ember_ir::{CodeTable, CodeUnit};
use rustc_hash::FxHashMap;

use crate::print_handler::{stdout_handler, SharedPrintHandler};
use crate::{natives, Exception, Value};

/// Signature of a function callable from Ember code.
///
/// Receives the VM and the evaluated arguments. Returning `Err` raises.
pub type NativeFn = fn(&mut Vm, &[Value]) -> Result<Value, Exception>;

/// Nesting limit for calls before `stack level too deep` is raised.
pub const DEFAULT_MAX_DEPTH: usize = 1024;

/// Result of [`Vm::load_string_cxt`] / [`Vm::load_file_cxt`].
#[derive(Debug, PartialEq)]
pub enum LoadOutcome {
    /// The program ran and produced this value.
    Executed(Value),
    /// Compile-only: the unit was appended to the code table at this index.
    Compiled(usize),
}

pub struct Vm {
    globals: FxHashMap<String, Value>,
    natives: FxHashMap<String, NativeFn>,
    pub(crate) methods: FxHashMap<String, Arc<CodeUnit>>,
    code: CodeTable,
    arena: Vec<Value>,
    print: SharedPrintHandler,
    data: FxHashMap<TypeId, Box<dyn Any>>,
    pub(crate) depth: usize,
    pub(crate) max_depth: usize,
    pub(crate) halted: bool,
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

impl Vm {
    /// A fresh VM printing to stdout, with the core natives defined.
    pub fn new() -> Self {
        Self::with_print_handler(stdout_handler())
    }

    pub fn with_print_handler(print: SharedPrintHandler) -> Self {
        let mut vm = Vm {
            globals: FxHashMap::default(),
            natives: FxHashMap::default(),
            methods: FxHashMap::default(),
            code: CodeTable::new(),
            arena: Vec::new(),
            print,
            data: FxHashMap::default(),
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
            halted: false,
        };
        natives::register(&mut vm);
        vm
    }

    /// A throwaway sub-instance sharing only this VM's output handler and
    /// limits. Used to compile code without touching this VM's state.
    pub fn isolated(&self) -> Vm {
        let mut vm = Vm::with_print_handler(Arc::clone(&self.print));
        vm.max_depth = self.max_depth;
        vm
    }

    pub fn set_max_depth(&mut self, depth: usize) {
        self.max_depth = depth;
    }

    pub fn print_handler(&self) -> &SharedPrintHandler {
        &self.print
    }

    // Globals

    /// Value of global `name`; `nil` when never assigned.
    pub fn get_global(&self, name: &str) -> Value {
        self.globals.get(name).cloned().unwrap_or(Value::Nil)
    }

    pub fn set_global(&mut self, name: &str, value: Value) {
        self.globals.insert(name.to_owned(), value);
    }

    pub fn global_defined(&self, name: &str) -> bool {
        self.globals.contains_key(name)
    }

    // Methods

    /// Define (or redefine) a native top-level function.
    pub fn define_native(&mut self, name: &str, f: NativeFn) {
        self.natives.insert(name.to_owned(), f);
    }

    pub(crate) fn native(&self, name: &str) -> Option<NativeFn> {
        self.natives.get(name).copied()
    }

    /// Whether `name` resolves to a script method or a native.
    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name) || self.natives.contains_key(name)
    }

    // Host data

    /// Attach per-VM state of type `T`, replacing any previous value.
    ///
    /// Natives are plain function pointers; this is where subsystems keep
    /// the state they need between calls.
    pub fn insert_data<T: Any>(&mut self, value: T) {
        self.data.insert(TypeId::of::<T>(), Box::new(value));
    }

    pub fn data<T: Any>(&self) -> Option<&T> {
        self.data.get(&TypeId::of::<T>())?.downcast_ref()
    }

    pub fn data_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.data.get_mut(&TypeId::of::<T>())?.downcast_mut()
    }

    // Code table

    pub fn code(&self) -> &CodeTable {
        &self.code
    }

    pub fn code_mut(&mut self) -> &mut CodeTable {
        &mut self.code
    }

    // GC arena

    /// Current arena watermark.
    pub fn gc_arena_save(&self) -> usize {
        self.arena.len()
    }

    /// Release every value protected since `idx` was saved.
    pub fn gc_arena_restore(&mut self, idx: usize) {
        self.arena.truncate(idx);
    }

    /// Keep `value` alive until the enclosing arena scope ends.
    pub fn protect(&mut self, value: Value) {
        self.arena.push(value);
    }

    /// Run `f` in its own arena scope.
    pub fn with_arena<R>(&mut self, f: impl FnOnce(&mut Vm) -> R) -> R {
        let idx = self.gc_arena_save();
        let result = f(self);
        self.gc_arena_restore(idx);
        result
    }

    /// The top-level `self`.
    pub fn top_self(&self) -> Value {
        Value::Main
    }

    // Loading

    /// Compile `source` and, unless `ctx.no_exec`, run it.
    #[tracing::instrument(level = "debug", skip_all, fields(file = ctx.filename.as_deref()))]
    pub fn load_string_cxt(
        &mut self,
        source: &str,
        ctx: &CompileContext,
    ) -> Result<LoadOutcome, Exception> {
        let unit = ember_compile::compile(source, ctx)
            .map_err(|err| Exception::syntax_error(err.to_string()))?;
        let unit = Arc::new(unit);
        let idx = self.code.push(Arc::clone(&unit));
        if ctx.no_exec {
            tracing::debug!(idx, "compiled without executing");
            return Ok(LoadOutcome::Compiled(idx));
        }
        self.run(unit).map(LoadOutcome::Executed)
    }

    /// Read `path` and hand it to [`Vm::load_string_cxt`], attributing it to
    /// `path` unless `ctx` already names a file.
    pub fn load_file_cxt(
        &mut self,
        path: &Path,
        ctx: &CompileContext,
    ) -> Result<LoadOutcome, Exception> {
        let source = std::fs::read_to_string(path).map_err(|err| {
            Exception::load_error(format!("cannot read {}: {err}", path.display()))
        })?;
        if ctx.filename.is_some() {
            self.load_string_cxt(&source, ctx)
        } else {
            let ctx = ctx.clone().with_filename(path.display().to_string());
            self.load_string_cxt(&source, &ctx)
        }
    }

    /// Whether a `Stop` in a script unit has halted the current run.
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub(crate) fn print(&self, msg: &str) {
        self.print.print(msg);
    }

    pub(crate) fn println(&self, msg: &str) {
        self.print.println(msg);
    }
}
