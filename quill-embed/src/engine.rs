// quill-embed - Engine implementation
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The Engine struct - main entry point for embedding Quill.

use std::rc::Rc;

use quill_core::{Interpreter, ModuleLoader};
use quill_object::ast::Program;
use quill_object::{Builtin, BuiltinTable, Exception, Failure, Output, Value};
use quill_vm::{Bytecode, CompileError, Compiler, Vm};

use crate::config::{Backend, EngineConfig};
use crate::convert::{FromValue, IntoValue};

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Why a run did not produce a value.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    /// The program failed at run time
    #[error("{0}")]
    Failure(Failure),
    /// The VM backend was forced and the compiler rejected the program
    #[error("compile error: {0}")]
    Compile(#[from] CompileError),
}

impl EngineError {
    /// The user-facing report.
    pub fn render(&self) -> String {
        match self {
            EngineError::Failure(failure) => failure.render(),
            EngineError::Compile(err) => format!("Compile error: {}", err),
        }
    }

    /// The uncaught exception, if the run ended with one.
    pub fn exception(&self) -> Option<&Exception> {
        match self {
            EngineError::Failure(failure) => failure.exception(),
            EngineError::Compile(_) => None,
        }
    }
}

impl From<Failure> for EngineError {
    fn from(failure: Failure) -> Self {
        EngineError::Failure(failure)
    }
}

/// The Quill scripting engine.
///
/// Runs programs on the configured backend. The interpreter is persistent,
/// so top-level bindings made by one interpreted run are visible to the
/// next; each VM run starts from fresh globals.
///
/// # Thread Safety
///
/// **`Engine` is NOT thread-safe.** Values use `Rc` and `RefCell`. Create
/// one engine per thread.
///
/// # Example
///
/// ```rust
/// use quill_embed::Engine;
/// use quill_object::ast::build as b;
/// use quill_object::Value;
///
/// let mut engine = Engine::default();
/// let program = b::program(vec![b::expr_stmt(b::add(b::int(1), b::int(2)))]);
/// assert_eq!(engine.run(&program).unwrap(), Value::Int(3));
/// ```
pub struct Engine {
    config: EngineConfig,
    /// Standard library plus registered natives, shared by both backends
    builtins: BuiltinTable,
    interpreter: Interpreter,
    output: Output,
    last_backend: Option<Backend>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let output = Output::default();
        let interpreter = Interpreter::new(config.interpreter.clone()).with_output(output.clone());
        Engine {
            config,
            builtins: BuiltinTable::standard(),
            interpreter,
            output,
            last_backend: None,
        }
    }

    /// Send `print` output to `output` on both backends.
    #[must_use]
    pub fn with_output(mut self, output: Output) -> Self {
        self.interpreter = self.interpreter.with_output(output.clone());
        self.output = output;
        self
    }

    /// Resolve imports through `loader`. Only the interpreter runs imports.
    #[must_use]
    pub fn with_loader(mut self, loader: Rc<dyn ModuleLoader>) -> Self {
        self.interpreter = self.interpreter.with_loader(loader);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn set_backend(&mut self, backend: Backend) {
        self.config.backend = backend;
    }

    pub fn output(&self) -> &Output {
        &self.output
    }

    /// The backend that ran the most recent program: `Vm` or `Interp`,
    /// never `Auto`.
    pub fn last_backend(&self) -> Option<Backend> {
        self.last_backend
    }

    /// Run a program on the configured backend.
    ///
    /// Returns the program's result value.
    ///
    /// # Errors
    ///
    /// - [`EngineError::Failure`] for an uncaught exception or fatal error
    /// - [`EngineError::Compile`] when the backend is `Vm` and the program
    ///   cannot be compiled
    #[tracing::instrument(level = "debug", skip_all, fields(backend = %self.config.backend))]
    pub fn run(&mut self, program: &Program) -> Result<Value> {
        match self.config.backend {
            Backend::Interp => self.run_interpreter(program),
            Backend::Vm => {
                let bytecode = self.compile(program)?;
                self.run_vm(bytecode)
            }
            Backend::Auto => match self.compile(program) {
                Ok(bytecode) => self.run_vm(bytecode),
                Err(err) if err.is_fallback() => {
                    tracing::debug!(reason = %err, "falling back to the interpreter");
                    self.run_interpreter(program)
                }
                Err(err) => Err(err.into()),
            },
        }
    }

    fn compile(&self, program: &Program) -> std::result::Result<Bytecode, CompileError> {
        Compiler::new()
            .with_file(self.config.interpreter.file.clone())
            .with_builtins(self.builtins.clone())
            .compile(program)
    }

    fn run_vm(&mut self, bytecode: Bytecode) -> Result<Value> {
        self.last_backend = Some(Backend::Vm);
        let mut vm = Vm::with_options(bytecode, self.config.vm.clone())
            .with_builtins(self.builtins.clone())
            .with_output(self.output.clone());
        Ok(vm.run()?)
    }

    fn run_interpreter(&mut self, program: &Program) -> Result<Value> {
        self.last_backend = Some(Backend::Interp);
        Ok(self.interpreter.interpret(program)?)
    }

    /// Register a native Rust function under `name` on both backends.
    ///
    /// # Example
    ///
    /// ```rust
    /// use quill_embed::{Engine, FromValue};
    /// use quill_object::ast::build as b;
    /// use quill_object::Value;
    ///
    /// let mut engine = Engine::default();
    /// engine.register_native("double", |args| {
    ///     let n = args.first().map(i64::from_value).transpose()?.unwrap_or(0);
    ///     Ok(Value::Int(n * 2))
    /// });
    /// let program = b::program(vec![b::expr_stmt(b::call_named("double", vec![b::int(21)]))]);
    /// assert_eq!(engine.run(&program).unwrap(), Value::Int(42));
    /// ```
    pub fn register_native<F>(&mut self, name: &str, func: F)
    where
        F: Fn(&[Value]) -> std::result::Result<Value, Exception> + 'static,
    {
        let func = Rc::new(func);
        let shared = Rc::clone(&func);
        self.builtins
            .register(Builtin::new(name, move |_: &Output, args: &[Value]| shared(args)));
        self.interpreter
            .register_native(Builtin::new(name, move |_: &Output, args: &[Value]| func(args)));
    }

    /// A top-level binding of the interpreter.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Value> {
        self.interpreter.env().get(name)
    }

    /// A top-level binding converted to a Rust type.
    ///
    /// Returns `None` when the name is unbound or the conversion fails.
    #[must_use]
    pub fn get_as<T: FromValue>(&self, name: &str) -> Option<T> {
        self.get(name).and_then(|v| T::from_value(&v).ok())
    }

    /// Bind `name` at the interpreter's top level.
    pub fn set(&self, name: &str, value: impl IntoValue) {
        self.interpreter.env().set(name, value.into_value());
    }
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new(EngineConfig::default())
    }
}
