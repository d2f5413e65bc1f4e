// quill-core - Tree-walking interpreter
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Tree-walking evaluator for Quill programs.
//!
//! Statements and expressions are evaluated directly against an [`Env`]
//! chain. Non-local exits travel on the `Err` side of [`Eval`] as a
//! [`Signal`], so `?` unwinds them through nested evaluation.

mod calls;
mod classes;
mod context;
mod exceptions;
mod expressions;
mod modules;
mod statements;

use std::rc::Rc;

use quill_object::ast::{Position, Program};
use quill_object::debug::MODULE_FUNCTION;
use quill_object::{
    Builtin, BuiltinTable, Env, Exception, Failure, FatalError, Output, StackFrame, Value,
};

use crate::error::Error;
use crate::module::{ModuleLoader, ModuleRegistry};
use crate::signal::{Eval, Signal};

// ============================================================================
// Options
// ============================================================================

/// Default recursion limit for user function calls.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 256;

/// Default file name reported in stack traces.
pub const DEFAULT_FILE: &str = "<main>";

/// Interpreter configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpreterOptions {
    /// File name used in stack frames when the program carries none
    pub file: String,
    /// Maximum nesting of user function calls
    pub max_call_depth: usize,
}

impl Default for InterpreterOptions {
    fn default() -> Self {
        InterpreterOptions {
            file: DEFAULT_FILE.to_string(),
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }
}

// ============================================================================
// Interpreter
// ============================================================================

/// A tree-walking interpreter with a persistent root environment.
pub struct Interpreter {
    root: Env,
    builtins: BuiltinTable,
    output: Output,
    options: InterpreterOptions,
    /// File of the program currently running
    file: String,
    /// Names of the user functions currently executing, outermost first
    call_stack: Vec<String>,
    modules: ModuleRegistry,
    loader: Option<Rc<dyn ModuleLoader>>,
}

impl Interpreter {
    pub fn new(options: InterpreterOptions) -> Self {
        Self::with_env(options, Env::new())
    }

    /// An interpreter whose root scope is `env`.
    pub fn with_env(options: InterpreterOptions, env: Env) -> Self {
        let file = options.file.clone();
        Interpreter {
            root: env,
            builtins: BuiltinTable::standard(),
            output: Output::Stdout,
            options,
            file,
            call_stack: Vec::new(),
            modules: ModuleRegistry::new(),
            loader: None,
        }
    }

    #[must_use]
    pub fn with_output(mut self, output: Output) -> Self {
        self.output = output;
        self
    }

    #[must_use]
    pub fn with_loader(mut self, loader: Rc<dyn ModuleLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    #[must_use]
    pub fn with_builtins(mut self, builtins: BuiltinTable) -> Self {
        self.builtins = builtins;
        self
    }

    /// Make a native function callable by name.
    pub fn register_native(&mut self, builtin: Builtin) {
        self.builtins.register(builtin);
    }

    pub fn env(&self) -> &Env {
        &self.root
    }

    pub fn output(&self) -> &Output {
        &self.output
    }

    pub fn options(&self) -> &InterpreterOptions {
        &self.options
    }

    pub fn modules(&self) -> &ModuleRegistry {
        &self.modules
    }

    /// Run a program to completion.
    ///
    /// The result is the value of the last statement, or the value of a
    /// top-level `return`.
    #[tracing::instrument(level = "debug", skip_all, fields(file = %program.file))]
    pub fn interpret(&mut self, program: &Program) -> Result<Value, Failure> {
        self.file = if program.file.is_empty() {
            self.options.file.clone()
        } else {
            program.file.clone()
        };
        self.call_stack.clear();

        let root = self.root.clone();
        let mut result = Value::Null;
        for stmt in &program.statements {
            match self.eval_stmt(stmt, &root) {
                Ok(val) => result = val,
                Err(Signal::Return(val)) => return Ok(val),
                Err(Signal::Break) => {
                    return Err(self.fatal(Error::BreakOutsideLoop, stmt.pos));
                }
                Err(Signal::Continue) => {
                    return Err(self.fatal(Error::ContinueOutsideLoop, stmt.pos));
                }
                Err(Signal::Exception(ex)) => return Err(Failure::Exception(*ex)),
                Err(Signal::Error(err)) => return Err(self.fatal(err, stmt.pos)),
            }
        }
        Ok(result)
    }

    // ========================================================================
    // Diagnostics
    // ========================================================================

    /// Name of the innermost executing function.
    fn current_function(&self) -> &str {
        self.call_stack
            .last()
            .map(String::as_str)
            .unwrap_or(MODULE_FUNCTION)
    }

    fn frame_at(&self, pos: Position) -> StackFrame {
        StackFrame::new(self.current_function(), &self.file, pos.line, pos.column)
    }

    /// Raise `ex` at `pos`, recording the raise site unless the exception
    /// already carries a trace.
    fn raise(&self, mut ex: Exception, pos: Position) -> Signal {
        if ex.stack_trace.is_empty() {
            ex.push_frame(self.frame_at(pos));
        }
        Signal::Exception(Box::new(ex))
    }

    fn fatal(&self, err: Error, pos: Position) -> Failure {
        let fatal = FatalError::from(err);
        if pos.line > 0 {
            Failure::Error(fatal.at(format!("{}:{}:{}", self.file, pos.line, pos.column)))
        } else {
            Failure::Error(fatal)
        }
    }

    /// Look up a name through the scope chain, then the builtins.
    fn resolve(&self, name: &str, env: &Env, pos: Position) -> Eval {
        if let Some(val) = env.get(name) {
            return Ok(val);
        }
        if let Some((_, builtin)) = self.builtins.lookup(name) {
            return Ok(Value::Builtin(builtin));
        }
        Err(self.raise(Exception::undefined_name(name), pos))
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new(InterpreterOptions::default())
    }
}

impl std::fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interpreter")
            .field("file", &self.file)
            .field("options", &self.options)
            .field("modules", &self.modules)
            .finish_non_exhaustive()
    }
}
