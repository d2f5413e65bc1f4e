// quill-core - Tree-walking interpreter for the Quill scripting language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! # quill-core
//!
//! Tree-walking interpreter for the Quill scripting language.
//! Evaluates a [`Program`](quill_object::ast::Program) directly, with the
//! full language: classes, exceptions, context managers and imports.

pub mod error;
pub mod interpreter;
pub mod module;
pub mod signal;

pub use error::{Error, LoadError, Result};
pub use interpreter::{DEFAULT_FILE, DEFAULT_MAX_CALL_DEPTH, Interpreter, InterpreterOptions};
pub use module::{MemoryLoader, ModuleLoader, ModuleRegistry};
pub use signal::{Eval, Signal};
