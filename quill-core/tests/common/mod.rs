// quill-core - Common test utilities
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Shared test helpers for Quill interpreter integration tests.
//!
//! # Usage
//!
//! In your test file, add:
//! ```ignore
//! mod common;
//! use common::*;
//! ```
//!
//! # Available Helpers
//!
//! - [`interpreter`] - A fresh interpreter writing to a buffer
//! - [`run`] - Run statements in a fresh interpreter
//! - [`run_output`] - Run statements and capture what they printed
//! - [`raised`] - The exception kind and message of a failed run
//!
//! # Macros
//!
//! - [`assert_run!`] - Assert that a program evaluates to a value
//! - [`assert_raises!`] - Assert that a program raises an exception kind

#[allow(unused_imports)]
pub use quill_core::{Interpreter, InterpreterOptions, MemoryLoader};
#[allow(unused_imports)]
pub use quill_object::ast::build as b;
#[allow(unused_imports)]
pub use quill_object::ast::{Program, Stmt};
#[allow(unused_imports)]
pub use quill_object::{Failure, Output, Value};

/// A default interpreter whose output goes to a buffer.
#[must_use]
pub fn interpreter() -> Interpreter {
    Interpreter::default().with_output(Output::buffer())
}

/// Run statements as a program in a fresh interpreter.
pub fn run(stmts: Vec<Stmt>) -> Result<Value, Failure> {
    interpreter().interpret(&b::program(stmts))
}

/// Run statements and return the result alongside the printed output.
#[allow(dead_code)]
pub fn run_output(stmts: Vec<Stmt>) -> (Result<Value, Failure>, String) {
    let mut interp = interpreter();
    let result = interp.interpret(&b::program(stmts));
    (result, interp.output().contents())
}

/// Kind and message of the exception a run ended with.
#[allow(dead_code)]
pub fn raised(result: Result<Value, Failure>) -> Option<(String, String)> {
    match result {
        Err(Failure::Exception(ex)) => Some((ex.kind, ex.message)),
        _ => None,
    }
}

/// Assert that a program evaluates to the expected value.
#[macro_export]
macro_rules! assert_run {
    ($stmts:expr, $expected:expr) => {
        assert_eq!(
            run($stmts).map_err(|f| f.render()),
            Ok(Value::from($expected))
        );
    };
}

/// Assert that a program raises the given exception kind.
#[macro_export]
macro_rules! assert_raises {
    ($stmts:expr, $kind:expr) => {
        match run($stmts) {
            Err(Failure::Exception(ex)) => assert_eq!(ex.kind, $kind, "{}", ex),
            other => panic!("expected {}, got {:?}", $kind, other),
        }
    };
}
