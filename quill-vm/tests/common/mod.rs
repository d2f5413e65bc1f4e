// quill-vm - Common test utilities
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Shared test helpers for Quill compiler and VM integration tests.
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
//! - [`compile`] - Compile statements, panicking on a compile error
//! - [`vm`] - A VM for statements, writing to a buffer
//! - [`run`] - Compile and run statements
//! - [`run_output`] - Run statements and capture what they printed
//! - [`raised`] - The exception kind and message of a failed run
//!
//! # Macros
//!
//! - [`assert_vm!`] - Assert that a program evaluates to a value
//! - [`assert_vm_raises!`] - Assert that a program raises an exception kind

#[allow(unused_imports)]
pub use quill_object::ast::build as b;
#[allow(unused_imports)]
pub use quill_object::ast::{Program, Stmt};
#[allow(unused_imports)]
pub use quill_object::{Failure, Output, Value};
#[allow(unused_imports)]
pub use quill_vm::{Bytecode, CompileError, Compiler, Opcode, Vm, VmOptions, disassemble};

/// Compile statements as a program.
pub fn compile(stmts: Vec<Stmt>) -> Bytecode {
    match Compiler::new().compile(&b::program(stmts)) {
        Ok(bytecode) => bytecode,
        Err(err) => panic!("compile error: {}", err),
    }
}

/// A VM for statements, with output going to a buffer.
#[allow(dead_code)]
pub fn vm(stmts: Vec<Stmt>) -> Vm {
    Vm::new(compile(stmts)).with_output(Output::buffer())
}

/// Compile and run statements.
#[allow(dead_code)]
pub fn run(stmts: Vec<Stmt>) -> Result<Value, Failure> {
    vm(stmts).run()
}

/// Run statements and return the result alongside the printed output.
#[allow(dead_code)]
pub fn run_output(stmts: Vec<Stmt>) -> (Result<Value, Failure>, String) {
    let mut machine = vm(stmts);
    let result = machine.run();
    (result, machine.output().contents())
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
macro_rules! assert_vm {
    ($stmts:expr, $expected:expr) => {
        assert_eq!(
            run($stmts).map_err(|f| f.render()),
            Ok(Value::from($expected))
        );
    };
}

/// Assert that a program raises the given exception kind.
#[macro_export]
macro_rules! assert_vm_raises {
    ($stmts:expr, $kind:expr) => {
        match run($stmts) {
            Err(Failure::Exception(ex)) => assert_eq!(ex.kind, $kind, "{}", ex),
            other => panic!("expected {}, got {:?}", $kind, other),
        }
    };
}
