// quill-vm - Bytecode compiler and virtual machine for the Quill scripting language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Bytecode compiler and stack-based virtual machine for Quill.
//!
//! This crate provides an alternative execution model to the tree-walking
//! interpreter in `quill-core`. Programs are first compiled to bytecode,
//! then executed by a stack-based VM that shares its operators, builtins
//! and failure reporting with the interpreter.

pub mod bytecode;
pub mod compiler;
pub mod hotpath;
pub mod opcode;
pub mod vm;

pub use bytecode::{BYTECODE_MAGIC, BYTECODE_VERSION, Bytecode};
pub use compiler::{CompileError, Compiler, compile};
pub use hotpath::{HotPath, HotPathStats, HotPathTracker};
pub use opcode::{Definition, Opcode, disassemble, lookup, make, read_operands};
pub use vm::{STACK_SIZE, Trap, Vm, VmError, VmOptions};
