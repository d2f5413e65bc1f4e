// quill-vm - Bytecode compiler and virtual machine for the Quill scripting language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Compiled program container.

use std::fmt;

use quill_object::{DebugEntry, Value, debug};

use crate::opcode::disassemble;

/// Tag identifying Quill bytecode.
pub const BYTECODE_MAGIC: &str = "QLB1";

/// Version of the toolchain that produced a bytecode unit.
pub const BYTECODE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// A compiled program: main instructions, the shared constant pool and the
/// main unit's debug table. Function bodies live in the constant pool as
/// compiled function values carrying their own debug tables.
#[derive(Debug, Clone)]
pub struct Bytecode {
    pub magic: String,
    pub version: String,
    pub instructions: Vec<u8>,
    pub constants: Vec<Value>,
    pub debug: Vec<DebugEntry>,
}

impl Bytecode {
    pub fn new(instructions: Vec<u8>, constants: Vec<Value>, debug: Vec<DebugEntry>) -> Self {
        Bytecode {
            magic: BYTECODE_MAGIC.to_string(),
            version: BYTECODE_VERSION.to_string(),
            instructions,
            constants,
            debug,
        }
    }

    /// Source position of the instruction at `offset` in the main unit.
    pub fn lookup_debug(&self, offset: usize) -> Option<DebugEntry> {
        debug::lookup(&self.debug, offset)
    }
}

impl fmt::Display for Bytecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&disassemble(&self.instructions))
    }
}
