// quill-vm - Bytecode compiler and virtual machine for the Quill scripting language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Call frames for the VM.

use std::rc::Rc;

use quill_object::{CompiledFunction, Value};

/// A call frame on the VM's call stack.
#[derive(Debug, Clone)]
pub struct Frame {
    /// The code unit being executed.
    pub func: Rc<CompiledFunction>,

    /// Instruction pointer (byte offset into the unit).
    pub ip: usize,

    /// Local slots, arguments first.
    pub locals: Vec<Value>,

    /// Stack height to restore on return (the callee's slot).
    pub base: usize,
}

impl Frame {
    pub fn new(func: Rc<CompiledFunction>, locals: Vec<Value>, base: usize) -> Self {
        Self {
            func,
            ip: 0,
            locals,
            base,
        }
    }

    #[inline]
    pub fn instructions(&self) -> &[u8] {
        &self.func.instructions
    }

    /// Identity of the code unit, stable while the unit is alive.
    #[inline]
    pub fn unit_id(&self) -> usize {
        self.func.instructions.as_ptr() as usize
    }
}
