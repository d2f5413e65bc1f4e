// quill-vm - Bytecode compiler and virtual machine for the Quill scripting language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Runtime errors for the VM.

use quill_object::Exception;

/// A fault the running program cannot catch.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VmError {
    #[error("stack overflow")]
    StackOverflow,
    #[error("stack underflow")]
    StackUnderflow,
    #[error("invalid bytecode: magic mismatch")]
    MagicMismatch,
    #[error("unknown opcode {0}")]
    UnknownOpcode(u8),
    #[error("constant index out of bounds: {0}")]
    BadConstant(usize),
    #[error("invalid bytecode: truncated operand at offset {offset}")]
    TruncatedOperand { offset: usize },
    #[error("builtin index out of bounds: {0}")]
    BadBuiltin(usize),
    #[error("internal error: {0}")]
    Internal(String),
}

/// Why an instruction stopped the VM.
#[derive(Debug, Clone)]
pub enum Trap {
    /// A program-level exception, reported with a stack trace.
    Exception(Exception),
    Fatal(VmError),
}

impl From<Exception> for Trap {
    fn from(ex: Exception) -> Self {
        Trap::Exception(ex)
    }
}

impl From<VmError> for Trap {
    fn from(err: VmError) -> Self {
        Trap::Fatal(err)
    }
}

/// Result type for instruction execution.
pub type Result<T> = std::result::Result<T, Trap>;
