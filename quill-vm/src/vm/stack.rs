// quill-vm - Bytecode compiler and virtual machine for the Quill scripting language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Operand stack for the VM.

use quill_object::Value;

use super::VmError;

/// Maximum number of values on the operand stack.
pub const STACK_SIZE: usize = 2048;

type Result<T> = std::result::Result<T, VmError>;

/// The VM's operand stack.
#[derive(Debug, Default)]
pub struct ValueStack {
    values: Vec<Value>,
}

impl ValueStack {
    pub fn new() -> Self {
        Self {
            values: Vec::with_capacity(256),
        }
    }

    /// Push a value, failing once the stack holds `STACK_SIZE` values.
    #[inline]
    pub fn push(&mut self, value: Value) -> Result<()> {
        if self.values.len() >= STACK_SIZE {
            return Err(VmError::StackOverflow);
        }
        self.values.push(value);
        Ok(())
    }

    #[inline]
    pub fn pop(&mut self) -> Result<Value> {
        self.values.pop().ok_or(VmError::StackUnderflow)
    }

    /// Value at an absolute index.
    #[inline]
    pub fn get(&self, index: usize) -> Result<&Value> {
        self.values.get(index).ok_or(VmError::StackUnderflow)
    }

    /// The top `n` values, oldest first.
    #[inline]
    pub fn top(&self, n: usize) -> Result<&[Value]> {
        let start = self
            .values
            .len()
            .checked_sub(n)
            .ok_or(VmError::StackUnderflow)?;
        Ok(&self.values[start..])
    }

    /// Remove and return the top `n` values, oldest first.
    pub fn pop_n(&mut self, n: usize) -> Result<Vec<Value>> {
        let start = self
            .values
            .len()
            .checked_sub(n)
            .ok_or(VmError::StackUnderflow)?;
        Ok(self.values.split_off(start))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn truncate(&mut self, size: usize) {
        self.values.truncate(size);
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}
