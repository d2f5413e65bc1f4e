// quill-vm - Bytecode compiler and virtual machine for the Quill scripting language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Collection and builtin-operation handlers: Array, Map, Hash, Index,
//! SetIndex, Len, Type, Print.

use quill_object::builtins::{join_display, length, type_of};
use quill_object::{Exception, Value, index};

use crate::opcode::Opcode;
use crate::vm::{Result, Vm, VmError};

impl Vm {
    /// Execute a collection opcode.
    pub(crate) fn execute_collections(&mut self, op: Opcode) -> Result<()> {
        match op {
            Opcode::Array => {
                let n = self.read_u16_operand()?;
                let items = self.stack.pop_n(n)?;
                self.stack.push(Value::array(items))?;
            }
            Opcode::Map => {
                let entries = self.pop_pairs()?;
                self.stack.push(Value::map(entries))?;
            }
            Opcode::Hash => {
                let entries = self.pop_pairs()?;
                let hash = Value::hash(entries).map_err(|key| {
                    Exception::type_error(format!("unusable as hash key: {}", key.type_name()))
                })?;
                self.stack.push(hash)?;
            }
            Opcode::Index => {
                let idx = self.stack.pop()?;
                let container = self.stack.pop()?;
                self.stack.push(index::get(&container, &idx)?)?;
            }
            Opcode::SetIndex => {
                let val = self.stack.pop()?;
                let idx = self.stack.pop()?;
                let container = self.stack.pop()?;
                index::set(&container, &idx, val.clone())?;
                self.stack.push(val)?;
            }
            Opcode::Len => {
                let val = self.stack.pop()?;
                self.stack.push(length(&val)?)?;
            }
            Opcode::Type => {
                let val = self.stack.pop()?;
                self.stack.push(type_of(&val))?;
            }
            Opcode::Print => {
                let n = self.read_u16_operand()?;
                let args = self.stack.pop_n(n)?;
                self.output.write_line(&join_display(&args));
                self.stack.push(Value::Null)?;
            }
            _ => {
                return Err(VmError::Internal(format!(
                    "execute_collections: unexpected opcode {:?}",
                    op
                ))
                .into());
            }
        }
        Ok(())
    }

    /// Pop `n` key/value pairs pushed key first.
    fn pop_pairs(&mut self) -> Result<Vec<(Value, Value)>> {
        let n = self.read_u16_operand()?;
        let flat = self.stack.pop_n(n * 2)?;
        let mut entries = Vec::with_capacity(n);
        let mut iter = flat.into_iter();
        while let (Some(key), Some(val)) = (iter.next(), iter.next()) {
            entries.push((key, val));
        }
        Ok(entries)
    }
}
