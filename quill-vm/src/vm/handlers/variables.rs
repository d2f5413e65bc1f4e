// quill-vm - Bytecode compiler and virtual machine for the Quill scripting language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Variable opcode handlers: SetGlobal, GetGlobal, SetLocal, GetLocal, GetBuiltin.

use quill_object::Value;

use crate::opcode::Opcode;
use crate::vm::{Result, Vm, VmError};

impl Vm {
    /// Execute a variable opcode.
    pub(crate) fn execute_variables(&mut self, op: Opcode) -> Result<()> {
        match op {
            Opcode::SetGlobal => {
                let idx = self.read_u16_operand()?;
                let val = self.stack.pop()?;
                if idx >= self.globals.len() {
                    self.globals.resize(idx + 1, Value::Null);
                }
                self.globals[idx] = val;
            }
            Opcode::GetGlobal => {
                let idx = self.read_u16_operand()?;
                let val = self.globals.get(idx).cloned().unwrap_or(Value::Null);
                self.stack.push(val)?;
            }
            Opcode::SetLocal => {
                let slot = self.read_u8_operand()?;
                let val = self.stack.pop()?;
                let locals = &mut self.frame_mut()?.locals;
                if slot >= locals.len() {
                    locals.resize(slot + 1, Value::Null);
                }
                locals[slot] = val;
            }
            Opcode::GetLocal => {
                let slot = self.read_u8_operand()?;
                let val = self
                    .frame_mut()?
                    .locals
                    .get(slot)
                    .cloned()
                    .unwrap_or(Value::Null);
                self.stack.push(val)?;
            }
            Opcode::GetBuiltin => {
                let idx = self.read_u8_operand()?;
                let builtin = self.builtins.get(idx).ok_or(VmError::BadBuiltin(idx))?;
                self.stack.push(Value::Builtin(builtin))?;
            }
            _ => {
                return Err(VmError::Internal(format!(
                    "execute_variables: unexpected opcode {:?}",
                    op
                ))
                .into());
            }
        }
        Ok(())
    }
}
