// quill-vm - Bytecode compiler and virtual machine for the Quill scripting language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Control flow handlers: Jump, JumpNotTruthy, Call, ReturnValue, Return, Throw.

use smallvec::SmallVec;

use quill_object::builtins::thrown;
use quill_object::{Exception, Value};

use crate::opcode::Opcode;
use crate::vm::frame::Frame;
use crate::vm::{Result, Vm, VmError};

/// Result of executing a control flow instruction.
#[derive(Debug, Clone)]
pub enum ControlFlow {
    /// Continue execution.
    Continue,
    /// The main program returned with the given value.
    Return(Value),
}

impl Vm {
    /// Execute a control flow opcode.
    pub(crate) fn execute_control(&mut self, op: Opcode) -> Result<ControlFlow> {
        match op {
            Opcode::Jump => {
                let target = self.read_u16_operand()?;
                self.jump(target)?;
            }
            Opcode::JumpNotTruthy => {
                let target = self.read_u16_operand()?;
                let cond = self.stack.pop()?;
                if !cond.is_truthy() {
                    self.jump(target)?;
                }
            }
            Opcode::Call => {
                let argc = self.read_u8_operand()?;
                self.call(argc)?;
            }
            Opcode::ReturnValue => {
                let result = self.stack.pop()?;
                return self.return_from_frame(result);
            }
            Opcode::Return => return self.return_from_frame(Value::Null),
            Opcode::Throw => {
                let val = self.stack.pop()?;
                return Err(thrown(&val).into());
            }
            _ => {
                return Err(VmError::Internal(format!(
                    "execute_control: unexpected opcode {:?}",
                    op
                ))
                .into());
            }
        }
        Ok(ControlFlow::Continue)
    }

    /// Call the value sitting below the top `argc` stack slots.
    fn call(&mut self, argc: usize) -> Result<()> {
        let callee_slot = self
            .stack
            .len()
            .checked_sub(argc + 1)
            .ok_or(VmError::StackUnderflow)?;
        let callee = self.stack.get(callee_slot)?.clone();

        match callee {
            Value::CompiledFunction(func) => {
                if argc != func.num_params {
                    return Err(Exception::type_error(format!(
                        "wrong number of arguments: expected {}, got {}",
                        func.num_params, argc
                    ))
                    .into());
                }
                if self.frames.len() >= self.options.max_frames {
                    return Err(Exception::runtime_error("maximum recursion depth exceeded").into());
                }
                let mut locals = self.stack.pop_n(argc)?;
                if locals.len() < func.num_locals {
                    locals.resize(func.num_locals, Value::Null);
                }
                self.stack.truncate(callee_slot);
                self.frames.push(Frame::new(func, locals, callee_slot));
            }
            Value::Builtin(builtin) => {
                let args: SmallVec<[Value; 4]> = self.stack.top(argc)?.iter().cloned().collect();
                self.stack.truncate(callee_slot);
                let result = builtin.call(&self.output, &args)?;
                self.stack.push(result)?;
            }
            other => {
                return Err(Exception::type_error(format!(
                    "not a function: {}",
                    other.type_name()
                ))
                .into());
            }
        }
        Ok(())
    }

    /// Pop the current frame and hand `result` to the caller.
    pub(crate) fn return_from_frame(&mut self, result: Value) -> Result<ControlFlow> {
        let frame = self
            .frames
            .pop()
            .ok_or_else(|| VmError::Internal("return with no active frame".into()))?;
        if self.frames.is_empty() {
            return Ok(ControlFlow::Return(result));
        }
        self.stack.truncate(frame.base);
        self.stack.push(result)?;
        Ok(ControlFlow::Continue)
    }
}
