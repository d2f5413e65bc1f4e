// quill-vm - Bytecode compiler and virtual machine for the Quill scripting language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Arithmetic and comparison handlers: Add through LessEqual, Minus, Bang.

use quill_object::ops::{self, BinaryOp};
use quill_object::Value;

use crate::opcode::Opcode;
use crate::vm::{Result, Vm, VmError};

/// The operator an arithmetic or comparison opcode applies.
pub fn binary_op(op: Opcode) -> Option<BinaryOp> {
    Some(match op {
        Opcode::Add => BinaryOp::Add,
        Opcode::Sub => BinaryOp::Sub,
        Opcode::Mul => BinaryOp::Mul,
        Opcode::Div => BinaryOp::Div,
        Opcode::Mod => BinaryOp::Mod,
        Opcode::Equal => BinaryOp::Eq,
        Opcode::NotEqual => BinaryOp::NotEq,
        Opcode::GreaterThan => BinaryOp::Gt,
        Opcode::LessThan => BinaryOp::Lt,
        Opcode::GreaterEqual => BinaryOp::GtEq,
        Opcode::LessEqual => BinaryOp::LtEq,
        _ => return None,
    })
}

impl Vm {
    /// Execute an arithmetic or comparison opcode.
    pub(crate) fn execute_arithmetic(&mut self, op: Opcode) -> Result<()> {
        match op {
            Opcode::Minus => {
                let operand = self.stack.pop()?;
                self.stack.push(ops::negate(&operand)?)?;
            }
            Opcode::Bang => {
                let operand = self.stack.pop()?;
                self.stack.push(ops::not(&operand))?;
            }
            _ => {
                let bin = binary_op(op).ok_or_else(|| {
                    VmError::Internal(format!("execute_arithmetic: unexpected opcode {:?}", op))
                })?;
                self.binary(bin)?;
            }
        }
        Ok(())
    }

    fn binary(&mut self, op: BinaryOp) -> Result<()> {
        let right = self.stack.pop()?;
        let left = self.stack.pop()?;
        let result = match (&left, &right) {
            (Value::Int(a), Value::Int(b)) => ops::int_op(op, *a, *b)?,
            (Value::Float(a), Value::Float(b)) => ops::float_op(op, *a, *b)?,
            _ => ops::binary(op, &left, &right)?,
        };
        self.stack.push(result)?;
        Ok(())
    }
}
