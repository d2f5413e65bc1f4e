// quill-object - Arithmetic and comparison operators
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Operator semantics shared by the interpreter and the VM.
//!
//! Both backends route every arithmetic and comparison operation through
//! [`binary`] so results and error messages cannot drift apart.

use std::cmp::Ordering;
use std::fmt;

use crate::exception::Exception;
use crate::value::Value;

/// Binary operators with value semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::LtEq => "<=",
            BinaryOp::GtEq => ">=",
        }
    }

    pub fn is_comparison(self) -> bool {
        !matches!(
            self,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod
        )
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

fn unsupported(op: BinaryOp, left: &Value, right: &Value) -> Exception {
    Exception::type_error(format!(
        "unsupported operand types: {} {} {}",
        left.type_name(),
        op,
        right.type_name()
    ))
}

// ============================================================================
// Binary operators
// ============================================================================

/// Apply a binary operator.
pub fn binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, Exception> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => int_op(op, *a, *b),
        (Value::Int(a), Value::Float(b)) => float_op(op, *a as f64, *b),
        (Value::Float(a), Value::Int(b)) => float_op(op, *a, *b as f64),
        (Value::Float(a), Value::Float(b)) => float_op(op, *a, *b),
        (Value::Str(a), Value::Str(b)) => match op {
            BinaryOp::Add => {
                let mut s = String::with_capacity(a.len() + b.len());
                s.push_str(a);
                s.push_str(b);
                Ok(Value::from(s))
            }
            _ if op.is_comparison() => Ok(Value::Bool(ordering_holds(op, a.cmp(b)))),
            _ => Err(unsupported(op, left, right)),
        },
        (Value::Bool(a), Value::Bool(b)) => match op {
            BinaryOp::Eq => Ok(Value::Bool(a == b)),
            BinaryOp::NotEq => Ok(Value::Bool(a != b)),
            _ => Err(unsupported(op, left, right)),
        },
        (Value::Null, _) | (_, Value::Null) => match op {
            BinaryOp::Eq => Ok(Value::Bool(left.is_null() && right.is_null())),
            BinaryOp::NotEq => Ok(Value::Bool(!(left.is_null() && right.is_null()))),
            _ => Err(Exception::type_error(
                "null can only be compared with == or !=",
            )),
        },
        _ => match op {
            BinaryOp::Eq => Ok(Value::Bool(left.equals(right))),
            BinaryOp::NotEq => Ok(Value::Bool(!left.equals(right))),
            _ => Err(unsupported(op, left, right)),
        },
    }
}

/// Integer arithmetic with wrapping overflow.
#[inline]
pub fn int_op(op: BinaryOp, a: i64, b: i64) -> Result<Value, Exception> {
    Ok(match op {
        BinaryOp::Add => Value::Int(a.wrapping_add(b)),
        BinaryOp::Sub => Value::Int(a.wrapping_sub(b)),
        BinaryOp::Mul => Value::Int(a.wrapping_mul(b)),
        BinaryOp::Div => {
            if b == 0 {
                return Err(Exception::zero_division("division by zero"));
            }
            Value::Int(a.wrapping_div(b))
        }
        BinaryOp::Mod => {
            if b == 0 {
                return Err(Exception::zero_division("modulo by zero"));
            }
            Value::Int(a.wrapping_rem(b))
        }
        _ => Value::Bool(ordering_holds(op, a.cmp(&b))),
    })
}

#[inline]
pub fn float_op(op: BinaryOp, a: f64, b: f64) -> Result<Value, Exception> {
    Ok(match op {
        BinaryOp::Add => Value::Float(a + b),
        BinaryOp::Sub => Value::Float(a - b),
        BinaryOp::Mul => Value::Float(a * b),
        BinaryOp::Div => {
            if b == 0.0 {
                return Err(Exception::zero_division("division by zero"));
            }
            Value::Float(a / b)
        }
        BinaryOp::Mod => {
            if b == 0.0 {
                return Err(Exception::zero_division("modulo by zero"));
            }
            Value::Float(a % b)
        }
        BinaryOp::Eq => Value::Bool(a == b),
        BinaryOp::NotEq => Value::Bool(a != b),
        BinaryOp::Lt => Value::Bool(a < b),
        BinaryOp::Gt => Value::Bool(a > b),
        BinaryOp::LtEq => Value::Bool(a <= b),
        BinaryOp::GtEq => Value::Bool(a >= b),
    })
}

fn ordering_holds(op: BinaryOp, ord: Ordering) -> bool {
    match op {
        BinaryOp::Eq => ord == Ordering::Equal,
        BinaryOp::NotEq => ord != Ordering::Equal,
        BinaryOp::Lt => ord == Ordering::Less,
        BinaryOp::Gt => ord == Ordering::Greater,
        BinaryOp::LtEq => ord != Ordering::Greater,
        BinaryOp::GtEq => ord != Ordering::Less,
        _ => false,
    }
}

// ============================================================================
// Unary operators
// ============================================================================

/// Prefix `-`.
pub fn negate(operand: &Value) -> Result<Value, Exception> {
    match operand {
        Value::Int(n) => Ok(Value::Int(n.wrapping_neg())),
        Value::Float(n) => Ok(Value::Float(-n)),
        other => Err(Exception::type_error(format!(
            "unsupported operand type for -: {}",
            other.type_name()
        ))),
    }
}

/// Prefix `!`.
pub fn not(operand: &Value) -> Value {
    Value::Bool(!operand.is_truthy())
}
