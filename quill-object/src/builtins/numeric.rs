// quill-object - Numeric builtins
// Copyright (c) 2025 Tom Waddington. MIT licensed.

use std::cmp::Ordering;

use super::{compare_or_raise, expect_args, wrong_type};
use crate::exception::Exception;
use crate::output::Output;
use crate::value::Value;

fn as_int(name: &str, value: &Value) -> Result<i64, Exception> {
    match value {
        Value::Int(n) => Ok(*n),
        other => Err(wrong_type(name, "an integer", other)),
    }
}

fn as_float(name: &str, value: &Value) -> Result<f64, Exception> {
    match value {
        Value::Int(n) => Ok(*n as f64),
        Value::Float(f) => Ok(*f),
        other => Err(wrong_type(name, "a number", other)),
    }
}

/// `range(stop)`, `range(start, stop)` or `range(start, stop, step)`.
pub(super) fn range(_: &Output, args: &[Value]) -> Result<Value, Exception> {
    let (start, stop, step) = match args {
        [stop] => (0, as_int("range", stop)?, 1),
        [start, stop] => (as_int("range", start)?, as_int("range", stop)?, 1),
        [start, stop, step] => (
            as_int("range", start)?,
            as_int("range", stop)?,
            as_int("range", step)?,
        ),
        _ => {
            return Err(Exception::type_error(format!(
                "range: expected 1-3 arguments, got {}",
                args.len()
            )));
        }
    };
    if step == 0 {
        return Err(Exception::value_error("range: step cannot be 0"));
    }

    let mut items = Vec::new();
    let mut i = start;
    while (step > 0 && i < stop) || (step < 0 && i > stop) {
        items.push(Value::Int(i));
        match i.checked_add(step) {
            Some(next) => i = next,
            None => break,
        }
    }
    Ok(Value::array(items))
}

pub(super) fn abs(_: &Output, args: &[Value]) -> Result<Value, Exception> {
    expect_args("abs", args, 1)?;
    match &args[0] {
        Value::Int(n) => Ok(Value::Int(n.wrapping_abs())),
        Value::Float(f) => Ok(Value::Float(f.abs())),
        other => Err(wrong_type("abs", "a number", other)),
    }
}

fn extreme(name: &str, args: &[Value], keep: Ordering) -> Result<Value, Exception> {
    let Some((first, rest)) = args.split_first() else {
        return Err(Exception::type_error(format!(
            "{}: expected at least 1 argument",
            name
        )));
    };
    let mut best = first;
    for arg in rest {
        if compare_or_raise(name, arg, best)? == keep {
            best = arg;
        }
    }
    Ok(best.clone())
}

pub(super) fn max(_: &Output, args: &[Value]) -> Result<Value, Exception> {
    extreme("max", args, Ordering::Greater)
}

pub(super) fn min(_: &Output, args: &[Value]) -> Result<Value, Exception> {
    extreme("min", args, Ordering::Less)
}

/// Sum of an array of numbers; integer unless a float is present.
pub(super) fn sum(_: &Output, args: &[Value]) -> Result<Value, Exception> {
    expect_args("sum", args, 1)?;
    let Value::Array(items) = &args[0] else {
        return Err(wrong_type("sum", "an array", &args[0]));
    };

    let mut int_sum: i64 = 0;
    let mut float_sum: Option<f64> = None;
    for item in items.borrow().iter() {
        match (item, float_sum.as_mut()) {
            (Value::Int(n), None) => int_sum = int_sum.wrapping_add(*n),
            (Value::Int(n), Some(acc)) => *acc += *n as f64,
            (Value::Float(f), None) => float_sum = Some(int_sum as f64 + f),
            (Value::Float(f), Some(acc)) => *acc += f,
            _ => {
                return Err(Exception::type_error("sum: all elements must be numbers"));
            }
        }
    }
    Ok(match float_sum {
        Some(f) => Value::Float(f),
        None => Value::Int(int_sum),
    })
}

/// Integer power for a non-negative integer exponent, float otherwise.
pub(super) fn pow(_: &Output, args: &[Value]) -> Result<Value, Exception> {
    expect_args("pow", args, 2)?;
    match (&args[0], &args[1]) {
        (Value::Int(base), Value::Int(exp)) if *exp >= 0 => {
            let mut result: i64 = 1;
            let mut b = *base;
            let mut e = *exp;
            while e > 0 {
                if e & 1 == 1 {
                    result = result.wrapping_mul(b);
                }
                b = b.wrapping_mul(b);
                e >>= 1;
            }
            Ok(Value::Int(result))
        }
        (base, exp) => Ok(Value::Float(
            as_float("pow", base)?.powf(as_float("pow", exp)?),
        )),
    }
}

/// `clamp(value, lo, hi)`
pub(super) fn clamp(_: &Output, args: &[Value]) -> Result<Value, Exception> {
    expect_args("clamp", args, 3)?;
    let (val, lo, hi) = (&args[0], &args[1], &args[2]);
    for v in [val, lo, hi] {
        as_float("clamp", v)?;
    }
    if compare_or_raise("clamp", val, lo)? == Ordering::Less {
        return Ok(lo.clone());
    }
    if compare_or_raise("clamp", val, hi)? == Ordering::Greater {
        return Ok(hi.clone());
    }
    Ok(val.clone())
}
