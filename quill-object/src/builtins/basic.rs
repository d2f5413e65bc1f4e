// quill-object - Core builtins
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Printing, conversion and introspection builtins.

use std::io::BufRead;

use super::{expect_args, wrong_type};
use crate::exception::Exception;
use crate::output::Output;
use crate::value::Value;

/// Length of a string (in bytes), array, map or hash.
pub fn length(value: &Value) -> Result<Value, Exception> {
    let n = match value {
        Value::Str(s) => s.len(),
        Value::Array(items) => items.borrow().len(),
        Value::Map(map) => map.borrow().len(),
        Value::Hash(hash) => hash.borrow().len(),
        other => {
            return Err(Exception::type_error(format!(
                "len: unsupported type {}",
                other.type_name()
            )));
        }
    };
    Ok(Value::Int(n as i64))
}

/// The type tag of a value, as a string value.
pub fn type_of(value: &Value) -> Value {
    Value::string(value.type_name())
}

/// Space-joined displays of `args`.
pub fn join_display(args: &[Value]) -> String {
    args.iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

pub(super) fn print(out: &Output, args: &[Value]) -> Result<Value, Exception> {
    out.write_line(&join_display(args));
    Ok(Value::Null)
}

pub(super) fn len(_: &Output, args: &[Value]) -> Result<Value, Exception> {
    expect_args("len", args, 1)?;
    length(&args[0])
}

pub(super) fn str(_: &Output, args: &[Value]) -> Result<Value, Exception> {
    expect_args("str", args, 1)?;
    match &args[0] {
        s @ Value::Str(_) => Ok(s.clone()),
        other => Ok(Value::from(other.to_string())),
    }
}

pub(super) fn int(_: &Output, args: &[Value]) -> Result<Value, Exception> {
    expect_args("int", args, 1)?;
    match &args[0] {
        Value::Int(n) => Ok(Value::Int(*n)),
        Value::Float(f) => Ok(Value::Int(*f as i64)),
        Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
        Value::Str(s) => s
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| Exception::value_error(format!("int: cannot convert {:?}", &**s))),
        other => Err(wrong_type("int", "a number or string", other)),
    }
}

pub(super) fn float(_: &Output, args: &[Value]) -> Result<Value, Exception> {
    expect_args("float", args, 1)?;
    match &args[0] {
        Value::Float(f) => Ok(Value::Float(*f)),
        Value::Int(n) => Ok(Value::Float(*n as f64)),
        Value::Str(s) => s
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| Exception::value_error(format!("float: cannot convert {:?}", &**s))),
        other => Err(wrong_type("float", "a number or string", other)),
    }
}

pub(super) fn bool(_: &Output, args: &[Value]) -> Result<Value, Exception> {
    expect_args("bool", args, 1)?;
    Ok(Value::Bool(args[0].is_truthy()))
}

pub(super) fn r#type(_: &Output, args: &[Value]) -> Result<Value, Exception> {
    expect_args("type", args, 1)?;
    Ok(type_of(&args[0]))
}

/// Read one line from stdin, after printing an optional prompt.
pub(super) fn input(out: &Output, args: &[Value]) -> Result<Value, Exception> {
    if args.len() > 1 {
        return Err(Exception::type_error(format!(
            "input: expected 0 or 1 arguments, got {}",
            args.len()
        )));
    }
    if let Some(prompt) = args.first() {
        out.write(&prompt.to_string());
    }
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| Exception::runtime_error(format!("input: {}", e)))?;
    Ok(Value::from(line.trim_end_matches(['\r', '\n']).to_string()))
}
