// quill-object - String builtins
// Copyright (c) 2025 Tom Waddington. MIT licensed.

use super::{expect_args, wrong_type};
use crate::exception::Exception;
use crate::output::Output;
use crate::value::Value;

fn map_str(name: &str, args: &[Value], f: impl Fn(&str) -> String) -> Result<Value, Exception> {
    expect_args(name, args, 1)?;
    match &args[0] {
        Value::Str(s) => Ok(Value::from(f(s))),
        other => Err(wrong_type(name, "a string", other)),
    }
}

pub(super) fn upper(_: &Output, args: &[Value]) -> Result<Value, Exception> {
    map_str("upper", args, str::to_uppercase)
}

pub(super) fn lower(_: &Output, args: &[Value]) -> Result<Value, Exception> {
    map_str("lower", args, str::to_lowercase)
}

pub(super) fn trim(_: &Output, args: &[Value]) -> Result<Value, Exception> {
    map_str("trim", args, |s| s.trim().to_string())
}
