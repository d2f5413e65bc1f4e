// quill-object - Collection builtins
// Copyright (c) 2025 Tom Waddington. MIT licensed.

use std::cmp::Ordering;

use super::{compare, expect_args, wrong_type};
use crate::exception::Exception;
use crate::output::Output;
use crate::value::Value;

pub(super) fn reverse(_: &Output, args: &[Value]) -> Result<Value, Exception> {
    expect_args("reverse", args, 1)?;
    match &args[0] {
        Value::Str(s) => Ok(Value::from(s.chars().rev().collect::<String>())),
        Value::Array(items) => Ok(Value::array(items.borrow().iter().rev().cloned().collect())),
        other => Err(wrong_type("reverse", "a string or array", other)),
    }
}

/// Sort `items`, failing on the first pair that has no ordering.
fn sort_values(name: &str, items: &mut [Value]) -> Result<(), Exception> {
    let mut failure = None;
    items.sort_by(|a, b| match compare(a, b) {
        Some(ord) => ord,
        None => {
            failure.get_or_insert_with(|| {
                Exception::type_error(format!(
                    "{}: cannot compare {} with {}",
                    name,
                    a.type_name(),
                    b.type_name()
                ))
            });
            Ordering::Equal
        }
    });
    match failure {
        Some(ex) => Err(ex),
        None => Ok(()),
    }
}

/// Sorted copy of an array.
pub(super) fn sorted(_: &Output, args: &[Value]) -> Result<Value, Exception> {
    expect_args("sorted", args, 1)?;
    let Value::Array(items) = &args[0] else {
        return Err(wrong_type("sorted", "an array", &args[0]));
    };
    let mut copy = items.borrow().clone();
    sort_values("sorted", &mut copy)?;
    Ok(Value::array(copy))
}

/// Sort an array in place and return it.
pub(super) fn sort(_: &Output, args: &[Value]) -> Result<Value, Exception> {
    expect_args("sort", args, 1)?;
    let Value::Array(items) = &args[0] else {
        return Err(wrong_type("sort", "an array", &args[0]));
    };
    sort_values("sort", &mut items.borrow_mut())?;
    Ok(args[0].clone())
}

/// New array with the extra values appended.
pub(super) fn append(_: &Output, args: &[Value]) -> Result<Value, Exception> {
    let Some((Value::Array(items), extra)) = args.split_first() else {
        return Err(Exception::type_error(
            "append: expected an array and at least one value",
        ));
    };
    if extra.is_empty() {
        return Err(Exception::type_error(
            "append: expected an array and at least one value",
        ));
    }
    let mut out = items.borrow().clone();
    out.extend_from_slice(extra);
    Ok(Value::array(out))
}

pub(super) fn contains(_: &Output, args: &[Value]) -> Result<Value, Exception> {
    expect_args("contains", args, 2)?;
    let needle = &args[1];
    let found = match &args[0] {
        Value::Array(items) => items.borrow().iter().any(|v| v.structural_eq(needle)),
        Value::Str(s) => match needle {
            Value::Str(sub) => s.contains(&**sub),
            other => return Err(wrong_type("contains", "a string", other)),
        },
        Value::Map(map) => map.borrow().contains_key(needle),
        Value::Hash(hash) => matches!(hash.borrow().get(needle), Ok(Some(_))),
        other => return Err(wrong_type("contains", "an array, string or map", other)),
    };
    Ok(Value::Bool(found))
}

fn entries(name: &str, value: &Value) -> Result<Vec<(Value, Value)>, Exception> {
    match value {
        Value::Map(map) => Ok(map
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()),
        Value::Hash(hash) => Ok(hash
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()),
        other => Err(wrong_type(name, "a map", other)),
    }
}

pub(super) fn keys(_: &Output, args: &[Value]) -> Result<Value, Exception> {
    expect_args("keys", args, 1)?;
    let pairs = entries("keys", &args[0])?;
    Ok(Value::array(pairs.into_iter().map(|(k, _)| k).collect()))
}

pub(super) fn values(_: &Output, args: &[Value]) -> Result<Value, Exception> {
    expect_args("values", args, 1)?;
    let pairs = entries("values", &args[0])?;
    Ok(Value::array(pairs.into_iter().map(|(_, v)| v).collect()))
}

/// `[[key, value], ...]` in insertion order.
pub(super) fn items(_: &Output, args: &[Value]) -> Result<Value, Exception> {
    expect_args("items", args, 1)?;
    let pairs = entries("items", &args[0])?;
    Ok(Value::array(
        pairs
            .into_iter()
            .map(|(k, v)| Value::array(vec![k, v]))
            .collect(),
    ))
}
