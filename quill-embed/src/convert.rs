// quill-embed - Type conversion traits
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Conversion between Rust and Quill values.
//!
//! | Rust Type | Quill Type |
//! |-----------|------------|
//! | `()` | `NULL` |
//! | `bool` | `BOOLEAN` |
//! | `i32`, `i64`, `usize` | `INTEGER` |
//! | `f64` | `FLOAT` |
//! | `String`, `&str` | `STRING` |
//! | `Vec<T>` | `ARRAY` |
//! | `Option<T>` | `T` or `NULL` |
//!
//! Failed conversions are `TypeError` exceptions, so native functions can
//! return them with `?`.

use quill_object::{Exception, Value};

/// Convert a Rust type into a [`Value`].
pub trait IntoValue {
    fn into_value(self) -> Value;
}

/// Convert a [`Value`] into a Rust type.
pub trait FromValue: Sized {
    fn from_value(val: &Value) -> Result<Self, Exception>;
}

fn mismatch(expected: &str, val: &Value) -> Exception {
    Exception::type_error(format!("expected {}, got {}", expected, val.type_name()))
}

// ============================================================================
// IntoValue
// ============================================================================

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl IntoValue for () {
    fn into_value(self) -> Value {
        Value::Null
    }
}

impl IntoValue for bool {
    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

impl IntoValue for i64 {
    fn into_value(self) -> Value {
        Value::Int(self)
    }
}

impl IntoValue for i32 {
    fn into_value(self) -> Value {
        Value::Int(self as i64)
    }
}

impl IntoValue for usize {
    fn into_value(self) -> Value {
        // Saturate on the (theoretical) platforms where usize exceeds i64
        Value::Int(i64::try_from(self).unwrap_or(i64::MAX))
    }
}

impl IntoValue for f64 {
    fn into_value(self) -> Value {
        Value::Float(self)
    }
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::string(self)
    }
}

impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::string(self)
    }
}

impl<T: IntoValue> IntoValue for Vec<T> {
    fn into_value(self) -> Value {
        Value::array(self.into_iter().map(IntoValue::into_value).collect())
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> Value {
        match self {
            Some(v) => v.into_value(),
            None => Value::Null,
        }
    }
}

// ============================================================================
// FromValue
// ============================================================================

impl FromValue for Value {
    fn from_value(val: &Value) -> Result<Self, Exception> {
        Ok(val.clone())
    }
}

impl FromValue for () {
    fn from_value(val: &Value) -> Result<Self, Exception> {
        match val {
            Value::Null => Ok(()),
            other => Err(mismatch("NULL", other)),
        }
    }
}

impl FromValue for bool {
    fn from_value(val: &Value) -> Result<Self, Exception> {
        match val {
            Value::Bool(b) => Ok(*b),
            other => Err(mismatch("BOOLEAN", other)),
        }
    }
}

impl FromValue for i64 {
    fn from_value(val: &Value) -> Result<Self, Exception> {
        match val {
            Value::Int(n) => Ok(*n),
            other => Err(mismatch("INTEGER", other)),
        }
    }
}

impl FromValue for i32 {
    fn from_value(val: &Value) -> Result<Self, Exception> {
        match val {
            Value::Int(n) => i32::try_from(*n).map_err(|_| {
                Exception::value_error(format!(
                    "integer {} out of range for i32 ({}..={})",
                    n,
                    i32::MIN,
                    i32::MAX
                ))
            }),
            other => Err(mismatch("INTEGER", other)),
        }
    }
}

impl FromValue for usize {
    fn from_value(val: &Value) -> Result<Self, Exception> {
        match val {
            Value::Int(n) => usize::try_from(*n).map_err(|_| {
                Exception::value_error(format!("integer {} out of range for usize", n))
            }),
            other => Err(mismatch("INTEGER", other)),
        }
    }
}

impl FromValue for f64 {
    fn from_value(val: &Value) -> Result<Self, Exception> {
        match val {
            Value::Float(n) => Ok(*n),
            Value::Int(n) => Ok(*n as f64),
            other => Err(mismatch("number", other)),
        }
    }
}

impl FromValue for String {
    fn from_value(val: &Value) -> Result<Self, Exception> {
        match val {
            Value::Str(s) => Ok(s.to_string()),
            other => Err(mismatch("STRING", other)),
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(val: &Value) -> Result<Self, Exception> {
        match val {
            Value::Array(items) => items.borrow().iter().map(T::from_value).collect(),
            other => Err(mismatch("ARRAY", other)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(val: &Value) -> Result<Self, Exception> {
        match val {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

/// Convert a Rust value into a [`Value`].
#[must_use]
pub fn to_value<T: IntoValue>(value: T) -> Value {
    value.into_value()
}

/// Convert a [`Value`] into a Rust type.
pub fn from_value<T: FromValue>(val: &Value) -> Result<T, Exception> {
    T::from_value(val)
}
