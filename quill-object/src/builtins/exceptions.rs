// quill-object - Exception constructors
// Copyright (c) 2025 Tom Waddington. MIT licensed.

use crate::exception::{Exception, ExceptionKind};
use crate::output::Output;
use crate::value::{Builtin, Value};

/// The message text for a value: strings verbatim, anything else displayed.
pub fn message_of(value: &Value) -> String {
    value.to_string()
}

/// The exception raised by `throw value`.
///
/// Exception values are re-raised as they are; strings become a
/// `RuntimeError` with that message, anything else a `RuntimeError` with
/// its display.
pub fn thrown(value: &Value) -> Exception {
    match value {
        Value::Exception(ex) => (**ex).clone(),
        other => Exception::runtime_error(message_of(other)),
    }
}

/// `Exception(message)` or `Exception(type, message)`.
pub(super) fn exception(_: &Output, args: &[Value]) -> Result<Value, Exception> {
    match args {
        [message] => Ok(Value::exception(Exception::new(
            "Exception",
            message_of(message),
        ))),
        [kind, message] => {
            let kind = match kind {
                Value::Str(s) => s.to_string(),
                _ => "Exception".to_string(),
            };
            Ok(Value::exception(Exception::new(kind, message_of(message))))
        }
        _ => Err(Exception::type_error(format!(
            "Exception: expected 1-2 arguments (type, message), got {}",
            args.len()
        ))),
    }
}

/// A one-argument constructor for a builtin exception kind.
pub(super) fn constructor(kind: ExceptionKind) -> Builtin {
    Builtin::new(kind.as_str(), move |_, args| match args {
        [message] => Ok(Value::exception(Exception::of(kind, message_of(message)))),
        _ => Err(Exception::type_error(format!(
            "{}: expected 1 argument (message), got {}",
            kind,
            args.len()
        ))),
    })
}
