// quill-object - Clock builtins
// Copyright (c) 2025 Tom Waddington. MIT licensed.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::exception::Exception;
use crate::output::Output;
use crate::value::Value;

/// RFC 3339 UTC timestamp (`YYYY-MM-DDTHH:MM:SSZ`).
pub fn format_rfc3339(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub(super) fn now(_: &Output, _: &[Value]) -> Result<Value, Exception> {
    Ok(Value::from(format_rfc3339(Utc::now())))
}

pub(super) fn timestamp(_: &Output, _: &[Value]) -> Result<Value, Exception> {
    Ok(Value::Int(Utc::now().timestamp()))
}
