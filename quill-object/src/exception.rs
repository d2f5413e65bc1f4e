// quill-object - Exceptions and stack traces
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Catchable, program-level exceptions.
//!
//! An exception carries a type name (one of the builtin kinds or a
//! user-chosen string), a message, the stack frames it unwound through,
//! and optionally a cause and a suggestion for the user.

use std::fmt;
use std::str::FromStr;

/// Builtin exception kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExceptionKind {
    ValueError,
    TypeError,
    NameError,
    IndexError,
    KeyError,
    ZeroDivisionError,
    RuntimeError,
    SyntaxError,
    AttributeError,
    AssertionError,
}

impl ExceptionKind {
    pub const ALL: [ExceptionKind; 10] = [
        ExceptionKind::ValueError,
        ExceptionKind::TypeError,
        ExceptionKind::NameError,
        ExceptionKind::IndexError,
        ExceptionKind::KeyError,
        ExceptionKind::ZeroDivisionError,
        ExceptionKind::RuntimeError,
        ExceptionKind::SyntaxError,
        ExceptionKind::AttributeError,
        ExceptionKind::AssertionError,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ExceptionKind::ValueError => "ValueError",
            ExceptionKind::TypeError => "TypeError",
            ExceptionKind::NameError => "NameError",
            ExceptionKind::IndexError => "IndexError",
            ExceptionKind::KeyError => "KeyError",
            ExceptionKind::ZeroDivisionError => "ZeroDivisionError",
            ExceptionKind::RuntimeError => "RuntimeError",
            ExceptionKind::SyntaxError => "SyntaxError",
            ExceptionKind::AttributeError => "AttributeError",
            ExceptionKind::AssertionError => "AssertionError",
        }
    }
}

impl fmt::Display for ExceptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExceptionKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExceptionKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or(())
    }
}

/// One entry in an exception's stack trace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    pub function: String,
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl StackFrame {
    pub fn new(function: impl Into<String>, file: impl Into<String>, line: u32, column: u32) -> Self {
        StackFrame {
            function: function.into(),
            file: file.into(),
            line,
            column,
        }
    }

    /// `file:line:col`
    pub fn location(&self) -> String {
        format!("{}:{}:{}", self.file, self.line, self.column)
    }
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "at {} ({})", self.function, self.location())
    }
}

/// A program-level exception.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct Exception {
    pub kind: String,
    pub message: String,
    /// Innermost frame first
    pub stack_trace: Vec<StackFrame>,
    pub cause: Option<Box<Exception>>,
    pub suggestion: Option<String>,
}

impl Exception {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Exception {
            kind: kind.into(),
            message: message.into(),
            stack_trace: Vec::new(),
            cause: None,
            suggestion: None,
        }
    }

    pub fn of(kind: ExceptionKind, message: impl Into<String>) -> Self {
        Exception::new(kind.as_str(), message)
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Exception::of(ExceptionKind::TypeError, message)
    }

    pub fn value_error(message: impl Into<String>) -> Self {
        Exception::of(ExceptionKind::ValueError, message)
    }

    pub fn runtime_error(message: impl Into<String>) -> Self {
        Exception::of(ExceptionKind::RuntimeError, message)
    }

    pub fn index_error(message: impl Into<String>) -> Self {
        Exception::of(ExceptionKind::IndexError, message)
    }

    pub fn zero_division(message: impl Into<String>) -> Self {
        Exception::of(ExceptionKind::ZeroDivisionError, message)
    }

    pub fn attribute_error(message: impl Into<String>) -> Self {
        Exception::of(ExceptionKind::AttributeError, message)
    }

    /// `NameError` for an unresolved identifier, with a declaration hint.
    pub fn undefined_name(name: &str) -> Self {
        Exception::of(
            ExceptionKind::NameError,
            format!("identifier not found: {}", name),
        )
        .with_suggestion(format!("Did you mean to declare '{}' first?", name))
    }

    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    #[must_use]
    pub fn with_cause(mut self, cause: Exception) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    #[must_use]
    pub fn with_frame(mut self, frame: StackFrame) -> Self {
        self.stack_trace.push(frame);
        self
    }

    pub fn push_frame(&mut self, frame: StackFrame) {
        self.stack_trace.push(frame);
    }

    pub fn is_kind(&self, kind: ExceptionKind) -> bool {
        self.kind == kind.as_str()
    }

    /// Location of the innermost frame, if any.
    pub fn location(&self) -> Option<String> {
        self.stack_trace.first().map(StackFrame::location)
    }
}
