// quill-object - Top-level failures
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The outcome of a program that did not complete normally.

use std::fmt::{self, Write};

use crate::exception::Exception;

/// An uncatchable runtime fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FatalError {
    pub message: String,
    /// `file:line:col` when known
    pub location: Option<String>,
}

impl FatalError {
    pub fn new(message: impl Into<String>) -> Self {
        FatalError {
            message: message.into(),
            location: None,
        }
    }

    #[must_use]
    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

impl fmt::Display for FatalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.location {
            Some(loc) => write!(f, "{}: {}", loc, self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// A program that ended with a fatal error or an uncaught exception.
#[derive(Debug, Clone, PartialEq)]
pub enum Failure {
    Error(FatalError),
    Exception(Exception),
}

impl Failure {
    /// The user-facing report.
    ///
    /// ```text
    /// ZeroDivisionError at main.ql:3:9: division by zero
    ///
    /// Stack trace:
    ///   at divide (main.ql:3:9)
    ///   at <module> (main.ql:7:1)
    /// ```
    pub fn render(&self) -> String {
        let mut out = String::new();
        match self {
            Failure::Error(err) => {
                header(&mut out, "Runtime error", err.location.as_deref(), &err.message);
            }
            Failure::Exception(ex) => {
                header(&mut out, &ex.kind, ex.location().as_deref(), &ex.message);
                if let Some(suggestion) = &ex.suggestion {
                    let _ = write!(out, "\n\nSuggestion: {}", suggestion);
                }
                if let Some(cause) = &ex.cause {
                    let _ = write!(out, "\n\nCaused by: {}", cause);
                }
                if !ex.stack_trace.is_empty() {
                    out.push_str("\n\nStack trace:");
                    for frame in &ex.stack_trace {
                        let _ = write!(out, "\n  {}", frame);
                    }
                }
            }
        }
        out
    }

    pub fn exception(&self) -> Option<&Exception> {
        match self {
            Failure::Exception(ex) => Some(ex),
            Failure::Error(_) => None,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Failure::Error(err) => &err.message,
            Failure::Exception(ex) => &ex.message,
        }
    }
}

fn header(out: &mut String, kind: &str, location: Option<&str>, message: &str) {
    out.push_str(kind);
    if let Some(loc) = location {
        out.push_str(" at ");
        out.push_str(loc);
    }
    out.push_str(": ");
    out.push_str(message);
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl std::error::Error for Failure {}

impl From<Exception> for Failure {
    fn from(ex: Exception) -> Self {
        Failure::Exception(ex)
    }
}

impl From<FatalError> for Failure {
    fn from(err: FatalError) -> Self {
        Failure::Error(err)
    }
}
