// quill-core - Evaluation signals
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Non-local exits from evaluation.
//!
//! Every evaluation step returns `Eval<Value>`: the `Ok` side carries a
//! value, the `Err` side carries whichever signal is unwinding. A signal
//! therefore never reaches a variable or a container.

use quill_object::{Exception, Value};

use crate::error::Error;

#[derive(Debug, Clone)]
pub enum Signal {
    /// `return` unwinding to the nearest function call
    Return(Value),
    /// `break` unwinding to the nearest loop
    Break,
    /// `continue` unwinding to the nearest loop
    Continue,
    /// A raised exception looking for a handler
    Exception(Box<Exception>),
    /// A fatal error; not catchable
    Error(Error),
}

/// Result of an evaluation step.
pub type Eval<T = Value> = std::result::Result<T, Signal>;

impl From<Exception> for Signal {
    fn from(ex: Exception) -> Self {
        Signal::Exception(Box::new(ex))
    }
}

impl From<Error> for Signal {
    fn from(err: Error) -> Self {
        Signal::Error(err)
    }
}
