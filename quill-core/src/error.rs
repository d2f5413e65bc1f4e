// quill-core - Error types for the Quill interpreter
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Fatal interpreter errors.
//!
//! These are faults of the program's structure rather than conditions it
//! can handle, so `catch` never sees them.

use quill_object::FatalError;

/// Result type for fallible interpreter plumbing.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort evaluation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// `break` reached a function or program boundary
    #[error("break outside of a loop")]
    BreakOutsideLoop,
    /// `continue` reached a function or program boundary
    #[error("continue outside of a loop")]
    ContinueOutsideLoop,
    /// Internal error - invariant violation
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<Error> for FatalError {
    fn from(err: Error) -> Self {
        FatalError::new(err.to_string())
    }
}

/// Failure to resolve an import path to a program.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    #[error("module not found: {0}")]
    NotFound(String),
    #[error("no module loader configured")]
    NoLoader,
    #[error("{0}")]
    Other(String),
}
