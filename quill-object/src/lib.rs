// quill-object - Object model for the Quill scripting language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! # quill-object
//!
//! Values, environments, exceptions and the syntax tree shared by the
//! Quill interpreter and virtual machine, together with the operator
//! semantics and builtin library both backends call into.

pub mod ast;
pub mod builtins;
pub mod debug;
pub mod env;
pub mod exception;
pub mod failure;
pub mod index;
pub mod ops;
pub mod output;
pub mod value;

pub use builtins::BuiltinTable;
pub use debug::DebugEntry;
pub use env::Env;
pub use exception::{Exception, ExceptionKind, StackFrame};
pub use failure::{Failure, FatalError};
pub use ops::BinaryOp;
pub use output::Output;
pub use value::{
    BoundMethod, Builtin, Class, CompiledFunction, FxIndexMap, Function, HashKey, HashObject,
    HashPair, Instance, MapObject, Module, NativeFn, SMALL_INT_CACHE, Value,
};
