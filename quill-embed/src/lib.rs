// quill-embed - Embedding API for the Quill scripting language
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! # quill-embed
//!
//! A high-level embedding API for Quill.
//!
//! [`Engine`] runs a [`Program`](quill_object::ast::Program) on the
//! bytecode VM, the tree-walking interpreter, or the VM with a fallback to
//! the interpreter for programs the compiler does not support.
//!
//! ## Quick Start
//!
//! ```rust
//! use quill_embed::{Backend, Engine, EngineConfig};
//! use quill_object::ast::build as b;
//!
//! let mut engine = Engine::new(EngineConfig::new(Backend::Auto));
//! let program = b::program(vec![
//!     b::var("x", b::int(20)),
//!     b::expr_stmt(b::add(b::ident("x"), b::int(22))),
//! ]);
//! assert_eq!(engine.run(&program).unwrap().to_string(), "42");
//! assert_eq!(engine.last_backend(), Some(Backend::Vm));
//! ```

mod config;
mod convert;
mod engine;

pub use config::{Backend, EngineConfig, UnknownBackend};
pub use convert::{FromValue, IntoValue, from_value, to_value};
pub use engine::{Engine, EngineError, Result};

// Re-export the option types for convenience
pub use quill_core::InterpreterOptions;
pub use quill_vm::VmOptions;
