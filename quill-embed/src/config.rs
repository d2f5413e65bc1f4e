// quill-embed - Engine configuration
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Backend selection and per-backend options.

use std::fmt;
use std::str::FromStr;

use quill_core::InterpreterOptions;
use quill_vm::VmOptions;

/// Which backend runs a program.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Backend {
    /// Compile for the VM, falling back to the interpreter when the
    /// compiler does not support the program.
    #[default]
    Auto,
    Vm,
    Interp,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::Auto => "auto",
            Backend::Vm => "vm",
            Backend::Interp => "interp",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown backend '{0}': expected auto, vm or interp")]
pub struct UnknownBackend(pub String);

impl FromStr for Backend {
    type Err = UnknownBackend;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Backend::Auto),
            "vm" => Ok(Backend::Vm),
            "interp" => Ok(Backend::Interp),
            other => Err(UnknownBackend(other.to_string())),
        }
    }
}

/// Engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineConfig {
    pub backend: Backend,
    pub interpreter: InterpreterOptions,
    pub vm: VmOptions,
}

impl EngineConfig {
    pub fn new(backend: Backend) -> Self {
        EngineConfig {
            backend,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_interpreter(mut self, options: InterpreterOptions) -> Self {
        self.interpreter = options;
        self
    }

    #[must_use]
    pub fn with_vm(mut self, options: VmOptions) -> Self {
        self.vm = options;
        self
    }
}
