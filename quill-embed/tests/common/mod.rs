// quill-embed - Common test utilities
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Shared helpers for running one program on several backends.

#[allow(unused_imports)]
pub use quill_embed::{Backend, Engine, EngineConfig, EngineError, VmOptions};
#[allow(unused_imports)]
pub use quill_object::ast::build as b;
#[allow(unused_imports)]
pub use quill_object::ast::{Program, Stmt};
#[allow(unused_imports)]
pub use quill_object::{Output, Value};

/// An engine on `backend` whose output goes to a buffer.
#[must_use]
pub fn engine(backend: Backend) -> Engine {
    Engine::new(EngineConfig::new(backend)).with_output(Output::buffer())
}

/// What a run observably did: its printed output, and either its result
/// or the kind and message of the exception that ended it.
#[derive(Debug, Clone, PartialEq)]
pub struct Observed {
    pub output: String,
    pub outcome: Result<Value, (String, String)>,
}

#[allow(dead_code)]
pub fn observe(backend: Backend, program: &Program) -> Observed {
    let mut engine = engine(backend);
    let outcome = engine.run(program).map_err(|err| match err.exception() {
        Some(ex) => (ex.kind.clone(), ex.message.clone()),
        None => ("Error".to_string(), err.to_string()),
    });
    Observed {
        output: engine.output().contents(),
        outcome,
    }
}

/// Assert that the VM and the interpreter agree on a program, and that
/// the VM really ran it.
#[macro_export]
macro_rules! assert_backends_agree {
    ($program:expr) => {{
        let program = $program;
        let mut vm = $crate::common::engine($crate::common::Backend::Vm);
        if let Err(quill_embed::EngineError::Compile(err)) = vm.run(&program) {
            panic!("program did not compile: {}", err);
        }
        let vm = $crate::common::observe($crate::common::Backend::Vm, &program);
        let interp = $crate::common::observe($crate::common::Backend::Interp, &program);
        pretty_assertions::assert_eq!(vm, interp);
        vm
    }};
}
