// quill-embed integration tests
// Copyright (c) 2025 Tom Waddington. MIT licensed.

mod common;
use common::*;

use std::rc::Rc;

use pretty_assertions::assert_eq;
use quill_core::MemoryLoader;
use quill_embed::{FromValue, InterpreterOptions};
use quill_object::Exception;

fn class_program() -> Program {
    b::program(vec![
        b::class(
            "Counter",
            vec![b::method(
                "__init__",
                &["self"],
                vec![b::expr_stmt(b::assign_member(b::ident("self"), "n", b::int(41)))],
            )],
        ),
        b::expr_stmt(b::add(
            b::member(b::call_named("Counter", vec![]), "n"),
            b::int(1),
        )),
    ])
}

// =============================================================================
// Backend selection
// =============================================================================

mod backend_selection {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn auto_prefers_the_vm() {
        let mut engine = engine(Backend::Auto);
        assert_eq!(engine.last_backend(), None);
        let program = b::program(vec![b::expr_stmt(b::mul(b::int(6), b::int(7)))]);
        assert_eq!(engine.run(&program), Ok(Value::Int(42)));
        assert_eq!(engine.last_backend(), Some(Backend::Vm));
    }

    #[test]
    fn auto_falls_back_for_unsupported_constructs() {
        let mut engine = engine(Backend::Auto);
        assert_eq!(engine.run(&class_program()), Ok(Value::Int(42)));
        assert_eq!(engine.last_backend(), Some(Backend::Interp));
    }

    #[test]
    fn forced_vm_reports_compile_errors() {
        let mut engine = engine(Backend::Vm);
        let err = engine.run(&class_program()).unwrap_err();
        assert!(matches!(err, EngineError::Compile(_)), "{:?}", err);
        assert!(err.render().starts_with("Compile error: "), "{}", err.render());
        assert_eq!(err.exception(), None);
    }

    #[test]
    fn forced_interpreter() {
        let mut engine = engine(Backend::Interp);
        let program = b::program(vec![b::expr_stmt(b::int(1))]);
        assert_eq!(engine.run(&program), Ok(Value::Int(1)));
        assert_eq!(engine.last_backend(), Some(Backend::Interp));
    }

    #[test]
    fn backend_can_be_switched() {
        let mut engine = engine(Backend::Interp);
        engine.set_backend(Backend::Vm);
        assert_eq!(engine.config().backend, Backend::Vm);
        engine.run(&b::program(vec![])).unwrap();
        assert_eq!(engine.last_backend(), Some(Backend::Vm));
    }
}

// =============================================================================
// Persistence and bindings
// =============================================================================

mod bindings {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn interpreter_bindings_survive_runs() {
        let mut engine = engine(Backend::Interp);
        engine
            .run(&b::program(vec![b::var("x", b::int(20))]))
            .unwrap();
        let program = b::program(vec![b::expr_stmt(b::add(b::ident("x"), b::int(22)))]);
        assert_eq!(engine.run(&program), Ok(Value::Int(42)));
        assert_eq!(engine.get_as::<i64>("x"), Some(20));
    }

    #[test]
    fn host_bindings_reach_the_interpreter() {
        // `limit` is unknown to the compiler, so auto mode interprets
        let mut engine = engine(Backend::Auto);
        engine.set("limit", 5i64);
        let program = b::program(vec![b::expr_stmt(b::mul(b::ident("limit"), b::int(2)))]);
        assert_eq!(engine.run(&program), Ok(Value::Int(10)));
        assert_eq!(engine.last_backend(), Some(Backend::Interp));
    }

    #[test]
    fn get_missing_or_mistyped() {
        let engine = engine(Backend::Interp);
        engine.set("name", "quill");
        assert_eq!(engine.get("missing"), None);
        assert_eq!(engine.get_as::<i64>("name"), None);
        assert_eq!(engine.get_as::<String>("name"), Some("quill".to_string()));
    }
}

// =============================================================================
// Native functions
// =============================================================================

mod natives {
    use super::*;
    use pretty_assertions::assert_eq;

    fn engine_with_halve(backend: Backend) -> Engine {
        let mut engine = engine(backend);
        engine.register_native("halve", |args| {
            let [n] = args else {
                return Err(Exception::type_error("halve() takes 1 argument"));
            };
            Ok(Value::Int(i64::from_value(n)? / 2))
        });
        engine
    }

    #[test]
    fn natives_run_on_both_backends() {
        let program = b::program(vec![
            b::expr_stmt(b::call_named("print", vec![b::call_named("halve", vec![b::int(9)])])),
            b::expr_stmt(b::call_named("halve", vec![b::int(84)])),
        ]);
        for backend in [Backend::Vm, Backend::Interp] {
            let mut engine = engine_with_halve(backend);
            assert_eq!(engine.run(&program), Ok(Value::Int(42)));
            assert_eq!(engine.output().contents(), "4\n");
            assert_eq!(engine.last_backend(), Some(backend));
        }
    }

    #[test]
    fn native_errors_are_exceptions() {
        let program = b::program(vec![b::expr_stmt(b::call_named(
            "halve",
            vec![b::str("x")],
        ))]);
        for backend in [Backend::Vm, Backend::Interp] {
            let mut engine = engine_with_halve(backend);
            let err = engine.run(&program).unwrap_err();
            let ex = err.exception().unwrap();
            assert_eq!(ex.kind, "TypeError");
            assert_eq!(ex.message, "expected INTEGER, got STRING");
        }
    }
}

// =============================================================================
// Failures
// =============================================================================

mod failures {
    use super::*;
    use pretty_assertions::assert_eq;

    fn divide_by_zero() -> Program {
        b::program(vec![
            b::var("x", b::int(1).at(1, 9)).at(1, 1),
            b::expr_stmt(b::div(b::ident("x"), b::int(0)).at(2, 3)).at(2, 1),
        ])
        .with_file("main.ql")
    }

    #[test]
    fn rendering_matches_across_backends() {
        let expected = "ZeroDivisionError at main.ql:2:3: division by zero\n\n\
                        Stack trace:\n  at <module> (main.ql:2:3)";
        for backend in [Backend::Vm, Backend::Interp] {
            let mut engine = engine(backend);
            let err = engine.run(&divide_by_zero()).unwrap_err();
            assert_eq!(err.render(), expected);
            assert_eq!(err.to_string(), expected);
        }
    }

    #[test]
    fn default_file_comes_from_the_interpreter_options() {
        let config = EngineConfig::new(Backend::Vm).with_interpreter(InterpreterOptions {
            file: "script.ql".to_string(),
            ..Default::default()
        });
        let mut engine = Engine::new(config).with_output(Output::buffer());
        let program = b::program(vec![
            b::expr_stmt(b::div(b::int(1), b::int(0)).at(1, 1)).at(1, 1),
        ]);
        let err = engine.run(&program).unwrap_err();
        assert!(err.render().contains("script.ql:1:1"), "{}", err.render());
    }

    #[test]
    fn instruction_budget_applies_to_vm_runs() {
        let config = EngineConfig::new(Backend::Vm).with_vm(VmOptions {
            instruction_budget: 50,
            ..Default::default()
        });
        let mut engine = Engine::new(config).with_output(Output::buffer());
        let program = b::program(vec![b::while_loop(b::boolean(true), vec![])]);
        let err = engine.run(&program).unwrap_err();
        assert_eq!(err.exception().map(|ex| ex.kind.as_str()), Some("RuntimeError"));
        assert_eq!(
            err.exception().map(|ex| ex.message.as_str()),
            Some("instruction budget exceeded")
        );
    }
}

// =============================================================================
// Imports
// =============================================================================

#[test]
fn test_imports_run_on_the_interpreter() {
    let module = b::program(vec![b::var("answer", b::int(42))]);
    let loader = MemoryLoader::new().with_module("consts", module);
    let mut engine = engine(Backend::Auto).with_loader(Rc::new(loader));
    let program = b::program(vec![
        b::import_as("consts", "c"),
        b::expr_stmt(b::member(b::ident("c"), "answer")),
    ]);
    assert_eq!(engine.run(&program), Ok(Value::Int(42)));
    assert_eq!(engine.last_backend(), Some(Backend::Interp));
}
