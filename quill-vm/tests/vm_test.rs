// quill-vm - Virtual machine tests
// Copyright (c) 2025 Tom Waddington. MIT licensed.

mod common;
use common::*;

use pretty_assertions::assert_eq;
use quill_object::{Builtin, BuiltinTable, Exception};

// =============================================================================
// Expressions
// =============================================================================

#[test]
fn test_arithmetic() {
    assert_vm!(vec![b::expr_stmt(b::add(b::int(1), b::int(2)))], 3i64);
    assert_vm!(
        vec![
            b::var("x", b::int(7)),
            b::expr_stmt(b::rem(b::ident("x"), b::int(4))),
        ],
        3i64
    );
    assert_vm!(
        vec![
            b::var("x", b::int(1)),
            b::expr_stmt(b::mul(b::ident("x"), b::float(2.5))),
        ],
        2.5f64
    );
    assert_vm!(
        vec![
            b::var("s", b::str("ab")),
            b::expr_stmt(b::add(b::ident("s"), b::str("c"))),
        ],
        "abc"
    );
}

#[test]
fn test_integer_overflow_wraps() {
    assert_vm!(
        vec![
            b::var("x", b::int(i64::MAX)),
            b::expr_stmt(b::add(b::ident("x"), b::int(1))),
        ],
        i64::MIN
    );
}

#[test]
fn test_comparison_and_logic() {
    assert_vm!(
        vec![
            b::var("x", b::int(3)),
            b::expr_stmt(b::and(
                b::gt(b::ident("x"), b::int(1)),
                b::lt_eq(b::ident("x"), b::int(3)),
            )),
        ],
        true
    );
    assert_vm!(
        vec![
            b::var("x", b::int(0)),
            b::expr_stmt(b::or(b::ident("x"), b::str(""))),
        ],
        false
    );
    assert_vm!(
        vec![
            b::var("x", b::null()),
            b::expr_stmt(b::or(b::ident("x"), b::int(5))),
        ],
        true
    );
    assert_vm!(
        vec![
            b::var("x", b::int(1)),
            b::expr_stmt(b::not(b::ident("x"))),
        ],
        false
    );
}

#[test]
fn test_short_circuit_skips_right_side() {
    let (result, output) = run_output(vec![
        b::var("x", b::boolean(false)),
        b::expr_stmt(b::and(
            b::ident("x"),
            b::call_named("print", vec![b::str("evaluated")]),
        )),
    ]);
    assert_eq!(result, Ok(Value::Bool(false)));
    assert_eq!(output, "");
}

#[test]
fn test_collections_and_indexing() {
    assert_vm!(
        vec![
            b::var("a", b::array(vec![b::int(1), b::int(2), b::int(3)])),
            b::expr_stmt(b::index(b::ident("a"), b::int(1))),
        ],
        2i64
    );
    assert_vm!(
        vec![
            b::var("h", b::hash(vec![(b::str("k"), b::int(9))])),
            b::expr_stmt(b::index(b::ident("h"), b::str("k"))),
        ],
        9i64
    );
    assert_vm!(
        vec![
            b::var("m", b::map(vec![(b::int(1), b::str("one"))])),
            b::expr_stmt(b::index(b::ident("m"), b::int(1))),
        ],
        "one"
    );
}

#[test]
fn test_read_miss_is_null_but_write_miss_raises() {
    assert_eq!(
        run(vec![
            b::var("a", b::array(vec![b::int(1)])),
            b::expr_stmt(b::index(b::ident("a"), b::int(5))),
        ]),
        Ok(Value::Null)
    );
    assert_vm_raises!(
        vec![
            b::var("a", b::array(vec![b::int(1)])),
            b::expr_stmt(b::assign_index(b::ident("a"), b::int(5), b::int(0))),
        ],
        "IndexError"
    );
}

#[test]
fn test_set_index_yields_value() {
    assert_vm!(
        vec![
            b::var("a", b::array(vec![b::int(1), b::int(2)])),
            b::expr_stmt(b::assign_index(b::ident("a"), b::int(0), b::int(7))),
            b::expr_stmt(b::index(b::ident("a"), b::int(0))),
        ],
        7i64
    );
}

#[test]
fn test_unhashable_key() {
    let result = run(vec![
        b::var("k", b::array(vec![])),
        b::expr_stmt(b::hash(vec![(b::ident("k"), b::int(1))])),
    ]);
    assert_eq!(
        raised(result),
        Some((
            "TypeError".to_string(),
            "unusable as hash key: ARRAY".to_string()
        ))
    );
}

#[test]
fn test_len_and_type() {
    assert_vm!(
        vec![b::expr_stmt(b::call_named("len", vec![b::str("hello")]))],
        5i64
    );
    assert_vm!(
        vec![b::expr_stmt(b::call_named("type", vec![b::float(1.0)]))],
        "FLOAT"
    );
    assert_vm_raises!(
        vec![b::expr_stmt(b::call_named("len", vec![b::int(1)]))],
        "TypeError"
    );
}

#[test]
fn test_print() {
    let (result, output) = run_output(vec![
        b::expr_stmt(b::call_named("print", vec![b::str("a"), b::int(1)])),
        b::expr_stmt(b::call_named(
            "print",
            vec![b::array(vec![b::str("x")])],
        )),
    ]);
    assert_eq!(result, Ok(Value::Null));
    assert_eq!(output, "a 1\n[x]\n");
}

#[test]
fn test_builtin_call() {
    assert_vm!(
        vec![b::expr_stmt(b::call_named(
            "max",
            vec![b::int(3), b::int(9), b::int(4)],
        ))],
        9i64
    );
}

// =============================================================================
// Statements
// =============================================================================

#[test]
fn test_if_else_chain() {
    let classify = |n: i64| {
        vec![
            b::var("n", b::int(n)),
            b::var("r", b::str("")),
            b::if_else_if(
                b::lt(b::ident("n"), b::int(0)),
                vec![b::expr_stmt(b::assign("r", b::str("neg")))],
                b::if_else(
                    b::eq(b::ident("n"), b::int(0)),
                    vec![b::expr_stmt(b::assign("r", b::str("zero")))],
                    vec![b::expr_stmt(b::assign("r", b::str("pos")))],
                ),
            ),
            b::expr_stmt(b::ident("r")),
        ]
    };
    assert_vm!(classify(-3), "neg");
    assert_vm!(classify(0), "zero");
    assert_vm!(classify(8), "pos");
}

#[test]
fn test_block_shadowing() {
    assert_vm!(
        vec![
            b::var("x", b::int(1)),
            b::block(vec![b::var("x", b::int(2))]),
            b::expr_stmt(b::ident("x")),
        ],
        1i64
    );
}

#[test]
fn test_while_with_continue() {
    // sum of odd numbers below 8
    assert_vm!(
        vec![
            b::var("i", b::int(0)),
            b::var("sum", b::int(0)),
            b::while_loop(
                b::lt(b::ident("i"), b::int(8)),
                vec![
                    b::expr_stmt(b::assign("i", b::add(b::ident("i"), b::int(1)))),
                    b::if_stmt(
                        b::eq(b::rem(b::ident("i"), b::int(2)), b::int(0)),
                        vec![b::continue_stmt()],
                    ),
                    b::expr_stmt(b::assign("sum", b::add(b::ident("sum"), b::ident("i")))),
                ],
            ),
            b::expr_stmt(b::ident("sum")),
        ],
        16i64
    );
}

#[test]
fn test_for_with_break_and_continue() {
    // continue still runs the post statement
    assert_vm!(
        vec![
            b::var("total", b::int(0)),
            b::for_loop(
                Some(b::var("i", b::int(0))),
                Some(b::lt(b::ident("i"), b::int(10))),
                Some(b::expr_stmt(b::assign("i", b::add(b::ident("i"), b::int(1))))),
                vec![
                    b::if_stmt(b::eq(b::ident("i"), b::int(2)), vec![b::continue_stmt()]),
                    b::if_stmt(b::eq(b::ident("i"), b::int(5)), vec![b::break_stmt()]),
                    b::expr_stmt(b::assign(
                        "total",
                        b::add(b::ident("total"), b::ident("i")),
                    )),
                ],
            ),
            b::expr_stmt(b::ident("total")),
        ],
        8i64
    );
}

#[test]
fn test_top_level_return() {
    assert_vm!(
        vec![
            b::expr_stmt(b::int(1)),
            b::ret(b::int(2)),
            b::expr_stmt(b::int(3)),
        ],
        2i64
    );
}

#[test]
fn test_result_is_last_statement_value() {
    assert_vm!(
        vec![b::expr_stmt(b::int(1)), b::var("x", b::int(2))],
        Value::Null
    );
    assert_eq!(run(vec![]), Ok(Value::Null));

    // an untaken branch with no else ends on null
    assert_vm!(
        vec![
            b::expr_stmt(b::int(7)),
            b::if_stmt(b::boolean(false), vec![b::expr_stmt(b::int(5))]),
        ],
        Value::Null
    );
    assert_vm!(
        vec![
            b::expr_stmt(b::int(7)),
            b::if_stmt(b::boolean(true), vec![b::expr_stmt(b::int(5))]),
        ],
        5i64
    );
    assert_vm!(
        vec![
            b::var("i", b::int(0)),
            b::while_loop(
                b::lt(b::ident("i"), b::int(3)),
                vec![b::expr_stmt(b::assign("i", b::add(b::ident("i"), b::int(1))))],
            ),
        ],
        Value::Null
    );
    assert_vm!(
        vec![b::block(vec![b::expr_stmt(b::int(4)), b::var("y", b::int(5))])],
        Value::Null
    );
}

#[test]
fn test_pops_inside_calls_do_not_set_the_result() {
    let f = || {
        b::func(
            "f",
            &[],
            vec![b::expr_stmt(b::int(1)), b::ret(b::int(2))],
        )
    };
    assert_vm!(
        vec![f(), b::var("x", b::call_named("f", vec![]))],
        Value::Null
    );
    assert_vm!(
        vec![
            f(),
            b::expr_stmt(b::str("before")),
            b::if_stmt(
                b::call_named("f", vec![]),
                vec![b::var("y", b::int(3))],
            ),
        ],
        Value::Null
    );
    assert_vm!(vec![f(), b::expr_stmt(b::call_named("f", vec![]))], 2i64);
}

// =============================================================================
// Functions
// =============================================================================

fn fib_program(n: i64) -> Vec<Stmt> {
    vec![
        b::func(
            "fib",
            &["n"],
            vec![
                b::if_stmt(
                    b::lt(b::ident("n"), b::int(2)),
                    vec![b::ret(b::ident("n"))],
                ),
                b::ret(b::add(
                    b::call_named("fib", vec![b::sub(b::ident("n"), b::int(1))]),
                    b::call_named("fib", vec![b::sub(b::ident("n"), b::int(2))]),
                )),
            ],
        ),
        b::expr_stmt(b::call_named("fib", vec![b::int(n)])),
    ]
}

#[test]
fn test_recursion() {
    assert_vm!(fib_program(15), 610i64);
}

#[test]
fn test_function_locals_and_implicit_return() {
    assert_vm!(
        vec![
            b::func(
                "f",
                &["a"],
                vec![
                    b::var("b", b::mul(b::ident("a"), b::int(2))),
                    b::expr_stmt(b::assign("b", b::add(b::ident("b"), b::int(1)))),
                ],
            ),
            b::expr_stmt(b::call_named("f", vec![b::int(4)])),
        ],
        Value::Null
    );
    assert_vm!(
        vec![
            b::var("double", b::lambda(&["x"], vec![b::ret(b::mul(b::ident("x"), b::int(2)))])),
            b::expr_stmt(b::call_named("double", vec![b::int(21)])),
        ],
        42i64
    );
}

#[test]
fn test_functions_update_globals() {
    assert_vm!(
        vec![
            b::var("count", b::int(0)),
            b::func(
                "bump",
                &[],
                vec![b::expr_stmt(b::assign(
                    "count",
                    b::add(b::ident("count"), b::int(1)),
                ))],
            ),
            b::expr_stmt(b::call_named("bump", vec![])),
            b::expr_stmt(b::call_named("bump", vec![])),
            b::expr_stmt(b::ident("count")),
        ],
        2i64
    );
}

#[test]
fn test_arity_mismatch() {
    let result = run(vec![
        b::func("f", &["a", "b"], vec![b::ret(b::ident("a"))]),
        b::expr_stmt(b::call_named("f", vec![b::int(1)])),
    ]);
    assert_eq!(
        raised(result),
        Some((
            "TypeError".to_string(),
            "wrong number of arguments: expected 2, got 1".to_string()
        ))
    );
}

#[test]
fn test_not_a_function() {
    let result = run(vec![
        b::var("x", b::int(1)),
        b::expr_stmt(b::call_named("x", vec![])),
    ]);
    assert_eq!(
        raised(result),
        Some(("TypeError".to_string(), "not a function: INTEGER".to_string()))
    );
}

#[test]
fn test_recursion_limit() {
    let program = b::program(vec![
        b::func("down", &[], vec![b::ret(b::call_named("down", vec![]))]),
        b::expr_stmt(b::call_named("down", vec![])),
    ]);
    let options = VmOptions {
        max_frames: 50,
        ..VmOptions::default()
    };
    let bytecode = Compiler::new().compile(&program).unwrap();
    let result = Vm::with_options(bytecode, options).run();
    assert_eq!(
        raised(result),
        Some((
            "RuntimeError".to_string(),
            "maximum recursion depth exceeded".to_string()
        ))
    );
}

#[test]
fn test_registered_native() {
    let mut builtins = BuiltinTable::standard();
    builtins.register(Builtin::new("triple", |_, args: &[Value]| match args {
        [Value::Int(n)] => Ok(Value::Int(n * 3)),
        _ => Err(Exception::type_error("triple: expected an integer")),
    }));
    let program = b::program(vec![b::expr_stmt(b::call_named("triple", vec![b::int(5)]))]);
    let bytecode = Compiler::new()
        .with_builtins(builtins.clone())
        .compile(&program)
        .unwrap();
    let result = Vm::new(bytecode).with_builtins(builtins).run();
    assert_eq!(result, Ok(Value::Int(15)));
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn test_exception_location() {
    let program = b::program(vec![
        b::var("x", b::int(1)).at(1, 1),
        b::expr_stmt(b::rem(b::ident("x"), b::int(0)).at(2, 9)).at(2, 1),
    ])
    .with_file("main.ql");
    let bytecode = Compiler::new().compile(&program).unwrap();
    let failure = Vm::new(bytecode).run().unwrap_err();
    assert_eq!(
        failure.render(),
        "ZeroDivisionError at main.ql:2:9: modulo by zero\n\nStack trace:\n  at <module> (main.ql:2:9)"
    );
}

#[test]
fn test_exception_inside_function_names_it() {
    let program = b::program(vec![
        b::func(
            "boom",
            &[],
            vec![b::throw(b::str("bad").at(2, 11)).at(2, 5)],
        )
        .at(1, 1),
        b::expr_stmt(b::call_named("boom", vec![]).at(4, 1)).at(4, 1),
    ]);
    let failure = Vm::new(Compiler::new().compile(&program).unwrap())
        .run()
        .unwrap_err();
    let ex = failure.exception().unwrap();
    assert_eq!(ex.kind, "RuntimeError");
    assert_eq!(ex.message, "bad");
    assert_eq!(ex.stack_trace.len(), 1);
    assert_eq!(ex.stack_trace[0].to_string(), "at boom (<main>:2:5)");
}

#[test]
fn test_throw_exception_value() {
    let result = run(vec![b::throw(b::call_named(
        "ValueError",
        vec![b::str("nope")],
    ))]);
    assert_eq!(
        raised(result),
        Some(("ValueError".to_string(), "nope".to_string()))
    );
}

#[test]
fn test_magic_mismatch() {
    let mut bytecode = compile(vec![b::expr_stmt(b::int(1))]);
    bytecode.magic = "XXXX".to_string();
    let mut machine = Vm::new(bytecode).with_output(Output::buffer());
    match machine.run() {
        Err(Failure::Error(err)) => {
            assert_eq!(err.message, "invalid bytecode: magic mismatch");
        }
        other => panic!("expected a fatal error, got {:?}", other),
    }
    assert_eq!(machine.instructions_executed(), 0);
}

#[test]
fn test_unknown_opcode_is_fatal() {
    let bytecode = Bytecode::new(vec![250], vec![], vec![]);
    match Vm::new(bytecode).run() {
        Err(Failure::Error(err)) => assert_eq!(err.message, "unknown opcode 250"),
        other => panic!("expected a fatal error, got {:?}", other),
    }
}

#[test]
fn test_truncated_operand_is_fatal() {
    let bytecode = Bytecode::new(vec![Opcode::Constant as u8], vec![Value::Int(7)], vec![]);
    match Vm::new(bytecode).run() {
        Err(Failure::Error(err)) => assert_eq!(
            err.message,
            "invalid bytecode: truncated operand at offset 1"
        ),
        other => panic!("expected a fatal error, got {:?}", other),
    }

    let bytecode = Bytecode::new(
        vec![Opcode::True as u8, Opcode::GetLocal as u8],
        vec![],
        vec![],
    );
    assert!(matches!(Vm::new(bytecode).run(), Err(Failure::Error(_))));
}

#[test]
fn test_stack_overflow_is_fatal() {
    let items: Vec<_> = (0..quill_vm::STACK_SIZE as i64 + 1)
        .map(|n| b::int(n).at(1, 1))
        .collect();
    let program = b::program(vec![b::expr_stmt(b::array(items))]);
    let bytecode = Compiler::new().compile(&program).unwrap();
    match Vm::new(bytecode).run() {
        Err(Failure::Error(err)) => {
            assert_eq!(err.message, "stack overflow");
            assert_eq!(err.location.as_deref(), Some("<main>:1:1"));
        }
        other => panic!("expected a fatal error, got {:?}", other),
    }
}

// =============================================================================
// Instruction budget
// =============================================================================

/// `var x = 1; x + 2;` runs six instructions.
fn six_instructions() -> Bytecode {
    compile(vec![
        b::var("x", b::int(1)),
        b::expr_stmt(b::add(b::ident("x"), b::int(2))),
    ])
}

#[test]
fn test_budget_allows_exactly_n() {
    let mut machine = Vm::new(six_instructions());
    machine.set_instruction_budget(6);
    assert_eq!(machine.run(), Ok(Value::Int(3)));
    assert_eq!(machine.instructions_executed(), 6);
}

#[test]
fn test_budget_exceeded() {
    let mut machine = Vm::new(six_instructions());
    machine.set_instruction_budget(5);
    assert_eq!(
        raised(machine.run()),
        Some((
            "RuntimeError".to_string(),
            "instruction budget exceeded".to_string()
        ))
    );
}

#[test]
fn test_zero_budget_is_unlimited() {
    let mut machine = Vm::new(compile(fib_program(12)));
    machine.set_instruction_budget(0);
    assert_eq!(machine.run(), Ok(Value::Int(144)));
}

#[test]
fn test_budget_stops_infinite_loop() {
    let mut machine = Vm::new(compile(vec![b::while_loop(b::boolean(true), vec![])]));
    machine.set_instruction_budget(10_000);
    assert!(raised(machine.run()).is_some());
    assert_eq!(machine.instructions_executed(), 10_000);
}
