// quill-embed - Backend equivalence tests
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! The VM and the interpreter must print the same output and end with the
//! same value or the same exception.

mod common;
use common::*;

use proptest::prelude::*;
use quill_object::ast::Expr;

fn print(args: Vec<Expr>) -> Stmt {
    b::expr_stmt(b::call_named("print", args))
}

// =============================================================================
// Representative programs
// =============================================================================

#[test]
fn test_arithmetic_and_printing() {
    let seen = assert_backends_agree!(b::program(vec![
        print(vec![
            b::add(b::int(1), b::mul(b::int(2), b::int(3))),
            b::div(b::int(7), b::int(2)),
            b::div(b::float(7.0), b::int(2)),
            b::rem(b::neg(b::int(5)), b::int(3)),
        ]),
        print(vec![b::add(b::str("quill"), b::str("!"))]),
        b::expr_stmt(b::sub(b::int(10), b::int(4))),
    ]));
    assert_eq!(seen.outcome, Ok(Value::Int(6)));
}

#[test]
fn test_division_by_zero() {
    for op in [b::div as fn(Expr, Expr) -> Expr, b::rem] {
        let seen = assert_backends_agree!(b::program(vec![
            b::var("x", b::int(4)),
            b::expr_stmt(op(b::ident("x"), b::int(0))),
        ]));
        assert_eq!(seen.outcome.unwrap_err().0, "ZeroDivisionError");
    }
}

#[test]
fn test_read_miss_and_write_miss() {
    let seen = assert_backends_agree!(b::program(vec![
        b::var("xs", b::array(vec![b::int(1), b::int(2)])),
        b::var("m", b::map(vec![(b::str("a"), b::int(1))])),
        print(vec![
            b::index(b::ident("xs"), b::int(10)),
            b::index(b::ident("m"), b::str("zz")),
        ]),
        b::expr_stmt(b::assign_index(b::ident("xs"), b::int(10), b::int(3))),
    ]));
    assert_eq!(seen.output, "null null\n");
    assert_eq!(seen.outcome.unwrap_err().0, "IndexError");
}

#[test]
fn test_collections() {
    assert_backends_agree!(b::program(vec![
        b::var("xs", b::array(vec![b::int(3), b::int(1), b::int(2)])),
        b::var(
            "h",
            b::hash(vec![(b::str("k"), b::int(1)), (b::int(2), b::str("two"))]),
        ),
        b::expr_stmt(b::assign_index(b::ident("xs"), b::int(0), b::int(9))),
        b::expr_stmt(b::assign_index(b::ident("h"), b::str("k"), b::int(5))),
        print(vec![
            b::ident("xs"),
            b::call_named("sorted", vec![b::ident("xs")]),
            b::call_named("len", vec![b::ident("h")]),
            b::index(b::ident("h"), b::str("k")),
            b::call_named("type", vec![b::ident("h")]),
        ]),
        b::expr_stmt(b::call_named("str", vec![b::ident("xs")])),
    ]));
}

#[test]
fn test_loops() {
    let seen = assert_backends_agree!(b::program(vec![
        b::var("total", b::int(0)),
        b::for_loop(
            Some(b::var("i", b::int(0))),
            Some(b::lt(b::ident("i"), b::int(20))),
            Some(b::expr_stmt(b::assign("i", b::add(b::ident("i"), b::int(1))))),
            vec![
                b::if_stmt(
                    b::eq(b::rem(b::ident("i"), b::int(3)), b::int(0)),
                    vec![b::continue_stmt()],
                ),
                b::if_stmt(b::gt(b::ident("i"), b::int(14)), vec![b::break_stmt()]),
                b::expr_stmt(b::assign("total", b::add(b::ident("total"), b::ident("i")))),
            ],
        ),
        b::var("n", b::int(0)),
        b::while_loop(
            b::lt(b::ident("n"), b::int(5)),
            vec![b::expr_stmt(b::assign("n", b::add(b::ident("n"), b::int(1))))],
        ),
        print(vec![b::ident("total"), b::ident("n")]),
        b::expr_stmt(b::ident("total")),
    ]));
    // 1 2 4 5 7 8 10 11 13 14
    assert_eq!(seen.outcome, Ok(Value::Int(75)));
}

#[test]
fn test_functions() {
    let seen = assert_backends_agree!(b::program(vec![
        b::func(
            "fib",
            &["n"],
            vec![
                b::if_stmt(b::lt(b::ident("n"), b::int(2)), vec![b::ret(b::ident("n"))]),
                b::ret(b::add(
                    b::call_named("fib", vec![b::sub(b::ident("n"), b::int(1))]),
                    b::call_named("fib", vec![b::sub(b::ident("n"), b::int(2))]),
                )),
            ],
        ),
        b::var("twice", b::lambda(&["x"], vec![b::ret(b::mul(b::ident("x"), b::int(2)))])),
        print(vec![b::call_named("twice", vec![b::call_named("fib", vec![b::int(10)])])]),
        b::expr_stmt(b::call_named("fib", vec![b::int(12)])),
    ]));
    assert_eq!(seen.output, "110\n");
    assert_eq!(seen.outcome, Ok(Value::Int(144)));
}

#[test]
fn test_call_errors() {
    let seen = assert_backends_agree!(b::program(vec![
        b::func("f", &["a"], vec![b::ret(b::ident("a"))]),
        b::expr_stmt(b::call_named("f", vec![b::int(1), b::int(2)])),
    ]));
    assert_eq!(
        seen.outcome,
        Err((
            "TypeError".to_string(),
            "wrong number of arguments: expected 1, got 2".to_string()
        ))
    );

    let seen = assert_backends_agree!(b::program(vec![
        b::var("g", b::int(3)),
        b::expr_stmt(b::call(b::ident("g"), vec![])),
    ]));
    assert_eq!(seen.outcome.unwrap_err().1, "not a function: INTEGER");
}

#[test]
fn test_thrown_exception() {
    let seen = assert_backends_agree!(b::program(vec![
        print(vec![b::str("before")]),
        b::throw(b::call_named("ValueError", vec![b::str("bad input")])),
        print(vec![b::str("after")]),
    ]));
    assert_eq!(seen.output, "before\n");
    assert_eq!(
        seen.outcome,
        Err(("ValueError".to_string(), "bad input".to_string()))
    );
}

#[test]
fn test_logic_operators() {
    let seen = assert_backends_agree!(b::program(vec![
        print(vec![
            b::and(b::int(1), b::str("")),
            b::or(b::int(0), b::str("x")),
            b::not(b::null()),
            b::eq(b::int(1), b::float(1.0)),
            b::not_eq(b::str("a"), b::int(1)),
        ]),
        b::expr_stmt(b::and(b::boolean(true), b::int(7))),
    ]));
    assert_eq!(seen.outcome, Ok(Value::Bool(true)));
}

#[test]
fn test_program_value_ignores_pops_inside_calls() {
    let helper = || {
        b::func(
            "f",
            &[],
            vec![b::expr_stmt(b::int(1)), b::ret(b::int(2))],
        )
    };
    let seen = assert_backends_agree!(b::program(vec![
        helper(),
        b::var("x", b::call_named("f", vec![])),
    ]));
    assert_eq!(seen.outcome, Ok(Value::Null));

    let seen = assert_backends_agree!(b::program(vec![
        helper(),
        b::expr_stmt(b::int(7)),
        b::if_stmt(b::boolean(false), vec![b::expr_stmt(b::int(5))]),
    ]));
    assert_eq!(seen.outcome, Ok(Value::Null));

    let seen = assert_backends_agree!(b::program(vec![
        helper(),
        b::if_else(
            b::call_named("f", vec![]),
            vec![b::expr_stmt(b::int(5)), b::expr_stmt(b::call_named("f", vec![]))],
            vec![],
        ),
    ]));
    assert_eq!(seen.outcome, Ok(Value::Int(2)));
}

#[test]
fn test_closures_made_in_a_while_body_share_one_binding() {
    let seen = assert_backends_agree!(b::program(vec![
        b::var("fs", b::array(vec![])),
        b::var("k", b::int(0)),
        b::while_loop(
            b::lt(b::ident("k"), b::int(3)),
            vec![
                b::var("j", b::ident("k")),
                b::expr_stmt(b::assign(
                    "fs",
                    b::call_named(
                        "append",
                        vec![b::ident("fs"), b::lambda(&[], vec![b::ret(b::ident("j"))])],
                    ),
                )),
                b::expr_stmt(b::assign("k", b::add(b::ident("k"), b::int(1)))),
            ],
        ),
        b::expr_stmt(b::call(b::index(b::ident("fs"), b::int(0)), vec![])),
    ]));
    assert_eq!(seen.outcome, Ok(Value::Int(2)));
}

#[test]
fn test_closures_over_for_body_variables_fall_back() {
    let program = b::program(vec![
        b::var("fs", b::array(vec![])),
        b::for_loop(
            Some(b::var("i", b::int(0))),
            Some(b::lt(b::ident("i"), b::int(3))),
            Some(b::expr_stmt(b::assign("i", b::add(b::ident("i"), b::int(1))))),
            vec![
                b::var("j", b::ident("i")),
                b::expr_stmt(b::assign(
                    "fs",
                    b::call_named(
                        "append",
                        vec![b::ident("fs"), b::lambda(&[], vec![b::ret(b::ident("j"))])],
                    ),
                )),
            ],
        ),
        print(vec![
            b::call(b::index(b::ident("fs"), b::int(0)), vec![]),
            b::call(b::index(b::ident("fs"), b::int(2)), vec![]),
        ]),
        b::expr_stmt(b::call(b::index(b::ident("fs"), b::int(0)), vec![])),
    ]);

    let mut vm = engine(Backend::Vm);
    assert!(matches!(vm.run(&program), Err(EngineError::Compile(_))));

    let auto = observe(Backend::Auto, &program);
    assert_eq!(auto, observe(Backend::Interp, &program));
    assert_eq!(auto.output, "0 2\n");
    assert_eq!(auto.outcome, Ok(Value::Int(0)));
}

#[test]
fn test_self_referential_array() {
    let seen = assert_backends_agree!(b::program(vec![
        b::var("a", b::array(vec![b::int(1), b::int(2)])),
        b::expr_stmt(b::assign_index(b::ident("a"), b::int(0), b::ident("a"))),
        print(vec![b::ident("a"), b::call_named("len", vec![b::ident("a")])]),
        b::expr_stmt(b::call_named("str", vec![b::ident("a")])),
    ]));
    assert_eq!(seen.output, "[[...], 2] 2\n");
    assert_eq!(seen.outcome, Ok(Value::from("[[...], 2]")));
}

// =============================================================================
// Generated programs
// =============================================================================

fn arb_expr() -> impl Strategy<Value = Expr> {
    let leaf = prop_oneof![
        (-50i64..50).prop_map(b::int),
        prop::sample::select(vec![0.0, 0.5, -1.25, 3.0]).prop_map(b::float),
        Just(b::ident("x")),
        any::<bool>().prop_map(b::boolean),
    ];
    leaf.prop_recursive(4, 24, 2, |inner| {
        let op = prop::sample::select(vec![
            b::add as fn(Expr, Expr) -> Expr,
            b::sub,
            b::mul,
            b::div,
            b::rem,
            b::lt,
            b::eq,
            b::gt_eq,
        ]);
        prop_oneof![
            (op, inner.clone(), inner.clone()).prop_map(|(op, l, r)| op(l, r)),
            inner.clone().prop_map(b::neg),
            inner.prop_map(b::not),
        ]
    })
}

/// Top-level statements around calls to a helper whose body has its own
/// expression statements.
fn arb_stmt() -> impl Strategy<Value = Stmt> {
    prop_oneof![
        arb_expr().prop_map(|e| b::var("x", e)),
        arb_expr().prop_map(b::expr_stmt),
        arb_expr().prop_map(|e| b::expr_stmt(b::call_named("f", vec![e]))),
        arb_expr().prop_map(|e| b::var("y", b::call_named("f", vec![e]))),
        (arb_expr(), arb_expr()).prop_map(|(c, e)| b::if_stmt(c, vec![b::expr_stmt(e)])),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn straight_line_programs_agree(x in -20i64..20, stmts in prop::collection::vec(arb_stmt(), 1..6)) {
        let mut body = vec![
            b::func(
                "f",
                &["a"],
                vec![
                    b::expr_stmt(b::mul(b::ident("a"), b::int(2))),
                    b::ret(b::add(b::ident("a"), b::int(1))),
                ],
            ),
            b::var("x", b::int(x)),
        ];
        body.extend(stmts);
        let program = b::program(body);
        let vm = observe(Backend::Vm, &program);
        let interp = observe(Backend::Interp, &program);
        prop_assert_eq!(vm, interp);
    }

    #[test]
    fn generated_expressions_agree(x in any::<i64>(), expr in arb_expr()) {
        let program = b::program(vec![
            b::var("x", b::int(x)),
            print(vec![expr.clone()]),
            b::expr_stmt(expr),
        ]);
        let vm = observe(Backend::Vm, &program);
        let interp = observe(Backend::Interp, &program);
        prop_assert_eq!(vm, interp);
    }

    #[test]
    fn counting_loops_agree(n in 0i64..300, step in -5i64..5) {
        let program = b::program(vec![
            b::var("acc", b::int(0)),
            b::var("i", b::int(0)),
            b::while_loop(
                b::lt(b::ident("i"), b::int(n)),
                vec![
                    b::expr_stmt(b::assign("acc", b::add(b::ident("acc"), b::mul(b::ident("i"), b::int(step))))),
                    b::expr_stmt(b::assign("i", b::add(b::ident("i"), b::int(1)))),
                ],
            ),
            print(vec![b::ident("acc")]),
            b::expr_stmt(b::ident("acc")),
        ]);
        let vm = observe(Backend::Vm, &program);
        let interp = observe(Backend::Interp, &program);
        prop_assert_eq!(vm, interp);
    }
}
