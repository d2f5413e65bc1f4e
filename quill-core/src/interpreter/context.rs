// quill-core - Context managers
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! `with ctx as name { ... }`

use std::rc::Rc;

use quill_object::ast::{Block, Expr};
use quill_object::{BoundMethod, Env, Exception, Value};

use super::Interpreter;
use crate::signal::{Eval, Signal};

/// Look up a context-manager hook. Instance methods come back bound.
fn hook(ctx: &Value, name: &str) -> Option<Value> {
    match ctx {
        Value::Instance(instance) => instance.class.member(name).map(|member| match member {
            Value::Function(method) => Value::BoundMethod(Rc::new(BoundMethod {
                receiver: instance.clone(),
                method,
            })),
            other => other,
        }),
        Value::Class(class) => class.member(name),
        _ => None,
    }
}

/// Whether `__exit__` wants the `(type, exception, trace)` triple.
fn takes_exception_info(exit: &Value) -> bool {
    match exit {
        Value::BoundMethod(bound) => bound.method.params.len() == 4,
        Value::Function(func) => func.params.len() == 3,
        _ => false,
    }
}

fn exception_info(ex: Option<&Exception>) -> Vec<Value> {
    match ex {
        Some(ex) => vec![
            Value::string(&ex.kind),
            Value::exception(ex.clone()),
            Value::array(
                ex.stack_trace
                    .iter()
                    .map(|frame| Value::from(frame.to_string()))
                    .collect(),
            ),
        ],
        None => vec![Value::Null, Value::Null, Value::Null],
    }
}

impl Interpreter {
    pub(super) fn eval_with(
        &mut self,
        context: &Expr,
        binding: Option<&str>,
        body: &Block,
        env: &Env,
    ) -> Eval {
        let ctx = self.eval_expr(context, env)?;
        let scope = Env::enclosed(env);
        if let Some(name) = binding {
            scope.set(name, ctx.clone());
        }

        if let Some(enter) = hook(&ctx, "__enter__") {
            let entered = self.call_value(&enter, Vec::new())?;
            if let Some(name) = binding {
                scope.set(name, entered);
            }
        }

        let result = self.eval_statements(&body.statements, &scope);

        let Some(exit) = hook(&ctx, "__exit__") else {
            return result;
        };
        let pending = match &result {
            Err(Signal::Exception(ex)) => Some(&**ex),
            _ => None,
        };
        let args = if takes_exception_info(&exit) {
            exception_info(pending)
        } else {
            Vec::new()
        };
        let suppress = matches!(self.call_value(&exit, args)?, Value::Bool(true));

        if suppress && pending.is_some() {
            tracing::debug!("exception suppressed by __exit__");
            return Ok(Value::Null);
        }
        result
    }
}
