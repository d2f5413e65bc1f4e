// quill-core - Function application
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Calling functions, builtins, classes and bound methods.

use std::rc::Rc;

use quill_object::ast::{Expr, Position};
use quill_object::{Class, Env, Exception, Failure, FatalError, Function, Instance, Value};

use super::Interpreter;
use crate::error::Error;
use crate::signal::{Eval, Signal};

impl Interpreter {
    /// `callee(args...)`: every exception leaving the call gains a frame
    /// for this call site, unless a rethrow already put that frame on top.
    pub(super) fn eval_call(
        &mut self,
        function: &Expr,
        args: &[Expr],
        env: &Env,
        pos: Position,
    ) -> Eval {
        let callee = self.eval_expr(function, env)?;
        let args = self.eval_exprs(args, env)?;
        match self.call_value(&callee, args) {
            Err(Signal::Exception(mut ex)) => {
                let frame = self.frame_at(pos);
                if ex.stack_trace.last() != Some(&frame) {
                    ex.push_frame(frame);
                }
                Err(Signal::Exception(ex))
            }
            other => other,
        }
    }

    /// Apply a callable value to evaluated arguments.
    pub(super) fn call_value(&mut self, callee: &Value, args: Vec<Value>) -> Eval {
        match callee {
            Value::Function(func) => self.call_function(func, args),
            Value::Builtin(builtin) => builtin.call(&self.output, &args).map_err(Signal::from),
            Value::Class(class) => self.instantiate(class, args),
            Value::BoundMethod(bound) => {
                let mut with_self = Vec::with_capacity(args.len() + 1);
                with_self.push(Value::Instance(bound.receiver.clone()));
                with_self.extend(args);
                self.call_function(&bound.method, with_self)
            }
            other => Err(Exception::type_error(format!(
                "not a function: {}",
                other.type_name()
            ))
            .into()),
        }
    }

    pub(super) fn call_function(&mut self, func: &Rc<Function>, args: Vec<Value>) -> Eval {
        if args.len() != func.params.len() {
            return Err(Exception::type_error(format!(
                "wrong number of arguments: expected {}, got {}",
                func.params.len(),
                args.len()
            ))
            .into());
        }
        if self.call_stack.len() >= self.options.max_call_depth {
            return Err(Exception::runtime_error("maximum recursion depth exceeded").into());
        }

        let call_env = Env::enclosed(&func.env);
        for (param, arg) in func.params.iter().zip(args) {
            call_env.set(param.as_str(), arg);
        }

        self.call_stack.push(func.display_name().to_string());
        let result = self.eval_statements(&func.body.statements, &call_env);
        self.call_stack.pop();

        match result {
            Ok(_) => Ok(Value::Null),
            Err(Signal::Return(val)) => Ok(val),
            Err(Signal::Break) => Err(Error::BreakOutsideLoop.into()),
            Err(Signal::Continue) => Err(Error::ContinueOutsideLoop.into()),
            Err(other) => Err(other),
        }
    }

    /// Create an instance and run its `__init__` with `self` prepended.
    fn instantiate(&mut self, class: &Rc<Class>, args: Vec<Value>) -> Eval {
        let instance = Value::Instance(Rc::new(Instance::new(class.clone())));
        match class.member("__init__") {
            Some(Value::Function(init)) => {
                let mut with_self = Vec::with_capacity(args.len() + 1);
                with_self.push(instance.clone());
                with_self.extend(args);
                self.call_function(&init, with_self)?;
            }
            _ if !args.is_empty() => {
                return Err(Exception::type_error(format!(
                    "{}() takes no arguments, got {}",
                    class.name,
                    args.len()
                ))
                .into());
            }
            _ => {}
        }
        Ok(instance)
    }

    /// Call a value from outside any program, e.g. a callback held by an
    /// embedder.
    pub fn call(&mut self, callee: &Value, args: Vec<Value>) -> Result<Value, Failure> {
        match self.call_value(callee, args) {
            Ok(val) | Err(Signal::Return(val)) => Ok(val),
            Err(Signal::Exception(ex)) => Err(Failure::Exception(*ex)),
            Err(Signal::Break) => Err(Failure::Error(Error::BreakOutsideLoop.into())),
            Err(Signal::Continue) => Err(Failure::Error(Error::ContinueOutsideLoop.into())),
            Err(Signal::Error(err)) => Err(Failure::Error(FatalError::from(err))),
        }
    }
}
