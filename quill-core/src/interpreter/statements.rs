// quill-core - Statement evaluation
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Statements, blocks, loops and scope declarations.

use std::rc::Rc;

use quill_object::ast::{Block, Else, Expr, Position, Stmt, StmtKind};
use quill_object::{Env, Exception, ExceptionKind, Function, Value};

use super::Interpreter;
use crate::signal::{Eval, Signal};

/// How a loop body finished.
enum LoopStep {
    Next,
    Exit,
}

fn loop_step(result: Eval) -> Eval<LoopStep> {
    match result {
        Ok(_) | Err(Signal::Continue) => Ok(LoopStep::Next),
        Err(Signal::Break) => Ok(LoopStep::Exit),
        Err(other) => Err(other),
    }
}

impl Interpreter {
    pub(super) fn eval_stmt(&mut self, stmt: &Stmt, env: &Env) -> Eval {
        match &stmt.kind {
            StmtKind::Expr(expr) => self.eval_expr(expr, env),
            StmtKind::Var { name, value } => {
                let val = self.eval_expr(value, env)?;
                env.set(name.as_str(), val);
                Ok(Value::Null)
            }
            StmtKind::Return(value) => {
                let val = match value {
                    Some(expr) => self.eval_expr(expr, env)?,
                    None => Value::Null,
                };
                Err(Signal::Return(val))
            }
            StmtKind::Block(block) => self.eval_block(block, env),
            StmtKind::If {
                condition,
                consequence,
                alternative,
            } => self.eval_if(condition, consequence, alternative.as_ref(), env),
            StmtKind::While { condition, body } => self.eval_while(condition, body, env),
            StmtKind::For {
                init,
                condition,
                post,
                body,
            } => self.eval_for(init.as_deref(), condition.as_ref(), post.as_deref(), body, env),
            StmtKind::Break => Err(Signal::Break),
            StmtKind::Continue => Err(Signal::Continue),
            StmtKind::Function(decl) => {
                let func = Function {
                    name: Some(decl.name.clone()),
                    params: decl.params.clone(),
                    body: decl.body.clone(),
                    env: env.clone(),
                };
                env.set(decl.name.as_str(), Value::Function(Rc::new(func)));
                Ok(Value::Null)
            }
            StmtKind::Class(decl) => self.eval_class(decl, env),
            StmtKind::Try {
                body,
                catches,
                finally,
            } => self.eval_try(body, catches, finally.as_ref(), env),
            StmtKind::Throw(value) => self.eval_throw(value, stmt.pos, env),
            StmtKind::With {
                context,
                binding,
                body,
            } => self.eval_with(context, binding.as_deref(), body, env),
            StmtKind::Import { path, alias } => {
                self.eval_import(path, alias.as_deref(), env, stmt.pos)
            }
            StmtKind::Assert { condition, message } => {
                self.eval_assert(condition, message.as_ref(), env, stmt.pos)
            }
            StmtKind::Global(names) => {
                for name in names {
                    if !self.root.has_local(name) {
                        self.root.set(name.as_str(), Value::Null);
                    }
                }
                Ok(Value::Null)
            }
            StmtKind::Nonlocal(names) => {
                for name in names {
                    if !self.has_enclosing_binding(name, env) {
                        return Err(self.raise(
                            Exception::runtime_error(format!(
                                "no binding for nonlocal '{}' found",
                                name
                            )),
                            stmt.pos,
                        ));
                    }
                }
                Ok(Value::Null)
            }
            StmtKind::Del(name) => {
                if env.delete(name) {
                    Ok(Value::Null)
                } else {
                    Err(self.raise(
                        Exception::of(
                            ExceptionKind::NameError,
                            format!("cannot delete undefined name: {}", name),
                        ),
                        stmt.pos,
                    ))
                }
            }
        }
    }

    /// Evaluate a block in a fresh scope.
    pub(super) fn eval_block(&mut self, block: &Block, env: &Env) -> Eval {
        let scope = Env::enclosed(env);
        self.eval_statements(&block.statements, &scope)
    }

    /// Evaluate statements in `env` itself; the value is the last one's.
    pub(super) fn eval_statements(&mut self, stmts: &[Stmt], env: &Env) -> Eval {
        let mut result = Value::Null;
        for stmt in stmts {
            result = self.eval_stmt(stmt, env)?;
        }
        Ok(result)
    }

    fn eval_if(
        &mut self,
        condition: &Expr,
        consequence: &Block,
        alternative: Option<&Else>,
        env: &Env,
    ) -> Eval {
        if self.eval_expr(condition, env)?.is_truthy() {
            return self.eval_block(consequence, env);
        }
        match alternative {
            Some(Else::Block(block)) => self.eval_block(block, env),
            Some(Else::If(stmt)) => self.eval_stmt(stmt, env),
            None => Ok(Value::Null),
        }
    }

    /// `while` bodies share the enclosing scope.
    fn eval_while(&mut self, condition: &Expr, body: &Block, env: &Env) -> Eval {
        while self.eval_expr(condition, env)?.is_truthy() {
            let result = self.eval_statements(&body.statements, env);
            if let LoopStep::Exit = loop_step(result)? {
                break;
            }
        }
        Ok(Value::Null)
    }

    fn eval_for(
        &mut self,
        init: Option<&Stmt>,
        condition: Option<&Expr>,
        post: Option<&Stmt>,
        body: &Block,
        env: &Env,
    ) -> Eval {
        let loop_env = Env::enclosed(env);
        if let Some(init) = init {
            self.eval_stmt(init, &loop_env)?;
        }
        loop {
            if let Some(cond) = condition
                && !self.eval_expr(cond, &loop_env)?.is_truthy()
            {
                break;
            }
            let result = self.eval_block(body, &loop_env);
            if let LoopStep::Exit = loop_step(result)? {
                break;
            }
            if let Some(post) = post {
                self.eval_stmt(post, &loop_env)?;
            }
        }
        Ok(Value::Null)
    }

    fn eval_assert(
        &mut self,
        condition: &Expr,
        message: Option<&Expr>,
        env: &Env,
        pos: Position,
    ) -> Eval {
        if self.eval_expr(condition, env)?.is_truthy() {
            return Ok(Value::Null);
        }
        let text = match message {
            Some(expr) => self.eval_expr(expr, env)?.to_string(),
            None => "assertion failed".to_string(),
        };
        Err(self.raise(Exception::of(ExceptionKind::AssertionError, text), pos))
    }

    /// Whether a scope between `env` and the root defines `name`.
    fn has_enclosing_binding(&self, name: &str, env: &Env) -> bool {
        let mut scope = env.outer();
        while let Some(current) = scope {
            if current.ptr_eq(&self.root) {
                return false;
            }
            if current.has_local(name) {
                return true;
            }
            scope = current.outer();
        }
        false
    }
}
