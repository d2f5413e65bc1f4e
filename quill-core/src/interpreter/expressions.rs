// quill-core - Expression evaluation
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Literals, operators, indexing and assignment.

use std::rc::Rc;

use quill_object::ast::{AssignTarget, Expr, ExprKind, InfixOp, Position, PrefixOp};
use quill_object::{Env, Exception, Function, Value, index, ops};

use super::Interpreter;
use crate::signal::Eval;

impl Interpreter {
    pub(super) fn eval_expr(&mut self, expr: &Expr, env: &Env) -> Eval {
        match &expr.kind {
            ExprKind::Int(n) => Ok(Value::Int(*n)),
            ExprKind::Float(n) => Ok(Value::Float(*n)),
            ExprKind::Str(s) => Ok(Value::string(s)),
            ExprKind::Bool(b) => Ok(Value::Bool(*b)),
            ExprKind::Null => Ok(Value::Null),
            ExprKind::Ident(name) => self.resolve(name, env, expr.pos),
            ExprKind::Prefix { op, right } => {
                let val = self.eval_expr(right, env)?;
                match op {
                    PrefixOp::Neg => ops::negate(&val).map_err(|ex| self.raise(ex, expr.pos)),
                    PrefixOp::Not => Ok(ops::not(&val)),
                }
            }
            ExprKind::Infix { op, left, right } => {
                self.eval_infix(*op, left, right, env, expr.pos)
            }
            ExprKind::Assign { target, value } => self.eval_assign(target, value, env, expr.pos),
            ExprKind::Call { function, args } => self.eval_call(function, args, env, expr.pos),
            ExprKind::Index { left, index } => {
                let container = self.eval_expr(left, env)?;
                let key = self.eval_expr(index, env)?;
                index::get(&container, &key).map_err(|ex| self.raise(ex, expr.pos))
            }
            ExprKind::Member { object, name } => {
                let target = self.eval_expr(object, env)?;
                self.get_member(&target, name, expr.pos)
            }
            ExprKind::Array(items) => {
                let values = self.eval_exprs(items, env)?;
                Ok(Value::array(values))
            }
            ExprKind::Map(entries) => {
                let pairs = self.eval_pairs(entries, env)?;
                Ok(Value::map(pairs))
            }
            ExprKind::Hash(entries) => {
                let pairs = self.eval_pairs(entries, env)?;
                Value::hash(pairs).map_err(|key| {
                    self.raise(
                        Exception::type_error(format!(
                            "unusable as hash key: {}",
                            key.type_name()
                        )),
                        expr.pos,
                    )
                })
            }
            ExprKind::Function(lit) => Ok(Value::Function(Rc::new(Function {
                name: lit.name.clone(),
                params: lit.params.clone(),
                body: lit.body.clone(),
                env: env.clone(),
            }))),
        }
    }

    /// Evaluate expressions left to right.
    pub(super) fn eval_exprs(&mut self, exprs: &[Expr], env: &Env) -> Eval<Vec<Value>> {
        let mut values = Vec::with_capacity(exprs.len());
        for expr in exprs {
            values.push(self.eval_expr(expr, env)?);
        }
        Ok(values)
    }

    fn eval_pairs(&mut self, entries: &[(Expr, Expr)], env: &Env) -> Eval<Vec<(Value, Value)>> {
        let mut pairs = Vec::with_capacity(entries.len());
        for (k, v) in entries {
            let key = self.eval_expr(k, env)?;
            let val = self.eval_expr(v, env)?;
            pairs.push((key, val));
        }
        Ok(pairs)
    }

    fn eval_infix(
        &mut self,
        op: InfixOp,
        left: &Expr,
        right: &Expr,
        env: &Env,
        pos: Position,
    ) -> Eval {
        match op {
            InfixOp::And => {
                if !self.eval_expr(left, env)?.is_truthy() {
                    return Ok(Value::Bool(false));
                }
                Ok(Value::Bool(self.eval_expr(right, env)?.is_truthy()))
            }
            InfixOp::Or => {
                if self.eval_expr(left, env)?.is_truthy() {
                    return Ok(Value::Bool(true));
                }
                Ok(Value::Bool(self.eval_expr(right, env)?.is_truthy()))
            }
            InfixOp::In => {
                let needle = self.eval_expr(left, env)?;
                let haystack = self.eval_expr(right, env)?;
                membership(&needle, &haystack)
                    .map(Value::Bool)
                    .map_err(|ex| self.raise(ex, pos))
            }
            InfixOp::Is => {
                let l = self.eval_expr(left, env)?;
                let r = self.eval_expr(right, env)?;
                Ok(Value::Bool(l.is_identical(&r)))
            }
            _ => {
                let l = self.eval_expr(left, env)?;
                let r = self.eval_expr(right, env)?;
                match op.as_binary() {
                    Some(bin) => ops::binary(bin, &l, &r).map_err(|ex| self.raise(ex, pos)),
                    None => Err(self.raise(
                        Exception::type_error(format!("unknown operator: {}", op)),
                        pos,
                    )),
                }
            }
        }
    }

    /// Assignment evaluates to the assigned value.
    fn eval_assign(
        &mut self,
        target: &AssignTarget,
        value: &Expr,
        env: &Env,
        pos: Position,
    ) -> Eval {
        match target {
            AssignTarget::Name(name) => {
                let val = self.eval_expr(value, env)?;
                if !env.update(name, val.clone()) {
                    env.set(name.as_str(), val.clone());
                }
                Ok(val)
            }
            AssignTarget::Index { object, index } => {
                let container = self.eval_expr(object, env)?;
                let key = self.eval_expr(index, env)?;
                let val = self.eval_expr(value, env)?;
                index::set(&container, &key, val.clone()).map_err(|ex| self.raise(ex, pos))?;
                Ok(val)
            }
            AssignTarget::Member { object, name } => {
                let target = self.eval_expr(object, env)?;
                let val = self.eval_expr(value, env)?;
                self.set_member(&target, name, val.clone(), pos)?;
                Ok(val)
            }
        }
    }
}

/// `needle in haystack`
fn membership(needle: &Value, haystack: &Value) -> Result<bool, Exception> {
    match haystack {
        Value::Array(items) => Ok(items.borrow().iter().any(|v| v.structural_eq(needle))),
        Value::Map(map) => Ok(map.borrow().contains_key(needle)),
        Value::Hash(hash) => hash
            .borrow()
            .get(needle)
            .map(|found| found.is_some())
            .map_err(|key| {
                Exception::type_error(format!("unusable as hash key: {}", key.type_name()))
            }),
        Value::Str(s) => match needle {
            Value::Str(sub) => Ok(s.contains(&**sub)),
            other => Err(Exception::type_error(format!(
                "'in <string>' requires string as left operand, not {}",
                other.type_name()
            ))),
        },
        other => Err(Exception::type_error(format!(
            "argument of type {} is not iterable",
            other.type_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership() {
        let arr = Value::array(vec![Value::array(vec![Value::int(1)])]);
        assert_eq!(membership(&Value::array(vec![Value::int(1)]), &arr), Ok(true));
        assert_eq!(
            membership(&Value::string("ell"), &Value::string("hello")),
            Ok(true)
        );
        let hash = Value::hash(vec![(Value::string("k"), Value::Null)]).unwrap();
        assert_eq!(membership(&Value::string("k"), &hash), Ok(true));
        assert!(membership(&Value::float(1.0), &hash).is_err());
        assert!(membership(&Value::int(1), &Value::int(1)).is_err());
    }
}
