// quill-core - Exception handling
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! `try`/`catch`/`finally` and `throw`.

use quill_object::ast::{Block, CatchClause, Expr, Position};
use quill_object::builtins::thrown;
use quill_object::{Env, Exception, Value};

use super::Interpreter;
use crate::signal::{Eval, Signal};

fn matches(clause: &CatchClause, ex: &Exception) -> bool {
    match &clause.exception_type {
        None => true,
        Some(kind) => ex.kind == *kind,
    }
}

impl Interpreter {
    pub(super) fn eval_try(
        &mut self,
        body: &Block,
        catches: &[CatchClause],
        finally: Option<&Block>,
        env: &Env,
    ) -> Eval {
        let mut result = self.eval_block(body, env);

        if let Err(Signal::Exception(pending)) = result {
            let mut pending = pending;
            let mut handled = None;
            for clause in catches {
                if !matches(clause, &pending) {
                    continue;
                }
                let scope = Env::enclosed(env);
                if let Some(name) = &clause.variable {
                    scope.set(name.as_str(), Value::exception((*pending).clone()));
                }
                match self.eval_statements(&clause.body.statements, &scope) {
                    Err(Signal::Exception(raised)) => pending = raised,
                    other => {
                        handled = Some(other);
                        break;
                    }
                }
            }
            result = handled.unwrap_or(Err(Signal::Exception(pending)));
        }

        if let Some(finally) = finally {
            self.eval_block(finally, env)?;
        }
        result
    }

    /// `throw e`: exceptions are re-raised as is, anything else becomes a
    /// RuntimeError.
    pub(super) fn eval_throw(&mut self, value: &Expr, pos: Position, env: &Env) -> Eval {
        let val = self.eval_expr(value, env)?;
        Err(self.raise(thrown(&val), pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_object::ExceptionKind;
    use quill_object::ast::build;

    #[test]
    fn test_catch_matching() {
        let ex = Exception::of(ExceptionKind::ValueError, "bad");
        assert!(matches(&build::catch(None, None, vec![]), &ex));
        assert!(matches(&build::catch(Some("ValueError"), None, vec![]), &ex));
        assert!(!matches(&build::catch(Some("TypeError"), None, vec![]), &ex));
    }
}
