// quill-core - Classes and member access
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Class declarations and `.` access on instances, classes, modules and
//! exceptions.

use std::rc::Rc;

use quill_object::ast::{ClassDecl, ClassMember, Position};
use quill_object::{BoundMethod, Class, Env, Exception, Function, Value};

use super::Interpreter;
use crate::signal::Eval;

impl Interpreter {
    /// Methods close over a class-body scope; class variables are
    /// evaluated there in declaration order.
    pub(super) fn eval_class(&mut self, decl: &ClassDecl, env: &Env) -> Eval {
        let class = Rc::new(Class::new(decl.name.as_str()));
        let class_env = Env::enclosed(env);

        for member in &decl.members {
            match member {
                ClassMember::Method(method) => {
                    let func = Value::Function(Rc::new(Function {
                        name: Some(method.name.clone()),
                        params: method.params.clone(),
                        body: method.body.clone(),
                        env: class_env.clone(),
                    }));
                    class.members.borrow_mut().insert(method.name.clone(), func);
                }
                ClassMember::Variable { name, value } => {
                    let val = self.eval_expr(value, &class_env)?;
                    class_env.set(name.as_str(), val.clone());
                    class.members.borrow_mut().insert(name.clone(), val);
                }
            }
        }

        env.set(decl.name.as_str(), Value::Class(class));
        Ok(Value::Null)
    }

    pub(super) fn get_member(&self, target: &Value, name: &str, pos: Position) -> Eval {
        let found = match target {
            Value::Instance(instance) => instance.field(name).or_else(|| {
                instance.class.member(name).map(|member| match member {
                    Value::Function(method) => Value::BoundMethod(Rc::new(BoundMethod {
                        receiver: instance.clone(),
                        method,
                    })),
                    other => other,
                })
            }),
            Value::Class(class) => class.member(name),
            Value::Module(module) => {
                if module.env.has_local(name) {
                    module.env.get(name)
                } else {
                    None
                }
            }
            Value::Exception(ex) => match name {
                "type" => Some(Value::string(ex.kind.as_str())),
                "message" => Some(Value::string(&ex.message)),
                "cause" => Some(match &ex.cause {
                    Some(cause) => Value::exception((**cause).clone()),
                    None => Value::Null,
                }),
                "stackTrace" => Some(Value::array(
                    ex.stack_trace
                        .iter()
                        .map(|frame| Value::from(frame.to_string()))
                        .collect(),
                )),
                _ => None,
            },
            _ => None,
        };
        found.ok_or_else(|| self.raise(no_attribute(target, name), pos))
    }

    pub(super) fn set_member(
        &self,
        target: &Value,
        name: &str,
        value: Value,
        pos: Position,
    ) -> Eval<()> {
        match target {
            Value::Instance(instance) => {
                instance.fields.borrow_mut().insert(name.to_string(), value);
                Ok(())
            }
            Value::Class(class) => {
                class.members.borrow_mut().insert(name.to_string(), value);
                Ok(())
            }
            other => Err(self.raise(
                Exception::attribute_error(format!(
                    "cannot set attribute '{}' on {}",
                    name,
                    other.type_name()
                )),
                pos,
            )),
        }
    }
}

fn no_attribute(target: &Value, name: &str) -> Exception {
    let owner = match target {
        Value::Instance(instance) => format!("'{}' object", instance.class.name),
        Value::Class(class) => format!("class '{}'", class.name),
        Value::Module(module) => format!("module '{}'", module.path),
        other => other.type_name().to_string(),
    };
    Exception::attribute_error(format!("{} has no attribute '{}'", owner, name))
}
