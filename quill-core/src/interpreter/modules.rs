// quill-core - Imports
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! `import "path"` and `import "path" as name`.

use std::rc::Rc;

use quill_object::ast::Position;
use quill_object::{Env, Exception, Module, Value};

use super::{Interpreter, InterpreterOptions};
use crate::error::LoadError;
use crate::signal::Eval;

impl Interpreter {
    pub(super) fn eval_import(
        &mut self,
        path: &str,
        alias: Option<&str>,
        env: &Env,
        pos: Position,
    ) -> Eval {
        let module = match self.modules.get(path) {
            Some(module) => {
                tracing::debug!(path, "module cache hit");
                module
            }
            None => self.load_module(path, env).map_err(|ex| self.raise(ex, pos))?,
        };

        match alias {
            Some(name) => env.set(name, Value::Module(module)),
            None => {
                for name in module.env.local_names() {
                    if let Some(val) = module.env.get(&name) {
                        env.set(name, val);
                    }
                }
            }
        }
        Ok(Value::Null)
    }

    /// Evaluate a module in a nested scope with its own interpreter.
    fn load_module(&mut self, path: &str, env: &Env) -> Result<Rc<Module>, Exception> {
        if !self.modules.begin(path) {
            return Err(Exception::runtime_error(format!(
                "import: circular import of \"{}\"",
                path
            )));
        }

        let loaded = self.evaluate_module(path, env);
        self.modules.finish(path, loaded.as_ref().ok().cloned());
        loaded
    }

    fn evaluate_module(&mut self, path: &str, env: &Env) -> Result<Rc<Module>, Exception> {
        let program = self
            .loader
            .as_ref()
            .ok_or(LoadError::NoLoader)
            .and_then(|loader| loader.load(path))
            .map_err(|err| {
                Exception::runtime_error(format!(
                    "import: cannot load module \"{}\": {}",
                    path, err
                ))
            })?;

        tracing::debug!(path, statements = program.statements.len(), "importing module");

        let module_env = Env::enclosed(env);
        let mut child = Interpreter::with_env(
            InterpreterOptions {
                file: path.to_string(),
                ..self.options.clone()
            },
            module_env.clone(),
        )
        .with_output(self.output.clone())
        .with_builtins(self.builtins.clone());
        child.modules = self.modules.clone();
        child.loader = self.loader.clone();

        child.interpret(&program).map_err(|failure| {
            Exception::runtime_error(format!(
                "import: runtime error in \"{}\": {}",
                path,
                failure.message()
            ))
        })?;

        Ok(Rc::new(Module {
            path: path.to_string(),
            env: module_env,
        }))
    }
}
