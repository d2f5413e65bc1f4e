// quill-core - Module loading
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Resolution and caching of imported modules.
//!
//! Parsing is the embedder's business: a [`ModuleLoader`] turns an import
//! path into a [`Program`]. Evaluated modules are cached by path in a
//! [`ModuleRegistry`] shared by every interpreter spawned for an import.

use std::cell::RefCell;
use std::rc::Rc;

use quill_object::ast::Program;
use quill_object::Module;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::LoadError;

/// Resolves import paths to parsed programs.
pub trait ModuleLoader {
    fn load(&self, path: &str) -> Result<Program, LoadError>;
}

/// A loader over an in-memory path -> program table.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    programs: FxHashMap<String, Program>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_module(mut self, path: impl Into<String>, program: Program) -> Self {
        self.insert(path, program);
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, program: Program) {
        let path = path.into();
        let program = if program.file.is_empty() {
            program.with_file(path.clone())
        } else {
            program
        };
        self.programs.insert(path, program);
    }
}

impl ModuleLoader for MemoryLoader {
    fn load(&self, path: &str) -> Result<Program, LoadError> {
        self.programs
            .get(path)
            .cloned()
            .ok_or_else(|| LoadError::NotFound(path.to_string()))
    }
}

#[derive(Default)]
struct RegistryInner {
    loaded: FxHashMap<String, Rc<Module>>,
    loading: FxHashSet<String>,
}

/// Cache of evaluated modules. Clones share the cache.
#[derive(Clone, Default)]
pub struct ModuleRegistry {
    inner: Rc<RefCell<RegistryInner>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<Rc<Module>> {
        self.inner.borrow().loaded.get(path).cloned()
    }

    /// Mark `path` as being evaluated. False if it already is (a cycle).
    pub fn begin(&self, path: &str) -> bool {
        self.inner.borrow_mut().loading.insert(path.to_string())
    }

    /// Finish evaluating `path`, caching the module on success.
    pub fn finish(&self, path: &str, module: Option<Rc<Module>>) {
        let mut inner = self.inner.borrow_mut();
        inner.loading.remove(path);
        if let Some(module) = module {
            inner.loaded.insert(path.to_string(), module);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().loaded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().loaded.is_empty()
    }
}

impl std::fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("ModuleRegistry")
            .field("loaded", &inner.loaded.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_object::Env;

    #[test]
    fn test_memory_loader() {
        let loader = MemoryLoader::new().with_module("lib", Program::default());
        assert_eq!(loader.load("lib").map(|p| p.file), Ok("lib".to_string()));
        assert_eq!(
            loader.load("nope").map(|p| p.file),
            Err(LoadError::NotFound("nope".to_string()))
        );
    }

    #[test]
    fn test_registry_cycle_detection() {
        let registry = ModuleRegistry::new();
        assert!(registry.begin("a"));
        assert!(!registry.begin("a"));
        registry.finish(
            "a",
            Some(Rc::new(Module {
                path: "a".to_string(),
                env: Env::new(),
            })),
        );
        assert!(registry.begin("a"));
        assert_eq!(registry.len(), 1);
        assert!(registry.clone().get("a").is_some());
    }
}
