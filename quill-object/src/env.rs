// quill-object - Environment for lexical scoping
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Environment for variable bindings with lexical scoping.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::value::Value;

/// A lexical environment for variable bindings.
///
/// Environments form a chain through outer references. Cloning an `Env`
/// clones the handle, so closures that capture it observe later writes.
///
/// # Examples
///
/// ```
/// use quill_object::{Env, Value};
///
/// // Create a root environment
/// let env = Env::new();
///
/// // Define a binding
/// env.set("x", Value::int(42));
/// assert_eq!(env.get("x"), Some(Value::int(42)));
///
/// // Enclosed environments see outer bindings
/// let inner = Env::enclosed(&env);
/// assert_eq!(inner.get("x"), Some(Value::int(42)));
///
/// // and can shadow them
/// inner.set("x", Value::int(100));
/// assert_eq!(inner.get("x"), Some(Value::int(100)));
/// assert_eq!(env.get("x"), Some(Value::int(42)));
/// ```
#[derive(Clone)]
pub struct Env {
    inner: Rc<RefCell<EnvInner>>,
}

struct EnvInner {
    store: FxHashMap<String, Value>,
    outer: Option<Env>,
}

impl Env {
    /// Create a new root environment.
    pub fn new() -> Self {
        Env {
            inner: Rc::new(RefCell::new(EnvInner {
                store: FxHashMap::default(),
                outer: None,
            })),
        }
    }

    /// Create an environment enclosed by `outer`.
    #[must_use]
    pub fn enclosed(outer: &Env) -> Self {
        Env {
            inner: Rc::new(RefCell::new(EnvInner {
                store: FxHashMap::default(),
                outer: Some(outer.clone()),
            })),
        }
    }

    /// Look up a name in this environment or the outer chain.
    /// Uses iterative traversal to avoid stack overflow on deep environments.
    pub fn get(&self, name: &str) -> Option<Value> {
        let mut current = self.clone();
        loop {
            let inner = current.inner.borrow();
            if let Some(val) = inner.store.get(name) {
                return Some(val.clone());
            }
            let outer = inner.outer.clone();
            drop(inner);
            match outer {
                Some(o) => current = o,
                None => return None,
            }
        }
    }

    /// Bind a name in this environment (not the outer chain).
    pub fn set(&self, name: impl Into<String>, val: Value) {
        self.inner.borrow_mut().store.insert(name.into(), val);
    }

    /// Rebind a name in the nearest scope that already defines it.
    /// Returns false when no scope in the chain has the name.
    pub fn update(&self, name: &str, val: Value) -> bool {
        let mut current = self.clone();
        loop {
            {
                let mut inner = current.inner.borrow_mut();
                if let Some(slot) = inner.store.get_mut(name) {
                    *slot = val;
                    return true;
                }
            }
            let outer = current.inner.borrow().outer.clone();
            match outer {
                Some(o) => current = o,
                None => return false,
            }
        }
    }

    /// Remove a binding from this environment only.
    pub fn delete(&self, name: &str) -> bool {
        self.inner.borrow_mut().store.remove(name).is_some()
    }

    #[must_use]
    pub fn has_local(&self, name: &str) -> bool {
        self.inner.borrow().store.contains_key(name)
    }

    pub fn outer(&self) -> Option<Env> {
        self.inner.borrow().outer.clone()
    }

    /// Names bound directly in this environment, sorted.
    pub fn local_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.borrow().store.keys().cloned().collect();
        names.sort();
        names
    }

    /// Whether two handles refer to the same scope.
    pub fn ptr_eq(&self, other: &Env) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for Env {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Env")
            .field("names", &inner.store.len())
            .field("has_outer", &inner.outer.is_some())
            .finish()
    }
}
