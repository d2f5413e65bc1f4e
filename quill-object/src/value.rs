// quill-object - Value types for Quill
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Core value type for Quill.
//!
//! `Value` is the closed set of runtime values shared by the tree-walking
//! interpreter and the bytecode VM.

use std::cell::RefCell;
use std::fmt::{self, Write as _};
use std::hash::{Hash, Hasher};
use std::ops::Range;
use std::rc::Rc;

use indexmap::IndexMap;
use rustc_hash::{FxBuildHasher, FxHasher};

use crate::ast::Block;
use crate::debug::DebugEntry;
use crate::env::Env;
use crate::exception::Exception;
use crate::output::Output;

/// Insertion-ordered map with the Fx hasher.
pub type FxIndexMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// Integers in this range are canonical shared instances: two equal
/// integers inside it are also identical under `is`.
pub const SMALL_INT_CACHE: Range<i64> = 0..256;

// ============================================================================
// Value
// ============================================================================

/// A Quill runtime value.
#[derive(Clone)]
pub enum Value {
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit floating point number
    Float(f64),
    /// Boolean true or false
    Bool(bool),
    /// Immutable string
    Str(Rc<str>),
    /// The null value
    Null,
    /// Mutable, shared, ordered sequence
    Array(Rc<RefCell<Vec<Value>>>),
    /// Association keyed by value equality
    Map(Rc<RefCell<MapObject>>),
    /// Association keyed by a precomputed hash of a String or Integer key
    Hash(Rc<RefCell<HashObject>>),
    /// User-defined function (closure over an environment)
    Function(Rc<Function>),
    /// Function compiled to bytecode
    CompiledFunction(Rc<CompiledFunction>),
    /// Native (Rust) function
    Builtin(Rc<Builtin>),
    /// Class with its method and attribute table
    Class(Rc<Class>),
    /// Instance of a class
    Instance(Rc<Instance>),
    /// Method bound to its receiver
    BoundMethod(Rc<BoundMethod>),
    /// Exception as a first-class value (bound by `catch`)
    Exception(Rc<Exception>),
    /// Imported module
    Module(Rc<Module>),
}

impl Value {
    pub fn int(n: i64) -> Self {
        Value::Int(n)
    }

    pub fn float(n: f64) -> Self {
        Value::Float(n)
    }

    pub fn bool(b: bool) -> Self {
        Value::Bool(b)
    }

    pub fn string(s: impl AsRef<str>) -> Self {
        Value::Str(Rc::from(s.as_ref()))
    }

    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    pub fn map(entries: Vec<(Value, Value)>) -> Self {
        let mut map = MapObject::default();
        for (k, v) in entries {
            map.insert(k, v);
        }
        Value::Map(Rc::new(RefCell::new(map)))
    }

    /// Build a Hash value. Returns the first unhashable key on failure.
    pub fn hash(entries: Vec<(Value, Value)>) -> Result<Self, Value> {
        let mut hash = HashObject::default();
        for (k, v) in entries {
            hash.insert(k, v)?;
        }
        Ok(Value::Hash(Rc::new(RefCell::new(hash))))
    }

    pub fn exception(ex: Exception) -> Self {
        Value::Exception(Rc::new(ex))
    }

    /// The type tag reported by `type()`.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "INTEGER",
            Value::Float(_) => "FLOAT",
            Value::Bool(_) => "BOOLEAN",
            Value::Str(_) => "STRING",
            Value::Null => "NULL",
            Value::Array(_) => "ARRAY",
            Value::Map(_) => "MAP",
            Value::Hash(_) => "HASH",
            Value::Function(_) => "FUNCTION",
            Value::CompiledFunction(_) => "COMPILED_FUNCTION",
            Value::Builtin(_) => "BUILTIN",
            Value::Class(_) => "CLASS",
            Value::Instance(_) => "INSTANCE",
            Value::BoundMethod(_) => "BOUND_METHOD",
            Value::Exception(_) => "EXCEPTION",
            Value::Module(_) => "MODULE",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// `null`, `false`, `0`, `0.0` and `""` are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(n) => *n != 0.0,
            Value::Str(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Language-level `==`.
    ///
    /// Primitives compare by value (Int and Float promote), containers and
    /// callables by identity, and values of unrelated kinds are unequal.
    pub fn equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) => (*a as f64) == *b,
            (Value::Float(a), Value::Int(b)) => *a == (*b as f64),
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Null, Value::Null) => true,
            _ => self.same_allocation(other),
        }
    }

    /// Deep structural equality, used for Map keys and membership tests.
    ///
    /// A pair of containers already being compared further up the
    /// recursion counts as equal, so self-referential values terminate.
    pub fn structural_eq(&self, other: &Value) -> bool {
        self.structural_eq_in(other, &mut Vec::new())
    }

    fn structural_eq_in(&self, other: &Value, active: &mut Vec<(*const (), *const ())>) -> bool {
        if let (Some(pa), Some(pb)) = (self.container_ptr(), other.container_ptr()) {
            if pa == pb || active.contains(&(pa, pb)) {
                return true;
            }
            active.push((pa, pb));
            let equal = self.containers_eq(other, active);
            active.pop();
            return equal;
        }
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::Exception(a), Value::Exception(b)) => {
                Rc::ptr_eq(a, b) || (a.kind == b.kind && a.message == b.message)
            }
            _ => self.same_allocation(other),
        }
    }

    fn containers_eq(&self, other: &Value, active: &mut Vec<(*const (), *const ())>) -> bool {
        match (self, other) {
            (Value::Array(a), Value::Array(b)) => {
                let (a, b) = (a.borrow(), b.borrow());
                a.len() == b.len()
                    && a.iter()
                        .zip(b.iter())
                        .all(|(x, y)| x.structural_eq_in(y, active))
            }
            (Value::Map(a), Value::Map(b)) => {
                let (a, b) = (a.borrow(), b.borrow());
                a.len() == b.len()
                    && a.entries.iter().all(|(k, v)| {
                        b.get(k)
                            .is_some_and(|other| other.structural_eq_in(v, active))
                    })
            }
            (Value::Hash(a), Value::Hash(b)) => {
                let (a, b) = (a.borrow(), b.borrow());
                a.len() == b.len()
                    && a.pairs.iter().all(|(k, pair)| {
                        b.pairs
                            .get(k)
                            .is_some_and(|other| other.value.structural_eq_in(&pair.value, active))
                    })
            }
            _ => false,
        }
    }

    /// Address of an Array, Map or Hash allocation.
    fn container_ptr(&self) -> Option<*const ()> {
        match self {
            Value::Array(rc) => Some(Rc::as_ptr(rc).cast::<()>()),
            Value::Map(rc) => Some(Rc::as_ptr(rc).cast::<()>()),
            Value::Hash(rc) => Some(Rc::as_ptr(rc).cast::<()>()),
            _ => None,
        }
    }

    /// Object identity (`is`).
    pub fn is_identical(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b && SMALL_INT_CACHE.contains(a),
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::Float(_), Value::Float(_)) => false,
            (Value::Str(a), Value::Str(b)) => Rc::ptr_eq(a, b),
            _ => self.same_allocation(other),
        }
    }

    fn same_allocation(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Map(a), Value::Map(b)) => Rc::ptr_eq(a, b),
            (Value::Hash(a), Value::Hash(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::CompiledFunction(a), Value::CompiledFunction(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => Rc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            (Value::BoundMethod(a), Value::BoundMethod(b)) => Rc::ptr_eq(a, b),
            (Value::Exception(a), Value::Exception(b)) => Rc::ptr_eq(a, b),
            (Value::Module(a), Value::Module(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// The hash key of a String or Integer value.
    pub fn hash_key(&self) -> Option<HashKey> {
        match self {
            Value::Int(n) => Some(HashKey::Int(*n)),
            Value::Str(s) => {
                let mut hasher = FxHasher::default();
                s.hash(&mut hasher);
                Some(HashKey::Str(hasher.finish()))
            }
            _ => None,
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.structural_eq(other)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Rc::from(s))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::array(items)
    }
}

// ============================================================================
// Map and Hash
// ============================================================================

/// Map keyed by structural equality.
#[derive(Debug, Clone, Default)]
pub struct MapObject {
    entries: Vec<(Value, Value)>,
}

impl MapObject {
    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k.structural_eq(key))
            .map(|(_, v)| v)
    }

    /// Replace the value of an equal key, or append a new entry.
    pub fn insert(&mut self, key: Value, value: Value) {
        match self.entries.iter_mut().find(|(k, _)| k.structural_eq(&key)) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn contains_key(&self, key: &Value) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }
}

/// Hash key of a hashable value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashKey {
    Int(i64),
    Str(u64),
}

/// Original key and value stored under a hash key.
#[derive(Debug, Clone)]
pub struct HashPair {
    pub key: Value,
    pub value: Value,
}

/// Map keyed by precomputed hash codes.
#[derive(Debug, Clone, Default)]
pub struct HashObject {
    pub pairs: FxIndexMap<HashKey, HashPair>,
}

impl HashObject {
    /// Look up a key. `Err` carries the key back when it is not hashable.
    pub fn get(&self, key: &Value) -> Result<Option<&Value>, Value> {
        let hk = key.hash_key().ok_or_else(|| key.clone())?;
        Ok(self.pairs.get(&hk).map(|pair| &pair.value))
    }

    /// Insert a pair. `Err` carries the key back when it is not hashable.
    pub fn insert(&mut self, key: Value, value: Value) -> Result<(), Value> {
        let hk = key.hash_key().ok_or_else(|| key.clone())?;
        self.pairs.insert(hk, HashPair { key, value });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.pairs.values().map(|pair| (&pair.key, &pair.value))
    }
}

// ============================================================================
// Callables
// ============================================================================

/// A user-defined function closing over its defining environment.
pub struct Function {
    pub name: Option<String>,
    pub params: Vec<String>,
    pub body: Rc<Block>,
    /// Captured environment, shared with every other closure over it
    pub env: Env,
}

impl Function {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<lambda>")
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#<fn {}/{}>", self.display_name(), self.params.len())
    }
}

/// A function body compiled to bytecode.
#[derive(Debug, Clone)]
pub struct CompiledFunction {
    pub name: Option<String>,
    pub instructions: Rc<[u8]>,
    pub num_locals: usize,
    pub num_params: usize,
    /// Offset-to-source table for this body
    pub debug: Rc<[DebugEntry]>,
}

/// Signature of native functions.
pub type NativeFn = dyn Fn(&Output, &[Value]) -> Result<Value, Exception>;

/// A native (Rust) function.
pub struct Builtin {
    name: String,
    func: Box<NativeFn>,
}

impl Builtin {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Output, &[Value]) -> Result<Value, Exception> + 'static,
    {
        Builtin {
            name: name.into(),
            func: Box::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn call(&self, out: &Output, args: &[Value]) -> Result<Value, Exception> {
        (self.func)(out, args)
    }
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#<builtin {}>", self.name)
    }
}

// ============================================================================
// Classes
// ============================================================================

/// A class: name plus methods and class variables.
#[derive(Debug)]
pub struct Class {
    pub name: String,
    pub members: RefCell<FxIndexMap<String, Value>>,
}

impl Class {
    pub fn new(name: impl Into<String>) -> Self {
        Class {
            name: name.into(),
            members: RefCell::new(FxIndexMap::default()),
        }
    }

    pub fn member(&self, name: &str) -> Option<Value> {
        self.members.borrow().get(name).cloned()
    }
}

/// An instance of a class with its own field table.
#[derive(Debug)]
pub struct Instance {
    pub class: Rc<Class>,
    pub fields: RefCell<FxIndexMap<String, Value>>,
}

impl Instance {
    pub fn new(class: Rc<Class>) -> Self {
        Instance {
            class,
            fields: RefCell::new(FxIndexMap::default()),
        }
    }

    pub fn field(&self, name: &str) -> Option<Value> {
        self.fields.borrow().get(name).cloned()
    }
}

/// A method paired with the instance it was read from.
#[derive(Debug)]
pub struct BoundMethod {
    pub receiver: Rc<Instance>,
    pub method: Rc<Function>,
}

/// An evaluated module.
#[derive(Debug)]
pub struct Module {
    pub path: String,
    pub env: Env,
}

// ============================================================================
// Display
// ============================================================================

/// Render `value` into `out`. `seen` holds the containers on the current
/// path; re-entering one prints `[...]` or `{...}`.
fn render(value: &Value, out: &mut String, seen: &mut Vec<*const ()>) {
    let Some(ptr) = value.container_ptr() else {
        let _ = write!(out, "{}", value);
        return;
    };
    if seen.contains(&ptr) {
        out.push_str(match value {
            Value::Array(_) => "[...]",
            _ => "{...}",
        });
        return;
    }
    seen.push(ptr);
    match value {
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.borrow().iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                render(item, out, seen);
            }
            out.push(']');
        }
        Value::Map(map) => render_entries(out, map.borrow().iter(), seen),
        Value::Hash(hash) => render_entries(out, hash.borrow().iter(), seen),
        _ => {}
    }
    seen.pop();
}

/// Entries sorted by their rendered key.
fn render_entries<'a>(
    out: &mut String,
    entries: impl Iterator<Item = (&'a Value, &'a Value)>,
    seen: &mut Vec<*const ()>,
) {
    let mut rendered: Vec<(String, String)> = entries
        .map(|(k, v)| {
            let mut key = String::new();
            render(k, &mut key, seen);
            let mut entry = format!("{}: ", key);
            render(v, &mut entry, seen);
            (key, entry)
        })
        .collect();
    rendered.sort();
    out.push('{');
    for (i, (_, entry)) in rendered.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(entry);
    }
    out.push('}');
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{}", n),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Str(s) => write!(f, "{}", s),
            Value::Null => write!(f, "null"),
            Value::Array(_) | Value::Map(_) | Value::Hash(_) => {
                let mut out = String::new();
                render(self, &mut out, &mut Vec::new());
                f.write_str(&out)
            }
            Value::Function(func) => match &func.name {
                Some(name) => write!(f, "func {}({})", name, func.params.join(", ")),
                None => write!(f, "func({})", func.params.join(", ")),
            },
            Value::CompiledFunction(cf) => match &cf.name {
                Some(name) => write!(
                    f,
                    "<compiled func {} params={} locals={}>",
                    name, cf.num_params, cf.num_locals
                ),
                None => write!(
                    f,
                    "<compiled func params={} locals={}>",
                    cf.num_params, cf.num_locals
                ),
            },
            Value::Builtin(b) => write!(f, "<builtin {}>", b.name()),
            Value::Class(c) => write!(f, "<class {}>", c.name),
            Value::Instance(inst) => write!(f, "<{} instance>", inst.class.name),
            Value::BoundMethod(bm) => write!(
                f,
                "<bound method {} of {}>",
                bm.method.display_name(),
                bm.receiver.class.name
            ),
            Value::Exception(ex) => write!(f, "{}: {}", ex.kind, ex.message),
            Value::Module(m) => write!(f, "<module {}>", m.path),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Float(n) => write!(f, "{:?}", n),
            other => write!(f, "{}", other),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
