// quill-object - Builtin function library
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Native functions available to every Quill program.
//!
//! The table keeps a fixed order so compiled code can refer to a builtin
//! by index; natives registered by an embedder are appended after the
//! standard set.

mod basic;
mod collections;
mod exceptions;
mod numeric;
mod strings;
mod time;

use std::cmp::Ordering;
use std::rc::Rc;

use rustc_hash::FxHashMap;

pub use self::basic::{join_display, length, type_of};
pub use self::exceptions::{message_of, thrown};

use crate::exception::{Exception, ExceptionKind};
use crate::output::Output;
use crate::value::{Builtin, Value};

/// Ordered, name-addressable set of builtins.
#[derive(Debug, Clone, Default)]
pub struct BuiltinTable {
    entries: Vec<Rc<Builtin>>,
    index: FxHashMap<String, usize>,
}

impl BuiltinTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard library, in its canonical order.
    pub fn standard() -> Self {
        let mut table = BuiltinTable::new();

        table.add("print", basic::print);
        table.add("len", basic::len);
        table.add("str", basic::str);
        table.add("int", basic::int);
        table.add("float", basic::float);
        table.add("bool", basic::bool);
        table.add("type", basic::r#type);
        table.add("input", basic::input);
        table.add("range", numeric::range);
        table.add("abs", numeric::abs);
        table.add("max", numeric::max);
        table.add("min", numeric::min);
        table.add("sum", numeric::sum);
        table.add("reverse", collections::reverse);
        table.add("sorted", collections::sorted);
        table.add("upper", strings::upper);
        table.add("lower", strings::lower);
        table.add("trim", strings::trim);
        table.add("append", collections::append);
        table.add("contains", collections::contains);
        table.add("pow", numeric::pow);
        table.add("clamp", numeric::clamp);
        table.add("now", time::now);
        table.add("timestamp", time::timestamp);
        table.add("keys", collections::keys);
        table.add("values", collections::values);
        table.add("items", collections::items);
        table.add("sort", collections::sort);

        table.add("Exception", exceptions::exception);
        for kind in ExceptionKind::ALL {
            table.register(exceptions::constructor(kind));
        }

        table
    }

    fn add<F>(&mut self, name: &str, func: F)
    where
        F: Fn(&Output, &[Value]) -> Result<Value, Exception> + 'static,
    {
        self.register(Builtin::new(name, func));
    }

    /// Add a builtin, replacing one with the same name in place.
    /// Returns its index.
    pub fn register(&mut self, builtin: Builtin) -> usize {
        let builtin = Rc::new(builtin);
        match self.index.get(builtin.name()) {
            Some(&idx) => {
                self.entries[idx] = builtin;
                idx
            }
            None => {
                let idx = self.entries.len();
                self.index.insert(builtin.name().to_string(), idx);
                self.entries.push(builtin);
                idx
            }
        }
    }

    pub fn lookup(&self, name: &str) -> Option<(usize, Rc<Builtin>)> {
        let idx = *self.index.get(name)?;
        Some((idx, self.entries[idx].clone()))
    }

    pub fn get(&self, idx: usize) -> Option<Rc<Builtin>> {
        self.entries.get(idx).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|b| b.name())
    }
}

// ============================================================================
// Argument helpers
// ============================================================================

fn expect_args(name: &str, args: &[Value], n: usize) -> Result<(), Exception> {
    if args.len() == n {
        Ok(())
    } else {
        Err(Exception::type_error(format!(
            "{}: expected {} argument{}, got {}",
            name,
            n,
            if n == 1 { "" } else { "s" },
            args.len()
        )))
    }
}

fn wrong_type(name: &str, what: &str, got: &Value) -> Exception {
    Exception::type_error(format!(
        "{}: argument must be {}, got {}",
        name,
        what,
        got.type_name()
    ))
}

/// Ordering used by `max`, `min`, `sorted` and `sort`: numbers by value
/// (with promotion), strings lexicographically, booleans false first.
pub fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Some(x.cmp(y)),
        (Value::Int(x), Value::Float(y)) => (*x as f64).partial_cmp(y),
        (Value::Float(x), Value::Int(y)) => x.partial_cmp(&(*y as f64)),
        (Value::Float(x), Value::Float(y)) => x.partial_cmp(y),
        (Value::Str(x), Value::Str(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

fn compare_or_raise(name: &str, a: &Value, b: &Value) -> Result<Ordering, Exception> {
    compare(a, b).ok_or_else(|| {
        Exception::type_error(format!(
            "{}: cannot compare {} with {}",
            name,
            a.type_name(),
            b.type_name()
        ))
    })
}
