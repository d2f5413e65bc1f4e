// quill-object - Indexing
// Copyright (c) 2025 Tom Waddington. MIT licensed.

//! Index reads and writes shared by both backends.
//!
//! Reads are forgiving (a miss yields `null`), writes are strict.

use crate::exception::Exception;
use crate::value::Value;

fn unusable_key(key: &Value) -> Exception {
    Exception::type_error(format!("unusable as hash key: {}", key.type_name()))
}

/// `container[index]`
pub fn get(container: &Value, index: &Value) -> Result<Value, Exception> {
    match (container, index) {
        (Value::Array(items), Value::Int(i)) => {
            let items = items.borrow();
            Ok(usize::try_from(*i)
                .ok()
                .and_then(|i| items.get(i).cloned())
                .unwrap_or(Value::Null))
        }
        (Value::Str(s), Value::Int(i)) => Ok(usize::try_from(*i)
            .ok()
            .and_then(|i| s.chars().nth(i))
            .map(|c| Value::from(c.to_string()))
            .unwrap_or(Value::Null)),
        (Value::Map(map), key) => Ok(map.borrow().get(key).cloned().unwrap_or(Value::Null)),
        (Value::Hash(hash), key) => {
            let hash = hash.borrow();
            let found = hash.get(key).map_err(|k| unusable_key(&k))?;
            Ok(found.cloned().unwrap_or(Value::Null))
        }
        _ => Err(Exception::type_error(format!(
            "index operator not supported: {}[{}]",
            container.type_name(),
            index.type_name()
        ))),
    }
}

/// `container[index] = value`
pub fn set(container: &Value, index: &Value, value: Value) -> Result<(), Exception> {
    match container {
        Value::Array(items) => {
            let Value::Int(i) = index else {
                return Err(Exception::type_error(format!(
                    "array index must be INTEGER, got {}",
                    index.type_name()
                )));
            };
            let mut items = items.borrow_mut();
            match usize::try_from(*i).ok().filter(|&i| i < items.len()) {
                Some(slot) => {
                    items[slot] = value;
                    Ok(())
                }
                None => Err(Exception::index_error(format!(
                    "array index out of range: {}",
                    i
                ))),
            }
        }
        Value::Map(map) => {
            map.borrow_mut().insert(index.clone(), value);
            Ok(())
        }
        Value::Hash(hash) => hash
            .borrow_mut()
            .insert(index.clone(), value)
            .map_err(|k| unusable_key(&k)),
        _ => Err(Exception::type_error(format!(
            "index assignment not supported: {}",
            container.type_name()
        ))),
    }
}
