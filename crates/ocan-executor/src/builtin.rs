// SPDX-License-Identifier: MIT OR Apache-2.0
//! The small set of built-in primitive methods the executor understands
//! without consulting a [`crate::Target`]'s method table — the minimum
//! needed for scenario 1 of spec.md §8 (`handle.bump(5).toString()`).

use ocan_core::{HeapValue, Value};

use crate::error::ExecError;

/// A built-in method name the executor recognizes on primitive cursors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    /// `.toString()` on a number, string, boolean, or bigint.
    ToString,
}

/// Resolve a property name to a [`Builtin`], if any value in this domain
/// would answer to it.
pub fn resolve(name: &str) -> Option<Builtin> {
    match name {
        "toString" => Some(Builtin::ToString),
        _ => None,
    }
}

/// Invoke a built-in against the value it was looked up on.
pub fn call(builtin: Builtin, owner: &Value, at_index: usize) -> Result<Value, ExecError> {
    match builtin {
        Builtin::ToString => to_string(owner).ok_or(ExecError::NotCallable {
            at_index,
            type_of: type_of(owner),
        }),
    }
}

fn to_string(value: &Value) -> Option<Value> {
    let text = match value {
        Value::Number(n) => format_number(*n),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::BigInt(s) => s.clone(),
        Value::Undefined => "undefined".to_string(),
        Value::Null => "null".to_string(),
        Value::Ref(heap) => match &*heap.borrow() {
            HeapValue::Array(_) => return None,
            HeapValue::Object(_) => "[object Object]".to_string(),
            HeapValue::Url(u) => u.clone(),
            HeapValue::Date(ms) => ms.to_string(),
            HeapValue::Regex { source, flags } => format!("/{source}/{flags}"),
            _ => return None,
        },
    };
    Some(Value::String(text))
}

/// Mirrors JS `Number#toString()` for the integer case the scenario needs;
/// falls back to Rust's default float formatting otherwise.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

fn type_of(value: &Value) -> &'static str {
    match value {
        Value::Undefined => "undefined",
        Value::Null => "object",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::BigInt(_) => "bigint",
        Value::String(_) => "string",
        Value::Ref(heap) => match &*heap.borrow() {
            HeapValue::Chain(_) => "function",
            _ => "object",
        },
    }
}
