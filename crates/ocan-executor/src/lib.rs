// SPDX-License-Identifier: MIT OR Apache-2.0
//! ocan-executor
#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! Replays an [`ocan_core::OperationChain`] against a [`Target`], per §4.D:
//! a cursor walks the chain's operations in order, `Get` traverses
//! properties, `Apply` calls whatever the cursor currently denotes (a
//! native method, a built-in primitive method, or — for the root-called-
//! directly edge case — the target itself), and nested-chain arguments are
//! resolved, left to right, before the `Apply` that contains them runs.

mod builtin;
mod error;
mod target;

pub use error::{ApplicationError, ExecError};
pub use target::{NativeMethod, Target};

use ocan_core::{ChainArg, HeapValue, Operation, OperationChain, Value};
use std::rc::Rc;

/// Replay `chain` against `target`, returning the value the chain denotes.
///
/// # Examples
///
/// ```
/// use ocan_core::{OperationChain, OrderedMap, Value};
/// use ocan_executor::{Target, execute_chain};
///
/// let mut obj = OrderedMap::new();
/// obj.insert("counter", Value::Number(0.0));
/// let target = Target::new(Value::object(obj)).with_method("bump", |this, args| {
///     let n = match args.first() {
///         Some(Value::Number(n)) => *n,
///         _ => 0.0,
///     };
///     let heap = this.as_heap().unwrap();
///     let mut guard = heap.borrow_mut();
///     let ocan_core::HeapValue::Object(map) = &mut *guard else { unreachable!() };
///     let next = match map.get("counter") {
///         Some(Value::Number(c)) => c + n,
///         _ => n,
///     };
///     map.insert("counter", Value::Number(next));
///     Ok(Value::Number(next))
/// });
///
/// let chain = OperationChain::new()
///     .get("bump")
///     .apply(vec![ocan_core::ChainArg::Value(Value::Number(5.0))]);
/// let result = execute_chain(&chain, &target).unwrap();
/// assert!(matches!(result, Value::Number(n) if n == 5.0));
/// ```
pub fn execute_chain(chain: &OperationChain, target: &Target) -> Result<Value, ExecError> {
    ocan_chain::validate_for_dispatch(chain)?;

    let mut cursor = Cursor {
        value: target.root_value(),
        owner: target.root_value(),
        pending: None,
    };

    for (index, op) in chain.ops().iter().enumerate() {
        cursor = step(cursor, op, target, index)?;
    }

    Ok(cursor.into_value())
}

struct Cursor {
    value: Value,
    owner: Value,
    pending: Option<Pending>,
}

enum Pending {
    Native(Rc<NativeMethod>),
    Builtin(builtin::Builtin),
}

impl Cursor {
    fn into_value(self) -> Value {
        self.value
    }
}

fn step(cursor: Cursor, op: &Operation, target: &Target, index: usize) -> Result<Cursor, ExecError> {
    match op {
        Operation::Get(key) => step_get(cursor, key, target, index),
        Operation::Apply(args) => step_apply(cursor, args, target, index),
    }
}

fn step_get(cursor: Cursor, key: &str, target: &Target, index: usize) -> Result<Cursor, ExecError> {
    if cursor.pending.is_some() {
        // A property access against an unresolved method reference has no
        // defined meaning in any scenario this executor supports; treat it
        // like reading off a nullish cursor.
        return Err(ExecError::NullDeref { at_index: index });
    }

    if cursor.value.is_nullish() {
        return Err(ExecError::NullDeref { at_index: index });
    }

    if let Some(found) = read_property(&cursor.value, key) {
        return Ok(Cursor {
            owner: cursor.value.clone(),
            value: found,
            pending: None,
        });
    }

    if target.is_root(&cursor.value) {
        if let Some(method) = target.lookup_method(key) {
            return Ok(Cursor {
                owner: cursor.value.clone(),
                value: Value::Undefined,
                pending: Some(Pending::Native(method)),
            });
        }
    }

    if let Some(builtin) = builtin::resolve(key) {
        return Ok(Cursor {
            owner: cursor.value.clone(),
            value: Value::Undefined,
            pending: Some(Pending::Builtin(builtin)),
        });
    }

    Ok(Cursor {
        owner: cursor.value.clone(),
        value: Value::Undefined,
        pending: None,
    })
}

fn read_property(value: &Value, key: &str) -> Option<Value> {
    let heap = value.as_heap()?;
    match &*heap.borrow() {
        HeapValue::Object(map) => map.get(key).cloned(),
        _ => None,
    }
}

fn step_apply(
    cursor: Cursor,
    args: &[ChainArg],
    target: &Target,
    index: usize,
) -> Result<Cursor, ExecError> {
    let resolved = resolve_args(args, target)?;

    match cursor.pending {
        Some(Pending::Native(method)) => {
            let result = method.call(&cursor.owner, &resolved)?;
            Ok(Cursor {
                owner: cursor.owner,
                value: result,
                pending: None,
            })
        }
        Some(Pending::Builtin(b)) => {
            let result = builtin::call(b, &cursor.owner, index)?;
            Ok(Cursor {
                owner: cursor.owner,
                value: result,
                pending: None,
            })
        }
        None => {
            // §9: a chain whose first operation is `Apply` calls the root
            // target directly, `this` bound to the root itself.
            if index == 0 && target.is_root(&cursor.value) {
                if let Some(call) = target.call_method() {
                    let result = call.call(&cursor.value, &resolved)?;
                    return Ok(Cursor {
                        owner: cursor.value.clone(),
                        value: result,
                        pending: None,
                    });
                }
            }
            Err(ExecError::NotCallable {
                at_index: index,
                type_of: type_of_str(&cursor.value),
            })
        }
    }
}

fn resolve_args(args: &[ChainArg], target: &Target) -> Result<Vec<Value>, ExecError> {
    let mut out = Vec::with_capacity(args.len());
    for arg in args {
        match arg {
            ChainArg::Value(v) => out.push(v.clone()),
            ChainArg::Nested(marker) => out.push(execute_chain(&marker.chain, target)?),
        }
    }
    Ok(out)
}

fn type_of_str(value: &Value) -> &'static str {
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

#[cfg(test)]
mod tests {
    use super::*;
    use ocan_core::{ErrorPayload, OrderedMap};

    fn counter_target() -> Target {
        let mut obj = OrderedMap::new();
        obj.insert("counter", Value::Number(0.0));
        Target::new(Value::object(obj)).with_method("bump", |this, args| {
            let n = match args.first() {
                Some(Value::Number(n)) => *n,
                _ => 0.0,
            };
            let heap = this.as_heap().unwrap();
            let mut guard = heap.borrow_mut();
            let HeapValue::Object(map) = &mut *guard else {
                unreachable!()
            };
            let next = match map.get("counter") {
                Some(Value::Number(c)) => c + n,
                _ => n,
            };
            map.insert("counter", Value::Number(next));
            Ok(Value::Number(next))
        })
    }

    /// Scenario 1 (spec.md §8): `handle.bump(5).toString()` yields `"5"`
    /// and leaves `counter === 5`.
    #[test]
    fn scenario_increment_via_chain() {
        let target = counter_target();
        let chain = OperationChain::new()
            .get("bump")
            .apply(vec![ChainArg::Value(Value::Number(5.0))])
            .get("toString")
            .apply(vec![]);

        let result = execute_chain(&chain, &target).unwrap();
        assert!(matches!(result, Value::String(ref s) if s == "5"));

        let counter = read_property(&target.root_value(), "counter").unwrap();
        assert!(matches!(counter, Value::Number(n) if n == 5.0));
    }

    /// Scenario 5: `handle.combine(handle.first(), handle.second())` yields `3`.
    #[test]
    fn scenario_nested_chain_resolves_left_to_right_before_outer_apply() {
        let target = Target::new(Value::object(OrderedMap::new()))
            .with_method("first", |_this, _args| Ok(Value::Number(1.0)))
            .with_method("second", |_this, _args| Ok(Value::Number(2.0)))
            .with_method("combine", |_this, args| {
                let a = match args.first() {
                    Some(Value::Number(n)) => *n,
                    _ => 0.0,
                };
                let b = match args.get(1) {
                    Some(Value::Number(n)) => *n,
                    _ => 0.0,
                };
                Ok(Value::Number(a + b))
            });

        let first_chain = OperationChain::new().get("first").apply(vec![]);
        let second_chain = OperationChain::new().get("second").apply(vec![]);
        let chain = OperationChain::new().get("combine").apply(vec![
            ChainArg::Nested(ocan_core::NestedOperationMarker { chain: first_chain }),
            ChainArg::Nested(ocan_core::NestedOperationMarker { chain: second_chain }),
        ]);

        let result = execute_chain(&chain, &target).unwrap();
        assert!(matches!(result, Value::Number(n) if n == 3.0));
    }

    /// Scenario 6: a thrown `RangeError` with a custom `code` property
    /// short-circuits the chain and is carried as an `ExecError::Application`.
    #[test]
    fn scenario_error_propagation() {
        let target = Target::new(Value::object(OrderedMap::new())).with_method(
            "boom",
            |_this, _args| {
                let mut extra = OrderedMap::new();
                extra.insert("code", Value::String("E_RANGE".into()));
                let err = Value::heap(HeapValue::Error(ErrorPayload {
                    name: "RangeError".into(),
                    message: "nope".into(),
                    stack: None,
                    cause: None,
                    extra,
                }));
                Err(ExecError::application(err))
            },
        );

        let chain = OperationChain::new().get("boom").apply(vec![]);
        let err = execute_chain(&chain, &target).unwrap_err();
        let ExecError::Application(ApplicationError(value)) = err else {
            panic!("expected an application error");
        };
        let HeapValue::Error(payload) = &*value.as_heap().unwrap().borrow() else {
            panic!("expected an error value");
        };
        assert_eq!(payload.name, "RangeError");
        assert_eq!(payload.message, "nope");
        assert!(matches!(payload.extra.get("code"), Some(Value::String(s)) if s == "E_RANGE"));
    }

    #[test]
    fn get_on_nullish_cursor_fails_with_null_deref() {
        let target = Target::new(Value::Null);
        let chain = OperationChain::new().get("anything");
        let err = execute_chain(&chain, &target).unwrap_err();
        assert!(matches!(err, ExecError::NullDeref { at_index: 0 }));
    }

    #[test]
    fn apply_on_non_callable_fails_with_not_callable() {
        let mut obj = OrderedMap::new();
        obj.insert("x", Value::Number(1.0));
        let target = Target::new(Value::object(obj));
        let chain = OperationChain::new().get("x").apply(vec![]);
        let err = execute_chain(&chain, &target).unwrap_err();
        assert!(matches!(
            err,
            ExecError::NotCallable {
                at_index: 1,
                type_of: "number"
            }
        ));
    }

    #[test]
    fn missing_property_yields_undefined_rather_than_an_error() {
        let target = Target::new(Value::object(OrderedMap::new()));
        let chain = OperationChain::new().get("nope");
        let result = execute_chain(&chain, &target).unwrap();
        assert!(matches!(result, Value::Undefined));
    }

    /// §9: calling the root target directly (`Apply` as the first op).
    #[test]
    fn root_called_directly_binds_this_to_the_root() {
        let target = Target::new(Value::object(OrderedMap::new())).with_call(|this, _args| {
            Ok(Value::Bool(this.as_heap().is_some()))
        });
        let chain = OperationChain::new().apply(vec![]);
        let result = execute_chain(&chain, &target).unwrap();
        assert!(matches!(result, Value::Bool(true)));
    }
}
