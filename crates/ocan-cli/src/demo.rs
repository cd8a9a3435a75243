// SPDX-License-Identifier: MIT OR Apache-2.0
//! A small, self-contained demo registry used by `registry list` and
//! `replay` when no real gateway is running — just enough of a live
//! actor instance (§4.F) to exercise the executor against a captured
//! chain without standing up a whole binding.

use std::rc::Rc;

use ocan_core::{OrderedMap, Value};
use ocan_executor::{ExecError, Target};
use ocan_registry::InstanceRegistry;

/// Build a registry with one `counters/demo` instance: an object with a
/// `counter` field and a `bump(n)` method, matching spec.md §8 scenario 1
/// closely enough to be a useful smoke target for `replay`.
pub fn demo_registry() -> InstanceRegistry {
    let mut registry = InstanceRegistry::new();
    registry
        .register("counters", "demo", counter_target())
        .expect("fresh registry has no prior 'counters/demo' entry");
    registry
}

fn counter_target() -> Rc<Target> {
    let mut obj = OrderedMap::new();
    obj.insert("counter", Value::Number(0.0));
    Rc::new(
        Target::new(Value::object(obj)).with_method("bump", |this, args| {
            let n = match args.first() {
                Some(Value::Number(n)) => *n,
                _ => return Err(ExecError::NotCallable { at_index: 0, type_of: "undefined" }),
            };
            let heap = this.as_heap().expect("counter target root is always an object");
            let mut guard = heap.borrow_mut();
            let ocan_core::HeapValue::Object(map) = &mut *guard else {
                unreachable!("counter target root is always an object")
            };
            let next = match map.get("counter") {
                Some(Value::Number(c)) => c + n,
                _ => n,
            };
            map.insert("counter", Value::Number(next));
            Ok(Value::Number(next))
        }),
    )
}
