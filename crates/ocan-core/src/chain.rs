// SPDX-License-Identifier: MIT OR Apache-2.0
use crate::value::{HeapValue, Value};

/// One step in an [`OperationChain`].
#[derive(Debug, Clone)]
pub enum Operation {
    /// Read a named property off the current cursor.
    Get(String),
    /// Call the current cursor (a bound method, per the executor's
    /// `this`-binding rules) with the given arguments.
    Apply(Vec<ChainArg>),
}

impl PartialEq for Operation {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Operation::Get(a), Operation::Get(b)) => a == b,
            (Operation::Apply(a), Operation::Apply(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x == y)
            }
            _ => false,
        }
    }
}

/// An argument to an [`Operation::Apply`]: either a plain serializable value
/// or a marker standing in for another, not-yet-replayed proxy handle.
#[derive(Debug, Clone)]
pub enum ChainArg {
    /// An ordinary value, including values that themselves embed a
    /// [`HeapValue::Chain`] somewhere in their structure.
    Value(Value),
    /// A proxy handle passed directly as an argument, recorded as its own
    /// chain rather than folded into the argument's value structure.
    Nested(NestedOperationMarker),
}

impl PartialEq for ChainArg {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ChainArg::Value(a), ChainArg::Value(b)) => a.deep_eq(b),
            (ChainArg::Nested(a), ChainArg::Nested(b)) => a == b,
            _ => false,
        }
    }
}

/// A proxy handle recorded as a pending operation chain, rather than a
/// resolved value, at the point it was used as an argument.
#[derive(Debug, Clone, PartialEq)]
pub struct NestedOperationMarker {
    /// The chain to replay, against the same target graph, to resolve this
    /// argument before the enclosing `Apply` runs.
    pub chain: OperationChain,
}

/// An ordered sequence of [`Operation`]s recorded against a [`ProxyHandle`]
/// and replayed, in order, against a live target.
///
/// [`ProxyHandle`]: https://docs.rs/ocan-proxy
#[derive(Debug, Clone, Default)]
pub struct OperationChain {
    ops: Vec<Operation>,
}

impl OperationChain {
    /// An empty chain — replaying it returns the target itself.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step.
    pub fn push(&mut self, op: Operation) {
        self.ops.push(op);
    }

    /// Builder-style: append a `Get` and return `self`.
    pub fn get(mut self, key: impl Into<String>) -> Self {
        self.push(Operation::Get(key.into()));
        self
    }

    /// Builder-style: append an `Apply` and return `self`.
    pub fn apply(mut self, args: Vec<ChainArg>) -> Self {
        self.push(Operation::Apply(args));
        self
    }

    /// The recorded steps, in replay order.
    pub fn ops(&self) -> &[Operation] {
        &self.ops
    }

    /// Number of recorded steps.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Whether no steps have been recorded.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Walk `value`'s structure (cycle-safely) looking for an embedded
/// [`HeapValue::Chain`] — the predicate that decides whether an argument
/// needs to be pre-resolved against the target graph before an `Apply` runs.
pub fn contains_nested_chain(value: &Value) -> bool {
    let mut seen = Vec::new();
    contains_nested_inner(value, &mut seen)
}

fn contains_nested_inner(value: &Value, seen: &mut Vec<usize>) -> bool {
    let heap = match value.as_heap() {
        Some(h) => h,
        None => return false,
    };
    let ptr = std::rc::Rc::as_ptr(heap) as usize;
    if seen.contains(&ptr) {
        return false;
    }
    seen.push(ptr);

    match &*heap.borrow() {
        HeapValue::Chain(_) => true,
        HeapValue::Object(map) => map.iter().any(|(_, v)| contains_nested_inner(v, seen)),
        HeapValue::Array(items) | HeapValue::Set(items) => {
            items.iter().any(|v| contains_nested_inner(v, seen))
        }
        HeapValue::Map(entries) => entries
            .iter()
            .any(|(k, v)| contains_nested_inner(k, seen) || contains_nested_inner(v, seen)),
        HeapValue::Error(payload) => payload
            .cause
            .as_ref()
            .is_some_and(|c| contains_nested_inner(c, seen)),
        _ => false,
    }
}

/// Whether an [`Operation::Apply`]'s argument list contains any argument
/// that needs pre-resolution before the call runs: an explicit
/// [`ChainArg::Nested`], or a [`ChainArg::Value`] with an embedded chain
/// somewhere inside it.
pub fn args_need_resolution(args: &[ChainArg]) -> bool {
    args.iter().any(|arg| match arg {
        ChainArg::Nested(_) => true,
        ChainArg::Value(v) => contains_nested_chain(v),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::OrderedMap;

    #[test]
    fn builder_records_steps_in_order() {
        let chain = OperationChain::new()
            .get("counter")
            .apply(vec![ChainArg::Value(Value::Number(5.0))]);
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.ops()[0], Operation::Get("counter".into()));
    }

    #[test]
    fn detects_a_nested_marker_buried_in_an_object_argument() {
        let nested_chain = OperationChain::new().get("other");
        let marker_value = Value::heap(HeapValue::Chain(nested_chain));
        let mut obj = OrderedMap::new();
        obj.insert("handle", marker_value);
        let arg = ChainArg::Value(Value::object(obj));
        assert!(args_need_resolution(&[arg]));
    }

    #[test]
    fn plain_value_arguments_need_no_resolution() {
        let arg = ChainArg::Value(Value::String("hello".into()));
        assert!(!args_need_resolution(&[arg]));
    }
}
