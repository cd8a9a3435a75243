// SPDX-License-Identifier: MIT OR Apache-2.0
//! ocan-chain
#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! Behavior built on top of [`ocan_core`]'s pure `Operation`/`OperationChain`
//! data types: builder helpers for extending a chain without consuming the
//! parent (used by a client proxy that needs the parent chain to remain
//! valid after a clone is extended), the closed [`ChainError`] set, and
//! dispatch-time validation.

use ocan_core::{ChainArg, HeapValue, NestedOperationMarker, Operation, OperationChain, Value};
use thiserror::Error;

/// The maximum nesting depth [`validate_for_dispatch`] will follow before
/// concluding that nested chains are cyclic (or simply unreasonable).
///
/// `OperationChain` is a plain value type with no shared-mutable aliasing,
/// so a literal cycle (a chain nesting itself) cannot be constructed
/// through this crate's public API — there is no `Rc`-style back-edge to
/// detect. What *can* happen is a chain built programmatically (e.g. by a
/// code generator) that nests chains to unbounded depth; a depth cap is the
/// honest, checkable realization of §4.C's "cycles among nested chains are
/// forbidden" for a language without the aliasing that makes real cycles
/// possible in the first place.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Everything that can go wrong building or dispatching an [`OperationChain`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChainError {
    /// The chain (or one of its nested arguments) is malformed for
    /// dispatch: nesting too deep to be anything but a mistake, or a
    /// structural problem the executor would refuse to run.
    #[error("invalid chain: {reason}")]
    InvalidChain {
        /// Human-readable detail.
        reason: String,
    },

    /// An attempt was made to extend a [`OperationChain`]/proxy handle that
    /// has already reached a terminal state (`Settled` or `Disposed` in
    /// the handle's state machine).
    #[error("chain is closed and cannot be extended")]
    ChainClosed,
}

/// Extend a *clone* of `chain` with a `Get`, returning the new chain and
/// leaving `chain` untouched.
///
/// This is the building block a client proxy uses to implement "reading a
/// property returns a new handle with an extended chain": the parent
/// handle's chain must remain valid (and independently extensible) after a
/// child is recorded.
pub fn extend_get(chain: &OperationChain, key: impl Into<String>) -> OperationChain {
    let mut next = chain.clone();
    next.push(Operation::Get(key.into()));
    next
}

/// Extend a *clone* of `chain` with an `Apply`, returning the new chain.
pub fn extend_apply(chain: &OperationChain, args: Vec<ChainArg>) -> OperationChain {
    let mut next = chain.clone();
    next.push(Operation::Apply(args));
    next
}

/// Whether `x` was produced by wrapping a chain via the proxy layer.
///
/// In this implementation the check is free and side-effect-free: a
/// [`ChainArg`] is a closed Rust enum, so recognizing
/// [`ChainArg::Nested`] is a plain pattern match, not a brand lookup —
/// there is no risk of observing a property on an arbitrary user value the
/// way a dynamic-language proxy would need to guard against.
pub fn is_nested_marker(arg: &ChainArg) -> bool {
    matches!(arg, ChainArg::Nested(_))
}

/// Validate a chain immediately before it is dispatched (§4.C): rejects
/// nested-argument structures that recurse past [`MAX_NESTING_DEPTH`].
///
/// An empty chain is valid — the executor defines replaying zero
/// operations as returning the root target unchanged (§4.D), so there is
/// no reason to special-case it here.
pub fn validate_for_dispatch(chain: &OperationChain) -> Result<(), ChainError> {
    for op in chain.ops() {
        if let Operation::Apply(args) = op {
            for arg in args {
                check_arg_depth(arg, 0)?;
            }
        }
    }
    Ok(())
}

fn check_arg_depth(arg: &ChainArg, depth: usize) -> Result<(), ChainError> {
    if depth > MAX_NESTING_DEPTH {
        return Err(ChainError::InvalidChain {
            reason: format!("nested chain exceeds max depth of {MAX_NESTING_DEPTH}"),
        });
    }
    match arg {
        ChainArg::Nested(NestedOperationMarker { chain }) => check_chain_depth(chain, depth + 1),
        ChainArg::Value(value) => check_value_depth(value, depth),
    }
}

fn check_chain_depth(chain: &OperationChain, depth: usize) -> Result<(), ChainError> {
    if depth > MAX_NESTING_DEPTH {
        return Err(ChainError::InvalidChain {
            reason: format!("nested chain exceeds max depth of {MAX_NESTING_DEPTH}"),
        });
    }
    for op in chain.ops() {
        if let Operation::Apply(args) = op {
            for arg in args {
                check_arg_depth(arg, depth)?;
            }
        }
    }
    Ok(())
}

fn check_value_depth(value: &Value, depth: usize) -> Result<(), ChainError> {
    let Some(heap) = value.as_heap() else {
        return Ok(());
    };
    match &*heap.borrow() {
        HeapValue::Chain(chain) => check_chain_depth(chain, depth + 1),
        HeapValue::Object(map) => {
            for (_, v) in map.iter() {
                check_value_depth(v, depth)?;
            }
            Ok(())
        }
        HeapValue::Array(items) | HeapValue::Set(items) => {
            for v in items {
                check_value_depth(v, depth)?;
            }
            Ok(())
        }
        HeapValue::Map(entries) => {
            for (k, v) in entries {
                check_value_depth(k, depth)?;
                check_value_depth(v, depth)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

pub use ocan_core::{ChainArg as Arg, Operation as Op, OperationChain as Chain};

#[cfg(test)]
mod tests {
    use super::*;
    use ocan_core::OrderedMap;

    #[test]
    fn extend_get_leaves_parent_untouched() {
        let parent = OperationChain::new().get("a");
        let child = extend_get(&parent, "b");
        assert_eq!(parent.len(), 1);
        assert_eq!(child.len(), 2);
    }

    #[test]
    fn empty_chain_is_valid_for_dispatch() {
        assert!(validate_for_dispatch(&OperationChain::new()).is_ok());
    }

    #[test]
    fn recognizes_a_nested_marker() {
        let marker = ChainArg::Nested(NestedOperationMarker {
            chain: OperationChain::new().get("x"),
        });
        assert!(is_nested_marker(&marker));
        assert!(!is_nested_marker(&ChainArg::Value(Value::Null)));
    }

    #[test]
    fn rejects_nesting_past_the_depth_cap() {
        let mut innermost = OperationChain::new().get("leaf");
        for _ in 0..MAX_NESTING_DEPTH + 2 {
            let marker = ChainArg::Nested(NestedOperationMarker { chain: innermost });
            innermost = OperationChain::new().apply(vec![marker]);
        }
        let err = validate_for_dispatch(&innermost).unwrap_err();
        assert!(matches!(err, ChainError::InvalidChain { .. }));
    }

    #[test]
    fn accepts_a_moderately_nested_chain() {
        let inner = OperationChain::new().get("first");
        let marker = ChainArg::Nested(NestedOperationMarker { chain: inner });
        let outer = OperationChain::new().apply(vec![marker]);
        assert!(validate_for_dispatch(&outer).is_ok());
    }

    #[test]
    fn finds_a_nested_chain_buried_inside_an_object_argument() {
        let nested = OperationChain::new().get("other");
        let mut buried = OrderedMap::new();
        buried.insert("handle", Value::heap(HeapValue::Chain(nested)));
        let arg = ChainArg::Value(Value::object(buried));
        let outer = OperationChain::new().apply(vec![arg]);
        assert!(validate_for_dispatch(&outer).is_ok());
    }
}
