// SPDX-License-Identifier: MIT OR Apache-2.0
//! ocan-core
#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! The stable contract for OCAN: the structured-clone [`Value`] domain and
//! the [`chain`] model used to record a sequence of property-access and
//! call operations for later replay.
//!
//! If you only take one dependency, take this one.

/// The operation-chain model: [`chain::Operation`], [`chain::OperationChain`],
/// and the nesting predicate used to detect proxy arguments embedded inside
/// a larger argument structure.
pub mod chain;
/// The structured-clone value domain: [`value::Value`], [`value::HeapValue`],
/// and the heap cell that gives reference types identity.
pub mod value;

pub use chain::{ChainArg, NestedOperationMarker, Operation, OperationChain};
pub use value::{
    DataViewPayload, ErrorPayload, Heap, HeapValue, OrderedMap, TypedArrayKind, TypedArrayPayload,
    Value,
};
