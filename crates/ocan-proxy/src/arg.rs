// SPDX-License-Identifier: MIT OR Apache-2.0
use ocan_core::{ChainArg, NestedOperationMarker, Value};

use crate::handle::ProxyHandle;

/// Converts a user-supplied call argument into a [`ChainArg`], replacing a
/// nested [`ProxyHandle`] with its [`NestedOperationMarker`] per §4.C's
/// behavioral contract ("if the argument is itself a handle, it is
/// replaced by its `NestedOperationMarker`; otherwise it is kept as-is").
pub trait IntoChainArg {
    /// Perform the conversion.
    fn into_chain_arg(self) -> ChainArg;
}

impl IntoChainArg for ChainArg {
    fn into_chain_arg(self) -> ChainArg {
        self
    }
}

impl IntoChainArg for Value {
    fn into_chain_arg(self) -> ChainArg {
        ChainArg::Value(self)
    }
}

impl IntoChainArg for ProxyHandle {
    fn into_chain_arg(self) -> ChainArg {
        ChainArg::Nested(NestedOperationMarker { chain: self.into_chain() })
    }
}

impl IntoChainArg for f64 {
    fn into_chain_arg(self) -> ChainArg {
        ChainArg::Value(Value::Number(self))
    }
}

impl IntoChainArg for bool {
    fn into_chain_arg(self) -> ChainArg {
        ChainArg::Value(Value::Bool(self))
    }
}

impl IntoChainArg for String {
    fn into_chain_arg(self) -> ChainArg {
        ChainArg::Value(Value::String(self))
    }
}

impl IntoChainArg for &str {
    fn into_chain_arg(self) -> ChainArg {
        ChainArg::Value(Value::String(self.to_string()))
    }
}

/// Convenience wrapper for building a call's argument list:
/// `handle.call(vec![arg(1.0), arg("x"), arg(other_handle)])`.
pub fn arg(value: impl IntoChainArg) -> ChainArg {
    value.into_chain_arg()
}
