// SPDX-License-Identifier: MIT OR Apache-2.0
use ocan_core::{ErrorPayload, HeapValue, OrderedMap, Value};
use thiserror::Error;

/// Everything that can go wrong replaying an [`crate::OperationChain`]
/// against a [`crate::Target`] (§4.D, §7).
#[derive(Debug, Error)]
pub enum ExecError {
    /// A `Get` was attempted against a null/undefined cursor.
    #[error("cannot read property of null/undefined at operation {at_index}")]
    NullDeref {
        /// Index of the offending operation within the chain.
        at_index: usize,
    },

    /// An `Apply` was attempted against a cursor that isn't callable.
    #[error("value at operation {at_index} is not callable (typeof {type_of})")]
    NotCallable {
        /// Index of the offending operation within the chain.
        at_index: usize,
        /// A `typeof`-style description of the non-callable cursor, for
        /// diagnostics.
        type_of: &'static str,
    },

    /// A chain or one of its nested arguments failed [`ocan_chain`]'s
    /// dispatch-time validation.
    #[error(transparent)]
    InvalidChain(#[from] ocan_chain::ChainError),

    /// User code running on the server threw. The payload is the thrown
    /// value, which the transport layer is responsible for serializing via
    /// the codec as an `err`-tagged value and returning on the response's
    /// error channel (§4.D, §7: `ApplicationError`).
    #[error("application error: {0}")]
    Application(ApplicationError),
}

/// A value thrown by user code during a native method call, carried
/// through [`ExecError::Application`].
#[derive(Debug, Clone)]
pub struct ApplicationError(pub Value);

impl std::fmt::Display for ApplicationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl ExecError {
    /// Build an [`ExecError::Application`] directly from a thrown [`Value`].
    pub fn application(value: Value) -> Self {
        ExecError::Application(ApplicationError(value))
    }

    /// The name that should appear on the `err`-tagged value this error
    /// becomes on the wire — `"NullDeref"`, `"NotCallable"`, `"InvalidChain"`,
    /// or the name of the application error's own thrown value.
    fn error_name(&self) -> &'static str {
        match self {
            ExecError::NullDeref { .. } => "NullDeref",
            ExecError::NotCallable { .. } => "NotCallable",
            ExecError::InvalidChain(_) => "InvalidChain",
            ExecError::Application(_) => "ApplicationError",
        }
    }

    /// Render this error as the [`Value`] that belongs on a response's error
    /// channel (§4.D Failure semantics, §7: every execution error "is
    /// captured, serialized via the codec as an `err`-tagged value").
    ///
    /// An [`ExecError::Application`] already carries the thrown value and is
    /// returned as-is; every other variant — a replay failure against the
    /// live target rather than something user code threw — is wrapped in a
    /// [`HeapValue::Error`] so the client restores it to a typed error
    /// instead of an opaque string.
    pub fn into_error_value(self) -> Value {
        match self {
            ExecError::Application(ApplicationError(value)) => value,
            other => {
                let name = other.error_name();
                let message = other.to_string();
                Value::heap(HeapValue::Error(ErrorPayload {
                    name: name.to_string(),
                    message,
                    stack: None,
                    cause: None,
                    extra: OrderedMap::new(),
                }))
            }
        }
    }
}
