// SPDX-License-Identifier: MIT OR Apache-2.0
//! Unified error taxonomy with stable error codes for OCAN.
//!
//! Every [`OcanError`] carries an [`ErrorCode`] (a machine-readable, stable
//! string tag matching the closed set in `spec.md` §7), a human-readable
//! message, an optional cause chain, and arbitrary key-value context. Use
//! the builder returned by [`OcanError::new`] to construct errors fluently.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ErrorCategory
// ---------------------------------------------------------------------------

/// Broad family that an [`ErrorCode`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Codec encode/decode errors.
    Codec,
    /// Chain-building and dispatch-time validation errors.
    Chain,
    /// Executor replay failures against a live target.
    Executor,
    /// Transport-boundary failures, local to the client.
    Transport,
    /// An error thrown by user code on the server.
    Application,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Codec => "codec",
            Self::Chain => "chain",
            Self::Executor => "executor",
            Self::Transport => "transport",
            Self::Application => "application",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// ErrorCode
// ---------------------------------------------------------------------------

/// Machine-readable, stable error code (§7's closed set).
///
/// Each variant serialises to a `SCREAMING_SNAKE_CASE` string that is
/// guaranteed not to change across patch releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Codec encountered a value outside the Value domain.
    UnsupportedType,
    /// Codec decode failure: top-level document shape is malformed.
    MalformedDocument,
    /// Codec decode failure: an index entry carries an unrecognized tag.
    UnknownTag,
    /// Codec decode failure: a `$ref` points outside the `index` table.
    DanglingReference,
    /// A recorded chain is malformed (empty at dispatch, cyclic nesting).
    InvalidChain,
    /// Attempt to extend a handle past its terminal state.
    ChainClosed,
    /// `Get` was attempted against a null/undefined cursor.
    NullDeref,
    /// `Apply` was attempted against a cursor that isn't callable.
    NotCallable,
    /// The underlying transport channel failed.
    TransportFailure,
    /// The transport deadline elapsed before a response arrived.
    Timeout,
    /// User code running on the server threw.
    ApplicationError,
}

impl ErrorCode {
    /// Returns the broad [`ErrorCategory`] this code belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UnsupportedType
            | Self::MalformedDocument
            | Self::UnknownTag
            | Self::DanglingReference => ErrorCategory::Codec,

            Self::InvalidChain | Self::ChainClosed => ErrorCategory::Chain,

            Self::NullDeref | Self::NotCallable => ErrorCategory::Executor,

            Self::TransportFailure | Self::Timeout => ErrorCategory::Transport,

            Self::ApplicationError => ErrorCategory::Application,
        }
    }

    /// Stable `&'static str` representation of the code (e.g.
    /// `"NULL_DEREF"`).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnsupportedType => "UNSUPPORTED_TYPE",
            Self::MalformedDocument => "MALFORMED_DOCUMENT",
            Self::UnknownTag => "UNKNOWN_TAG",
            Self::DanglingReference => "DANGLING_REFERENCE",
            Self::InvalidChain => "INVALID_CHAIN",
            Self::ChainClosed => "CHAIN_CLOSED",
            Self::NullDeref => "NULL_DEREF",
            Self::NotCallable => "NOT_CALLABLE",
            Self::TransportFailure => "TRANSPORT_FAILURE",
            Self::Timeout => "TIMEOUT",
            Self::ApplicationError => "APPLICATION_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// OcanError
// ---------------------------------------------------------------------------

/// Unified OCAN error.
///
/// Carries a stable [`ErrorCode`], a human-readable message, an optional
/// source error for cause-chaining, and arbitrary structured context.
///
/// # Builder usage
///
/// ```
/// use ocan_error::{ErrorCode, OcanError};
///
/// let err = OcanError::new(ErrorCode::Timeout, "no response within deadline")
///     .with_context("session", "s1")
///     .with_context("deadline_ms", 5_000);
/// ```
pub struct OcanError {
    /// Machine-readable error code.
    pub code: ErrorCode,
    /// Human-readable description.
    pub message: String,
    /// Optional underlying cause.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
    /// Arbitrary structured context for diagnostics.
    pub context: BTreeMap<String, serde_json::Value>,
}

impl OcanError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
            context: BTreeMap::new(),
        }
    }

    /// Attach a key-value pair to the diagnostic context.
    ///
    /// The value is converted via [`serde_json::to_value`]; if
    /// serialization fails, the entry is silently skipped.
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    /// Attach an underlying cause.
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Shorthand for `self.code.category()`.
    pub fn category(&self) -> ErrorCategory {
        self.code.category()
    }
}

impl fmt::Debug for OcanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("OcanError");
        d.field("code", &self.code);
        d.field("message", &self.message);
        if let Some(ref src) = self.source {
            d.field("source", &src.to_string());
        }
        if !self.context.is_empty() {
            d.field("context", &self.context);
        }
        d.finish()
    }
}

impl fmt::Display for OcanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)?;
        if !self.context.is_empty() {
            if let Ok(ctx) = serde_json::to_string(&self.context) {
                write!(f, " {ctx}")?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for OcanError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

// ---------------------------------------------------------------------------
// Conversions from component-crate errors
// ---------------------------------------------------------------------------

impl From<ocan_codec::CodecError> for OcanError {
    fn from(err: ocan_codec::CodecError) -> Self {
        use ocan_codec::CodecError as E;
        let code = match err {
            E::UnsupportedType { .. } => ErrorCode::UnsupportedType,
            E::MalformedDocument(_) => ErrorCode::MalformedDocument,
            E::UnknownTag { .. } => ErrorCode::UnknownTag,
            E::DanglingReference(_) => ErrorCode::DanglingReference,
            E::Json(_) | E::InvalidBase64(_) => ErrorCode::MalformedDocument,
        };
        OcanError::new(code, err.to_string())
    }
}

impl From<ocan_chain::ChainError> for OcanError {
    fn from(err: ocan_chain::ChainError) -> Self {
        use ocan_chain::ChainError as E;
        let code = match err {
            E::InvalidChain { .. } => ErrorCode::InvalidChain,
            E::ChainClosed => ErrorCode::ChainClosed,
        };
        OcanError::new(code, err.to_string())
    }
}

impl From<ocan_executor::ExecError> for OcanError {
    fn from(err: ocan_executor::ExecError) -> Self {
        use ocan_executor::ExecError as E;
        let code = match &err {
            E::NullDeref { .. } => ErrorCode::NullDeref,
            E::NotCallable { .. } => ErrorCode::NotCallable,
            E::InvalidChain(_) => ErrorCode::InvalidChain,
            E::Application(_) => ErrorCode::ApplicationError,
        };
        OcanError::new(code, err.to_string())
    }
}

impl From<ocan_transport::TransportError> for OcanError {
    fn from(err: ocan_transport::TransportError) -> Self {
        use ocan_transport::TransportError as E;
        let code = match &err {
            E::Timeout => ErrorCode::Timeout,
            E::SessionDisposed(_) | E::Closed | E::Dispatch(_) => ErrorCode::TransportFailure,
            E::Codec(_) => ErrorCode::MalformedDocument,
        };
        OcanError::new(code, err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Serialization support
// ---------------------------------------------------------------------------

/// Serializable snapshot of an [`OcanError`] (without the opaque source).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OcanErrorDto {
    /// Error code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
    /// Structured context.
    pub context: BTreeMap<String, serde_json::Value>,
    /// String representation of the source error, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_message: Option<String>,
}

impl From<&OcanError> for OcanErrorDto {
    fn from(err: &OcanError) -> Self {
        Self {
            code: err.code,
            message: err.message.clone(),
            context: err.context.clone(),
            source_message: err.source.as_ref().map(|s| s.to_string()),
        }
    }
}

impl From<OcanErrorDto> for OcanError {
    fn from(dto: OcanErrorDto) -> Self {
        Self {
            code: dto.code,
            message: dto.message,
            source: None,
            context: dto.context,
        }
    }
}
