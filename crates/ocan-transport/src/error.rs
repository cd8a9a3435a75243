// SPDX-License-Identifier: MIT OR Apache-2.0
use thiserror::Error;

/// Failures local to the transport boundary (§7: "transport errors LOCAL
/// to the client" — these never cross the wire as an encoded value).
#[derive(Debug, Error)]
pub enum TransportError {
    /// No response arrived before the configured deadline.
    #[error("request timed out")]
    Timeout,

    /// An `invoke` was attempted against a session whose first `dispose`
    /// has already been acknowledged (P7).
    #[error("session {0} has been disposed")]
    SessionDisposed(String),

    /// The peer closed the channel, or the in-process handler panicked,
    /// before a response could be produced.
    #[error("transport closed before a response arrived")]
    Closed,

    /// The wire document could not be decoded.
    #[error(transparent)]
    Codec(#[from] ocan_codec::CodecError),

    /// Any other transport-level failure, carrying a human-readable cause.
    #[error("transport failure: {0}")]
    Dispatch(String),
}
