// SPDX-License-Identifier: MIT OR Apache-2.0
use thiserror::Error;

/// Everything that can go wrong recording, materializing, or disposing a
/// [`crate::ProxyHandle`] (§4.C).
#[derive(Debug, Error)]
pub enum ProxyError {
    /// A `Get`/`Apply` was attempted on a handle whose chain is no longer
    /// extendable (it has already settled or been disposed).
    #[error("chain is closed and cannot be extended further")]
    ChainClosed,

    /// An `invoke` was attempted against a session whose first `dispose`
    /// has already been observed (P7).
    #[error("session {0} has been disposed")]
    SessionDisposed(String),

    /// The chain or one of its embedded values failed to encode or decode.
    #[error(transparent)]
    Codec(#[from] ocan_codec::CodecError),

    /// The transport failed to deliver the request or return a response.
    #[error(transparent)]
    Transport(#[from] ocan_transport::TransportError),

    /// The server-side executor reported an application error; the
    /// payload is the decoded, codec-round-tripped error value.
    #[error("application error")]
    Application(ocan_core::Value),
}
