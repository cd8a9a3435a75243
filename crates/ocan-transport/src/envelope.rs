// SPDX-License-Identifier: MIT OR Apache-2.0
//! The bit-exact request/response envelopes from spec §6.

use ocan_codec::EncodedDocument;
use serde::{Deserialize, Serialize};

/// The request body sent to an executor-backed session: `{"chain": ...,
/// "session": ..., "kind": "invoke" | "dispose"}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvokeRequest {
    /// The encoded operation chain to replay.
    pub chain: EncodedDocument,
    /// Opaque session identifier scoping this request to a live target.
    pub session: String,
    /// Whether this is a chain dispatch or a session teardown.
    pub kind: RequestKind,
}

/// Discriminates an [`InvokeRequest`] between materializing a chain and
/// releasing the session it's scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    /// Replay the chain and return its result.
    Invoke,
    /// Release any server-side resources held by the session.
    Dispose,
}

/// The response body: exactly one of `{"ok": <value>}` or `{"err": <error>}`.
/// HTTP status is 200 either way; a non-200 status means the transport
/// itself failed, not the application-level call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseEnvelope {
    /// The chain materialized successfully.
    Ok {
        /// The encoded result value.
        ok: EncodedDocument,
    },
    /// Execution failed; the error has been captured and encoded as an
    /// `err`-tagged value (see `ocan_core::HeapValue::Error`).
    Err {
        /// The encoded error value.
        err: EncodedDocument,
    },
}

impl ResponseEnvelope {
    /// Build a success envelope.
    pub fn ok(value: EncodedDocument) -> Self {
        ResponseEnvelope::Ok { ok: value }
    }

    /// Build a failure envelope.
    pub fn err(value: EncodedDocument) -> Self {
        ResponseEnvelope::Err { err: value }
    }

    /// Whether this envelope carries a success payload.
    pub fn is_ok(&self) -> bool {
        matches!(self, ResponseEnvelope::Ok { .. })
    }
}
