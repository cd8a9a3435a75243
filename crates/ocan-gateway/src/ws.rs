// SPDX-License-Identifier: MIT OR Apache-2.0
//! Frame shapes for the long-lived, multiplexed WebSocket transport
//! (§4.E): a client-assigned `id` correlates each request with its
//! response over the one socket, the same way `ocan_transport`'s
//! `ChannelTransport` correlates requests by id over a single channel.

use ocan_transport::{InvokeRequest, ResponseEnvelope};
use serde::{Deserialize, Serialize};

/// One multiplexed request frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsFrame {
    /// Client-assigned id correlating this request with its response.
    pub id: u64,
    /// The invoke/dispose envelope to replay.
    pub request: InvokeRequest,
}

/// The correlated response frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsResponseFrame {
    /// Echoes the request frame's id.
    pub id: u64,
    /// The resulting response envelope.
    pub response: ResponseEnvelope,
}
