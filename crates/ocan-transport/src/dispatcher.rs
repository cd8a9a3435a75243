// SPDX-License-Identifier: MIT OR Apache-2.0
use async_trait::async_trait;

use crate::envelope::{InvokeRequest, ResponseEnvelope};
use crate::error::TransportError;

/// Couples a client proxy to whatever can carry a request envelope and
/// return a response envelope (§4.E). The core proxy is oblivious to which
/// shape backs a given session — HTTP-style request/response and a
/// long-lived multiplexed channel both implement this the same way.
///
/// `?Send`: chains carry `Rc`-rooted values (§5's single-threaded
/// cooperative model), so a dispatch future must not be required to cross
/// a thread boundary.
#[async_trait(?Send)]
pub trait Dispatcher {
    /// Send `request` and await its response.
    async fn dispatch(&self, request: InvokeRequest) -> Result<ResponseEnvelope, TransportError>;
}
