// SPDX-License-Identifier: MIT OR Apache-2.0
//! ocan-transport
#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! Couples a client proxy to whatever can carry a request envelope and
//! return a response envelope (§4.E of the design): an [`InvokeRequest`] in,
//! a [`ResponseEnvelope`] out, via the [`Dispatcher`] trait. Two concrete
//! shapes are provided: [`InProcessTransport`] (one request, one response,
//! no multiplexing — the "HTTP-style" case) and [`ChannelTransport`] (one
//! duplex channel, responses correlated by request id — the "long-lived
//! bidirectional channel" case). Selection between the two is an injected
//! capability; nothing above this crate cares which one it's talking to.

mod channel;
mod dispatcher;
mod envelope;
mod error;
mod inprocess;

pub use channel::ChannelTransport;
pub use dispatcher::Dispatcher;
pub use envelope::{InvokeRequest, RequestKind, ResponseEnvelope};
pub use error::TransportError;
pub use inprocess::InProcessTransport;
