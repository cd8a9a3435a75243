// SPDX-License-Identifier: MIT OR Apache-2.0
//! ocan-gateway
#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! Axum HTTP + WebSocket binding realizing the bit-exact invoke/dispose
//! envelopes and the bearer-subprotocol extraction boundary (§6). Every
//! `Rc`-rooted value this crate ultimately touches — the registry, its
//! targets, a decoded chain — lives on one dedicated worker thread (see
//! [`worker`]); route handlers only ever hold owned, `Send` envelopes.
//! That split is what lets the rest of the workspace use `Rc`/`RefCell`
//! throughout while still serving requests from axum's default
//! multi-threaded runtime.

mod auth;
mod error;
mod routes;
mod state;
mod worker;
mod ws;

pub use auth::AuthToken;
pub use error::GatewayError;
pub use state::GatewayState;
pub use ws::{WsFrame, WsResponseFrame};

use axum::routing::{get, post};
use axum::Router;

/// Build the gateway's axum [`Router`].
///
/// Routes: `/health`, and per `(binding, instance)` pair,
/// `/ocan/{binding}/{instance}/invoke`, `/ocan/{binding}/{instance}/dispose`,
/// and `/ocan/{binding}/{instance}/ws`.
pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/ocan/{binding}/{instance}/invoke", post(routes::invoke))
        .route("/ocan/{binding}/{instance}/dispose", post(routes::dispose))
        .route("/ocan/{binding}/{instance}/ws", get(routes::ws_upgrade))
        .with_state(state)
}
