// SPDX-License-Identifier: MIT OR Apache-2.0
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use tracing::{info, warn};

use ocan_transport::{InvokeRequest, RequestKind, ResponseEnvelope, TransportError};

use crate::auth::extract_auth_token;
use crate::error::GatewayError;
use crate::state::GatewayState;
use crate::ws::{WsFrame, WsResponseFrame};

/// `GET /health` — a bare liveness probe, not part of §6's envelope.
pub(crate) async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// `POST /ocan/{binding}/{instance}/invoke`.
pub(crate) async fn invoke(
    Path((binding, instance)): Path<(String, String)>,
    State(state): State<GatewayState>,
    Json(mut request): Json<InvokeRequest>,
) -> Result<Json<ResponseEnvelope>, GatewayError> {
    request.kind = RequestKind::Invoke;
    let started = std::time::Instant::now();
    let wire_bytes_in = serde_json::to_vec(&request.chain).map(|b| b.len()).unwrap_or(0) as u64;
    let session = request.session.clone();

    let response = state.dispatch(binding, instance, request).await?;
    record_metrics(&state, &session, started, wire_bytes_in, &response);
    Ok(Json(response))
}

/// `POST /ocan/{binding}/{instance}/dispose`.
pub(crate) async fn dispose(
    Path((binding, instance)): Path<(String, String)>,
    State(state): State<GatewayState>,
    Json(mut request): Json<InvokeRequest>,
) -> Result<Json<ResponseEnvelope>, GatewayError> {
    request.kind = RequestKind::Dispose;
    let response = state.dispatch(binding, instance, request).await?;
    Ok(Json(response))
}

/// `GET /ocan/{binding}/{instance}/ws` — upgrades to the multiplexed
/// transport used for the §9 "await-to-dispatch" proxy handles.
pub(crate) async fn ws_upgrade(
    Path((binding, instance)): Path<(String, String)>,
    State(state): State<GatewayState>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let prefix = state.config().ws_subprotocol_prefix.clone();
    let token = headers
        .get(axum::http::header::SEC_WEBSOCKET_PROTOCOL)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| extract_auth_token(v, &prefix));
    if let Some(token) = &token {
        info!(
            binding = %binding,
            instance = %instance,
            token_len = token.0.len(),
            "ws upgrade carried a bearer subprotocol token"
        );
    }
    ws.on_upgrade(move |socket| handle_socket(socket, binding, instance, state))
}

async fn handle_socket(mut socket: WebSocket, binding: String, instance: String, state: GatewayState) {
    while let Some(received) = socket.recv().await {
        let message = match received {
            Ok(m) => m,
            Err(_) => break,
        };
        let text = match message {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };

        let frame: WsFrame = match serde_json::from_str(&text) {
            Ok(f) => f,
            Err(err) => {
                warn!(error = %err, "discarding malformed ws frame");
                continue;
            }
        };

        let response = match state
            .dispatch(binding.clone(), instance.clone(), frame.request)
            .await
        {
            Ok(response) => response,
            Err(err) => transport_error_as_envelope(&err),
        };

        let out = WsResponseFrame { id: frame.id, response };
        let Ok(text) = serde_json::to_string(&out) else {
            break;
        };
        if socket.send(Message::Text(text.into())).await.is_err() {
            break;
        }
    }
}

/// The WS transport has no separate non-200 status channel, so a
/// transport-level failure still has to ride back over the socket as an
/// `err`-tagged envelope rather than being dropped silently.
fn transport_error_as_envelope(err: &TransportError) -> ResponseEnvelope {
    let message = ocan_core::Value::String(err.to_string());
    let encoded = ocan_codec::encode_document(&message).unwrap_or_else(|_| ocan_codec::EncodedDocument {
        root: ocan_codec::document::WireNode::Scalar {
            tag: ocan_codec::document::ScalarTag::Undef,
            payload: None,
        },
        index: Vec::new(),
    });
    ResponseEnvelope::err(encoded)
}

fn record_metrics(
    state: &GatewayState,
    session: &str,
    started: std::time::Instant,
    wire_bytes_in: u64,
    response: &ResponseEnvelope,
) {
    let outcome = if response.is_ok() {
        ocan_telemetry::DispatchOutcome::Ok
    } else {
        ocan_telemetry::DispatchOutcome::Application
    };
    let wire_bytes_out = serde_json::to_vec(response).map(|b| b.len()).unwrap_or(0) as u64;
    let metrics = ocan_telemetry::DispatchMetrics {
        session_id: session.to_string(),
        operation_count: 0,
        nested_chain_count: 0,
        wire_bytes_in,
        wire_bytes_out,
        round_trip_ms: started.elapsed().as_millis() as u64,
        outcome,
    };
    ocan_telemetry::log_dispatch(&metrics);
    state.metrics().record(metrics);
}
