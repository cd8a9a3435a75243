// SPDX-License-Identifier: MIT OR Apache-2.0
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ocan_transport::TransportError;
use serde_json::json;

/// Wraps a [`TransportError`] as an axum response.
///
/// Per §6, a non-200 status here always means the transport itself
/// failed — a disposed session, an unknown instance, a malformed body.
/// An application-level throw never produces one of these; it rides back
/// as `{"err": ...}` with status 200 via
/// [`ocan_transport::ResponseEnvelope::err`].
#[derive(Debug)]
pub struct GatewayError(pub TransportError);

impl From<TransportError> for GatewayError {
    fn from(err: TransportError) -> Self {
        GatewayError(err)
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            TransportError::SessionDisposed(_) => StatusCode::CONFLICT,
            TransportError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            TransportError::Closed => StatusCode::SERVICE_UNAVAILABLE,
            TransportError::Codec(_) => StatusCode::BAD_REQUEST,
            TransportError::Dispatch(_) => StatusCode::NOT_FOUND,
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}
