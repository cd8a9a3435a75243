// SPDX-License-Identifier: MIT OR Apache-2.0
//! ocan-harness
#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! `test_project(scenario)`-style harness (§4.F): drives a real
//! `ocan-gateway` router through [`tower::ServiceExt::oneshot`] for
//! HTTP-shaped assertions, a fake WebSocket client for the multiplexed
//! transport, a cookie jar mirroring a browser's, and direct
//! `InstanceRegistry`-backed proxy handles for in-process assertions
//! that never touch the wire at all.
//!
//! `GatewayState::spawn` runs its registry-building closure on a
//! dedicated worker thread (see `ocan_gateway::worker`) because the
//! value graph it roots is `Rc`-based and therefore `!Send`. That same
//! constraint means a harness scenario cannot hand out one `Rc` graph
//! shared between `instances()` and `fetch()`/`websocket()`: the
//! `build_registry` closure passed to [`test_project`] is invoked twice,
//! once on the calling thread for `instances()` and once more (via
//! `Clone`) on the gateway's worker thread for everything that goes
//! through the router. Both registries are built from identical
//! definitions, but they are independent `Rc` graphs — an instance
//! fetched through `instances()` and the "same" instance reached via
//! `fetch()` are logically equivalent, not pointer-identical.

mod cookies;
mod websocket;

pub use cookies::CookieJar;
pub use websocket::FakeWebSocket;

use std::cell::RefCell;
use std::future::Future;

use axum::body::Body;
use axum::http::{Request, Response};
use http_body_util::BodyExt;
use ocan_config::GatewayConfig;
use ocan_proxy::ProxyHandle;
use ocan_registry::InstanceRegistry;
use tower::ServiceExt;

/// Failures a harness scenario can surface; these are test-authoring
/// errors, not application-level ones (those ride inside
/// [`ocan_transport::ResponseEnvelope`]).
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// Couldn't bind the loopback listener a fake WebSocket needs.
    #[error("failed to bind loopback listener: {0}")]
    Bind(#[source] std::io::Error),
    /// The WebSocket handshake or a later frame send/recv failed.
    #[error("websocket transport error: {0}")]
    WsConnect(#[source] tokio_tungstenite::tungstenite::Error),
    /// The peer closed the socket before a response frame arrived.
    #[error("websocket closed before a response frame arrived")]
    SocketClosed,
    /// A request or response body failed to serialize or deserialize.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    /// The in-memory router failed to produce a response at all.
    #[error("router request failed: {0}")]
    Request(#[from] axum::http::Error),
    /// Reading back the in-memory response body failed.
    #[error("failed to read response body: {0}")]
    Body(#[source] axum::Error),
}

/// Everything a scenario closure needs to exercise one gateway instance.
pub struct Scenario {
    router: axum::Router,
    local_registry: InstanceRegistry,
    cookies: RefCell<CookieJar>,
    next_session: RefCell<u64>,
}

impl Scenario {
    /// Send `request` through the router in-memory via
    /// [`tower::ServiceExt::oneshot`], absorbing any `Set-Cookie` headers
    /// into the jar and attaching the jar's current `Cookie` header.
    pub async fn fetch(&self, mut request: Request<Body>) -> Result<Response<Body>, HarnessError> {
        if let Some(cookie) = self.cookies.borrow().to_header() {
            request.headers_mut().insert(axum::http::header::COOKIE, cookie);
        }
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("axum::Router's Service is infallible");
        self.cookies.borrow_mut().absorb(response.headers());
        Ok(response)
    }

    /// Read a response's body back to bytes, mirroring the
    /// `http_body_util::BodyExt` pattern used against real gateway
    /// responses.
    pub async fn read_body(response: Response<Body>) -> Result<Vec<u8>, HarnessError> {
        let bytes = response
            .into_body()
            .collect()
            .await
            .map_err(HarnessError::Body)?
            .to_bytes();
        Ok(bytes.to_vec())
    }

    /// A direct, in-process proxy handle against `(binding, instance)`,
    /// bypassing the router entirely — backed by this scenario's own
    /// `local_registry`, independent of whatever the gateway's worker
    /// thread holds (see the module-level note on `Rc` identity).
    pub fn instances(&self, binding: &str, instance: &str) -> Option<ProxyHandle> {
        let mut counter = self.next_session.borrow_mut();
        let session = format!("harness-{}", *counter);
        *counter += 1;
        self.local_registry.client_for(binding, instance, session)
    }

    /// The cookie jar `fetch` reads and writes.
    pub fn cookies(&self) -> std::cell::Ref<'_, CookieJar> {
        self.cookies.borrow()
    }

    /// Set a cookie directly, as if a prior out-of-band response had.
    pub fn set_cookie(&self, name: impl Into<String>, value: impl Into<String>) {
        self.cookies.borrow_mut().set(name, value);
    }

    /// Connect a fake WebSocket client to `path` against a freshly bound
    /// loopback copy of this scenario's router.
    pub async fn websocket(&self, path: &str) -> Result<FakeWebSocket, HarnessError> {
        FakeWebSocket::connect(self.router.clone(), path).await
    }
}

/// Build a gateway around `build_registry`'s instances and hand a
/// [`Scenario`] to `scenario`, the way a browser test runner hands a
/// `page` fixture to a test body.
///
/// `build_registry` runs twice — once directly here for `instances()`,
/// once more (cloned) on the gateway's dedicated worker thread for
/// everything reached through `fetch()`/`websocket()` — because the
/// registry's value graph is `Rc`-rooted and can't cross threads.
pub async fn test_project<B, F, Fut, T>(build_registry: B, scenario: F) -> T
where
    B: Fn() -> InstanceRegistry + Clone + Send + 'static,
    F: FnOnce(Scenario) -> Fut,
    Fut: Future<Output = T>,
{
    let local_registry = build_registry();
    let worker_build = build_registry.clone();
    let state = ocan_gateway::GatewayState::spawn(move || worker_build(), GatewayConfig::default());
    let router = ocan_gateway::build_router(state);

    scenario(Scenario {
        router,
        local_registry,
        cookies: RefCell::new(CookieJar::new()),
        next_session: RefCell::new(0),
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use ocan_core::{OrderedMap, Value};
    use ocan_executor::Target;
    use std::rc::Rc;

    fn demo_registry() -> InstanceRegistry {
        let mut registry = InstanceRegistry::new();
        registry
            .register(
                "counters",
                "demo",
                Rc::new(Target::new(Value::object(OrderedMap::new())).with_method(
                    "ping",
                    |_this, _args| Ok(Value::String("pong".into())),
                )),
            )
            .expect("fresh registry has no prior entry");
        registry
    }

    #[tokio::test]
    async fn instances_dispatches_directly_against_the_local_registry() {
        test_project(demo_registry, |scenario| async move {
            let handle = scenario.instances("counters", "demo").expect("registered instance");
            let result = handle.get("ping").unwrap().call(vec![]).unwrap().await.unwrap();
            assert!(matches!(result, Value::String(ref s) if s == "pong"));
        })
        .await;
    }

    #[tokio::test]
    async fn fetch_reaches_the_health_route() {
        test_project(demo_registry, |scenario| async move {
            let request = Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap();
            let response = scenario.fetch(request).await.unwrap();
            assert_eq!(response.status(), axum::http::StatusCode::OK);
            let body = Scenario::read_body(response).await.unwrap();
            let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(json["status"], "ok");
        })
        .await;
    }

    #[tokio::test]
    async fn cookies_set_directly_are_sent_back_on_the_next_fetch() {
        test_project(demo_registry, |scenario| async move {
            scenario.set_cookie("session", "abc123");
            assert_eq!(scenario.cookies().get("session"), Some("abc123"));
        })
        .await;
    }
}
