// SPDX-License-Identifier: MIT OR Apache-2.0
use http_body_util::BodyExt;
use ocan_codec::encode_document;
use ocan_config::GatewayConfig;
use ocan_core::{ChainArg, HeapValue, OperationChain, OrderedMap, Value};
use ocan_executor::Target;
use ocan_gateway::{build_router, GatewayState};
use ocan_registry::InstanceRegistry;
use ocan_transport::{InvokeRequest, RequestKind, ResponseEnvelope};
use std::rc::Rc;
use tower::ServiceExt;

fn counter_registry() -> InstanceRegistry {
    let mut root = OrderedMap::new();
    root.insert("counter", Value::Number(0.0));
    let target = Rc::new(Target::new(Value::object(root)).with_method("bump", |this, args| {
        let n = match args.first() {
            Some(Value::Number(n)) => *n,
            _ => 0.0,
        };
        let heap = this.as_heap().expect("bump's this is always the root object");
        let mut guard = heap.borrow_mut();
        let HeapValue::Object(map) = &mut *guard else {
            unreachable!("target root is always a plain object")
        };
        let next = match map.get("counter") {
            Some(Value::Number(c)) => c + n,
            _ => n,
        };
        map.insert("counter", Value::Number(next));
        Ok(Value::Number(next))
    }));
    let mut registry = InstanceRegistry::new();
    registry.register("counters", "a", target).expect("fresh registry accepts the first registration");
    registry
}

fn invoke_body(chain: OperationChain, session: &str) -> String {
    let wire = Value::heap(HeapValue::Chain(chain));
    let doc = encode_document(&wire).unwrap();
    serde_json::to_string(&InvokeRequest {
        chain: doc,
        session: session.into(),
        kind: RequestKind::Invoke,
    })
    .unwrap()
}

fn post(uri: &str, body: String) -> axum::http::Request<axum::body::Body> {
    axum::http::Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(axum::body::Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn invoke_replays_a_chain_against_the_registered_instance() {
    let state = GatewayState::spawn(counter_registry, GatewayConfig::default());
    let app = build_router(state);

    let chain = OperationChain::new()
        .get("bump")
        .apply(vec![ChainArg::Value(Value::Number(5.0))]);
    let body = invoke_body(chain, "s1");

    let response = app.oneshot(post("/ocan/counters/a/invoke", body)).await.unwrap();
    assert_eq!(response.status(), axum::http::StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let envelope: ResponseEnvelope = serde_json::from_slice(&bytes).unwrap();
    assert!(envelope.is_ok());
}

#[tokio::test]
async fn invoke_against_an_unknown_instance_is_a_transport_failure() {
    let state = GatewayState::spawn(InstanceRegistry::new, GatewayConfig::default());
    let app = build_router(state);

    let body = invoke_body(OperationChain::new().get("x"), "s1");
    let response = app.oneshot(post("/ocan/counters/missing/invoke", body)).await.unwrap();
    assert_eq!(response.status(), axum::http::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invoke_after_dispose_fails_with_conflict() {
    let state = GatewayState::spawn(counter_registry, GatewayConfig::default());
    let app = build_router(state);

    let dispose_request = InvokeRequest {
        chain: encode_document(&Value::Undefined).unwrap(),
        session: "s1".into(),
        kind: RequestKind::Dispose,
    };
    let dispose_body = serde_json::to_string(&dispose_request).unwrap();
    let dispose_response = app
        .clone()
        .oneshot(post("/ocan/counters/a/dispose", dispose_body))
        .await
        .unwrap();
    assert_eq!(dispose_response.status(), axum::http::StatusCode::OK);

    let body = invoke_body(OperationChain::new().get("bump").apply(vec![]), "s1");
    let second_response = app.oneshot(post("/ocan/counters/a/invoke", body)).await.unwrap();
    assert_eq!(second_response.status(), axum::http::StatusCode::CONFLICT);
}

#[tokio::test]
async fn health_route_reports_ok() {
    let state = GatewayState::spawn(InstanceRegistry::new, GatewayConfig::default());
    let app = build_router(state);

    let request = axum::http::Request::builder()
        .method("GET")
        .uri("/health")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), axum::http::StatusCode::OK);
}
