// SPDX-License-Identifier: MIT OR Apache-2.0
//! End-to-end tests for the multiplexed WebSocket transport (§4.E): one
//! socket, many in-flight requests, correlated by client-assigned id.

use std::net::SocketAddr;
use std::rc::Rc;

use futures::{SinkExt, StreamExt};
use ocan_codec::encode_document;
use ocan_config::GatewayConfig;
use ocan_core::{ChainArg, HeapValue, OperationChain, OrderedMap, Value};
use ocan_executor::Target;
use ocan_gateway::{build_router, GatewayState, WsFrame, WsResponseFrame};
use ocan_registry::InstanceRegistry;
use ocan_transport::{InvokeRequest, RequestKind};
use tokio_tungstenite::tungstenite::Message;

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

async fn spawn_server() -> SocketAddr {
    let state = GatewayState::spawn(counter_registry, GatewayConfig::default());
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn invoke_frame(id: u64, chain: OperationChain, session: &str) -> WsFrame {
    let wire = Value::heap(HeapValue::Chain(chain));
    let doc = encode_document(&wire).unwrap();
    WsFrame {
        id,
        request: InvokeRequest {
            chain: doc,
            session: session.into(),
            kind: RequestKind::Invoke,
        },
    }
}

#[tokio::test]
async fn invoke_over_websocket_replays_and_echoes_the_id() {
    let addr = spawn_server().await;
    let url = format!("ws://{}/ocan/counters/a/ws", addr);
    let (stream, _response) = tokio_tungstenite::connect_async(&url).await.unwrap();
    let (mut sink, mut source) = stream.split();

    let frame = invoke_frame(
        7,
        OperationChain::new().get("bump").apply(vec![ChainArg::Value(Value::Number(3.0))]),
        "ws-session",
    );
    let text = serde_json::to_string(&frame).unwrap();
    sink.send(Message::Text(text.into())).await.unwrap();

    let reply = source.next().await.unwrap().unwrap();
    let Message::Text(text) = reply else {
        panic!("expected a text frame");
    };
    let response: WsResponseFrame = serde_json::from_str(&text).unwrap();
    assert_eq!(response.id, 7);
    assert!(response.response.is_ok());
}

#[tokio::test]
async fn two_concurrent_requests_on_one_socket_are_correlated_by_id() {
    let addr = spawn_server().await;
    let url = format!("ws://{}/ocan/counters/a/ws", addr);
    let (stream, _response) = tokio_tungstenite::connect_async(&url).await.unwrap();
    let (mut sink, mut source) = stream.split();

    for (id, amount) in [(1u64, 1.0), (2u64, 2.0)] {
        let frame = invoke_frame(
            id,
            OperationChain::new().get("bump").apply(vec![ChainArg::Value(Value::Number(amount))]),
            "ws-session",
        );
        let text = serde_json::to_string(&frame).unwrap();
        sink.send(Message::Text(text.into())).await.unwrap();
    }

    let mut seen = Vec::new();
    for _ in 0..2 {
        let reply = source.next().await.unwrap().unwrap();
        let Message::Text(text) = reply else {
            panic!("expected a text frame");
        };
        let response: WsResponseFrame = serde_json::from_str(&text).unwrap();
        seen.push(response.id);
    }
    seen.sort_unstable();
    assert_eq!(seen, vec![1, 2]);
}
