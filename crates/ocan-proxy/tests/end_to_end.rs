// SPDX-License-Identifier: MIT OR Apache-2.0
//! Drives a [`ProxyHandle`] all the way through an in-process transport into
//! [`ocan_executor`], exercising the full recording → dispatch → decode path
//! without a network boundary — the same shape `ocan_harness` will offer
//! through a real router, but wired directly here.

use std::rc::Rc;

use ocan_core::{HeapValue, OrderedMap, Value};
use ocan_executor::Target;
use ocan_proxy::ProxyHandle;
use ocan_transport::{Dispatcher, InProcessTransport, RequestKind, ResponseEnvelope};

fn counter_transport() -> Rc<dyn Dispatcher> {
    let mut obj = OrderedMap::new();
    obj.insert("counter", Value::Number(0.0));
    let target = Rc::new(Target::new(Value::object(obj)).with_method("bump", |this, args| {
        let n = match args.first() {
            Some(Value::Number(n)) => *n,
            _ => 0.0,
        };
        let heap = this.as_heap().unwrap();
        let mut guard = heap.borrow_mut();
        let HeapValue::Object(map) = &mut *guard else {
            unreachable!()
        };
        let next = match map.get("counter") {
            Some(Value::Number(c)) => c + n,
            _ => n,
        };
        map.insert("counter", Value::Number(next));
        Ok(Value::Number(next))
    }));

    Rc::new(InProcessTransport::new(move |request| {
        match request.kind {
            RequestKind::Dispose => Ok(ResponseEnvelope::ok(ocan_codec::encode_document(
                &Value::Undefined,
            )?)),
            RequestKind::Invoke => {
                let chain_value = ocan_codec::decode_document(&request.chain)?;
                let chain_heap = chain_value.as_heap().unwrap().borrow();
                let HeapValue::Chain(chain) = &*chain_heap else {
                    unreachable!("request.chain always decodes to a Chain wire value");
                };
                match ocan_executor::execute_chain(chain, &target) {
                    Ok(value) => Ok(ResponseEnvelope::ok(ocan_codec::encode_document(&value)?)),
                    Err(err) => Ok(ResponseEnvelope::err(ocan_codec::encode_document(
                        &err.into_error_value(),
                    )?)),
                }
            }
        }
    }))
}

#[tokio::test]
async fn bump_then_to_string_round_trips_through_the_full_stack() {
    let seed = ProxyHandle::new(counter_transport(), "session-1");

    let handle = seed
        .get("bump")
        .unwrap()
        .call(vec![ocan_proxy::arg(5.0)])
        .unwrap()
        .get("toString")
        .unwrap()
        .call(vec![])
        .unwrap();

    let result = handle.await.unwrap();
    assert!(matches!(result, Value::String(ref s) if s == "5"));
}

#[tokio::test]
async fn dispose_then_invoke_fails_locally_without_a_round_trip() {
    let seed = ProxyHandle::new(counter_transport(), "session-1");
    let bump = seed.get("bump").unwrap();

    seed.clone().dispose().await.unwrap();

    let err = bump
        .call(vec![ocan_proxy::arg(1.0)])
        .unwrap()
        .materialize()
        .await
        .unwrap_err();
    assert!(matches!(err, ocan_proxy::ProxyError::SessionDisposed(_)));
}
