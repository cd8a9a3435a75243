// SPDX-License-Identifier: MIT OR Apache-2.0
//! The long-lived, bidirectional channel transport shape (§4.E):
//! invocations are multiplexed over one duplex channel and correlated by a
//! monotonically increasing request id, rather than one request per
//! response pair. Mirrors the background-task-plus-`oneshot`-per-call
//! correlation pattern used elsewhere for tracking in-flight async work.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use crate::dispatcher::Dispatcher;
use crate::envelope::{InvokeRequest, ResponseEnvelope};
use crate::error::TransportError;

type PendingMap = Arc<Mutex<HashMap<u64, oneshot::Sender<ResponseEnvelope>>>>;

/// A [`Dispatcher`] that multiplexes invocations over one outbound/inbound
/// channel pair, correlating each response to its request by id.
///
/// Request and response envelopes are plain owned data (no `Rc`), so the
/// correlation loop can run as an ordinary `tokio::spawn`med task even
/// though the proxy/executor value graph this transport ultimately
/// serves stays single-threaded.
pub struct ChannelTransport {
    outbound: mpsc::UnboundedSender<(u64, InvokeRequest)>,
    pending: PendingMap,
    next_id: AtomicU64,
}

impl ChannelTransport {
    /// Spawn the correlation loop and return a dispatcher handle.
    ///
    /// `outbound` carries `(request id, request)` pairs to whatever drives
    /// the other end of the channel (a WebSocket write half, an in-process
    /// peer); `inbound` is where that same peer's `(request id, response)`
    /// pairs arrive.
    pub fn spawn(
        outbound: mpsc::UnboundedSender<(u64, InvokeRequest)>,
        mut inbound: mpsc::UnboundedReceiver<(u64, ResponseEnvelope)>,
    ) -> Self {
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let loop_pending = pending.clone();

        tokio::spawn(async move {
            while let Some((id, response)) = inbound.recv().await {
                if let Some(tx) = loop_pending.lock().unwrap().remove(&id) {
                    let _ = tx.send(response);
                }
            }
        });

        Self {
            outbound,
            pending,
            next_id: AtomicU64::new(0),
        }
    }
}

#[async_trait(?Send)]
impl Dispatcher for ChannelTransport {
    async fn dispatch(&self, request: InvokeRequest) -> Result<ResponseEnvelope, TransportError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().unwrap().insert(id, tx);

        if self.outbound.send((id, request)).is_err() {
            self.pending.lock().unwrap().remove(&id);
            return Err(TransportError::Closed);
        }

        rx.await.map_err(|_| TransportError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::RequestKind;
    use ocan_codec::document::{PrimitiveWire, WireNode};
    use ocan_codec::EncodedDocument;

    fn null_doc() -> EncodedDocument {
        EncodedDocument {
            root: WireNode::Literal(PrimitiveWire::Null),
            index: vec![],
        }
    }

    #[tokio::test]
    async fn correlates_responses_by_request_id_out_of_order() {
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<(u64, InvokeRequest)>();
        let (in_tx, in_rx) = mpsc::unbounded_channel::<(u64, ResponseEnvelope)>();

        // A fake peer that replies out of order: second request first.
        tokio::spawn(async move {
            let first = out_rx.recv().await.unwrap();
            let second = out_rx.recv().await.unwrap();
            in_tx.send((second.0, ResponseEnvelope::ok(null_doc()))).unwrap();
            in_tx.send((first.0, ResponseEnvelope::err(null_doc()))).unwrap();
        });

        let transport = ChannelTransport::spawn(out_tx, in_rx);
        let req = |session: &str| InvokeRequest {
            chain: null_doc(),
            session: session.into(),
            kind: RequestKind::Invoke,
        };

        let first = transport.dispatch(req("a"));
        let second = transport.dispatch(req("b"));
        let (first, second) = tokio::join!(first, second);

        assert!(!first.unwrap().is_ok());
        assert!(second.unwrap().is_ok());
    }

    #[tokio::test]
    async fn dispatch_fails_once_the_peer_side_is_dropped() {
        let (out_tx, out_rx) = mpsc::unbounded_channel::<(u64, InvokeRequest)>();
        let (_in_tx, in_rx) = mpsc::unbounded_channel::<(u64, ResponseEnvelope)>();
        drop(out_rx);

        let transport = ChannelTransport::spawn(out_tx, in_rx);
        let req = InvokeRequest {
            chain: null_doc(),
            session: "s".into(),
            kind: RequestKind::Invoke,
        };
        let err = transport.dispatch(req).await.unwrap_err();
        assert!(matches!(err, TransportError::Closed));
    }
}
