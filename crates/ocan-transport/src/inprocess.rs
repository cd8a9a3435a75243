// SPDX-License-Identifier: MIT OR Apache-2.0
//! The HTTP-style transport shape (§4.E): one request in, one response out,
//! no multiplexing. `InProcessTransport` stands in for an actual HTTP round
//! trip in tests and in the `ocan-cli replay` command, wrapping a plain
//! handler function rather than a real socket.

use async_trait::async_trait;

use crate::dispatcher::Dispatcher;
use crate::envelope::{InvokeRequest, ResponseEnvelope};
use crate::error::TransportError;

/// A [`Dispatcher`] backed directly by a handler function, with no
/// background task and no request-id correlation — one call in, one
/// result out.
pub struct InProcessTransport<F> {
    handler: F,
}

impl<F> InProcessTransport<F>
where
    F: Fn(InvokeRequest) -> Result<ResponseEnvelope, TransportError>,
{
    /// Wrap a handler as an in-process dispatcher.
    pub fn new(handler: F) -> Self {
        Self { handler }
    }
}

#[async_trait(?Send)]
impl<F> Dispatcher for InProcessTransport<F>
where
    F: Fn(InvokeRequest) -> Result<ResponseEnvelope, TransportError>,
{
    async fn dispatch(&self, request: InvokeRequest) -> Result<ResponseEnvelope, TransportError> {
        (self.handler)(request)
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
    async fn dispatches_synchronously_through_the_handler() {
        let transport = InProcessTransport::new(|req: InvokeRequest| {
            assert_eq!(req.session, "s1");
            Ok(ResponseEnvelope::ok(null_doc()))
        });

        let request = InvokeRequest {
            chain: null_doc(),
            session: "s1".into(),
            kind: RequestKind::Invoke,
        };
        let response = transport.dispatch(request).await.unwrap();
        assert!(response.is_ok());
    }
}
