// SPDX-License-Identifier: MIT OR Apache-2.0
//! A fake WebSocket client standing in for a browser's `WebSocket`
//! constructor (§4.F `helpers.websocket`).
//!
//! `tower::ServiceExt::oneshot` has no upgrade handshake to offer, so
//! unlike [`crate::Scenario::fetch`] this binds the router to a real
//! loopback socket and drives it with `tokio-tungstenite`, the same way
//! the gateway's own multiplexed transport is exercised end to end.

use axum::Router;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use ocan_gateway::{WsFrame, WsResponseFrame};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::HarnessError;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A live WebSocket connection into a [`crate::Scenario`]'s router.
pub struct FakeWebSocket {
    sink: SplitSink<Socket, Message>,
    stream: SplitStream<Socket>,
    next_id: u64,
}

impl FakeWebSocket {
    /// Bind `router` to an ephemeral loopback port, serve it on a
    /// background task, and connect to `path` as a client.
    pub async fn connect(router: Router, path: &str) -> Result<Self, HarnessError> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(HarnessError::Bind)?;
        let addr = listener.local_addr().map_err(HarnessError::Bind)?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });

        let url = format!("ws://{}{}", addr, path);
        let (socket, _response) = tokio_tungstenite::connect_async(&url)
            .await
            .map_err(HarnessError::WsConnect)?;
        let (sink, stream) = socket.split();
        Ok(Self { sink, stream, next_id: 0 })
    }

    /// Send one multiplexed invoke/dispose request and return the id it
    /// was tagged with, for matching against [`Self::recv`].
    pub async fn send(&mut self, request: ocan_transport::InvokeRequest) -> Result<u64, HarnessError> {
        let id = self.next_id;
        self.next_id += 1;
        let frame = WsFrame { id, request };
        let text = serde_json::to_string(&frame)?;
        self.sink
            .send(Message::Text(text.into()))
            .await
            .map_err(HarnessError::WsConnect)?;
        Ok(id)
    }

    /// Wait for the next correlated response frame.
    pub async fn recv(&mut self) -> Result<WsResponseFrame, HarnessError> {
        loop {
            let message = self
                .stream
                .next()
                .await
                .ok_or(HarnessError::SocketClosed)?
                .map_err(HarnessError::WsConnect)?;
            match message {
                Message::Text(text) => return Ok(serde_json::from_str(&text)?),
                Message::Close(_) => return Err(HarnessError::SocketClosed),
                _ => continue,
            }
        }
    }

    /// Close the underlying socket.
    pub async fn close(mut self) -> Result<(), HarnessError> {
        self.sink.close().await.map_err(HarnessError::WsConnect)
    }
}
