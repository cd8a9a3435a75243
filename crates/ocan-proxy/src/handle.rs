// SPDX-License-Identifier: MIT OR Apache-2.0
use std::cell::Cell;
use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::rc::Rc;

use ocan_chain::Chain;
use ocan_core::{ChainArg, HeapValue, Value};
use ocan_transport::{Dispatcher, InvokeRequest, RequestKind, ResponseEnvelope};

use crate::error::ProxyError;
use crate::session::SessionInner;

/// Per-handle lifecycle state (§4.C).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyState {
    /// The chain may still be extended; dispatch has not been requested.
    Recording,
    /// Materialization is in flight.
    Dispatching,
    /// A response has been received; the chain is frozen.
    Settled,
    /// The handle (or its session) has been released.
    Disposed,
}

/// A capability-bearing façade over a remote target (§4.C).
///
/// Reading a property or calling a handle never touches the transport —
/// it only records another [`ocan_core::Operation`] onto a freshly
/// returned handle. Transport traffic happens exactly once, when a handle
/// is awaited.
#[derive(Clone)]
pub struct ProxyHandle {
    session: Rc<SessionInner>,
    chain: Chain,
    state: Cell<ProxyState>,
}

impl ProxyHandle {
    /// Create the seed handle for a fresh session: an empty chain bound to
    /// `dispatcher` and `session_id`.
    pub fn new(dispatcher: Rc<dyn Dispatcher>, session_id: impl Into<String>) -> Self {
        Self {
            session: SessionInner::new(dispatcher, session_id),
            chain: Chain::new(),
            state: Cell::new(ProxyState::Recording),
        }
    }

    /// Current lifecycle state of this handle.
    pub fn state(&self) -> ProxyState {
        self.state.get()
    }

    /// Read a named property, returning a new handle with an additional
    /// `Get` recorded.
    pub fn get(&self, key: impl Into<String>) -> Result<Self, ProxyError> {
        self.ensure_extendable()?;
        Ok(Self {
            session: self.session.clone(),
            chain: ocan_chain::extend_get(&self.chain, key),
            state: Cell::new(ProxyState::Recording),
        })
    }

    /// Call this handle as a function, returning a new handle with an
    /// additional `Apply` recorded.
    pub fn call(&self, args: Vec<ChainArg>) -> Result<Self, ProxyError> {
        self.ensure_extendable()?;
        Ok(Self {
            session: self.session.clone(),
            chain: ocan_chain::extend_apply(&self.chain, args),
            state: Cell::new(ProxyState::Recording),
        })
    }

    fn ensure_extendable(&self) -> Result<(), ProxyError> {
        match self.state.get() {
            ProxyState::Recording => Ok(()),
            _ => Err(ProxyError::ChainClosed),
        }
    }

    pub(crate) fn into_chain(self) -> Chain {
        self.chain
    }

    /// Materialize the chain: dispatch it and decode the result. Safe to
    /// call more than once on clones of the same handle — each call is an
    /// independent round trip (§4.C: "a handle is not cached").
    pub async fn materialize(self) -> Result<Value, ProxyError> {
        if self.session.disposed.get() {
            return Err(ProxyError::SessionDisposed(self.session.session_id.clone()));
        }

        self.state.set(ProxyState::Dispatching);
        let response = dispatch_chain(&self.session, &self.chain, RequestKind::Invoke).await?;
        self.state.set(ProxyState::Settled);

        match response {
            ResponseEnvelope::Ok { ok } => Ok(ocan_codec::decode_document(&ok)?),
            ResponseEnvelope::Err { err } => {
                Err(ProxyError::Application(ocan_codec::decode_document(&err)?))
            }
        }
    }

    /// Release any server-side resources the session holds. Idempotent: a
    /// second `dispose` on an already-disposed session is a no-op success
    /// (§9, resolved open question).
    pub async fn dispose(self) -> Result<(), ProxyError> {
        if self.session.disposed.get() {
            self.state.set(ProxyState::Disposed);
            return Ok(());
        }

        dispatch_chain(&self.session, &self.chain, RequestKind::Dispose).await?;
        self.session.disposed.set(true);
        self.state.set(ProxyState::Disposed);
        Ok(())
    }
}

async fn dispatch_chain(
    session: &SessionInner,
    chain: &Chain,
    kind: RequestKind,
) -> Result<ResponseEnvelope, ProxyError> {
    let wire_value = Value::heap(HeapValue::Chain(chain.clone()));
    let request = InvokeRequest {
        chain: ocan_codec::encode_document(&wire_value)?,
        session: session.session_id.clone(),
        kind,
    };
    Ok(session.dispatcher.dispatch(request).await?)
}

impl IntoFuture for ProxyHandle {
    type Output = Result<Value, ProxyError>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output>>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.materialize())
    }
}
