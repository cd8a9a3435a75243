// SPDX-License-Identifier: MIT OR Apache-2.0
//! The dedicated thread that owns every `Rc`-rooted value this crate ever
//! touches.
//!
//! An [`ocan_registry::InstanceRegistry`] holds its targets behind `Rc`,
//! which is `!Send` by construction — it can never be moved into another
//! thread, let alone shared across the pool axum's default runtime spreads
//! requests over. So the registry is never handed to this module from the
//! outside: it is *built* here, on the one thread that will ever touch it,
//! and every route handler instead holds a [`WorkerHandle`] — a `Send`
//! channel carrying owned envelopes in and a `oneshot` reply out. This is
//! the same background-task/correlated-reply shape `ocan_transport`'s
//! `ChannelTransport` uses for an in-process async dispatcher, generalized
//! from a tokio task to a plain OS thread because the state it wraps can't
//! live inside a `Send` future at all.

use std::collections::HashSet;

use ocan_core::{HeapValue, Value};
use ocan_registry::InstanceRegistry;
use ocan_transport::{InvokeRequest, RequestKind, ResponseEnvelope, TransportError};
use tokio::sync::{mpsc, oneshot};

struct WorkerJob {
    binding: String,
    instance: String,
    request: InvokeRequest,
    reply: oneshot::Sender<Result<ResponseEnvelope, TransportError>>,
}

/// A cheaply cloneable handle to the worker thread's inbox.
#[derive(Clone)]
pub struct WorkerHandle {
    inbox: mpsc::UnboundedSender<WorkerJob>,
}

impl WorkerHandle {
    /// Submit one invoke/dispose envelope and await its reply.
    pub async fn submit(
        &self,
        binding: String,
        instance: String,
        request: InvokeRequest,
    ) -> Result<ResponseEnvelope, TransportError> {
        let (reply, response) = oneshot::channel();
        let job = WorkerJob {
            binding,
            instance,
            request,
            reply,
        };
        self.inbox
            .send(job)
            .map_err(|_| TransportError::Closed)?;
        response.await.map_err(|_| TransportError::Closed)?
    }
}

/// Spawn the worker thread. `build_registry` runs *on* the new thread, not
/// here, so the registry it produces never has to cross a thread boundary.
pub fn spawn(build_registry: impl FnOnce() -> InstanceRegistry + Send + 'static) -> WorkerHandle {
    let (tx, rx) = mpsc::unbounded_channel::<WorkerJob>();
    std::thread::Builder::new()
        .name("ocan-gateway-worker".into())
        .spawn(move || {
            // A current-thread runtime's `block_on` has no `Send` bound on
            // its future, unlike `tokio::spawn` — exactly what lets the
            // registry's `Rc`s live across the `.await` between jobs.
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("build ocan-gateway worker runtime");
            runtime.block_on(run(build_registry(), rx));
        })
        .expect("spawn ocan-gateway worker thread");
    WorkerHandle { inbox: tx }
}

async fn run(registry: InstanceRegistry, mut inbox: mpsc::UnboundedReceiver<WorkerJob>) {
    let mut disposed: HashSet<(String, String, String)> = HashSet::new();
    while let Some(job) = inbox.recv().await {
        let result = handle(&registry, &mut disposed, &job.binding, &job.instance, &job.request);
        let _ = job.reply.send(result);
    }
}

fn handle(
    registry: &InstanceRegistry,
    disposed: &mut HashSet<(String, String, String)>,
    binding: &str,
    instance: &str,
    request: &InvokeRequest,
) -> Result<ResponseEnvelope, TransportError> {
    let key = (binding.to_string(), instance.to_string(), request.session.clone());

    if request.kind == RequestKind::Dispose {
        disposed.insert(key);
        return Ok(ResponseEnvelope::ok(ocan_codec::encode_document(&Value::Undefined)?));
    }

    if disposed.contains(&key) {
        return Err(TransportError::SessionDisposed(request.session.clone()));
    }

    let target = registry.resolve(binding, instance).ok_or_else(|| {
        TransportError::Dispatch(format!(
            "no instance '{instance}' registered under binding '{binding}'"
        ))
    })?;

    let chain_value = ocan_codec::decode_document(&request.chain)?;
    let chain_heap = chain_value.as_heap().ok_or_else(|| {
        TransportError::Dispatch("request chain did not decode to a reference value".into())
    })?;
    let borrowed = chain_heap.borrow();
    let HeapValue::Chain(chain) = &*borrowed else {
        return Err(TransportError::Dispatch(
            "request chain did not decode to a chain value".into(),
        ));
    };

    match ocan_executor::execute_chain(chain, &target) {
        Ok(value) => Ok(ResponseEnvelope::ok(ocan_codec::encode_document(&value)?)),
        Err(err) => Ok(ResponseEnvelope::err(ocan_codec::encode_document(
            &err.into_error_value(),
        )?)),
    }
}
