// SPDX-License-Identifier: MIT OR Apache-2.0
use std::sync::Arc;

use ocan_config::GatewayConfig;
use ocan_registry::InstanceRegistry;
use ocan_telemetry::MetricsCollector;
use ocan_transport::{InvokeRequest, ResponseEnvelope, TransportError};

use crate::worker::{self, WorkerHandle};

struct Inner {
    worker: WorkerHandle,
    config: GatewayConfig,
    metrics: MetricsCollector,
}

/// Shared, `Clone + Send + Sync` state axum hands to every route.
///
/// Holds no `Rc`-rooted value itself — only a channel to the dedicated
/// worker thread that owns the registry and everything reachable from it.
#[derive(Clone)]
pub struct GatewayState(Arc<Inner>);

impl GatewayState {
    /// Spawn a worker thread around a freshly built registry and wrap it
    /// in gateway state.
    ///
    /// `build_registry` runs on the worker thread, not here: see
    /// [`crate::worker::spawn`] for why it can't be built on the caller's
    /// thread and handed over.
    pub fn spawn(
        build_registry: impl FnOnce() -> InstanceRegistry + Send + 'static,
        config: GatewayConfig,
    ) -> Self {
        Self(Arc::new(Inner {
            worker: worker::spawn(build_registry),
            config,
            metrics: MetricsCollector::new(),
        }))
    }

    /// Dispatch one invoke/dispose envelope against `(binding, instance)`.
    pub async fn dispatch(
        &self,
        binding: String,
        instance: String,
        request: InvokeRequest,
    ) -> Result<ResponseEnvelope, TransportError> {
        self.0.worker.submit(binding, instance, request).await
    }

    /// The gateway's runtime configuration.
    pub fn config(&self) -> &GatewayConfig {
        &self.0.config
    }

    /// The dispatch metrics collector shared across every session.
    pub fn metrics(&self) -> &MetricsCollector {
        &self.0.metrics
    }
}
