// SPDX-License-Identifier: MIT OR Apache-2.0
//! ocan-telemetry
#![deny(unsafe_code)]
#![warn(missing_docs)]
//!
//! Structured telemetry and metrics collection for OCAN dispatch.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tracing::info;

// ---------------------------------------------------------------------------
// DispatchMetrics
// ---------------------------------------------------------------------------

/// Metrics captured for a single materialized chain (§4.C, §4.E).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DispatchMetrics {
    /// Session id the chain was dispatched on.
    pub session_id: String,
    /// Number of `Get`/`Apply` operations in the chain.
    pub operation_count: u64,
    /// Number of nested chains resolved as arguments.
    pub nested_chain_count: u64,
    /// Size of the request envelope, in bytes, on the wire.
    pub wire_bytes_in: u64,
    /// Size of the response envelope, in bytes, on the wire.
    pub wire_bytes_out: u64,
    /// Wall-clock round-trip duration in milliseconds.
    pub round_trip_ms: u64,
    /// Outcome of the dispatch.
    pub outcome: DispatchOutcome,
}

/// How a dispatched chain resolved.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// The response carried `ok`.
    #[default]
    Ok,
    /// The response carried `err` (an application-level throw).
    Application,
    /// The transport itself failed (timeout, closed channel, disposed
    /// session).
    TransportFailure,
}

// ---------------------------------------------------------------------------
// DispatchSummary
// ---------------------------------------------------------------------------

/// Aggregated statistics across multiple dispatches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DispatchSummary {
    /// Number of dispatches recorded.
    pub count: usize,
    /// Mean round-trip duration in milliseconds.
    pub mean_round_trip_ms: f64,
    /// Median (p50) round-trip duration in milliseconds.
    pub p50_round_trip_ms: f64,
    /// 99th-percentile round-trip duration in milliseconds.
    pub p99_round_trip_ms: f64,
    /// Total inbound wire bytes across all dispatches.
    pub total_wire_bytes_in: u64,
    /// Total outbound wire bytes across all dispatches.
    pub total_wire_bytes_out: u64,
    /// Failure rate (non-`Ok` outcomes / total dispatches).
    pub failure_rate: f64,
    /// Per-session dispatch counts (deterministic ordering).
    pub session_counts: BTreeMap<String, usize>,
}

impl Default for DispatchSummary {
    fn default() -> Self {
        Self {
            count: 0,
            mean_round_trip_ms: 0.0,
            p50_round_trip_ms: 0.0,
            p99_round_trip_ms: 0.0,
            total_wire_bytes_in: 0,
            total_wire_bytes_out: 0,
            failure_rate: 0.0,
            session_counts: BTreeMap::new(),
        }
    }
}

/// Compute a percentile value from a **sorted** slice.
fn percentile(sorted: &[u64], pct: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    if sorted.len() == 1 {
        return sorted[0] as f64;
    }
    let rank = pct / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let frac = rank - lower as f64;
    sorted[lower] as f64 * (1.0 - frac) + sorted[upper] as f64 * frac
}

// ---------------------------------------------------------------------------
// MetricsCollector
// ---------------------------------------------------------------------------

/// Thread-safe collector for dispatch metrics.
///
/// Wrap in an `Arc` to share across threads (the inner storage is already
/// behind a `Mutex`) — the gateway fans requests across a tokio runtime
/// even though the proxy/executor value graph underneath any one dispatch
/// stays single-threaded.
#[derive(Debug, Clone)]
pub struct MetricsCollector {
    inner: Arc<Mutex<Vec<DispatchMetrics>>>,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector {
    /// Create a new, empty collector.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Record a completed dispatch's metrics.
    pub fn record(&self, metrics: DispatchMetrics) {
        let mut data = self.inner.lock().expect("metrics lock poisoned");
        data.push(metrics);
    }

    /// Return all recorded dispatch metrics.
    pub fn dispatches(&self) -> Vec<DispatchMetrics> {
        let data = self.inner.lock().expect("metrics lock poisoned");
        data.clone()
    }

    /// Number of dispatches recorded so far.
    pub fn len(&self) -> usize {
        let data = self.inner.lock().expect("metrics lock poisoned");
        data.len()
    }

    /// Whether the collector has no recorded dispatches.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Compute an aggregated summary of all recorded dispatches.
    pub fn summary(&self) -> DispatchSummary {
        let data = self.inner.lock().expect("metrics lock poisoned");
        if data.is_empty() {
            return DispatchSummary::default();
        }

        let count = data.len();
        let mut durations: Vec<u64> = data.iter().map(|m| m.round_trip_ms).collect();
        durations.sort_unstable();

        let total_duration: u64 = durations.iter().sum();
        let mean_round_trip_ms = total_duration as f64 / count as f64;
        let p50_round_trip_ms = percentile(&durations, 50.0);
        let p99_round_trip_ms = percentile(&durations, 99.0);

        let total_wire_bytes_in: u64 = data.iter().map(|m| m.wire_bytes_in).sum();
        let total_wire_bytes_out: u64 = data.iter().map(|m| m.wire_bytes_out).sum();

        let failures = data
            .iter()
            .filter(|m| m.outcome != DispatchOutcome::Ok)
            .count();
        let failure_rate = failures as f64 / count as f64;

        let mut session_counts: BTreeMap<String, usize> = BTreeMap::new();
        for m in data.iter() {
            *session_counts.entry(m.session_id.clone()).or_insert(0) += 1;
        }

        DispatchSummary {
            count,
            mean_round_trip_ms,
            p50_round_trip_ms,
            p99_round_trip_ms,
            total_wire_bytes_in,
            total_wire_bytes_out,
            failure_rate,
            session_counts,
        }
    }

    /// Clear all recorded metrics.
    pub fn clear(&self) {
        let mut data = self.inner.lock().expect("metrics lock poisoned");
        data.clear();
    }
}

// ---------------------------------------------------------------------------
// tracing init
// ---------------------------------------------------------------------------

/// Initialize a `tracing_subscriber` formatter honoring `RUST_LOG`, falling
/// back to `"ocan=info"` when unset.
pub fn init_tracing() {
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|v| tracing_subscriber::EnvFilter::try_new(v).ok())
        .unwrap_or_else(|| tracing_subscriber::EnvFilter::new("ocan=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Emit a single structured `tracing::info!` event for a dispatch, in
/// addition to (not instead of) recording it in a [`MetricsCollector`].
pub fn log_dispatch(metrics: &DispatchMetrics) {
    info!(
        session = %metrics.session_id,
        operations = metrics.operation_count,
        nested_chains = metrics.nested_chain_count,
        round_trip_ms = metrics.round_trip_ms,
        outcome = ?metrics.outcome,
        "ocan_dispatch"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn sample(session: &str, ms: u64, outcome: DispatchOutcome) -> DispatchMetrics {
        DispatchMetrics {
            session_id: session.to_string(),
            operation_count: 2,
            nested_chain_count: 0,
            wire_bytes_in: 64,
            wire_bytes_out: 32,
            round_trip_ms: ms,
            outcome,
        }
    }

    #[test]
    fn collector_new_is_empty() {
        let c = MetricsCollector::new();
        assert!(c.is_empty());
    }

    #[test]
    fn collector_record_and_len() {
        let c = MetricsCollector::new();
        c.record(sample("s1", 10, DispatchOutcome::Ok));
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn empty_collector_summary() {
        let s = MetricsCollector::new().summary();
        assert_eq!(s.count, 0);
        assert_eq!(s.failure_rate, 0.0);
    }

    #[test]
    fn summary_mean_and_percentiles() {
        let c = MetricsCollector::new();
        for d in [10, 20, 30, 40, 50] {
            c.record(sample("s1", d, DispatchOutcome::Ok));
        }
        let s = c.summary();
        assert!((s.mean_round_trip_ms - 30.0).abs() < f64::EPSILON);
        assert!((s.p50_round_trip_ms - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn summary_failure_rate_counts_non_ok_outcomes() {
        let c = MetricsCollector::new();
        c.record(sample("s1", 10, DispatchOutcome::Ok));
        c.record(sample("s1", 20, DispatchOutcome::Application));
        c.record(sample("s1", 30, DispatchOutcome::TransportFailure));
        let s = c.summary();
        assert!((s.failure_rate - 2.0 / 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn summary_session_counts_are_deterministic() {
        let c = MetricsCollector::new();
        c.record(sample("zeta", 10, DispatchOutcome::Ok));
        c.record(sample("alpha", 20, DispatchOutcome::Ok));
        let s = c.summary();
        assert_eq!(s.session_counts["alpha"], 1);
        assert_eq!(s.session_counts["zeta"], 1);
    }

    #[test]
    fn dispatch_metrics_serde_roundtrip() {
        let m = sample("s1", 99, DispatchOutcome::Application);
        let json = serde_json::to_string(&m).unwrap();
        let m2: DispatchMetrics = serde_json::from_str(&json).unwrap();
        assert_eq!(m, m2);
    }

    #[test]
    fn concurrent_recording() {
        let c = MetricsCollector::new();
        let mut handles = vec![];
        for i in 0..10 {
            let cc = c.clone();
            handles.push(thread::spawn(move || {
                cc.record(sample("t", i * 10, DispatchOutcome::Ok));
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(c.len(), 10);
    }

    #[test]
    fn percentile_single_value() {
        assert_eq!(percentile(&[42], 99.0), 42.0);
    }
}
