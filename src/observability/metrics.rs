//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define the request metrics recorded by the instrumentation middleware
//! - Render them in the Prometheus text exposition format
//!
//! # Metrics
//! - `app_request_latency_seconds` (histogram): latency by method, endpoint
//! - `app_request_count` (counter): requests by method, endpoint, http_status
//!
//! # Design Decisions
//! - The recorder is owned by the server, not installed globally, so several
//!   servers (and tests) can live in one process
//! - Updates go through the recorder's atomics; no extra locking
//! - Histogram buckets default to the Prometheus client defaults

use metrics::Unit;
use metrics_exporter_prometheus::{
    BuildError, Matcher, PrometheusBuilder, PrometheusHandle, PrometheusRecorder,
};

use crate::config::schema::DEFAULT_LATENCY_BUCKETS;

pub const REQUEST_LATENCY: &str = "app_request_latency_seconds";
pub const REQUEST_COUNT: &str = "app_request_count";

/// Sink for per-request instrumentation.
pub trait RequestMetrics: Send + Sync {
    /// Record the wall-clock duration of one request.
    fn observe_latency(&self, method: &str, path: &str, seconds: f64);

    /// Count one completed request with its final status.
    fn increment_count(&self, method: &str, path: &str, status: u16);
}

/// Prometheus-backed request metrics registry.
pub struct PrometheusMetrics {
    recorder: PrometheusRecorder,
    handle: PrometheusHandle,
}

impl PrometheusMetrics {
    /// Build a registry whose latency histogram uses `buckets`.
    pub fn new(buckets: &[f64]) -> Result<Self, BuildError> {
        let recorder = PrometheusBuilder::new()
            .set_buckets_for_metric(Matcher::Full(REQUEST_LATENCY.to_string()), buckets)?
            .build_recorder();
        let handle = recorder.handle();

        metrics::with_local_recorder(&recorder, || {
            metrics::describe_histogram!(
                REQUEST_LATENCY,
                Unit::Seconds,
                "Application Request Latency"
            );
            metrics::describe_counter!(REQUEST_COUNT, "Application Request Count");
        });

        Ok(Self { recorder, handle })
    }

    pub fn with_default_buckets() -> Result<Self, BuildError> {
        Self::new(&DEFAULT_LATENCY_BUCKETS)
    }

    /// Current state of every metric in Prometheus text format.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

impl RequestMetrics for PrometheusMetrics {
    fn observe_latency(&self, method: &str, path: &str, seconds: f64) {
        metrics::with_local_recorder(&self.recorder, || {
            metrics::histogram!(
                REQUEST_LATENCY,
                "method" => method.to_string(),
                "endpoint" => path.to_string()
            )
            .record(seconds);
        });
    }

    fn increment_count(&self, method: &str, path: &str, status: u16) {
        metrics::with_local_recorder(&self.recorder, || {
            metrics::counter!(
                REQUEST_COUNT,
                "method" => method.to_string(),
                "endpoint" => path.to_string(),
                "http_status" => status.to_string()
            )
            .increment(1);
        });
    }
}

/// Sink used when instrumentation is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl RequestMetrics for NoopMetrics {
    fn observe_latency(&self, _method: &str, _path: &str, _seconds: f64) {}

    fn increment_count(&self, _method: &str, _path: &str, _status: u16) {}
}
