//! Request instrumentation middleware.
//!
//! Records one latency observation and one count increment per request,
//! keyed by method and raw path (plus final status for the count). The
//! exposition route is skipped so scraping does not measure itself.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use std::time::Instant;

use crate::observability::RequestMetrics;

/// State shared by every invocation of [`track_metrics`].
#[derive(Clone)]
pub struct InstrumentationState {
    pub sink: Arc<dyn RequestMetrics>,
    /// Requests to this path are passed through untouched.
    pub excluded_path: Arc<str>,
}

impl InstrumentationState {
    pub fn new(sink: Arc<dyn RequestMetrics>, excluded_path: impl Into<Arc<str>>) -> Self {
        Self {
            sink,
            excluded_path: excluded_path.into(),
        }
    }
}

pub async fn track_metrics(
    State(state): State<InstrumentationState>,
    request: Request,
    next: Next,
) -> Response {
    if request.uri().path() == &*state.excluded_path {
        return next.run(request).await;
    }

    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    let elapsed = start.elapsed().as_secs_f64();
    state.sink.observe_latency(&method, &path, elapsed);
    state
        .sink
        .increment_count(&method, &path, response.status().as_u16());

    response
}
