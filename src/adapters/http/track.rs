//! Request tracking middleware.
//!
//! Emits a per-HTTP-method counter increment when a request arrives and
//! sets the endpoint latency gauge when the response completes. All
//! instrumentation goes through the metric bus; the middleware never
//! touches the registry and can never fail a request.

use std::time::Instant;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use super::AppState;
use crate::domain::metrics::names;

/// Count the request and record its latency.
pub async fn track_requests(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    state
        .metrics
        .increment(names::request_count(request.method().as_str()));

    let start = Instant::now();
    let response = next.run(request).await;

    state
        .metrics
        .set(names::ENDPOINT_LATENCY, start.elapsed().as_millis() as f64);

    response
}
