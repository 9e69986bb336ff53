//! Inbound HTTP Adapter - axum API Surface
//!
//! Assembles the service router: auth, franchise, and order routes under
//! `/api`, liveness/readiness probes for orchestrators, a welcome root,
//! and a JSON 404 fallback. The whole router is wrapped by the
//! request-tracking middleware so every request (including unknown
//! endpoints) feeds the per-method counters and the latency gauge.
//!
//! Sub-modules:
//! - `auth`: Registration, login, logout, user update
//! - `franchise`: Franchise and store administration
//! - `order`: Menu and diner orders
//! - `extract`: Bearer-token `AuthUser` extractor
//! - `track`: Request counting / latency middleware
//! - `error`: `ServiceError` to HTTP response mapping

pub mod auth;
pub mod error;
pub mod extract;
pub mod franchise;
pub mod order;
pub mod track;

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{middleware, Json, Router};
use serde_json::json;
use tokio::sync::watch;

use crate::usecases::auth_service::AuthService;
use crate::usecases::franchise_service::FranchiseService;
use crate::usecases::metrics_pipeline::MetricBus;
use crate::usecases::order_service::OrderService;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Auth use cases + token verification for the extractor.
    pub auth: Arc<AuthService>,
    /// Franchise use cases.
    pub franchises: Arc<FranchiseService>,
    /// Order use cases.
    pub orders: Arc<OrderService>,
    /// Metric event emitter for the tracking middleware.
    pub metrics: MetricBus,
    /// Readiness flag flipped off during graceful shutdown.
    pub ready: watch::Receiver<bool>,
}

/// Build the service router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/live", get(liveness))
        .route("/ready", get(readiness))
        .nest("/api/auth", auth::router())
        .nest("/api/franchise", franchise::router())
        .nest("/api/order", order::router())
        .fallback(unknown_endpoint)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            track::track_requests,
        ))
        .with_state(state)
}

/// Welcome banner with the service version.
async fn root() -> impl IntoResponse {
    Json(json!({
        "message": "welcome to the pizza service",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Liveness probe: 200 while the process runs.
async fn liveness() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Readiness probe: 503 once graceful shutdown begins.
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    if *state.ready.borrow() {
        (StatusCode::OK, "READY")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "NOT READY")
    }
}

/// JSON 404 for unknown routes.
async fn unknown_endpoint() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({"message": "unknown endpoint"})),
    )
}
