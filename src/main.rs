//! Pizza Service — Entry Point
//!
//! Initializes configuration, logging, storage, and the metrics
//! pipeline, then serves the API until SIGINT.
//!
//! Wiring sequence:
//! 1. Load config.toml + validate
//! 2. Init tracing (JSON structured logging)
//! 3. Create shutdown/readiness channels
//! 4. Load secrets from env vars (PIZZA_JWT_SECRET, PIZZA_FACTORY_KEY,
//!    PIZZA_METRICS_USER, PIZZA_METRICS_KEY)
//! 5. Wire the in-memory store, metric bus, and services
//! 6. Seed the default admin account
//! 7. Spawn the metrics pipeline (collector + flusher select loop)
//! 8. Serve the tracked API router
//! 9. Wait for SIGINT → graceful shutdown (unready→signal→bounded joins)

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::{broadcast, watch};
use tracing::{error, info};

mod adapters;
mod config;
mod domain;
mod ports;
mod usecases;

use adapters::factory::PizzaFactoryClient;
use adapters::http::{build_router, AppState};
use adapters::metrics::{GrafanaSink, SinkCredentials, SysinfoProbe};
use adapters::persistence::InMemoryStore;
use usecases::auth_service::{AuthService, TokenIssuer};
use usecases::franchise_service::FranchiseService;
use usecases::metrics_pipeline::{metric_channel, MetricsPipeline};
use usecases::order_service::OrderService;

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1. Load configuration from config.toml ──────────────
    let config = config::loader::load_config("config.toml")
        .context("Failed to load configuration")?;

    // ── 2. Initialize structured JSON logging ───────────────
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new(&config.service.log_level)
                }),
        )
        .json()
        .init();

    info!(
        name = %config.service.name,
        version = env!("CARGO_PKG_VERSION"),
        metrics_enabled = config.metrics.enabled,
        "Starting pizza service"
    );

    // ── 3. Shutdown signal channels ─────────────────────────
    let (shutdown_tx, _shutdown_rx) = broadcast::channel::<()>(1);
    let (ready_tx, ready_rx) = watch::channel(true);

    // ── 4. Load secrets from env vars ───────────────────────
    let issuer = TokenIssuer::from_env(config.auth.token_ttl_hours)
        .context("Failed to load JWT secret from env")?;
    let factory = Arc::new(
        PizzaFactoryClient::from_env(&config.factory)
            .context("Failed to create factory client")?,
    );

    // ── 5. Wire the store, metric bus, and services ─────────
    let store = Arc::new(InMemoryStore::new());
    let (metric_bus, metric_events) = metric_channel();

    let auth = Arc::new(AuthService::new(
        store.clone(),
        issuer,
        metric_bus.clone(),
    ));
    let franchises = Arc::new(FranchiseService::new(store.clone(), store.clone()));
    let orders = Arc::new(OrderService::new(
        store.clone(),
        factory,
        metric_bus.clone(),
    ));

    // ── 6. Seed the default admin account ───────────────────
    auth.ensure_admin(
        &config.auth.admin_name,
        &config.auth.admin_email,
        &config.auth.admin_password,
    )
    .await
    .context("Failed to seed admin account")?;

    // ── 7. Spawn metrics pipeline ───────────────────────────
    let pipeline_handle = if config.metrics.enabled {
        let credentials = SinkCredentials::from_env()
            .context("Failed to load metrics credentials from env")?;
        let sink = Arc::new(GrafanaSink::new(
            config.metrics.url.clone(),
            credentials,
            Duration::from_secs(config.metrics.timeout_seconds),
        )?);
        let pipeline = MetricsPipeline::new(
            metric_events,
            Box::new(SysinfoProbe::new()),
            sink,
            config.metrics.source.clone(),
            Duration::from_secs(config.metrics.interval_seconds),
        );

        let pipeline_shutdown = shutdown_tx.subscribe();
        Some(tokio::spawn(async move {
            if let Err(e) = pipeline.run(pipeline_shutdown).await {
                error!(error = %e, "Metrics pipeline failed");
            }
        }))
    } else {
        info!("Metrics reporting disabled");
        drop(metric_events);
        None
    };

    // ── 8. Serve the API ────────────────────────────────────
    let state = AppState {
        auth,
        franchises,
        orders,
        metrics: metric_bus,
        ready: ready_rx,
    };
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.service.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", config.service.bind_address))?;
    info!(address = %config.service.bind_address, "API server listening");

    let mut server_shutdown = shutdown_tx.subscribe();
    let server_handle = tokio::spawn(async move {
        let result = axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = server_shutdown.recv().await;
            })
            .await;
        if let Err(e) = result {
            error!(error = %e, "API server failed");
        }
    });

    info!("All tasks spawned — service is running");

    // ── 9. Wait for SIGINT ──────────────────────────────────
    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("SIGINT received, initiating graceful shutdown");
        }
    }

    // Graceful shutdown: readiness probe flips to 503, tasks get the
    // broadcast, joins are bounded.
    let _ = ready_tx.send(false);
    let _ = shutdown_tx.send(());

    let _ = tokio::time::timeout(Duration::from_secs(10), server_handle).await;
    if let Some(handle) = pipeline_handle {
        let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
    }

    info!("Shutdown complete");
    Ok(())
}
