//! Metrics Pipeline - Event Ingestion, Collection, and Periodic Flush
//!
//! The pipeline task is the sole owner of the `MetricRegistry`. Request
//! handlers emit `MetricEvent`s through a cloneable `MetricBus`; the
//! pipeline applies them between timer ticks. Each tick it samples host
//! CPU/memory through the `SystemProbe` port, serializes the registry,
//! pushes the payload through the `MetricsSink` port, and then zeroes
//! every resettable metric - whether or not the push succeeded, matching
//! the upstream exporter.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::{broadcast, mpsc};
use tokio::time::MissedTickBehavior;
use tracing::{info, instrument, warn};

use crate::domain::metrics::{names, MetricEvent, MetricRegistry};
use crate::ports::metrics_sink::MetricsSink;
use crate::ports::system_probe::SystemProbe;

/// Create a connected bus/receiver pair.
///
/// The receiver side is handed to the pipeline; the bus side is cloned
/// into every instrumentation call site.
pub fn metric_channel() -> (MetricBus, mpsc::UnboundedReceiver<MetricEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (MetricBus { tx }, rx)
}

/// Cloneable handle for emitting metric events.
///
/// Sends never block and never fail the caller: if the pipeline is gone
/// the event is silently dropped, because metrics must never fail a
/// user-facing request.
#[derive(Debug, Clone)]
pub struct MetricBus {
    /// Event channel into the pipeline task.
    tx: mpsc::UnboundedSender<MetricEvent>,
}

impl MetricBus {
    /// Add 1 to a counter.
    pub fn increment(&self, name: impl Into<String>) {
        self.increment_by(name, 1.0);
    }

    /// Add `amount` to a counter.
    pub fn increment_by(&self, name: impl Into<String>, amount: f64) {
        self.emit(MetricEvent::Increment {
            name: name.into(),
            amount,
        });
    }

    /// Subtract 1 from a counter.
    pub fn decrement(&self, name: impl Into<String>) {
        self.emit(MetricEvent::Decrement {
            name: name.into(),
            amount: 1.0,
        });
    }

    /// Overwrite a gauge.
    pub fn set(&self, name: impl Into<String>, value: f64) {
        self.emit(MetricEvent::Set {
            name: name.into(),
            value,
        });
    }

    fn emit(&self, event: MetricEvent) {
        let _ = self.tx.send(event);
    }
}

/// Timer-driven metrics collection and reporting loop.
pub struct MetricsPipeline {
    /// The registry this task owns.
    registry: MetricRegistry,
    /// Incoming mutation events from request handlers.
    events: mpsc::UnboundedReceiver<MetricEvent>,
    /// Host CPU/memory sampler.
    probe: Box<dyn SystemProbe>,
    /// Remote push endpoint.
    sink: Arc<dyn MetricsSink>,
    /// Source tag attached to every metric line.
    source: String,
    /// Collection/flush interval.
    interval: Duration,
}

impl MetricsPipeline {
    /// Wire a pipeline from its ports.
    pub fn new(
        events: mpsc::UnboundedReceiver<MetricEvent>,
        probe: Box<dyn SystemProbe>,
        sink: Arc<dyn MetricsSink>,
        source: String,
        interval: Duration,
    ) -> Self {
        Self {
            registry: MetricRegistry::new(),
            events,
            probe,
            sink,
            source,
            interval,
        }
    }

    /// Read access to the registry for assertions and probes.
    pub fn registry(&self) -> &MetricRegistry {
        &self.registry
    }

    /// Apply one bus event to the registry.
    pub fn handle_event(&mut self, event: MetricEvent) {
        self.registry.apply(event);
    }

    /// Sample host CPU and memory into the system gauges.
    pub fn collect_system(&mut self) {
        let cpu = self.probe.cpu_usage_percent();
        let memory = self.probe.memory_usage_percent();
        self.registry.set(names::CPU_USAGE, cpu);
        self.registry.set(names::MEMORY_USAGE, memory);
    }

    /// Serialize and push the registry, then zero resettable metrics.
    ///
    /// Push failures are logged and the cycle's counts are dropped; the
    /// reset still runs, matching the upstream exporter. No retry within
    /// the cycle.
    #[instrument(skip(self))]
    pub async fn flush(&mut self) {
        let payload = self.registry.render(&self.source);
        if payload.is_empty() {
            return;
        }

        if let Err(e) = self.sink.push(&payload).await {
            warn!(error = %e, "Metrics push failed, dropping this cycle");
        }

        self.registry.reset_resettable();
    }

    /// Run the pipeline until shutdown.
    ///
    /// Events are applied as they arrive; every `interval` the system
    /// gauges are collected and the registry is flushed.
    #[instrument(skip(self, shutdown_rx))]
    pub async fn run(mut self, mut shutdown_rx: broadcast::Receiver<()>) -> Result<()> {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // interval() resolves immediately once; the first flush should
        // happen a full interval after startup
        ticker.tick().await;

        info!(
            interval_s = self.interval.as_secs(),
            source = %self.source,
            metrics = self.registry.len(),
            "Metrics pipeline started"
        );

        loop {
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => {
                    info!("Metrics pipeline shutting down");
                    return Ok(());
                }
                _ = ticker.tick() => {
                    self.collect_system();
                    self.flush().await;
                }
                event = self.events.recv() => match event {
                    Some(event) => self.registry.apply(event),
                    None => {
                        info!("All metric emitters dropped, pipeline stopping");
                        return Ok(());
                    }
                },
            }
        }
    }
}
