//! Metrics Adapters - Host Probe and Remote Push Sink
//!
//! Implements the `SystemProbe` port with sysinfo sampling and the
//! `MetricsSink` port with a reqwest client posting line-protocol
//! payloads to the configured Grafana-style endpoint.

pub mod sink;
pub mod system;

pub use sink::{GrafanaSink, SinkCredentials};
pub use system::SysinfoProbe;
