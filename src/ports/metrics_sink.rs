//! Metrics Sink Port - Remote Time-series Push Interface
//!
//! The flusher serializes the registry into a line-protocol payload and
//! hands it to this port once per cycle. Push failures are logged by the
//! pipeline and never retried within the cycle.

use async_trait::async_trait;

/// Trait for remote metrics endpoints.
#[async_trait]
pub trait MetricsSink: Send + Sync + 'static {
  /// Post one newline-delimited line-protocol payload.
  ///
  /// # Errors
  /// Returns an error on transport failure or a non-success HTTP
  /// status. The pipeline treats both as a skipped cycle.
  async fn push(&self, payload: &str) -> anyhow::Result<()>;
}
