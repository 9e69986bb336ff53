//! System Probe Port - Host Resource Sampling Interface
//!
//! The collector samples host CPU and memory utilization through this
//! port each cycle. Sampling is synchronous and must not block.

/// Trait for host resource samplers.
pub trait SystemProbe: Send + 'static {
  /// Load-average-derived CPU utilization in percent, rounded to two
  /// decimals.
  fn cpu_usage_percent(&mut self) -> f64;

  /// Memory utilization (used / total) in percent, rounded to two
  /// decimals.
  fn memory_usage_percent(&mut self) -> f64;
}
