//! Operational metrics registry and event model.
//!
//! A flat table of named counters and gauges that the reporting pipeline
//! serializes and pushes to the remote time-series endpoint each cycle.
//! Metrics are declared once in a static family table and expanded into
//! concrete entries at registry construction; there is no dynamic
//! registration afterwards. Mutations referencing an unknown name log a
//! warning and are dropped — metrics must never fail a request.

use std::collections::BTreeMap;

use tracing::warn;

/// A mutation request for a named metric.
///
/// Emitted by request handlers through the `MetricBus` and applied by the
/// pipeline task that owns the registry. Handlers never touch the
/// registry directly.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricEvent {
    /// Add `amount` to a counter.
    Increment {
        /// Metric name (`{family}_{submetric}`).
        name: String,
        /// Amount to add.
        amount: f64,
    },
    /// Subtract `amount` from a counter.
    Decrement {
        /// Metric name.
        name: String,
        /// Amount to subtract.
        amount: f64,
    },
    /// Overwrite a gauge with `value`.
    Set {
        /// Metric name.
        name: String,
        /// New value.
        value: f64,
    },
}

/// Declarative description of one metric family.
///
/// An empty submetric list declares a singleton metric named by the
/// family itself (e.g. `activeUsers`).
#[derive(Debug, Clone, Copy)]
pub struct MetricFamily {
    /// Family prefix for the wire name.
    pub family: &'static str,
    /// Whether members are zeroed after each flush cycle.
    pub resettable: bool,
    /// Submetric suffixes, expanded to `{family}_{submetric}`.
    pub submetrics: &'static [&'static str],
    /// Value each member starts at.
    pub initial_value: f64,
}

/// All metric families known to the service.
///
/// Wire names keep the dashboard's `{family}_{submetric}` convention.
pub const METRIC_FAMILIES: &[MetricFamily] = &[
    MetricFamily {
        family: "requestCounts",
        resettable: true,
        submetrics: &["GET", "POST", "PUT", "DELETE"],
        initial_value: 0.0,
    },
    MetricFamily {
        family: "authAttempts",
        resettable: true,
        submetrics: &["successful", "failed"],
        initial_value: 0.0,
    },
    MetricFamily {
        family: "activeUsers",
        resettable: false,
        submetrics: &[],
        initial_value: 0.0,
    },
    MetricFamily {
        family: "systemMetrics",
        resettable: false,
        submetrics: &["cpuUsage", "memoryUsage"],
        initial_value: 0.0,
    },
    MetricFamily {
        family: "pizzaMetrics",
        resettable: true,
        submetrics: &["sold", "creationFailures", "revenue"],
        initial_value: 0.0,
    },
    MetricFamily {
        family: "latencyMetrics",
        resettable: false,
        submetrics: &["serviceEndpoint", "pizzaCreation"],
        initial_value: 0.0,
    },
];

/// Well-known metric names used by instrumentation call sites.
pub mod names {
    /// Cumulative logged-in user gauge.
    pub const ACTIVE_USERS: &str = "activeUsers";
    /// Successful login counter.
    pub const AUTH_SUCCESSFUL: &str = "authAttempts_successful";
    /// Failed login counter.
    pub const AUTH_FAILED: &str = "authAttempts_failed";
    /// Host CPU utilization gauge (percent).
    pub const CPU_USAGE: &str = "systemMetrics_cpuUsage";
    /// Host memory utilization gauge (percent).
    pub const MEMORY_USAGE: &str = "systemMetrics_memoryUsage";
    /// Pizzas sold this cycle.
    pub const PIZZAS_SOLD: &str = "pizzaMetrics_sold";
    /// Orders the factory failed to fulfill this cycle.
    pub const PIZZA_FAILURES: &str = "pizzaMetrics_creationFailures";
    /// Revenue taken this cycle.
    pub const PIZZA_REVENUE: &str = "pizzaMetrics_revenue";
    /// Last observed endpoint latency gauge (ms).
    pub const ENDPOINT_LATENCY: &str = "latencyMetrics_serviceEndpoint";
    /// Last observed factory round-trip gauge (ms).
    pub const PIZZA_LATENCY: &str = "latencyMetrics_pizzaCreation";

    /// Per-HTTP-method request counter name.
    pub fn request_count(method: &str) -> String {
        format!("requestCounts_{method}")
    }
}

/// A single registered metric.
#[derive(Debug, Clone)]
struct Metric {
    /// Current value.
    value: f64,
    /// Zeroed after each flush cycle when true.
    resettable: bool,
}

/// The in-process metric table.
///
/// Not thread-safe on purpose: the reporting pipeline task is the sole
/// owner, and all concurrent mutation flows through `MetricEvent`s.
#[derive(Debug)]
pub struct MetricRegistry {
    metrics: BTreeMap<String, Metric>,
}

impl MetricRegistry {
    /// Build the registry by expanding `METRIC_FAMILIES`.
    pub fn new() -> Self {
        let mut metrics = BTreeMap::new();

        for family in METRIC_FAMILIES {
            if family.submetrics.is_empty() {
                metrics.insert(
                    family.family.to_string(),
                    Metric {
                        value: family.initial_value,
                        resettable: family.resettable,
                    },
                );
            } else {
                for sub in family.submetrics {
                    metrics.insert(
                        format!("{}_{sub}", family.family),
                        Metric {
                            value: family.initial_value,
                            resettable: family.resettable,
                        },
                    );
                }
            }
        }

        Self { metrics }
    }

    /// Add `amount` to a registered metric. Unknown names are dropped
    /// with a warning.
    pub fn increment(&mut self, name: &str, amount: f64) {
        match self.metrics.get_mut(name) {
            Some(metric) => metric.value += amount,
            None => warn!(metric = name, "metric not registered, ignoring"),
        }
    }

    /// Subtract `amount` from a registered metric.
    pub fn decrement(&mut self, name: &str, amount: f64) {
        match self.metrics.get_mut(name) {
            Some(metric) => metric.value -= amount,
            None => warn!(metric = name, "metric not registered, ignoring"),
        }
    }

    /// Overwrite a registered metric's value.
    pub fn set(&mut self, name: &str, value: f64) {
        match self.metrics.get_mut(name) {
            Some(metric) => metric.value = value,
            None => warn!(metric = name, "metric not registered, ignoring"),
        }
    }

    /// Current value of a metric; 0 for unknown names.
    pub fn get(&self, name: &str) -> f64 {
        self.metrics.get(name).map_or(0.0, |m| m.value)
    }

    /// Apply a bus event to the table.
    pub fn apply(&mut self, event: MetricEvent) {
        match event {
            MetricEvent::Increment { name, amount } => self.increment(&name, amount),
            MetricEvent::Decrement { name, amount } => self.decrement(&name, amount),
            MetricEvent::Set { name, value } => self.set(&name, value),
        }
    }

    /// Serialize every metric as one line-protocol record per metric:
    /// `name,source=<tag> value=<value>`, newline-joined.
    pub fn render(&self, source: &str) -> String {
        self.metrics
            .iter()
            .map(|(name, metric)| format!("{name},source={source} value={}", metric.value))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Zero every resettable metric. Gauges and cumulative metrics keep
    /// their values across cycles.
    pub fn reset_resettable(&mut self) {
        for metric in self.metrics.values_mut() {
            if metric.resettable {
                metric.value = 0.0;
            }
        }
    }

    /// Number of registered metrics.
    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    /// Whether the registry holds no metrics.
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}

impl Default for MetricRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_table_expands_all_members() {
        let registry = MetricRegistry::new();
        // 4 request methods + 2 auth outcomes + activeUsers + 2 system
        // gauges + 3 pizza counters + 2 latency gauges
        assert_eq!(registry.len(), 14);
        assert_eq!(registry.get("requestCounts_GET"), 0.0);
        assert_eq!(registry.get(names::ACTIVE_USERS), 0.0);
    }

    #[test]
    fn test_increment_accumulates() {
        let mut registry = MetricRegistry::new();
        registry.increment(names::PIZZAS_SOLD, 1.0);
        registry.increment(names::PIZZAS_SOLD, 3.0);
        assert_eq!(registry.get(names::PIZZAS_SOLD), 4.0);
    }

    #[test]
    fn test_decrement_and_set() {
        let mut registry = MetricRegistry::new();
        registry.set(names::ACTIVE_USERS, 10.0);
        registry.decrement(names::ACTIVE_USERS, 4.0);
        assert_eq!(registry.get(names::ACTIVE_USERS), 6.0);
    }

    #[test]
    fn test_unknown_metric_is_a_noop() {
        let mut registry = MetricRegistry::new();
        registry.increment("no_such_metric", 1.0);
        registry.decrement("no_such_metric", 1.0);
        registry.set("no_such_metric", 42.0);
        assert_eq!(registry.get("no_such_metric"), 0.0);
        assert_eq!(registry.len(), 14);
    }

    #[test]
    fn test_render_line_protocol() {
        let mut registry = MetricRegistry::new();
        registry.set(names::CPU_USAGE, 56.25);
        let payload = registry.render("test-host");
        assert!(payload.contains("systemMetrics_cpuUsage,source=test-host value=56.25"));
        assert_eq!(payload.lines().count(), registry.len());
    }

    #[test]
    fn test_reset_only_touches_resettable() {
        let mut registry = MetricRegistry::new();
        registry.increment("requestCounts_POST", 7.0);
        registry.set(names::CPU_USAGE, 93.1);
        registry.increment(names::ACTIVE_USERS, 2.0);

        registry.reset_resettable();

        assert_eq!(registry.get("requestCounts_POST"), 0.0);
        assert_eq!(registry.get(names::CPU_USAGE), 93.1);
        assert_eq!(registry.get(names::ACTIVE_USERS), 2.0);
    }

    #[test]
    fn test_apply_routes_events() {
        let mut registry = MetricRegistry::new();
        registry.apply(MetricEvent::Increment {
            name: names::AUTH_FAILED.to_string(),
            amount: 2.0,
        });
        registry.apply(MetricEvent::Set {
            name: names::ENDPOINT_LATENCY.to_string(),
            value: 12.0,
        });
        registry.apply(MetricEvent::Decrement {
            name: names::AUTH_FAILED.to_string(),
            amount: 1.0,
        });
        assert_eq!(registry.get(names::AUTH_FAILED), 1.0);
        assert_eq!(registry.get(names::ENDPOINT_LATENCY), 12.0);
    }
}
