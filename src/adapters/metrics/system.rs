//! Sysinfo Probe - Host CPU and Memory Sampling
//!
//! CPU utilization derives from the 1-minute load average divided by
//! the logical CPU count; memory utilization is used/total. Both are
//! percentages rounded to two decimals, matching the dashboard's
//! expectations.

use sysinfo::System;

use crate::ports::system_probe::SystemProbe;

/// Host resource sampler backed by the sysinfo crate.
pub struct SysinfoProbe {
    /// Reused system handle; memory stats refresh in place.
    system: System,
}

impl SysinfoProbe {
    /// Create a new probe.
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }
}

impl Default for SysinfoProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemProbe for SysinfoProbe {
    fn cpu_usage_percent(&mut self) -> f64 {
        let cpus = std::thread::available_parallelism().map_or(1, std::num::NonZero::get);
        let load = System::load_average().one;
        round2(load / cpus as f64 * 100.0)
    }

    fn memory_usage_percent(&mut self) -> f64 {
        self.system.refresh_memory();
        let total = self.system.total_memory();
        if total == 0 {
            return 0.0;
        }
        round2(self.system.used_memory() as f64 / total as f64 * 100.0)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(56.2549), 56.25);
        assert_eq!(round2(0.005), 0.01);
        assert_eq!(round2(100.0), 100.0);
    }

    #[test]
    fn test_memory_percent_in_range() {
        let mut probe = SysinfoProbe::new();
        let memory = probe.memory_usage_percent();
        assert!((0.0..=100.0).contains(&memory));
    }

    #[test]
    fn test_cpu_percent_non_negative() {
        let mut probe = SysinfoProbe::new();
        assert!(probe.cpu_usage_percent() >= 0.0);
    }
}
