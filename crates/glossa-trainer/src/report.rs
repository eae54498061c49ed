//! Metric reporting contract.

use tracing::info;

/// Receives per-epoch metrics. The trainer depends only on this
/// contract, never on a particular logging backend.
pub trait Reporter {
    /// Record one metric value for one epoch.
    fn report(&mut self, metric: &str, value: f64, epoch: usize);
}

/// Reporter emitting metrics as `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&mut self, metric: &str, value: f64, epoch: usize) {
        info!(metric, value, epoch = epoch + 1, "epoch metric");
    }
}

/// Reporter recording metrics in memory, for inspection after a run.
#[derive(Debug, Default, Clone)]
pub struct MemoryReporter {
    /// `(metric, value, epoch)` records in emission order.
    pub records: Vec<(String, f64, usize)>,
}

impl MemoryReporter {
    /// All recorded values of one metric, in epoch order.
    pub fn values_of(&self, metric: &str) -> Vec<f64> {
        self.records
            .iter()
            .filter(|(name, _, _)| name == metric)
            .map(|(_, value, _)| *value)
            .collect()
    }
}

impl Reporter for MemoryReporter {
    fn report(&mut self, metric: &str, value: f64, epoch: usize) {
        self.records.push((metric.to_string(), value, epoch));
    }
}
