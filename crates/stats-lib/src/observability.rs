//! Observability infrastructure for the stats agent
//!
//! Provides:
//! - Prometheus metrics (query latency, samples written, skipped ticks, last usage)
//! - Structured event logging with tracing

use crate::models::{Report, Sample, TIMESTAMP_FORMAT};
use prometheus::{
    register_gauge, register_histogram, register_int_counter, Gauge, Histogram, IntCounter,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for runtime query latency (in seconds)
const QUERY_LATENCY_BUCKETS: &[f64] = &[0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<AgentMetricsInner> = OnceLock::new();

struct AgentMetricsInner {
    query_latency_seconds: Histogram,
    samples_written: IntCounter,
    ticks_skipped: IntCounter,
    collection_errors: IntCounter,
    last_cpu_percent: Gauge,
    last_memory_percent: Gauge,
}

impl AgentMetricsInner {
    fn new() -> Self {
        Self {
            query_latency_seconds: register_histogram!(
                "container_stats_query_latency_seconds",
                "Time spent waiting for the runtime stats command",
                QUERY_LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register query_latency_seconds"),

            samples_written: register_int_counter!(
                "container_stats_samples_written_total",
                "Samples appended to the series file"
            )
            .expect("Failed to register samples_written"),

            ticks_skipped: register_int_counter!(
                "container_stats_ticks_skipped_total",
                "Ticks where the runtime returned no stats"
            )
            .expect("Failed to register ticks_skipped"),

            collection_errors: register_int_counter!(
                "container_stats_collection_errors_total",
                "Failures that stopped the collection loop"
            )
            .expect("Failed to register collection_errors"),

            last_cpu_percent: register_gauge!(
                "container_stats_cpu_percent",
                "CPU percent of the most recent sample"
            )
            .expect("Failed to register cpu_percent"),

            last_memory_percent: register_gauge!(
                "container_stats_memory_percent",
                "Memory percent of the most recent sample"
            )
            .expect("Failed to register memory_percent"),
        }
    }
}

/// Handle to the process-wide Prometheus metrics
///
/// Clones share the same underlying metrics.
#[derive(Clone)]
pub struct AgentMetrics {
    _private: (),
}

impl Default for AgentMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentMetrics {
    /// Create a new metrics handle (registers the metrics on first call)
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(AgentMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &AgentMetricsInner {
        GLOBAL_METRICS.get_or_init(AgentMetricsInner::new)
    }

    pub fn observe_query_latency(&self, duration_secs: f64) {
        self.inner().query_latency_seconds.observe(duration_secs);
    }

    pub fn inc_samples_written(&self) {
        self.inner().samples_written.inc();
    }

    pub fn inc_ticks_skipped(&self) {
        self.inner().ticks_skipped.inc();
    }

    pub fn inc_collection_errors(&self) {
        self.inner().collection_errors.inc();
    }

    /// Record the usage figures of the latest sample
    pub fn set_last_usage(&self, cpu_percent: f64, memory_percent: f64) {
        self.inner().last_cpu_percent.set(cpu_percent);
        self.inner().last_memory_percent.set(memory_percent);
    }
}

/// Structured logger for agent events
///
/// Every record carries an `event` field so log pipelines can filter on it.
#[derive(Clone)]
pub struct StructuredLogger {
    node_name: String,
}

impl StructuredLogger {
    pub fn new(node_name: impl Into<String>) -> Self {
        Self {
            node_name: node_name.into(),
        }
    }

    pub fn log_startup(&self, version: &str, container: &str, output: &str) {
        info!(
            event = "agent_started",
            node = %self.node_name,
            agent_version = %version,
            container = %container,
            output = %output,
            "Stats agent started"
        );
    }

    pub fn log_sample(&self, sample: &Sample) {
        info!(
            event = "sample_recorded",
            node = %self.node_name,
            container_id = %sample.container_id,
            timestamp = %sample.timestamp.format(TIMESTAMP_FORMAT),
            cpu_percent = sample.cpu_percent,
            memory_usage = %sample.memory_usage,
            memory_percent = sample.memory_percent,
            disk_read_mib = sample.disk_read_mib,
            disk_write_mib = sample.disk_write_mib,
            "Sample recorded"
        );
    }

    pub fn log_skipped_tick(&self, container: &str, skipped_total: u64) {
        info!(
            event = "tick_skipped",
            node = %self.node_name,
            container = %container,
            skipped_total = skipped_total,
            "Runtime returned no stats, skipping tick"
        );
    }

    pub fn log_collection_aborted(&self, container: &str, error: &str) {
        warn!(
            event = "collection_aborted",
            node = %self.node_name,
            container = %container,
            error = %error,
            "Collection stopped on error"
        );
    }

    pub fn log_shutdown(&self, container: &str, samples: u64, skipped: u64) {
        info!(
            event = "agent_shutdown",
            node = %self.node_name,
            container = %container,
            samples = samples,
            skipped = skipped,
            "Stats collection stopped"
        );
    }

    pub fn log_report(&self, report: &Report) {
        info!(
            event = "series_analyzed",
            node = %self.node_name,
            container_id = %report.container_id,
            samples = report.sample_count,
            max_cpu_percent = report.cpu.value,
            max_memory_percent = report.memory.percent,
            max_disk_read_mib = report.disk_read.value,
            max_disk_write_mib = report.disk_write.value,
            "Series analyzed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_metrics_handles_share_registry() {
        let metrics = AgentMetrics::new();
        let other = metrics.clone();

        metrics.observe_query_latency(0.02);
        metrics.inc_ticks_skipped();
        metrics.set_last_usage(12.5, 40.0);
        other.inc_samples_written();

        assert!(other.inner().samples_written.get() >= 1);
        assert!(metrics.inner().ticks_skipped.get() >= 1);
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("test-node");
        assert_eq!(logger.node_name, "test-node");
    }
}
