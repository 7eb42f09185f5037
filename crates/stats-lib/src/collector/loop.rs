//! Sampling loop
//!
//! Queries the runtime once per tick, turns non-empty output into a sample,
//! appends it durably to the series sink and sleeps for the configured
//! interval. Empty output skips the tick; malformed output aborts the loop.

use super::{Clock, RuntimeStats, StatsSource, SystemClock};
use crate::error::{Result, StatsError};
use crate::health::{components, HealthRegistry};
use crate::models::Sample;
use crate::observability::{AgentMetrics, StructuredLogger};
use crate::series::SeriesSink;
use chrono::NaiveDateTime;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

/// Configuration for the sampling loop
#[derive(Debug, Clone)]
pub struct CollectionConfig {
    /// Container name or ID passed to the runtime
    pub container_ref: String,
    /// Pause between ticks (default: 5 seconds)
    pub interval: Duration,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            container_ref: String::new(),
            interval: Duration::from_secs(5),
        }
    }
}

impl CollectionConfig {
    fn validate(&self) -> Result<()> {
        if self.container_ref.trim().is_empty() {
            return Err(StatsError::Config {
                reason: "container reference must not be empty".to_string(),
            });
        }
        if self.interval.is_zero() {
            return Err(StatsError::Config {
                reason: "collection interval must be positive".to_string(),
            });
        }
        Ok(())
    }
}

/// What a single tick produced
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Sampled(Sample),
    Skipped,
}

/// Explicit state carried from one tick to the next
#[derive(Debug, Clone, PartialEq)]
pub struct CollectorState {
    /// Container reference being sampled
    pub target: String,
    pub tick_count: u64,
    pub samples_collected: u64,
    pub ticks_skipped: u64,
    pub last_sample: Option<Sample>,
}

impl CollectorState {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            tick_count: 0,
            samples_collected: 0,
            ticks_skipped: 0,
            last_sample: None,
        }
    }

    /// Advance by one tick given the runtime output and the current time
    ///
    /// Pure: performs no I/O, so it can be driven without timers or a runtime.
    pub fn step(
        mut self,
        output: Option<&str>,
        now: NaiveDateTime,
    ) -> Result<(Self, TickOutcome)> {
        self.tick_count += 1;

        let line = match output.map(str::trim) {
            Some(line) if !line.is_empty() => line,
            _ => {
                self.ticks_skipped += 1;
                return Ok((self, TickOutcome::Skipped));
            }
        };

        let sample = RuntimeStats::parse(line)?.into_sample(now)?;
        self.samples_collected += 1;
        self.last_sample = Some(sample.clone());

        Ok((self, TickOutcome::Sampled(sample)))
    }
}

/// Sampling loop for a single container
pub struct CollectionLoop {
    source: Arc<dyn StatsSource>,
    sink: Box<dyn SeriesSink>,
    clock: Arc<dyn Clock>,
    config: CollectionConfig,
    metrics: Option<AgentMetrics>,
    health: Option<HealthRegistry>,
    logger: Option<StructuredLogger>,
}

impl CollectionLoop {
    /// Run until a shutdown signal arrives or a tick fails
    ///
    /// Returns the final loop state on shutdown. A failed query spawn, a
    /// malformed runtime line or a failed append ends the loop with an error.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) -> Result<CollectorState> {
        info!(
            container = %self.config.container_ref,
            interval_secs = self.config.interval.as_secs_f64(),
            "Starting stats collection loop"
        );

        let mut state = CollectorState::new(self.config.container_ref.clone());

        loop {
            let started = Instant::now();
            let output = tokio::select! {
                _ = shutdown.recv() => {
                    info!(ticks = state.tick_count, "Shutting down stats collection loop");
                    break;
                }
                output = self.source.query(&state.target) => output,
            };

            if let Some(metrics) = &self.metrics {
                metrics.observe_query_latency(started.elapsed().as_secs_f64());
            }

            // No await from here until the append completes, so shutdown can
            // never leave a half-written tick behind.
            state = match self.tick(state, output) {
                Ok((state, outcome)) => {
                    self.report_tick(&state, &outcome).await;
                    state
                }
                Err(e) => {
                    self.report_failure(&e).await;
                    return Err(e);
                }
            };

            tokio::select! {
                _ = shutdown.recv() => {
                    info!(ticks = state.tick_count, "Shutting down stats collection loop");
                    break;
                }
                _ = sleep(self.config.interval) => {}
            }
        }

        if let Some(logger) = &self.logger {
            logger.log_shutdown(&state.target, state.samples_collected, state.ticks_skipped);
        }

        Ok(state)
    }

    fn tick(
        &mut self,
        state: CollectorState,
        output: Result<Option<String>>,
    ) -> Result<(CollectorState, TickOutcome)> {
        let output = output?;
        let now = self.clock.now();
        let (state, outcome) = state.step(output.as_deref(), now)?;

        if let TickOutcome::Sampled(sample) = &outcome {
            self.sink.append(sample)?;
        }

        Ok((state, outcome))
    }

    async fn report_tick(&self, state: &CollectorState, outcome: &TickOutcome) {
        match outcome {
            TickOutcome::Sampled(sample) => {
                if let Some(metrics) = &self.metrics {
                    metrics.inc_samples_written();
                    metrics.set_last_usage(sample.cpu_percent, sample.memory_percent);
                }
                if let Some(logger) = &self.logger {
                    logger.log_sample(sample);
                }
                if let Some(health) = &self.health {
                    health.set_healthy(components::COLLECTOR).await;
                    health.set_healthy(components::SERIES).await;
                }
            }
            TickOutcome::Skipped => {
                if let Some(metrics) = &self.metrics {
                    metrics.inc_ticks_skipped();
                }
                if let Some(logger) = &self.logger {
                    logger.log_skipped_tick(&state.target, state.ticks_skipped);
                }
                if let Some(health) = &self.health {
                    health
                        .set_degraded(components::COLLECTOR, "runtime returned no stats")
                        .await;
                }
            }
        }

        debug!(
            tick = state.tick_count,
            samples = state.samples_collected,
            skipped = state.ticks_skipped,
            "Tick complete"
        );
    }

    async fn report_failure(&self, error: &StatsError) {
        if let Some(metrics) = &self.metrics {
            metrics.inc_collection_errors();
        }
        if let Some(logger) = &self.logger {
            logger.log_collection_aborted(&self.config.container_ref, &error.to_string());
        }
        if let Some(health) = &self.health {
            let component = match error {
                StatsError::Io { .. } => components::SERIES,
                _ => components::COLLECTOR,
            };
            health.set_unhealthy(component, error.to_string()).await;
        }
    }
}

/// Builder for creating the collection loop
pub struct CollectionLoopBuilder {
    source: Option<Arc<dyn StatsSource>>,
    sink: Option<Box<dyn SeriesSink>>,
    clock: Arc<dyn Clock>,
    config: CollectionConfig,
    metrics: Option<AgentMetrics>,
    health: Option<HealthRegistry>,
    logger: Option<StructuredLogger>,
}

impl CollectionLoopBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            source: None,
            sink: None,
            clock: Arc::new(SystemClock),
            config: CollectionConfig::default(),
            metrics: None,
            health: None,
            logger: None,
        }
    }

    /// Set the runtime stats source
    pub fn source(mut self, source: Arc<dyn StatsSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Set the series sink
    pub fn sink(mut self, sink: Box<dyn SeriesSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Set the timestamp clock
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Set the container to sample
    pub fn container(mut self, container_ref: impl Into<String>) -> Self {
        self.config.container_ref = container_ref.into();
        self
    }

    /// Set the collection interval
    pub fn interval(mut self, interval: Duration) -> Self {
        self.config.interval = interval;
        self
    }

    pub fn metrics(mut self, metrics: AgentMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn health(mut self, health: HealthRegistry) -> Self {
        self.health = Some(health);
        self
    }

    pub fn logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Build the collection loop
    pub fn build(self) -> anyhow::Result<CollectionLoop> {
        let source = self
            .source
            .ok_or_else(|| anyhow::anyhow!("Stats source is required"))?;
        let sink = self
            .sink
            .ok_or_else(|| anyhow::anyhow!("Series sink is required"))?;
        self.config.validate()?;

        Ok(CollectionLoop {
            source,
            sink,
            clock: self.clock,
            config: self.config,
            metrics: self.metrics,
            health: self.health,
            logger: self.logger,
        })
    }
}

impl Default for CollectionLoopBuilder {
    fn default() -> Self {
        Self::new()
    }
}
