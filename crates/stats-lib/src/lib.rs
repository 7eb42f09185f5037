//! Core library for the container stats agent
//!
//! This crate provides the core functionality for:
//! - Sampling a container's CPU, memory and block I/O from the runtime CLI
//! - Normalizing runtime units into canonical percent and MiB values
//! - Persisting samples as an append-only series file
//! - Peak usage analysis over a persisted series
//! - Health checks and observability

pub mod analyzer;
pub mod collector;
pub mod error;
pub mod health;
pub mod models;
pub mod observability;
pub mod series;
pub mod units;

pub use analyzer::{analyze, analyze_file, AnalyzeOptions};
pub use error::{Result, StatsError};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use models::*;
pub use observability::{AgentMetrics, StructuredLogger};
pub use series::{SeriesReader, SeriesSink, SeriesWriter};
