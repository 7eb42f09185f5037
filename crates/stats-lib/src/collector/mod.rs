//! Metrics collection from a container runtime
//!
//! This module polls the runtime's stats command for one container, parses
//! each snapshot into a [`Sample`](crate::models::Sample) and appends it to a
//! series sink on a fixed cadence.

mod parse;
mod r#loop;
mod runtime;

#[cfg(test)]
mod tests;

pub use parse::{split_block_io, RuntimeStats};
pub use r#loop::{
    CollectionConfig, CollectionLoop, CollectionLoopBuilder, CollectorState, TickOutcome,
};
pub use runtime::{RuntimeCliSource, DEFAULT_QUERY_TIMEOUT, STATS_FORMAT};

use crate::error::Result;
use chrono::{Local, NaiveDateTime, Timelike};

pub use async_trait::async_trait;

/// Source of point-in-time container statistics
#[async_trait]
pub trait StatsSource: Send + Sync {
    /// Query one snapshot for `container_ref`
    ///
    /// Returns `Ok(None)` when the runtime produced no output, which callers
    /// treat as a skipped tick rather than an error.
    async fn query(&self, container_ref: &str) -> Result<Option<String>>;
}

/// Wall-clock source for sample timestamps
pub trait Clock: Send + Sync {
    /// Current local time at second resolution
    fn now(&self) -> NaiveDateTime;
}

/// Clock backed by the system's local time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        let now = Local::now().naive_local();
        now.with_nanosecond(0).unwrap_or(now)
    }
}
