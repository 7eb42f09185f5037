//! Core data models for the stats agent

use crate::error::{Result, StatsError};
use crate::units::parse_byte_magnitude;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Timestamp format used in the series file and in reports
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One timestamped resource-usage observation for a container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: NaiveDateTime,
    /// Container identifier as reported by the runtime
    pub container_id: String,
    pub cpu_percent: f64,
    /// Raw `used / limit` string as reported by the runtime
    pub memory_usage: String,
    pub memory_percent: f64,
    pub disk_read_mib: f64,
    pub disk_write_mib: f64,
}

impl Sample {
    /// Canonical memory figures for this sample
    pub fn memory(&self) -> Result<MemoryUsage> {
        MemoryUsage::parse(&self.memory_usage)
    }
}

/// Memory usage split into canonical MiB values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MemoryUsage {
    pub used_mib: f64,
    pub limit_mib: f64,
}

impl MemoryUsage {
    /// Parse a `used / limit` pair such as `50MiB / 1GiB`
    pub fn parse(raw: &str) -> Result<Self> {
        let (used, limit) = raw
            .split_once('/')
            .ok_or_else(|| StatsError::format(raw, "expected `used / limit`"))?;

        Ok(Self {
            used_mib: parse_byte_magnitude(used)?,
            limit_mib: parse_byte_magnitude(limit)?,
        })
    }
}

/// Peak value of one metric and when it occurred
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Peak {
    pub value: f64,
    pub timestamp: NaiveDateTime,
}

/// Peak memory percent together with the raw usage string of the same row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryPeak {
    pub percent: f64,
    pub usage: String,
    pub timestamp: NaiveDateTime,
}

/// Peak usage report over a whole series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub container_id: String,
    pub sample_count: usize,
    pub first_timestamp: NaiveDateTime,
    pub last_timestamp: NaiveDateTime,
    pub cpu: Peak,
    pub memory: MemoryPeak,
    pub disk_read: Peak,
    pub disk_write: Peak,
}
