//! Peak usage analysis over a persisted series
//!
//! Scans every sample once and records, per metric, the largest value and
//! the timestamp of its first occurrence.

use crate::error::{Result, StatsError};
use crate::models::{MemoryPeak, Peak, Report, Sample};
use crate::series::{self, SeriesReader};
use std::path::Path;
use tracing::info;

/// Options for [`analyze_file`]
#[derive(Debug, Clone, Copy, Default)]
pub struct AnalyzeOptions {
    /// Empty the series file after the report has been built
    pub truncate: bool,
}

/// Load `path` and report its peaks
pub fn analyze_file(path: &Path, options: AnalyzeOptions) -> Result<Report> {
    let samples = SeriesReader::load(path)?;
    let report = analyze(&samples).ok_or_else(|| StatsError::EmptySeries {
        path: path.to_path_buf(),
    })?;

    info!(
        path = %path.display(),
        samples = report.sample_count,
        truncate = options.truncate,
        "Analyzed series"
    );

    if options.truncate {
        series::truncate(path)?;
    }

    Ok(report)
}

/// Compute peak usage over `samples`
///
/// Returns `None` for an empty slice. Ties keep the earliest sample.
pub fn analyze(samples: &[Sample]) -> Option<Report> {
    let first = samples.first()?;
    let last = samples.last()?;

    let cpu = peak_by(samples, |s| s.cpu_percent);
    let memory = peak_by(samples, |s| s.memory_percent);
    let disk_read = peak_by(samples, |s| s.disk_read_mib);
    let disk_write = peak_by(samples, |s| s.disk_write_mib);

    Some(Report {
        container_id: first.container_id.clone(),
        sample_count: samples.len(),
        first_timestamp: first.timestamp,
        last_timestamp: last.timestamp,
        cpu: to_peak(cpu, |s| s.cpu_percent),
        memory: MemoryPeak {
            percent: memory.memory_percent,
            usage: memory.memory_usage.clone(),
            timestamp: memory.timestamp,
        },
        disk_read: to_peak(disk_read, |s| s.disk_read_mib),
        disk_write: to_peak(disk_write, |s| s.disk_write_mib),
    })
}

/// First sample holding the maximum of `metric`
///
/// Panics on an empty slice; callers check emptiness first.
fn peak_by<F>(samples: &[Sample], metric: F) -> &Sample
where
    F: Fn(&Sample) -> f64,
{
    let mut best = &samples[0];
    for sample in &samples[1..] {
        if metric(sample) > metric(best) {
            best = sample;
        }
    }
    best
}

fn to_peak<F>(sample: &Sample, metric: F) -> Peak
where
    F: Fn(&Sample) -> f64,
{
    Peak {
        value: metric(sample),
        timestamp: sample.timestamp,
    }
}
