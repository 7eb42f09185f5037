//! Show command implementation

use crate::output::{color_percent, format_mib, format_timestamp, print_rows, OutputFormat};
use anyhow::{Context, Result};
use stats_lib::{Sample, SeriesReader};
use std::path::Path;
use tabled::Tabled;

#[derive(Tabled)]
struct SampleRow {
    #[tabled(rename = "Timestamp")]
    timestamp: String,
    #[tabled(rename = "Container")]
    container: String,
    #[tabled(rename = "CPU")]
    cpu: String,
    #[tabled(rename = "Memory")]
    memory: String,
    #[tabled(rename = "Mem %")]
    memory_percent: String,
    #[tabled(rename = "Read")]
    disk_read: String,
    #[tabled(rename = "Write")]
    disk_write: String,
}

impl From<&Sample> for SampleRow {
    fn from(sample: &Sample) -> Self {
        Self {
            timestamp: format_timestamp(&sample.timestamp),
            container: sample.container_id.clone(),
            cpu: color_percent(sample.cpu_percent),
            memory: format_memory(sample),
            memory_percent: color_percent(sample.memory_percent),
            disk_read: format_mib(sample.disk_read_mib),
            disk_write: format_mib(sample.disk_write_mib),
        }
    }
}

/// Render memory as normalized `used / limit`, falling back to the raw string
fn format_memory(sample: &Sample) -> String {
    match sample.memory() {
        Ok(usage) => format!(
            "{} / {}",
            format_mib(usage.used_mib),
            format_mib(usage.limit_mib)
        ),
        Err(_) => sample.memory_usage.clone(),
    }
}

/// Keep only the most recent `last` samples
fn tail(samples: &[Sample], last: Option<usize>) -> &[Sample] {
    match last {
        Some(n) if n < samples.len() => &samples[samples.len() - n..],
        _ => samples,
    }
}

/// List samples recorded at `path`
pub fn run_show(path: &Path, last: Option<usize>, format: OutputFormat) -> Result<()> {
    let samples = SeriesReader::load(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let shown = tail(&samples, last);

    let rows: Vec<SampleRow> = shown.iter().map(SampleRow::from).collect();
    print_rows(&rows, shown, format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample(secs: u32) -> Sample {
        Sample {
            timestamp: NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(9, 0, secs)
                .unwrap(),
            container_id: "web".to_string(),
            cpu_percent: secs as f64,
            memory_usage: "50MiB / 1GiB".to_string(),
            memory_percent: 4.88,
            disk_read_mib: 0.0,
            disk_write_mib: 0.0,
        }
    }

    #[test]
    fn test_tail() {
        let samples: Vec<Sample> = (0..5).map(sample).collect();

        assert_eq!(tail(&samples, None).len(), 5);
        assert_eq!(tail(&samples, Some(10)).len(), 5);

        let last_two = tail(&samples, Some(2));
        assert_eq!(last_two.len(), 2);
        assert_eq!(last_two[0].cpu_percent, 3.0);
        assert_eq!(last_two[1].cpu_percent, 4.0);

        assert!(tail(&samples, Some(0)).is_empty());
    }

    #[test]
    fn test_format_memory() {
        let mut s = sample(0);
        s.memory_usage = "512KiB / 2GiB".to_string();
        assert_eq!(format_memory(&s), "512.00KiB / 2.00GiB");

        s.memory_usage = "50MiB".to_string();
        assert_eq!(format_memory(&s), "50MiB");
    }
}
