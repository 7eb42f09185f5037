//! Analyze command implementation

use crate::output::{
    color_percent, format_mib, format_timestamp, print_json, print_warning, OutputFormat,
};
use anyhow::{Context, Result};
use colored::Colorize;
use stats_lib::{analyze_file, AnalyzeOptions, Report, StructuredLogger};
use std::path::Path;
use tabled::Tabled;

#[derive(Tabled)]
struct PeakRow {
    #[tabled(rename = "Metric")]
    metric: &'static str,
    #[tabled(rename = "Peak")]
    peak: String,
    #[tabled(rename = "At")]
    timestamp: String,
}

fn peak_rows(report: &Report) -> Vec<PeakRow> {
    vec![
        PeakRow {
            metric: "CPU",
            peak: color_percent(report.cpu.value),
            timestamp: format_timestamp(&report.cpu.timestamp),
        },
        PeakRow {
            metric: "Memory",
            peak: format!(
                "{} ({})",
                color_percent(report.memory.percent),
                report.memory.usage
            ),
            timestamp: format_timestamp(&report.memory.timestamp),
        },
        PeakRow {
            metric: "Disk read",
            peak: format_mib(report.disk_read.value),
            timestamp: format_timestamp(&report.disk_read.timestamp),
        },
        PeakRow {
            metric: "Disk write",
            peak: format_mib(report.disk_write.value),
            timestamp: format_timestamp(&report.disk_write.timestamp),
        },
    ]
}

fn node_name() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "local".to_string())
}

/// Report peak usage for the series at `path`
pub fn run_analyze(path: &Path, truncate: bool, format: OutputFormat) -> Result<()> {
    let report = analyze_file(path, AnalyzeOptions { truncate })
        .with_context(|| format!("Failed to analyze {}", path.display()))?;

    StructuredLogger::new(node_name()).log_report(&report);

    match format {
        OutputFormat::Json => {
            print_json(&report)?;
        }
        OutputFormat::Table => {
            println!("\n{}", "Peak Usage".bold());
            println!("{}", "=".repeat(50));
            println!("Container:     {}", report.container_id.cyan());
            println!("Samples:       {}", report.sample_count);
            println!(
                "Window:        {} .. {}",
                format_timestamp(&report.first_timestamp),
                format_timestamp(&report.last_timestamp)
            );
            println!();

            let table = tabled::Table::new(peak_rows(&report))
                .with(tabled::settings::Style::rounded())
                .to_string();
            println!("{}", table);
        }
    }

    if truncate {
        print_warning(&format!("Truncated {}", path.display()));
    }

    Ok(())
}
