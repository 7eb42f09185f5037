//! Output formatting utilities

use chrono::NaiveDateTime;
use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use stats_lib::TIMESTAMP_FORMAT;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print rows as a table, or serialize `values` as JSON
pub fn print_rows<T, V>(rows: &[T], values: &V, format: OutputFormat) -> anyhow::Result<()>
where
    T: Tabled,
    V: Serialize + ?Sized,
{
    match format {
        OutputFormat::Table => {
            if rows.is_empty() {
                println!("{}", "No samples found".yellow());
                return Ok(());
            }
            let table = Table::new(rows).with(Style::rounded()).to_string();
            println!("{}", table);
            Ok(())
        }
        OutputFormat::Json => print_json(values),
    }
}

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Format a series timestamp
pub fn format_timestamp(timestamp: &NaiveDateTime) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Format a canonical percent value
pub fn format_percent(percent: f64) -> String {
    format!("{:.2}%", percent)
}

/// Format a MiB value with a unit suited to its size
pub fn format_mib(mib: f64) -> String {
    if mib >= 1024.0 {
        format!("{:.2}GiB", mib / 1024.0)
    } else if mib >= 1.0 {
        format!("{:.2}MiB", mib)
    } else {
        format!("{:.2}KiB", mib * 1024.0)
    }
}

/// Color a percentage by how close it is to saturation
pub fn color_percent(percent: f64) -> String {
    let formatted = format_percent(percent);
    if percent >= 90.0 {
        formatted.red().to_string()
    } else if percent >= 70.0 {
        formatted.yellow().to_string()
    } else {
        formatted.green().to_string()
    }
}
