//! Container stats CLI
//!
//! A command-line tool for sampling a container into a series file,
//! reporting peak usage, and listing recorded samples.

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{analyze, collect, show};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Container stats CLI
#[derive(Parser)]
#[command(name = "cstat")]
#[command(author, version, about = "Sample and analyze container resource usage", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sample a container until interrupted
    Collect {
        /// Container name or ID
        container: String,

        /// Series file to write (can also be set via CSTAT_OUTPUT env var)
        #[arg(long, short, env = "CSTAT_OUTPUT", default_value = "container_stats.csv")]
        output: PathBuf,

        /// Seconds between samples
        #[arg(long, short, default_value_t = 5)]
        interval: u64,

        /// Upper bound for a single runtime query, in seconds
        #[arg(long, default_value_t = 10)]
        timeout: u64,

        /// Runtime CLI used for stats queries
        #[arg(long, default_value = "docker")]
        runtime: String,

        /// Keep an existing series instead of starting a fresh one
        #[arg(long)]
        append: bool,
    },

    /// Report peak usage over a series file
    Analyze {
        /// Series file to analyze
        #[arg(env = "CSTAT_OUTPUT", default_value = "container_stats.csv")]
        path: PathBuf,

        /// Empty the series file after reporting
        #[arg(long)]
        truncate: bool,

        /// Output format
        #[arg(long, short, default_value = "table")]
        format: output::OutputFormat,
    },

    /// List recorded samples
    Show {
        /// Series file to read
        #[arg(env = "CSTAT_OUTPUT", default_value = "container_stats.csv")]
        path: PathBuf,

        /// Only show the most recent N samples
        #[arg(long, short)]
        last: Option<usize>,

        /// Output format
        #[arg(long, short, default_value = "table")]
        format: output::OutputFormat,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli).await {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Collect {
            container,
            output,
            interval,
            timeout,
            runtime,
            append,
        } => {
            let options = collect::CollectOptions {
                container,
                output,
                interval,
                timeout,
                runtime,
                append,
            };
            collect::run_collect(options).await?;
        }
        Commands::Analyze {
            path,
            truncate,
            format,
        } => {
            analyze::run_analyze(&path, truncate, format)?;
        }
        Commands::Show { path, last, format } => {
            show::run_show(&path, last, format)?;
        }
    }

    Ok(())
}
