//! Collect command implementation

use crate::output::{print_info, print_success};
use anyhow::{bail, Context, Result};
use stats_lib::collector::{CollectionLoopBuilder, RuntimeCliSource};
use stats_lib::{SeriesSink, SeriesWriter};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::info;

pub struct CollectOptions {
    pub container: String,
    pub output: PathBuf,
    pub interval: u64,
    pub timeout: u64,
    pub runtime: String,
    pub append: bool,
}

/// Sample the container until Ctrl+C, then print a summary
pub async fn run_collect(options: CollectOptions) -> Result<()> {
    if options.timeout == 0 {
        bail!("--timeout must be at least 1 second");
    }

    let sink: Box<dyn SeriesSink> = if options.append {
        Box::new(SeriesWriter::open_append(&options.output).with_context(|| {
            format!("Failed to open {} for appending", options.output.display())
        })?)
    } else {
        Box::new(
            SeriesWriter::create(&options.output)
                .with_context(|| format!("Failed to create {}", options.output.display()))?,
        )
    };

    let source = Arc::new(RuntimeCliSource::new(
        options.runtime,
        Duration::from_secs(options.timeout),
    ));

    let collection_loop = CollectionLoopBuilder::new()
        .source(source)
        .sink(sink)
        .container(options.container.clone())
        .interval(Duration::from_secs(options.interval))
        .build()?;

    print_info(&format!(
        "Collecting stats for {} every {}s into {} (Ctrl+C to stop)",
        options.container,
        options.interval,
        options.output.display()
    ));

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received");
            let _ = shutdown_tx.send(());
        }
    });

    let state = collection_loop
        .run(shutdown_rx)
        .await
        .with_context(|| format!("Collection for {} aborted", options.container))?;

    print_success(&format!(
        "Stopped after {} ticks: {} samples written, {} skipped",
        state.tick_count, state.samples_collected, state.ticks_skipped
    ));

    Ok(())
}
