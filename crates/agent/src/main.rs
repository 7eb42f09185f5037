//! Stats Agent - container resource usage sampler
//!
//! Samples one container's CPU, memory and block I/O through the runtime
//! CLI, appends every sample to a series file and serves health/metrics
//! endpoints until interrupted.

use anyhow::{Context, Result};
use stats_lib::{
    collector::{CollectionLoopBuilder, RuntimeCliSource},
    health::HealthRegistry,
    observability::{AgentMetrics, StructuredLogger},
    SeriesSink, SeriesWriter,
};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;

const AGENT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting stats-agent");

    let config = config::AgentConfig::load().context("Failed to load agent configuration")?;
    info!(
        container = %config.container,
        output = %config.output_path.display(),
        interval_secs = config.interval_secs,
        runtime = %config.runtime_binary,
        "Agent configured"
    );

    let health_registry = HealthRegistry::new();
    health_registry.register_all().await;

    let metrics = AgentMetrics::new();
    let logger = StructuredLogger::new(&config.node_name);
    logger.log_startup(
        AGENT_VERSION,
        &config.container,
        &config.output_path.display().to_string(),
    );

    let sink: Box<dyn SeriesSink> = if config.append {
        Box::new(SeriesWriter::open_append(&config.output_path)?)
    } else {
        Box::new(SeriesWriter::create(&config.output_path)?)
    };

    let source = Arc::new(RuntimeCliSource::new(
        config.runtime_binary.clone(),
        config.query_timeout(),
    ));

    let collection_loop = CollectionLoopBuilder::new()
        .source(source)
        .sink(sink)
        .container(config.container.clone())
        .interval(config.interval())
        .metrics(metrics)
        .health(health_registry.clone())
        .logger(logger.clone())
        .build()?;

    let app_state = Arc::new(api::AppState::new(health_registry.clone()));
    health_registry.set_ready(true).await;

    let api_port = config.api_port;
    tokio::spawn(async move {
        if let Err(e) = api::serve(api_port, app_state).await {
            error!(error = %e, "API server stopped");
        }
    });

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let mut collector = tokio::spawn(collection_loop.run(shutdown_rx));

    tokio::select! {
        result = &mut collector => {
            let state = result.context("Collection task panicked")??;
            info!(samples = state.samples_collected, "Collection loop finished");
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for shutdown signal")?;
            info!("SIGINT received");
            let _ = shutdown_tx.send(());
            let state = collector.await.context("Collection task panicked")??;
            info!(
                samples = state.samples_collected,
                skipped = state.ticks_skipped,
                "Collection loop stopped"
            );
        }
    }

    health_registry.set_ready(false).await;
    info!("Shutting down");

    Ok(())
}
