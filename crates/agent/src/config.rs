//! Agent configuration

use anyhow::{bail, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable naming an optional configuration file
pub const CONFIG_FILE_ENV: &str = "STATS_AGENT_CONFIG";

/// Agent configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// Container name or ID to sample
    #[serde(default)]
    pub container: String,

    /// Series file path
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,

    /// Seconds between samples
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Upper bound for a single runtime query, in seconds
    #[serde(default = "default_query_timeout")]
    pub query_timeout_secs: u64,

    /// Runtime CLI used for stats queries
    #[serde(default = "default_runtime_binary")]
    pub runtime_binary: String,

    /// Keep an existing series instead of starting a fresh one
    #[serde(default)]
    pub append: bool,

    /// Node name reported in structured logs
    #[serde(default = "default_node_name")]
    pub node_name: String,

    /// API server port for health/metrics
    #[serde(default = "default_api_port")]
    pub api_port: u16,
}

fn default_output_path() -> PathBuf {
    PathBuf::from("container_stats.csv")
}

fn default_interval() -> u64 {
    5
}

fn default_query_timeout() -> u64 {
    10
}

fn default_runtime_binary() -> String {
    "docker".to_string()
}

fn default_node_name() -> String {
    std::env::var("NODE_NAME")
        .or_else(|_| std::env::var("HOSTNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}

fn default_api_port() -> u16 {
    8080
}

impl AgentConfig {
    /// Load configuration from an optional file and the environment
    ///
    /// Environment variables (`STATS_AGENT_CONTAINER`, `STATS_AGENT_INTERVAL_SECS`, ...)
    /// override values from the file.
    pub fn load() -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Ok(path) = std::env::var(CONFIG_FILE_ENV) {
            builder = builder.add_source(config::File::with_name(&path));
        }

        let config = builder
            .add_source(config::Environment::with_prefix("STATS_AGENT").try_parsing(true))
            .build()?;

        let agent_config: AgentConfig = config.try_deserialize()?;
        agent_config.validate()?;
        Ok(agent_config)
    }

    /// Reject settings the collector cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.container.trim().is_empty() {
            bail!("no container configured (set STATS_AGENT_CONTAINER)");
        }
        if self.interval_secs == 0 {
            bail!("interval_secs must be at least 1");
        }
        if self.query_timeout_secs == 0 {
            bail!("query_timeout_secs must be at least 1");
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }
}
