//! Runtime CLI stats source
//!
//! Runs `<runtime> stats <ref> --no-stream --format ...` and returns its
//! standard output. Works with any runtime whose CLI mirrors docker's stats
//! command (docker, podman, nerdctl).

use super::{async_trait, StatsSource};
use crate::error::{Result, StatsError};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Go template requesting the five comma-separated stats fields
pub const STATS_FORMAT: &str =
    "{{.Container}},{{.CPUPerc}},{{.MemUsage}},{{.MemPerc}},{{.BlockIO}}";

/// Default upper bound for a single stats query
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Stats source that shells out to a container runtime CLI
#[derive(Debug, Clone)]
pub struct RuntimeCliSource {
    binary: String,
    timeout: Duration,
}

impl RuntimeCliSource {
    /// Create a source invoking `binary` with the given query timeout
    pub fn new(binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    /// Source for the docker CLI with the default timeout
    pub fn docker() -> Self {
        Self::new("docker", DEFAULT_QUERY_TIMEOUT)
    }

    fn command(&self, container_ref: &str) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("stats")
            .arg(container_ref)
            .arg("--no-stream")
            .arg("--format")
            .arg(STATS_FORMAT)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

impl Default for RuntimeCliSource {
    fn default() -> Self {
        Self::docker()
    }
}

#[async_trait]
impl StatsSource for RuntimeCliSource {
    async fn query(&self, container_ref: &str) -> Result<Option<String>> {
        let child = self
            .command(container_ref)
            .spawn()
            .map_err(|e| StatsError::Query {
                reason: format!("failed to run {}: {}", self.binary, e),
            })?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                debug!(binary = %self.binary, error = %e, "Stats query failed to complete");
                return Ok(None);
            }
            Err(_) => {
                debug!(
                    binary = %self.binary,
                    timeout_secs = self.timeout.as_secs_f64(),
                    "Stats query timed out"
                );
                return Ok(None);
            }
        };

        if !output.status.success() {
            debug!(
                binary = %self.binary,
                container = %container_ref,
                status = ?output.status.code(),
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "Stats query returned an error status"
            );
            return Ok(None);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let trimmed = stdout.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        Ok(Some(trimmed.to_string()))
    }
}
