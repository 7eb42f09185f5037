//! Error types for the stats library

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for stats operations
pub type Result<T> = std::result::Result<T, StatsError>;

/// Errors raised while collecting, persisting, or analyzing samples
#[derive(Error, Debug)]
pub enum StatsError {
    /// A numeric value (percent or byte magnitude) could not be parsed
    #[error("Invalid value {value:?}: {reason}")]
    Format { value: String, reason: String },

    /// A series row, series header, or runtime line is structurally malformed
    #[error("Malformed record at line {line}: {reason}")]
    Parse { line: usize, reason: String },

    /// The series file does not exist
    #[error("Series file not found: {path:?}")]
    NotFound { path: PathBuf },

    /// The series file exists but holds no samples
    #[error("Series file {path:?} contains no samples")]
    EmptySeries { path: PathBuf },

    /// The runtime stats command could not be executed at all
    #[error("Runtime query failed: {reason}")]
    Query { reason: String },

    /// Collector settings are unusable
    #[error("Invalid configuration: {reason}")]
    Config { reason: String },

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StatsError {
    pub(crate) fn format(value: &str, reason: impl Into<String>) -> Self {
        Self::Format {
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn parse(line: usize, reason: impl Into<String>) -> Self {
        Self::Parse {
            line,
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Returns true if the error means the series file is absent
    pub fn is_not_found(&self) -> bool {
        matches!(self, StatsError::NotFound { .. })
    }
}
