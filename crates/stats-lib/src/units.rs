//! Unit normalization for runtime-reported values
//!
//! Container runtimes report usage as human-formatted strings such as
//! `12.50%`, `1.5GB` or `512KiB`. These helpers convert them into the
//! canonical units used everywhere else in the crate: percent for CPU and
//! memory, MiB for byte magnitudes.

use crate::error::{Result, StatsError};

const KIB_PER_MIB: f64 = 1024.0;
const BYTES_PER_MIB: f64 = 1024.0 * 1024.0;

/// Magnitude suffix recognized on a byte value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteUnit {
    Terabyte,
    Gigabyte,
    Megabyte,
    Kilobyte,
    Byte,
}

/// Suffixes in match order. Every multi-letter suffix ends in `B`, so the
/// bare `B` entry must stay last.
const SUFFIXES: &[(&str, ByteUnit)] = &[
    ("TiB", ByteUnit::Terabyte),
    ("TB", ByteUnit::Terabyte),
    ("GiB", ByteUnit::Gigabyte),
    ("GB", ByteUnit::Gigabyte),
    ("MiB", ByteUnit::Megabyte),
    ("MB", ByteUnit::Megabyte),
    ("KiB", ByteUnit::Kilobyte),
    ("kB", ByteUnit::Kilobyte),
    ("B", ByteUnit::Byte),
];

impl ByteUnit {
    /// Split a trimmed value into its magnitude text and unit
    pub fn split(value: &str) -> Option<(&str, ByteUnit)> {
        SUFFIXES.iter().find_map(|(suffix, unit)| {
            value
                .strip_suffix(suffix)
                .map(|magnitude| (magnitude.trim_end(), *unit))
        })
    }

    /// Convert a magnitude in this unit to MiB
    pub fn to_mib(self, magnitude: f64) -> f64 {
        match self {
            ByteUnit::Terabyte => magnitude * 1024.0 * 1024.0,
            ByteUnit::Gigabyte => magnitude * 1024.0,
            ByteUnit::Megabyte => magnitude,
            ByteUnit::Kilobyte => magnitude / KIB_PER_MIB,
            ByteUnit::Byte => magnitude / BYTES_PER_MIB,
        }
    }
}

/// Parse a percentage such as `12.50%` into `12.5`
///
/// The trailing `%` is optional so that already-canonical values parse too.
pub fn parse_percent(value: &str) -> Result<f64> {
    let trimmed = value.trim();
    let number = trimmed.strip_suffix('%').unwrap_or(trimmed).trim_end();
    parse_finite(value, number)
}

/// Parse a byte magnitude such as `1.5GB` into MiB
///
/// Values without a recognized suffix degrade to `0.0`. A recognized suffix
/// with a non-numeric magnitude is a format error.
pub fn parse_byte_magnitude(value: &str) -> Result<f64> {
    let trimmed = value.trim();
    match ByteUnit::split(trimmed) {
        Some((magnitude, unit)) => Ok(unit.to_mib(parse_finite(value, magnitude)?)),
        None => Ok(0.0),
    }
}

/// Format a MiB value the way the series file stores it
pub fn format_mib(mib: f64) -> String {
    format!("{}MiB", mib)
}

fn parse_finite(original: &str, number: &str) -> Result<f64> {
    let parsed: f64 = number
        .parse()
        .map_err(|_| StatsError::format(original, "not a number"))?;

    if !parsed.is_finite() {
        return Err(StatsError::format(original, "not a finite number"));
    }

    Ok(parsed)
}
