//! Parsing of runtime stats output

use crate::error::{Result, StatsError};
use crate::models::Sample;
use crate::units::{parse_byte_magnitude, parse_percent};
use chrono::NaiveDateTime;

const BLOCK_IO_SEPARATOR: &str = " / ";
const DEFAULT_DISK_WRITE: &str = "0B";
const FIELD_COUNT: usize = 5;

/// One line of runtime stats output, split into its raw fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeStats {
    pub container_id: String,
    pub cpu_percent: String,
    pub memory_usage: String,
    pub memory_percent: String,
    pub block_io: String,
}

impl RuntimeStats {
    /// Split a `container,cpu%,mem usage,mem%,block io` line
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim();
        if line.lines().count() > 1 {
            return Err(StatsError::parse(1, "runtime returned more than one line"));
        }

        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != FIELD_COUNT {
            return Err(StatsError::parse(
                1,
                format!(
                    "expected {} runtime fields, found {}",
                    FIELD_COUNT,
                    fields.len()
                ),
            ));
        }

        Ok(Self {
            container_id: fields[0].to_string(),
            cpu_percent: fields[1].to_string(),
            memory_usage: fields[2].to_string(),
            memory_percent: fields[3].to_string(),
            block_io: fields[4].to_string(),
        })
    }

    /// Canonicalize into a sample stamped with `timestamp`
    pub fn into_sample(self, timestamp: NaiveDateTime) -> Result<Sample> {
        let (read, write) = split_block_io(&self.block_io);

        Ok(Sample {
            timestamp,
            cpu_percent: parse_percent(&self.cpu_percent)?,
            memory_percent: parse_percent(&self.memory_percent)?,
            disk_read_mib: parse_byte_magnitude(read)?,
            disk_write_mib: parse_byte_magnitude(write)?,
            container_id: self.container_id,
            memory_usage: self.memory_usage,
        })
    }
}

/// Split a block I/O field into its read and write parts
///
/// Without a separator the whole field is the read value and write is zero.
pub fn split_block_io(block_io: &str) -> (&str, &str) {
    block_io
        .split_once(BLOCK_IO_SEPARATOR)
        .unwrap_or((block_io, DEFAULT_DISK_WRITE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_parse_runtime_line() {
        let stats =
            RuntimeStats::parse("3f2a9c1e,12.50%,50MiB / 1GiB,4.88%,1.5GB / 200kB\n").unwrap();

        assert_eq!(stats.container_id, "3f2a9c1e");
        assert_eq!(stats.memory_usage, "50MiB / 1GiB");

        let sample = stats.into_sample(ts()).unwrap();
        assert_eq!(sample.timestamp, ts());
        assert_eq!(sample.cpu_percent, 12.5);
        assert_eq!(sample.memory_percent, 4.88);
        assert_eq!(sample.disk_read_mib, 1536.0);
        assert_eq!(sample.disk_write_mib, 0.1953125);
        assert_eq!(sample.memory_usage, "50MiB / 1GiB");
    }

    #[test]
    fn test_block_io_without_separator() {
        assert_eq!(split_block_io("3MB"), ("3MB", "0B"));
        assert_eq!(split_block_io("3MB / 1kB"), ("3MB", "1kB"));

        let sample = RuntimeStats::parse("abc,1%,1MiB / 2MiB,1%,3MB")
            .unwrap()
            .into_sample(ts())
            .unwrap();
        assert_eq!(sample.disk_read_mib, 3.0);
        assert_eq!(sample.disk_write_mib, 0.0);
    }

    #[test]
    fn test_wrong_field_count_is_structural_error() {
        assert!(matches!(
            RuntimeStats::parse("abc,1%,1MiB / 2MiB"),
            Err(StatsError::Parse { .. })
        ));
        assert!(matches!(
            RuntimeStats::parse("abc,1%,1MiB / 2MiB,1%,0B / 0B,extra"),
            Err(StatsError::Parse { .. })
        ));
    }

    #[test]
    fn test_multiple_lines_rejected() {
        let output = "abc,1%,1MiB / 2MiB,1%,0B / 0B\ndef,1%,1MiB / 2MiB,1%,0B / 0B";
        assert!(RuntimeStats::parse(output).is_err());
    }

    #[test]
    fn test_bad_percent_is_format_error() {
        let err = RuntimeStats::parse("abc,--,1MiB / 2MiB,1%,0B / 0B")
            .unwrap()
            .into_sample(ts())
            .unwrap_err();
        assert!(matches!(err, StatsError::Format { .. }));
    }
}
