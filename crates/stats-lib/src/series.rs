//! Persisted sample series
//!
//! A series is a plain text record log: one fixed header line followed by
//! one comma-separated line per sample. Writes are append-only and each line
//! is synced to disk before the append returns, so a crash loses at most the
//! sample being written.

use crate::error::{Result, StatsError};
use crate::models::{Sample, TIMESTAMP_FORMAT};
use crate::units::{format_mib, parse_byte_magnitude, parse_percent};
use chrono::NaiveDateTime;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Header line written once at the start of every series
pub const HEADER: &str =
    "Timestamp,Container,CPU_Usage,Memory_Usage,Memory_Percent,Disk_Read,Disk_Write";

const FIELD_COUNT: usize = 7;

/// Append-capable destination for samples
pub trait SeriesSink: Send + Sync {
    /// Append one sample; the sample must be durable once this returns
    fn append(&mut self, sample: &Sample) -> Result<()>;
}

impl SeriesSink for Vec<Sample> {
    fn append(&mut self, sample: &Sample) -> Result<()> {
        self.push(sample.clone());
        Ok(())
    }
}

/// File-backed series writer
#[derive(Debug)]
pub struct SeriesWriter {
    path: PathBuf,
    file: File,
    appended: u64,
}

impl SeriesWriter {
    /// Start a fresh series, discarding any previous content of `path`
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        ensure_parent(&path)?;

        File::create(&path).map_err(|e| StatsError::io(&path, e))?;
        let file = open_for_append(&path)?;

        let mut writer = Self {
            path,
            file,
            appended: 0,
        };
        writer.write_line(HEADER)?;

        info!(path = %writer.path.display(), "Started fresh series");
        Ok(writer)
    }

    /// Continue an existing series, or start one if `path` is missing or empty
    ///
    /// Existing content must begin with the series header. A last line
    /// without a newline is terminated before new rows are written.
    pub fn open_append(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        ensure_parent(&path)?;

        let file = open_for_append(&path)?;

        let len = file
            .metadata()
            .map_err(|e| StatsError::io(&path, e))?
            .len();

        let mut writer = Self {
            path,
            file,
            appended: 0,
        };

        if len == 0 {
            writer.write_line(HEADER)?;
            info!(path = %writer.path.display(), "Started series");
        } else {
            check_header(&writer.path)?;
            if !ends_with_newline(&writer.path)? {
                warn!(path = %writer.path.display(), "Series missing final newline");
                writer.write_line("")?;
            }
            info!(path = %writer.path.display(), bytes = len, "Appending to existing series");
        }

        Ok(writer)
    }

    /// Number of samples appended through this writer
    pub fn appended(&self) -> u64 {
        self.appended
    }

    fn write_line(&mut self, line: &str) -> Result<()> {
        let mut buf = String::with_capacity(line.len() + 1);
        buf.push_str(line);
        buf.push('\n');

        self.file
            .write_all(buf.as_bytes())
            .and_then(|_| self.file.flush())
            .and_then(|_| self.file.sync_data())
            .map_err(|e| StatsError::io(&self.path, e))
    }
}

impl SeriesSink for SeriesWriter {
    fn append(&mut self, sample: &Sample) -> Result<()> {
        let line = format_record(sample)?;
        self.write_line(&line)?;
        self.appended += 1;

        debug!(path = %self.path.display(), appended = self.appended, "Sample appended");
        Ok(())
    }
}

/// Reads a whole series back into memory
pub struct SeriesReader;

impl SeriesReader {
    /// Load every sample in `path`, in file order
    pub fn load(path: &Path) -> Result<Vec<Sample>> {
        let file = File::open(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StatsError::NotFound {
                path: path.to_path_buf(),
            },
            _ => StatsError::io(path, e),
        })?;

        let mut samples = Vec::new();
        let mut saw_header = false;

        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| StatsError::io(path, e))?;
            let line_no = index + 1;
            let line = line.trim_end_matches('\r');

            if !saw_header {
                if line != HEADER {
                    return Err(StatsError::parse(line_no, "missing or unexpected header"));
                }
                saw_header = true;
                continue;
            }

            if line.trim().is_empty() {
                continue;
            }

            samples.push(parse_record(line_no, line)?);
        }

        debug!(path = %path.display(), samples = samples.len(), "Series loaded");
        Ok(samples)
    }
}

/// Empty `path` completely, header included
pub fn truncate(path: &Path) -> Result<()> {
    OpenOptions::new()
        .write(true)
        .truncate(true)
        .open(path)
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound => StatsError::NotFound {
                path: path.to_path_buf(),
            },
            _ => StatsError::io(path, e),
        })?;

    warn!(path = %path.display(), "Series truncated");
    Ok(())
}

/// Render a sample as one series line (without newline)
pub fn format_record(sample: &Sample) -> Result<String> {
    for value in [&sample.container_id, &sample.memory_usage] {
        if value.contains(',') || value.contains('\n') {
            return Err(StatsError::format(value, "field contains a separator"));
        }
    }

    Ok(format!(
        "{},{},{}%,{},{}%,{},{}",
        sample.timestamp.format(TIMESTAMP_FORMAT),
        sample.container_id,
        sample.cpu_percent,
        sample.memory_usage,
        sample.memory_percent,
        format_mib(sample.disk_read_mib),
        format_mib(sample.disk_write_mib),
    ))
}

/// Parse one series line, canonicalizing every numeric column
pub fn parse_record(line_no: usize, line: &str) -> Result<Sample> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() != FIELD_COUNT {
        return Err(StatsError::parse(
            line_no,
            format!("expected {} fields, found {}", FIELD_COUNT, fields.len()),
        ));
    }

    let timestamp = NaiveDateTime::parse_from_str(fields[0].trim(), TIMESTAMP_FORMAT)
        .map_err(|e| StatsError::parse(line_no, format!("bad timestamp: {}", e)))?;

    Ok(Sample {
        timestamp,
        container_id: fields[1].to_string(),
        cpu_percent: parse_percent(fields[2])?,
        memory_usage: fields[3].to_string(),
        memory_percent: parse_percent(fields[4])?,
        disk_read_mib: parse_byte_magnitude(fields[5])?,
        disk_write_mib: parse_byte_magnitude(fields[6])?,
    })
}

fn check_header(path: &Path) -> Result<()> {
    let file = File::open(path).map_err(|e| StatsError::io(path, e))?;
    let mut first = String::new();
    BufReader::new(file)
        .read_line(&mut first)
        .map_err(|e| StatsError::io(path, e))?;

    if first.trim_end_matches(['\r', '\n']) != HEADER {
        return Err(StatsError::parse(1, "existing file is not a stats series"));
    }
    Ok(())
}

fn ends_with_newline(path: &Path) -> Result<bool> {
    let mut file = File::open(path).map_err(|e| StatsError::io(path, e))?;
    let mut last = [0u8; 1];
    file.seek(SeekFrom::End(-1))
        .and_then(|_| file.read_exact(&mut last))
        .map_err(|e| StatsError::io(path, e))?;
    Ok(last[0] == b'\n')
}

// Append mode keeps every write at the current end of file, even if another
// process truncated it in the meantime.
fn open_for_append(path: &Path) -> Result<File> {
    OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .map_err(|e| StatsError::io(path, e))
}

fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(|e| StatsError::io(parent, e))
        }
        _ => Ok(()),
    }
}
