use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Local;
use log::Level;
use parking_lot::Mutex;

use crate::models::error::CaptureError;
use crate::storage::format::LineFormat;

/// Named, leveled sink appending formatted records to one file.
///
/// The file is always opened in append mode, so several sinks bound to the
/// same path interleave their records in write order. Each record goes out
/// in a single `write_all`.
#[derive(Debug)]
pub struct LogSink {
    name: String,
    level: Level,
    path: PathBuf,
    format: LineFormat,
    file: Mutex<File>,
    records_written: AtomicU64,
}

impl LogSink {
    pub fn open(
        name: impl Into<String>,
        level: Level,
        path: impl Into<PathBuf>,
        format: LineFormat,
    ) -> Result<Self, CaptureError> {
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| CaptureError::storage(&path, e))?;

        Ok(Self {
            name: name.into(),
            level,
            path,
            format,
            file: Mutex::new(file),
            records_written: AtomicU64::new(0),
        })
    }

    /// Whether a record at `level` passes this sink's threshold.
    pub fn enabled(&self, level: Level) -> bool {
        level <= self.level
    }

    /// Format and append one record. Records below the threshold are dropped.
    pub fn log(&self, level: Level, message: &str) -> io::Result<()> {
        if !self.enabled(level) {
            return Ok(());
        }

        let mut record = self.format.render(&Local::now(), &self.name, level, message);
        record.push('\n');

        self.file.lock().write_all(record.as_bytes())?;
        self.records_written.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records_written(&self) -> u64 {
        self.records_written.load(Ordering::Relaxed)
    }
}
