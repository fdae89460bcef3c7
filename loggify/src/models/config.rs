use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::storage::format::{LineFormat, DEFAULT_DATE_FORMAT, DEFAULT_LINE_FORMAT};

/// How the log file is opened when a session is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileMode {
    /// Keep existing content and append new records after it.
    #[default]
    Append,
    /// Truncate once at construction, then append.
    Truncate,
}

/// Configuration for a capture session.
///
/// Supplied once to `ScopedCapture::new` and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfiguration {
    /// Log file shared by the stdout and stderr sinks.
    pub filename: PathBuf,

    /// Open mode for `filename` (default: append).
    pub mode: FileMode,

    /// Delete an existing file at `filename` before opening it (default: false).
    pub replace: bool,

    /// Record template, see `LineFormat` for placeholders.
    pub line_format: String,

    /// strftime-style timestamp format used for `{asctime}`.
    pub date_format: String,

    /// Mirror captured writes to the original streams (default: true).
    pub mirror: bool,
}

impl CaptureConfiguration {
    pub fn new(filename: impl Into<PathBuf>) -> Self {
        Self {
            filename: filename.into(),
            ..Default::default()
        }
    }

    pub fn with_mode(mut self, mode: FileMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_replace(mut self, replace: bool) -> Self {
        self.replace = replace;
        self
    }

    pub fn with_line_format(mut self, line_format: impl Into<String>) -> Self {
        self.line_format = line_format.into();
        self
    }

    pub fn with_date_format(mut self, date_format: impl Into<String>) -> Self {
        self.date_format = date_format.into();
        self
    }

    pub fn with_mirror(mut self, mirror: bool) -> Self {
        self.mirror = mirror;
        self
    }

    pub fn from_json(json: &str) -> Result<Self, String> {
        serde_json::from_str(json).map_err(|e| format!("failed to parse configuration: {}", e))
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.filename.as_os_str().is_empty() {
            return Err("filename must not be empty".into());
        }
        if self.filename.is_dir() {
            return Err(format!("{} is a directory", self.filename.display()));
        }
        LineFormat::parse(&self.line_format, &self.date_format)
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}

impl Default for CaptureConfiguration {
    fn default() -> Self {
        Self {
            filename: PathBuf::new(),
            mode: FileMode::Append,
            replace: false,
            line_format: DEFAULT_LINE_FORMAT.to_string(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            mirror: true,
        }
    }
}
