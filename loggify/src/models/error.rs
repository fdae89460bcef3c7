use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while configuring or driving a capture session.
///
/// I/O failures of the wrapped streams during `write`/`flush` are not
/// wrapped here; they surface as plain `std::io::Error`.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("invalid format: {0}")]
    InvalidFormat(String),

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),

    #[error("storage error on {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl CaptureError {
    pub(crate) fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }
}
