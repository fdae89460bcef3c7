use std::fs::{self, File};
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use log::Level;
use uuid::Uuid;

use crate::models::config::{CaptureConfiguration, FileMode};
use crate::models::diagnostics::CaptureDiagnostics;
use crate::models::error::CaptureError;
use crate::models::error_info::ErrorInfo;
use crate::models::state::CaptureState;
use crate::storage::file_sink::LogSink;
use crate::storage::format::LineFormat;
use crate::storage::registry::{self, STDERR_SINK_NAME, STDOUT_SINK_NAME};
use crate::stream::adapter::StreamAdapter;
use crate::stream::console;
use crate::traits::output_stream::OutputStream;

/// Slot bindings that were active before `enter`.
struct SavedStreams {
    stdout: Arc<dyn OutputStream>,
    stderr: Arc<dyn OutputStream>,
}

/// Scoped stdout/stderr capture into one log file.
///
/// Construction opens two sinks on the same file: `STDOUT` at info level
/// and `STDERR` at error level. While a [`CaptureGuard`] returned by
/// [`enter`](Self::enter) is alive, the process-wide console slots point at
/// the two adapters; the guard puts the previous bindings back on every exit
/// path, panics included.
///
/// ```no_run
/// use loggify::{cprintln, CaptureConfiguration, ScopedCapture};
///
/// let mut capture = ScopedCapture::new(CaptureConfiguration::new("run.log"))?;
/// capture.run(|| -> Result<(), std::io::Error> {
///     cprintln!("this line lands in run.log");
///     Ok(())
/// })?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct ScopedCapture {
    id: Uuid,
    config: CaptureConfiguration,
    stdout: Arc<StreamAdapter>,
    stderr: Arc<StreamAdapter>,
    state: CaptureState,
    saved: Option<SavedStreams>,
    errors_recorded: u64,
}

impl ScopedCapture {
    /// Open the sinks and wire the adapters to the real process streams.
    pub fn new(config: CaptureConfiguration) -> Result<Self, CaptureError> {
        Self::with_streams(config, console::original_stdout(), console::original_stderr())
    }

    /// Like [`new`](Self::new), but mirroring into the given streams.
    pub fn with_streams(
        config: CaptureConfiguration,
        stdout: Arc<dyn OutputStream>,
        stderr: Arc<dyn OutputStream>,
    ) -> Result<Self, CaptureError> {
        config.validate().map_err(CaptureError::ConfigurationFailed)?;
        let format = LineFormat::parse(&config.line_format, &config.date_format)?;
        let path = &config.filename;

        if config.replace && path.is_file() {
            fs::remove_file(path).map_err(|e| CaptureError::storage(path, e))?;
            log::debug!("removed existing log file {}", path.display());
        }
        if config.mode == FileMode::Truncate {
            File::create(path).map_err(|e| CaptureError::storage(path, e))?;
        }

        let out_sink = Arc::new(LogSink::open(STDOUT_SINK_NAME, Level::Info, path, format.clone())?);
        let err_sink = Arc::new(LogSink::open(STDERR_SINK_NAME, Level::Error, path, format)?);
        registry::register_sink(Arc::clone(&out_sink));
        registry::register_sink(Arc::clone(&err_sink));

        let stdout = StreamAdapter::new(stdout, out_sink, Level::Info).with_mirror(config.mirror);
        let stderr = StreamAdapter::new(stderr, err_sink, Level::Error).with_mirror(config.mirror);

        let id = Uuid::new_v4();
        log::debug!("capture session {} created for {}", id, path.display());

        Ok(Self {
            id,
            config,
            stdout: Arc::new(stdout),
            stderr: Arc::new(stderr),
            state: CaptureState::Idle,
            saved: None,
            errors_recorded: 0,
        })
    }

    /// Install the adapters as the active stdout/stderr.
    pub fn enter(&mut self) -> CaptureGuard<'_> {
        let previous = SavedStreams {
            stdout: console::set_stdout(self.stdout.clone()),
            stderr: console::set_stderr(self.stderr.clone()),
        };
        // A leaked guard leaves the first saved bindings in place.
        if self.saved.is_none() {
            self.saved = Some(previous);
        }
        self.state = CaptureState::Active;
        log::debug!("capture session {} entered", self.id);

        CaptureGuard {
            capture: self,
            exited: false,
        }
    }

    /// Run `f` with capture active.
    ///
    /// An `Err` is recorded at error level and returned unchanged. A panic is
    /// recorded, the streams are restored and the unwind continues with the
    /// original payload.
    pub fn run<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
        E: std::error::Error,
    {
        let guard = self.enter();
        match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(Ok(value)) => {
                guard.finish(None);
                Ok(value)
            }
            Ok(Err(error)) => {
                guard.finish(Some(&ErrorInfo::from_error(&error)));
                Err(error)
            }
            Err(payload) => {
                guard.finish(Some(&ErrorInfo::from_panic(payload.as_ref())));
                panic::resume_unwind(payload)
            }
        }
    }

    fn exit_inner(&mut self, error: Option<&ErrorInfo>) -> io::Result<()> {
        // Pending tails first, so a trace never merges into a partial line.
        // Draining goes straight to the sinks, so a failing original stream
        // cannot leave a tail behind.
        let mut result = self.stdout.flush();
        result = result.and(self.stderr.flush());
        result = result.and(self.stdout.drain_pending());
        result = result.and(self.stderr.drain_pending());

        if let Some(info) = error {
            self.errors_recorded += 1;
            let written = self.stderr.write(&info.trace, false);
            result = result.and(written).and(self.stderr.drain_pending());
        }

        if let Some(saved) = self.saved.take() {
            console::set_stdout(saved.stdout);
            console::set_stderr(saved.stderr);
        }
        self.state = CaptureState::Idle;
        log::debug!(
            "capture session {} exited{}: {}",
            self.id,
            if error.is_some() { " with error" } else { "" },
            self.diagnostics_json()
        );
        result
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn config(&self) -> &CaptureConfiguration {
        &self.config
    }

    pub fn stdout_adapter(&self) -> &Arc<StreamAdapter> {
        &self.stdout
    }

    pub fn stderr_adapter(&self) -> &Arc<StreamAdapter> {
        &self.stderr
    }

    pub fn diagnostics(&self) -> CaptureDiagnostics {
        CaptureDiagnostics {
            stdout_records: self.stdout.records(),
            stderr_records: self.stderr.records(),
            errors_recorded: self.errors_recorded,
        }
    }

    /// Diagnostics as a JSON object, for log lines and export.
    pub fn diagnostics_json(&self) -> String {
        serde_json::to_string(&self.diagnostics()).unwrap_or_else(|e| format!("{{\"error\":\"{}\"}}", e))
    }
}

/// Active capture scope. Dropping it exits without error information.
pub struct CaptureGuard<'a> {
    capture: &'a mut ScopedCapture,
    exited: bool,
}

impl CaptureGuard<'_> {
    /// Leave the scope, recording `error` at error level first when given.
    ///
    /// The saved streams are restored even when flushing or recording fails;
    /// the first such failure is returned.
    pub fn exit(mut self, error: Option<&ErrorInfo>) -> io::Result<()> {
        self.exited = true;
        self.capture.exit_inner(error)
    }

    fn finish(self, error: Option<&ErrorInfo>) {
        if let Err(e) = self.exit(error) {
            log::warn!("capture exit incomplete: {}", e);
        }
    }

    pub fn capture(&self) -> &ScopedCapture {
        self.capture
    }
}

impl Drop for CaptureGuard<'_> {
    fn drop(&mut self) {
        if self.exited {
            return;
        }
        if let Err(e) = self.capture.exit_inner(None) {
            log::warn!("capture exit incomplete: {}", e);
        }
    }
}
