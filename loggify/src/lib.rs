//! # loggify
//!
//! Capture everything written to stdout/stderr, plus the error that ended
//! the run, into a timestamped log file.
//!
//! Output goes through swappable process-wide slots (`stream::console`).
//! A [`ScopedCapture`] points those slots at two [`StreamAdapter`]s for the
//! duration of a scope; each adapter reassembles writes into whole lines and
//! appends them to a shared log file at a fixed level, optionally still
//! echoing to the real console.
//!
//! ## Architecture
//!
//! ```text
//! loggify (this crate)
//! ├── traits/      ← OutputStream
//! ├── models/      ← CaptureError, CaptureConfiguration, CaptureState, ErrorInfo, CaptureDiagnostics
//! ├── processing/  ← LineBuffer
//! ├── storage/     ← LineFormat, LogSink, sink registry
//! ├── stream/      ← StdStream, StreamAdapter, console slots + cprint!/ceprint! macros
//! └── session/     ← ScopedCapture, CaptureGuard
//! ```
//!
//! Record layout with the default format:
//!
//! ```text
//! 2024-03-09 07:05:03.042:STDOUT:hello
//! 2024-03-09 07:05:03.043:STDERR:loggify_demo::JobError: job 7 failed
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod storage;
pub mod stream;
pub mod traits;

#[cfg(test)]
mod test_support;

// Re-export key types at crate root for convenience.
pub use models::config::{CaptureConfiguration, FileMode};
pub use models::diagnostics::CaptureDiagnostics;
pub use models::error::CaptureError;
pub use models::error_info::ErrorInfo;
pub use models::state::CaptureState;
pub use processing::line_buffer::LineBuffer;
pub use session::scoped::{CaptureGuard, ScopedCapture};
pub use storage::file_sink::LogSink;
pub use storage::format::LineFormat;
pub use stream::adapter::StreamAdapter;
pub use stream::console::Console;
pub use stream::std_stream::StdStream;
pub use traits::output_stream::OutputStream;
