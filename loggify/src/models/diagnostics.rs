use serde::Serialize;

/// Counters for debugging a capture session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CaptureDiagnostics {
    pub stdout_records: u64,
    pub stderr_records: u64,
    pub errors_recorded: u64,
}
