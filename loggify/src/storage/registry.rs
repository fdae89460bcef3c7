//! Process-wide table of named sinks.
//!
//! Sinks live for the rest of the process once registered; a later
//! registration under the same name replaces the binding instead of adding a
//! second destination.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::storage::file_sink::LogSink;

pub const STDOUT_SINK_NAME: &str = "STDOUT";
pub const STDERR_SINK_NAME: &str = "STDERR";

static SINKS: Mutex<BTreeMap<String, Arc<LogSink>>> = Mutex::new(BTreeMap::new());

/// Register `sink` under its name, returning the sink it replaced.
pub fn register_sink(sink: Arc<LogSink>) -> Option<Arc<LogSink>> {
    let replaced = SINKS.lock().insert(sink.name().to_string(), sink);
    if let Some(ref old) = replaced {
        log::debug!("sink {} rebound (was {})", old.name(), old.path().display());
    }
    replaced
}

pub fn registered_sink(name: &str) -> Option<Arc<LogSink>> {
    SINKS.lock().get(name).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::format::LineFormat;
    use log::Level;

    #[test]
    fn registration_replaces_previous_binding() {
        let dir = tempfile::tempdir().unwrap();
        let name = "registry-test-sink";

        let first = Arc::new(LogSink::open(name, Level::Info, dir.path().join("a.log"), LineFormat::default()).unwrap());
        let second = Arc::new(LogSink::open(name, Level::Info, dir.path().join("b.log"), LineFormat::default()).unwrap());

        register_sink(Arc::clone(&first));
        let replaced = register_sink(Arc::clone(&second)).unwrap();

        assert!(Arc::ptr_eq(&replaced, &first));
        assert!(Arc::ptr_eq(&registered_sink(name).unwrap(), &second));
        assert!(registered_sink("registry-test-unknown").is_none());
    }
}
